//! The query cache itself: cached results keyed by `QueryKey`, one shared
//! in-flight fetch per key, staleness driven by tag invalidation.

use std::any::Any;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry as InFlightEntry;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use lru::LruCache;
use metrics::counter;
use tracing::{debug, info};

use crate::config::CacheSettings;
use crate::domain::error::ErrorKind;
use crate::util::lock::{mutex_lock, rw_read, rw_write};

use super::keys::{QueryKey, Tag};
use super::registry::TagRegistry;

const SOURCE: &str = "cache::store";
const METRIC_HIT: &str = "gramline_cache_hit_total";
const METRIC_MISS: &str = "gramline_cache_miss_total";
const METRIC_EVICT: &str = "gramline_cache_evict_total";
const METRIC_INVALIDATED: &str = "gramline_cache_invalidated_total";

type DynValue = Arc<dyn Any + Send + Sync>;
type SharedFetch = Shared<BoxFuture<'static, Result<DynValue, ErrorKind>>>;

struct Entry {
    value: DynValue,
    stale: bool,
}

/// A fetch that has been started but whose result is not yet cached.
///
/// The map entry owns a handle to the shared future, so the fetch survives
/// even if every caller that awaited it is cancelled; the next caller for
/// the key resumes it. `invalidated` collects tags dirtied while the fetch
/// was airborne: those invalidations ran before the result was registered,
/// so the result must be inserted already stale if its tags intersect.
struct InFlightFetch {
    fetch: SharedFetch,
    invalidated: std::sync::Mutex<HashSet<Tag>>,
}

/// In-memory query cache with tag-driven invalidation.
///
/// A cached value is the single source of truth for its key: concurrent
/// readers observe the same value, and concurrent fetches for the same key
/// collapse into one network call whose outcome fans out to every waiter.
/// Entries never expire on their own; they leave via tag invalidation,
/// `clear`, or LRU pressure.
pub struct QueryCache {
    enabled: bool,
    entries: RwLock<LruCache<QueryKey, Entry>>,
    registry: TagRegistry,
    in_flight: DashMap<QueryKey, InFlightFetch>,
    /// Bumped by `clear` so a fetch that was in flight across a logout can
    /// never repopulate the cache with pre-logout data.
    generation: AtomicU64,
}

impl QueryCache {
    pub fn new(settings: &CacheSettings) -> Self {
        Self {
            enabled: settings.enabled,
            entries: RwLock::new(LruCache::new(settings.query_limit_non_zero())),
            registry: TagRegistry::new(),
            in_flight: DashMap::new(),
            generation: AtomicU64::new(0),
        }
    }

    /// Resolve a query through the cache.
    ///
    /// A fresh cached value is returned without touching the network. On a
    /// miss (or a stale entry) `fetch` runs; concurrent callers for the same
    /// key share the one in-flight fetch. On success whichever caller
    /// observes completion stores the value (last writer wins) and registers
    /// the tags computed by `provides`; a tag invalidated while the fetch
    /// was airborne leaves the stored entry already stale. Failures are
    /// returned to every sharing caller and are not cached, so the next read
    /// retries.
    pub async fn query<T, P, F, Fut>(
        &self,
        key: QueryKey,
        provides: P,
        fetch: F,
    ) -> Result<T, ErrorKind>
    where
        T: Clone + Send + Sync + 'static,
        P: FnOnce(&T) -> Vec<Tag>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ErrorKind>> + Send + 'static,
    {
        if !self.enabled {
            return fetch().await;
        }

        if let Some(value) = self.lookup::<T>(&key) {
            counter!(METRIC_HIT).increment(1);
            debug!(query_key = ?key, "Query served from cache");
            return Ok(value);
        }
        counter!(METRIC_MISS).increment(1);

        let generation = self.generation.load(Ordering::SeqCst);
        let shared = self.join_or_start::<T, _, _>(&key, fetch);
        let outcome = shared.clone().await;

        // Every caller runs the completion step, not just the one that
        // started the fetch: a creator cancelled mid-await must not leave
        // the key wedged on a completed in-flight future. The step is
        // idempotent (last-writer-wins insert, tag re-registration, pointer
        // checked removal).
        self.finish::<T, P>(&key, generation, &shared, &outcome, provides);

        match outcome {
            Ok(value) => match value.downcast::<T>() {
                Ok(typed) => Ok((*typed).clone()),
                Err(_) => Err(ErrorKind::Decode(
                    "cached value type mismatch".to_string(),
                )),
            },
            Err(err) => Err(err),
        }
    }

    /// Mark every entry whose provided-tag set intersects `tags` as stale.
    /// Stale entries are re-fetched before they are ever served again.
    pub fn invalidate(&self, tags: &[Tag]) {
        if tags.is_empty() {
            return;
        }

        // Fetches already airborne are not in the registry yet; record the
        // tags on their in-flight entries so their results land stale when
        // they intersect.
        for in_flight in self.in_flight.iter() {
            mutex_lock(&in_flight.invalidated, SOURCE, "invalidate.in_flight")
                .extend(tags.iter().cloned());
        }

        let affected = self.registry.keys_for_tags(tags);
        if affected.is_empty() {
            debug!(tag_count = tags.len(), "Invalidation matched no cached queries");
            return;
        }

        let mut marked = 0u64;
        {
            let mut entries = rw_write(&self.entries, SOURCE, "invalidate");
            for key in &affected {
                if let Some(entry) = entries.peek_mut(key)
                    && !entry.stale
                {
                    entry.stale = true;
                    marked += 1;
                }
            }
        }
        counter!(METRIC_INVALIDATED).increment(marked);
        info!(
            tag_count = tags.len(),
            affected = affected.len(),
            marked,
            "Cache tags invalidated"
        );
    }

    /// Drop every entry and tag registration. Fetches already in flight are
    /// fenced out by the generation bump and cannot repopulate the cache.
    pub fn clear(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        rw_write(&self.entries, SOURCE, "clear").clear();
        self.registry.clear();
        self.in_flight.clear();
        info!("Query cache cleared");
    }

    /// True if the key holds a fresh (non-stale) value.
    pub fn is_fresh(&self, key: &QueryKey) -> bool {
        rw_read(&self.entries, SOURCE, "is_fresh")
            .peek(key)
            .is_some_and(|entry| !entry.stale)
    }

    pub fn len(&self) -> usize {
        rw_read(&self.entries, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lookup<T: Clone + Send + Sync + 'static>(&self, key: &QueryKey) -> Option<T> {
        let mut entries = rw_write(&self.entries, SOURCE, "lookup");
        let stale = match entries.get(key) {
            Some(entry) if !entry.stale => {
                return entry.value.downcast_ref::<T>().cloned();
            }
            Some(_) => true,
            None => false,
        };
        if stale {
            entries.pop(key);
            drop(entries);
            self.registry.unregister(key);
        }
        None
    }

    fn join_or_start<T, F, Fut>(&self, key: &QueryKey, fetch: F) -> SharedFetch
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ErrorKind>> + Send + 'static,
    {
        match self.in_flight.entry(key.clone()) {
            InFlightEntry::Occupied(existing) => existing.get().fetch.clone(),
            InFlightEntry::Vacant(slot) => {
                let shared = fetch()
                    .map(|result| result.map(|value| Arc::new(value) as DynValue))
                    .boxed()
                    .shared();
                slot.insert(InFlightFetch {
                    fetch: shared.clone(),
                    invalidated: std::sync::Mutex::new(HashSet::new()),
                });
                shared
            }
        }
    }

    fn finish<T, P>(
        &self,
        key: &QueryKey,
        generation: u64,
        fetch: &SharedFetch,
        outcome: &Result<DynValue, ErrorKind>,
        provides: P,
    ) where
        T: Clone + Send + Sync + 'static,
        P: FnOnce(&T) -> Vec<Tag>,
    {
        if let Ok(value) = outcome {
            if self.generation.load(Ordering::SeqCst) == generation {
                if let Some(typed) = value.downcast_ref::<T>() {
                    let tags: HashSet<Tag> = provides(typed).into_iter().collect();
                    debug!(query_key = ?key, tag_count = tags.len(), "Query result cached");
                    self.registry.register(key.clone(), tags.clone());

                    let evicted = {
                        let mut entries = rw_write(&self.entries, SOURCE, "finish.insert");
                        // A sibling caller of the same fetch may have
                        // inserted already and seen its entry invalidated;
                        // re-inserting the same value must not revive it.
                        let stale = entries.peek(key).is_some_and(|entry| entry.stale);
                        entries.push(
                            key.clone(),
                            Entry {
                                value: Arc::clone(value),
                                stale,
                            },
                        )
                    };
                    if let Some((evicted_key, _)) = evicted
                        && evicted_key != *key
                    {
                        counter!(METRIC_EVICT).increment(1);
                        self.registry.unregister(&evicted_key);
                        debug!(query_key = ?evicted_key, "Cache entry evicted by capacity");
                    }

                    // Invalidations that landed while the fetch was airborne
                    // never saw this entry in the registry; apply them now
                    // that the tags are known.
                    if self.invalidated_in_flight(key, &tags) {
                        let mut entries = rw_write(&self.entries, SOURCE, "finish.mark_stale");
                        if let Some(entry) = entries.peek_mut(key)
                            && !entry.stale
                        {
                            entry.stale = true;
                            counter!(METRIC_INVALIDATED).increment(1);
                            debug!(query_key = ?key, "Result invalidated while its fetch was in flight");
                        }
                    }
                }
            } else {
                debug!(query_key = ?key, "Dropped fetch result from a cleared generation");
            }
        }
        // Only the fetch that produced this outcome may be unlisted; a newer
        // fetch for the same key stays.
        self.in_flight
            .remove_if(key, |_, in_flight| in_flight.fetch.ptr_eq(fetch));
    }

    fn invalidated_in_flight(&self, key: &QueryKey, tags: &HashSet<Tag>) -> bool {
        self.in_flight.get(key).is_some_and(|in_flight| {
            mutex_lock(&in_flight.invalidated, SOURCE, "finish.invalidated")
                .iter()
                .any(|tag| tags.contains(tag))
        })
    }
}
