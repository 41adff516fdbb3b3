//! Bidirectional tag registry.
//!
//! Tracks which cached queries provide which tags, so a mutation's
//! invalidated-tag set can be resolved to the exact set of affected keys.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use crate::util::lock::{rw_read, rw_write};

use super::keys::{QueryKey, Tag};

const SOURCE: &str = "cache::registry";

/// Maps tag → providing keys and key → provided tags.
///
/// Both directions are needed: invalidation walks tag → keys, while entry
/// replacement and eviction walk key → tags to clean up.
pub struct TagRegistry {
    tag_to_keys: RwLock<HashMap<Tag, HashSet<QueryKey>>>,
    key_to_tags: RwLock<HashMap<QueryKey, HashSet<Tag>>>,
}

impl TagRegistry {
    pub fn new() -> Self {
        Self {
            tag_to_keys: RwLock::new(HashMap::new()),
            key_to_tags: RwLock::new(HashMap::new()),
        }
    }

    /// Register a query's provided tags, replacing any previous registration
    /// for the same key (a re-fetch may provide a different tag set, e.g. a
    /// list result gaining per-id tags).
    pub fn register(&self, key: QueryKey, tags: HashSet<Tag>) {
        self.unregister(&key);

        let mut t2k = rw_write(&self.tag_to_keys, SOURCE, "register.tag_to_keys");
        let mut k2t = rw_write(&self.key_to_tags, SOURCE, "register.key_to_tags");

        for tag in &tags {
            t2k.entry(tag.clone()).or_default().insert(key.clone());
        }
        k2t.insert(key, tags);
    }

    /// All keys whose provided-tag set intersects `tags`.
    pub fn keys_for_tags(&self, tags: &[Tag]) -> HashSet<QueryKey> {
        let t2k = rw_read(&self.tag_to_keys, SOURCE, "keys_for_tags");
        let mut affected = HashSet::new();
        for tag in tags {
            if let Some(keys) = t2k.get(tag) {
                affected.extend(keys.iter().cloned());
            }
        }
        affected
    }

    /// Tags provided by a key.
    pub fn tags_for_key(&self, key: &QueryKey) -> HashSet<Tag> {
        rw_read(&self.key_to_tags, SOURCE, "tags_for_key")
            .get(key)
            .cloned()
            .unwrap_or_default()
    }

    /// Remove a key and clean up the tag side of the mapping.
    ///
    /// Called when a cache entry is evicted or dropped.
    pub fn unregister(&self, key: &QueryKey) {
        let mut t2k = rw_write(&self.tag_to_keys, SOURCE, "unregister.tag_to_keys");
        let mut k2t = rw_write(&self.key_to_tags, SOURCE, "unregister.key_to_tags");

        if let Some(tags) = k2t.remove(key) {
            for tag in tags {
                if let Some(keys) = t2k.get_mut(&tag) {
                    keys.remove(key);
                    if keys.is_empty() {
                        t2k.remove(&tag);
                    }
                }
            }
        }
    }

    /// Drop all mappings.
    pub fn clear(&self) {
        rw_write(&self.tag_to_keys, SOURCE, "clear.tag_to_keys").clear();
        rw_write(&self.key_to_tags, SOURCE, "clear.key_to_tags").clear();
    }

    pub fn tag_count(&self) -> usize {
        rw_read(&self.tag_to_keys, SOURCE, "tag_count").len()
    }

    pub fn key_count(&self) -> usize {
        rw_read(&self.key_to_tags, SOURCE, "key_count").len()
    }
}

impl Default for TagRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::keys::ResourceKind;

    fn tags(list: &[Tag]) -> HashSet<Tag> {
        list.iter().cloned().collect()
    }

    #[test]
    fn register_and_lookup() {
        let registry = TagRegistry::new();
        let key = QueryKey::PostById(42);
        let tag = Tag::id(ResourceKind::Post, 42);

        registry.register(key.clone(), tags(&[tag.clone()]));

        let affected = registry.keys_for_tags(&[tag.clone()]);
        assert!(affected.contains(&key));
        assert!(registry.tags_for_key(&key).contains(&tag));
    }

    #[test]
    fn intersection_over_multiple_tags() {
        let registry = TagRegistry::new();
        registry.register(
            QueryKey::Posts,
            tags(&[Tag::id(ResourceKind::Post, 1), Tag::list(ResourceKind::Post)]),
        );
        registry.register(
            QueryKey::CommentCount(7),
            tags(&[Tag::list(ResourceKind::Comment)]),
        );

        let affected = registry.keys_for_tags(&[
            Tag::list(ResourceKind::Post),
            Tag::list(ResourceKind::Comment),
        ]);
        assert_eq!(affected.len(), 2);

        let unaffected = registry.keys_for_tags(&[Tag::list(ResourceKind::Follow)]);
        assert!(unaffected.is_empty());
    }

    #[test]
    fn unregister_cleans_both_directions() {
        let registry = TagRegistry::new();
        let key = QueryKey::PostById(42);
        registry.register(key.clone(), tags(&[Tag::id(ResourceKind::Post, 42)]));
        assert_eq!(registry.key_count(), 1);
        assert_eq!(registry.tag_count(), 1);

        registry.unregister(&key);
        assert_eq!(registry.key_count(), 0);
        assert_eq!(registry.tag_count(), 0);
    }

    #[test]
    fn reregistration_replaces_previous_tags() {
        let registry = TagRegistry::new();
        let key = QueryKey::Posts;
        registry.register(key.clone(), tags(&[Tag::id(ResourceKind::Post, 1)]));
        registry.register(key.clone(), tags(&[Tag::id(ResourceKind::Post, 2)]));

        assert!(
            registry
                .keys_for_tags(&[Tag::id(ResourceKind::Post, 1)])
                .is_empty()
        );
        assert!(
            registry
                .keys_for_tags(&[Tag::id(ResourceKind::Post, 2)])
                .contains(&key)
        );
    }

    #[test]
    fn multiple_keys_share_one_tag() {
        let registry = TagRegistry::new();
        let shared = Tag::name(ResourceKind::Follow, "ada");
        registry.register(
            QueryKey::FollowerCount("ada".to_string()),
            tags(&[shared.clone()]),
        );
        registry.register(QueryKey::Followed("ada".to_string()), tags(&[shared.clone()]));

        assert_eq!(registry.keys_for_tags(&[shared]).len(), 2);
    }

    #[test]
    fn clear_removes_all_mappings() {
        let registry = TagRegistry::new();
        registry.register(
            QueryKey::Posts,
            tags(&[Tag::list(ResourceKind::Post)]),
        );
        registry.clear();
        assert_eq!(registry.key_count(), 0);
        assert_eq!(registry.tag_count(), 0);
    }
}
