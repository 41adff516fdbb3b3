//! Gramline query cache.
//!
//! A single in-memory cache stands between the resource endpoints and the
//! transport:
//!
//! - queries declare a [`QueryKey`] and the [`Tag`]s their result provides;
//! - mutations declare the tags they invalidate;
//! - any intersection marks the affected entries stale, and a stale entry is
//!   re-fetched before it is served again.
//!
//! Capacity and the enable switch come from `[cache]` in `gramline.toml`.

mod keys;
mod registry;
mod store;

pub use keys::{QueryKey, ResourceKind, Tag, TagId};
pub use registry::TagRegistry;
pub use store::QueryCache;
