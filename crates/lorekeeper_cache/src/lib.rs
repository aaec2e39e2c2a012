//! Explicit profile cache for Lorekeeper.
//!
//! [`CachedProfileStore`] wraps any [`ProfileStore`](lorekeeper_interface::ProfileStore)
//! and keeps recently loaded profiles in memory. Every save writes through
//! to the wrapped store and then reloads the entry from it, so the cache
//! only ever holds what the backing store returns.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod cache;

pub use cache::{CacheEntry, CachedProfileStore, ProfileCacheConfig, ProfileCacheConfigBuilder};
