//! Profile cache implementation.

use async_trait::async_trait;
use derive_getters::Getters;
use lorekeeper_core::Profile;
use lorekeeper_error::LorekeeperResult;
use lorekeeper_interface::ProfileStore;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Cache entry with value and expiration.
#[derive(Debug, Clone, Getters)]
pub struct CacheEntry {
    profile: Profile,
    created_at: Instant,
    ttl: Duration,
}

impl CacheEntry {
    /// Check if this entry is expired.
    pub fn is_expired(&self) -> bool {
        self.created_at.elapsed() > self.ttl
    }
}

/// Configuration for the profile cache.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Getters,
    derive_setters::Setters,
    derive_builder::Builder,
)]
#[setters(prefix = "with_")]
#[builder(default)]
pub struct ProfileCacheConfig {
    /// Time an entry stays valid (seconds)
    #[serde(default = "default_ttl")]
    default_ttl: u64,

    /// Maximum number of cached profiles
    #[serde(default = "default_max_size")]
    max_size: usize,

    /// Whether caching is enabled
    #[serde(default = "default_enabled")]
    enabled: bool,
}

fn default_ttl() -> u64 {
    600
}

fn default_max_size() -> usize {
    64
}

fn default_enabled() -> bool {
    true
}

impl Default for ProfileCacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: default_ttl(),
            max_size: default_max_size(),
            enabled: default_enabled(),
        }
    }
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<String, CacheEntry>,
    access_order: Vec<String>,
    hits: u64,
    misses: u64,
}

impl CacheState {
    fn touch(&mut self, name: &str) {
        if let Some(pos) = self.access_order.iter().position(|k| k == name) {
            self.access_order.remove(pos);
        }
        self.access_order.push(name.to_string());
    }

    fn forget(&mut self, name: &str) {
        self.entries.remove(name);
        if let Some(pos) = self.access_order.iter().position(|k| k == name) {
            self.access_order.remove(pos);
        }
    }

    fn evict_lru(&mut self) {
        if !self.access_order.is_empty() {
            let name = self.access_order.remove(0);
            tracing::debug!(character = %name, "Evicting LRU profile");
            self.entries.remove(&name);
        }
    }
}

/// A [`ProfileStore`] with an in-memory cache in front of it.
///
/// # Example
///
/// ```
/// use lorekeeper_cache::{CachedProfileStore, ProfileCacheConfig};
/// use lorekeeper_core::Profile;
/// use lorekeeper_interface::ProfileStore;
/// use lorekeeper_storage::InMemoryProfileStore;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = CachedProfileStore::new(InMemoryProfileStore::new(), ProfileCacheConfig::default());
/// store.save(&Profile::new("Mei")).await?;
/// assert!(store.load("Mei").await?.is_some());
/// assert_eq!(store.len().await, 1);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct CachedProfileStore<S> {
    inner: S,
    config: ProfileCacheConfig,
    state: Mutex<CacheState>,
}

impl<S: ProfileStore> CachedProfileStore<S> {
    /// Wrap a store.
    pub fn new(inner: S, config: ProfileCacheConfig) -> Self {
        tracing::debug!(
            default_ttl = config.default_ttl,
            max_size = config.max_size,
            enabled = config.enabled,
            "Creating new CachedProfileStore"
        );
        Self {
            inner,
            config,
            state: Mutex::new(CacheState::default()),
        }
    }

    /// The wrapped store.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    async fn remember(&self, profile: Profile) {
        if !self.config.enabled || self.config.max_size == 0 {
            return;
        }
        let mut state = self.state.lock().await;
        let name = profile.name.clone();
        if state.entries.len() >= self.config.max_size && !state.entries.contains_key(&name) {
            state.evict_lru();
        }
        state.touch(&name);
        state.entries.insert(
            name,
            CacheEntry {
                profile,
                created_at: Instant::now(),
                ttl: Duration::from_secs(self.config.default_ttl),
            },
        );
    }

    /// Drop one cached profile.
    pub async fn invalidate(&self, name: &str) {
        self.state.lock().await.forget(name);
    }

    /// Drop every cached profile.
    pub async fn clear(&self) {
        let mut state = self.state.lock().await;
        let count = state.entries.len();
        state.entries.clear();
        state.access_order.clear();
        tracing::info!(cleared = count, "Cleared profile cache");
    }

    /// Number of cached profiles.
    pub async fn len(&self) -> usize {
        self.state.lock().await.entries.len()
    }

    /// Whether the cache holds nothing.
    pub async fn is_empty(&self) -> bool {
        self.state.lock().await.entries.is_empty()
    }

    /// Cache hits and misses since creation.
    pub async fn stats(&self) -> (u64, u64) {
        let state = self.state.lock().await;
        (state.hits, state.misses)
    }
}

#[async_trait]
impl<S: ProfileStore> ProfileStore for CachedProfileStore<S> {
    #[tracing::instrument(skip(self), fields(character = name))]
    async fn load(&self, name: &str) -> LorekeeperResult<Option<Profile>> {
        if self.config.enabled {
            let mut state = self.state.lock().await;
            let cached = state.entries.get(name).map(|entry| {
                (entry.is_expired(), entry.profile.clone())
            });
            match cached {
                Some((false, profile)) => {
                    state.hits += 1;
                    state.touch(name);
                    tracing::debug!("Cache hit");
                    return Ok(Some(profile));
                }
                Some((true, _)) => {
                    tracing::debug!("Cache entry expired, removing");
                    state.forget(name);
                    state.misses += 1;
                }
                None => state.misses += 1,
            }
        }

        let loaded = self.inner.load(name).await?;
        if let Some(profile) = &loaded {
            self.remember(profile.clone()).await;
        }
        Ok(loaded)
    }

    #[tracing::instrument(skip(self, profile), fields(character = %profile.name))]
    async fn save(&self, profile: &Profile) -> LorekeeperResult<()> {
        self.invalidate(&profile.name).await;
        self.inner.save(profile).await?;

        match self.inner.load(&profile.name).await? {
            Some(stored) => self.remember(stored).await,
            None => tracing::warn!("Saved profile not readable from backing store"),
        }
        Ok(())
    }

    async fn list(&self) -> LorekeeperResult<Vec<String>> {
        self.inner.list().await
    }
}
