//! Map-backed profile store.

use async_trait::async_trait;
use lorekeeper_core::Profile;
use lorekeeper_error::LorekeeperResult;
use lorekeeper_interface::ProfileStore;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

/// Profiles held in memory for the lifetime of the store.
#[derive(Debug, Default)]
pub struct InMemoryProfileStore {
    profiles: RwLock<BTreeMap<String, Profile>>,
}

impl InMemoryProfileStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn load(&self, name: &str) -> LorekeeperResult<Option<Profile>> {
        Ok(self.profiles.read().await.get(name).cloned())
    }

    #[tracing::instrument(skip(self, profile), fields(character = %profile.name))]
    async fn save(&self, profile: &Profile) -> LorekeeperResult<()> {
        self.profiles
            .write()
            .await
            .insert(profile.name.clone(), profile.clone());
        tracing::debug!("Stored profile in memory");
        Ok(())
    }

    async fn list(&self) -> LorekeeperResult<Vec<String>> {
        Ok(self.profiles.read().await.keys().cloned().collect())
    }
}
