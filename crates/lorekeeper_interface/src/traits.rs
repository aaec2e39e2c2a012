//! Collaborator trait definitions.

use crate::Chapter;
use async_trait::async_trait;
use lorekeeper_core::Profile;
use lorekeeper_error::LorekeeperResult;
use std::sync::Arc;

/// A parsed JSON object returned by the model.
pub type Mapping = serde_json::Map<String, serde_json::Value>;

/// One model round trip that yields a JSON object.
///
/// Implementations return an empty [`Mapping`] when the model output is not
/// a JSON object. Transport failures are errors.
#[async_trait]
pub trait StructuredGenerator: Send + Sync {
    /// Send `prompt` under the `system` instruction and parse the reply.
    async fn generate_structured(&self, prompt: &str, system: &str) -> LorekeeperResult<Mapping>;
}

#[async_trait]
impl<T: StructuredGenerator + ?Sized> StructuredGenerator for Arc<T> {
    async fn generate_structured(&self, prompt: &str, system: &str) -> LorekeeperResult<Mapping> {
        (**self).generate_structured(prompt, system).await
    }
}

/// Ordered chapters of one book with their text.
pub trait ChapterSource: Send + Sync {
    /// Chapters in source order.
    fn chapters(&self) -> &[Chapter];

    /// Raw text of a chapter, or `None` if its span cannot be resolved.
    fn text(&self, chapter: &Chapter) -> Option<&str>;

    /// Number of chapters.
    fn chapter_count(&self) -> usize {
        self.chapters().len()
    }

    /// Chapter at a position.
    fn chapter(&self, index: usize) -> Option<&Chapter> {
        self.chapters().get(index)
    }
}

/// Persistence for profiles, keyed by character name.
///
/// A save must be visible to the next load of the same name within the
/// process.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Load a stored profile.
    async fn load(&self, name: &str) -> LorekeeperResult<Option<Profile>>;

    /// Store a profile, replacing any previous version.
    async fn save(&self, profile: &Profile) -> LorekeeperResult<()>;

    /// Names of all stored profiles, sorted.
    async fn list(&self) -> LorekeeperResult<Vec<String>>;
}

#[async_trait]
impl<T: ProfileStore + ?Sized> ProfileStore for Arc<T> {
    async fn load(&self, name: &str) -> LorekeeperResult<Option<Profile>> {
        (**self).load(name).await
    }

    async fn save(&self, profile: &Profile) -> LorekeeperResult<()> {
        (**self).save(profile).await
    }

    async fn list(&self) -> LorekeeperResult<Vec<String>> {
        (**self).list().await
    }
}
