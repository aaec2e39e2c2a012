//! Filesystem-based profile storage.

use async_trait::async_trait;
use lorekeeper_core::{Profile, validate_character_name};
use lorekeeper_error::{JsonError, LorekeeperResult, StorageError, StorageErrorKind};
use lorekeeper_interface::ProfileStore;
use std::path::{Path, PathBuf};

const CHARACTERS_DIR: &str = "characters";
const PROFILE_FILE: &str = "profile.json";

/// Filesystem profile store.
///
/// Layout:
///
/// ```text
/// {data_dir}/
/// └── characters/
///     ├── Mei/
///     │   └── profile.json
///     └── Lin/
///         └── profile.json
/// ```
///
/// Writes go to a temp file that is renamed over the profile, so a reader
/// never sees a half-written document.
#[derive(Debug, Clone)]
pub struct FileSystemProfileStore {
    base_path: PathBuf,
}

impl FileSystemProfileStore {
    /// Create a store rooted at `data_dir`, creating the directory tree.
    ///
    /// # Errors
    ///
    /// Returns error if the directory cannot be created.
    #[tracing::instrument(skip(data_dir))]
    pub fn new(data_dir: impl Into<PathBuf>) -> LorekeeperResult<Self> {
        let base_path = data_dir.into().join(CHARACTERS_DIR);

        std::fs::create_dir_all(&base_path).map_err(|e| {
            StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                "{}: {}",
                base_path.display(),
                e
            )))
        })?;

        tracing::info!(path = %base_path.display(), "Opened profile store");
        Ok(Self { base_path })
    }

    /// Directory holding one subdirectory per character.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Path of a character's profile document.
    ///
    /// # Errors
    ///
    /// Returns a validation error for names that cannot be used as a
    /// directory name.
    pub fn profile_path(&self, name: &str) -> LorekeeperResult<PathBuf> {
        let name = validate_character_name(name)?;
        Ok(self.base_path.join(name).join(PROFILE_FILE))
    }
}

#[async_trait]
impl ProfileStore for FileSystemProfileStore {
    #[tracing::instrument(skip(self), fields(character = name))]
    async fn load(&self, name: &str) -> LorekeeperResult<Option<Profile>> {
        let path = self.profile_path(name)?;

        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No stored profile");
                return Ok(None);
            }
            Err(e) => {
                return Err(StorageError::new(StorageErrorKind::FileRead(format!(
                    "{}: {}",
                    path.display(),
                    e
                )))
                .into());
            }
        };

        let profile: Profile = serde_json::from_str(&raw).map_err(|e| {
            StorageError::new(StorageErrorKind::Corrupt(format!(
                "{}: {}",
                path.display(),
                e
            )))
        })?;

        tracing::debug!(
            path = %path.display(),
            appearances = profile.appearances.len(),
            "Loaded profile"
        );
        Ok(Some(profile))
    }

    #[tracing::instrument(skip(self, profile), fields(character = %profile.name))]
    async fn save(&self, profile: &Profile) -> LorekeeperResult<()> {
        let path = self.profile_path(&profile.name)?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                    "{}: {}",
                    parent.display(),
                    e
                )))
            })?;
        }

        let document = serde_json::to_string_pretty(profile)
            .map_err(|e| JsonError::new(format!("serialize profile {}: {}", profile.name, e)))?;

        // Write to temp file first, then rename for atomicity
        let temp_path = path.with_extension("json.tmp");
        tokio::fs::write(&temp_path, document).await.map_err(|e| {
            StorageError::new(StorageErrorKind::FileWrite(format!(
                "{}: {}",
                temp_path.display(),
                e
            )))
        })?;

        tokio::fs::rename(&temp_path, &path).await.map_err(|e| {
            StorageError::new(StorageErrorKind::FileWrite(format!(
                "rename {} to {}: {}",
                temp_path.display(),
                path.display(),
                e
            )))
        })?;

        tracing::info!(
            path = %path.display(),
            appearances = profile.appearances.len(),
            status = %profile.analysis_status,
            "Saved profile"
        );
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn list(&self) -> LorekeeperResult<Vec<String>> {
        let read_error = |e: std::io::Error| {
            StorageError::new(StorageErrorKind::FileRead(format!(
                "{}: {}",
                self.base_path.display(),
                e
            )))
        };

        let mut entries = tokio::fs::read_dir(&self.base_path)
            .await
            .map_err(read_error)?;
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(read_error)? {
            let has_profile = tokio::fs::try_exists(entry.path().join(PROFILE_FILE))
                .await
                .unwrap_or(false);
            if has_profile {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }
}
