//! Lorekeeper - on-demand character analysis for long-form fiction
//!
//! Lorekeeper builds a profile of one named character from a chaptered book
//! by asking an LLM a series of structured questions: one per chapter the
//! character appears in, then three synthesis passes over everything found
//! (relationships, personality, deep profile). Profiles are stored and can
//! be extended chapter by chapter later.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use lorekeeper::{
//!     Book, CharacterAnalyzer, ChatCompletionsClient, FileSystemProfileStore, LorekeeperConfig,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = LorekeeperConfig::load()?;
//!     let client = ChatCompletionsClient::new(config.model().client_settings()?)?;
//!     let book = Arc::new(Book::from_json_file("book.json")?);
//!     let store = Arc::new(FileSystemProfileStore::new(config.storage().data_dir())?);
//!
//!     let analyzer = CharacterAnalyzer::new(client, book, store, config.analysis().clone())?;
//!     let profile = analyzer.analyze_full("Mei", Some(10)).await?;
//!     println!("{}", profile.summary);
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - `lorekeeper-error` - Error types
//! - `lorekeeper-core` - Profile data model and vocabularies
//! - `lorekeeper-interface` - Collaborator traits and the book model
//! - `lorekeeper-storage` - Profile persistence
//! - `lorekeeper-cache` - Write-through profile cache
//! - `lorekeeper-models` - Chat completions client
//! - `lorekeeper-analysis` - The analysis pipeline
//!
//! This crate re-exports the public surface and adds layered configuration.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;

pub use config::{LorekeeperConfig, ModelConfig, StorageConfig};

pub use lorekeeper_error::{
    AnalysisError, AnalysisErrorKind, ConfigError, ExtractionError, ExtractionErrorKind,
    GenerationError, GenerationErrorKind, JsonError, LorekeeperError, LorekeeperErrorKind,
    LorekeeperResult, StorageError, StorageErrorKind, ValidationError, ValidationErrorKind,
};

pub use lorekeeper_core::{
    AnalysisConfig, AnalysisStatus, Appearance, Confidence, CoreTrait, EnumPolicy, Initiator,
    Interaction, InteractionKind, MentionResult, NarratorBias, Profile, Relation, RelationType,
    Role, Sentiment, Significance, SyncReport, Vocabulary, validate_chapter_index,
    validate_character_name,
};

pub use lorekeeper_interface::{
    Book, Chapter, ChapterSource, Mapping, ProfileStore, StructuredGenerator,
};

pub use lorekeeper_storage::{FileSystemProfileStore, InMemoryProfileStore};

pub use lorekeeper_cache::{CachedProfileStore, ProfileCacheConfig};

pub use lorekeeper_models::{ChatCompletionsClient, ClientSettings};

pub use lorekeeper_analysis::{
    AnalysisEvent, AnalysisStream, CharacterAnalyzer, DeepProfile, Scheduler, search_mentions,
};
