//! Character on-demand analysis pipeline.
//!
//! The pipeline turns chapters that mention a character into a structured
//! [`Profile`](lorekeeper_core::Profile):
//!
//! 1. [`search_mentions`] finds chapters containing the name literally.
//! 2. [`sample_chapters`] bounds how many of them a full run extracts.
//! 3. [`AppearanceExtractor`] asks the model about each chapter.
//! 4. [`RelationSynthesizer`], [`PersonalitySynthesizer`] and
//!    [`DeepProfileSynthesizer`] aggregate the appearances.
//!
//! [`CharacterAnalyzer`] drives the stages for full runs, continuations and
//! summary refreshes, either awaited or as a stream of [`AnalysisEvent`]s.
//!
//! # Example
//!
//! ```rust,no_run
//! use lorekeeper_analysis::CharacterAnalyzer;
//! use lorekeeper_core::AnalysisConfig;
//! use lorekeeper_interface::{Book, StructuredGenerator};
//! use lorekeeper_storage::InMemoryProfileStore;
//! use std::sync::Arc;
//!
//! # async fn example(generator: impl StructuredGenerator) -> Result<(), Box<dyn std::error::Error>> {
//! let book = Book::from_json_file("book.json")?;
//! let analyzer = CharacterAnalyzer::new(
//!     generator,
//!     Arc::new(book),
//!     Arc::new(InMemoryProfileStore::new()),
//!     AnalysisConfig::default(),
//! )?;
//!
//! let profile = analyzer.analyze_full("Mei", Some(10)).await?;
//! let profile = analyzer.continue_analysis(profile, Some(10), false).await?;
//! println!("{} chapters analyzed", profile.analyzed_chapters.len());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod decode;
mod deep_profile;
mod events;
mod extractor;
mod mention;
mod merge;
mod orchestrator;
mod personality;
mod prompts;
mod relations;
mod sampler;
mod scheduler;

pub use deep_profile::{
    DeepProfile, DeepProfileSynthesizer, MAX_CORE_TRAITS, MAX_NOTABLE_QUOTES, MAX_QUALITIES,
    decode_deep_profile,
};
pub use events::AnalysisEvent;
pub use extractor::{
    AppearanceExtractor, ChapterJob, MAX_EVENTS, MAX_INTERACTIONS, decode_appearance,
};
pub use mention::search_mentions;
pub use merge::{MergeResult, merge_outcomes};
pub use orchestrator::{AnalysisStream, CharacterAnalyzer};
pub use personality::{MAX_TRAITS, PersonalitySketch, PersonalitySynthesizer, decode_personality};
pub use prompts::truncate_chars;
pub use relations::{
    CounterpartGroup, MAX_COUNTERPARTS, MAX_RELATIONS, RelationSynthesizer, decode_relations,
    group_interactions,
};
pub use sampler::sample_chapters;
pub use scheduler::Scheduler;
