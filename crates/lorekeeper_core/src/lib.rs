//! Core data model for the Lorekeeper character analysis pipeline.
//!
//! A [`Profile`] is the aggregate root: it owns the per-chapter
//! [`Appearance`] records of one subject character together with the
//! fields synthesized from them. Everything the model produces as a
//! free-form label is typed through a [`Vocabulary`] enum that keeps
//! unknown terms in an `Other` variant, so the [`EnumPolicy`] in
//! [`AnalysisConfig`] decides what happens to them.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod appearance;
mod config;
mod integrity;
mod interaction;
mod mention;
mod profile;
mod relation;
mod validation;
mod vocabulary;

pub use appearance::{Appearance, NarratorBias, Significance, discovered_characters};
pub use config::{AnalysisConfig, AnalysisConfigBuilder, EnumPolicy};
pub use integrity::SyncReport;
pub use interaction::{Initiator, Interaction, InteractionKind, Sentiment};
pub use mention::MentionResult;
pub use profile::{AnalysisStatus, CoreTrait, Profile, Role};
pub use relation::{Confidence, Relation, RelationType};
pub use validation::{
    MAX_NAME_CHARS, validate_budget, validate_chapter_index, validate_character_name,
};
pub use vocabulary::Vocabulary;
