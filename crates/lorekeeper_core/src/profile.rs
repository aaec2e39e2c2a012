//! The character profile aggregate.

use crate::vocabulary::vocabulary;
use crate::{Appearance, Confidence, MentionResult, Relation};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Narrative role of a character.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
    strum::EnumString,
)]
#[serde(from = "String", into = "String")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Role {
    /// Main character
    #[display("protagonist")]
    Protagonist,
    /// Main opponent
    #[display("antagonist")]
    Antagonist,
    /// Recurring secondary character
    #[display("supporting")]
    Supporting,
    /// Occasional character
    #[display("minor")]
    Minor,
    /// Not yet classified
    #[display("unknown")]
    Unknown,
    /// Undocumented term reported by the model
    #[display("{_0}")]
    #[strum(default)]
    Other(String),
}

vocabulary!(
    Role,
    default = Unknown,
    terms = ["protagonist", "antagonist", "supporting", "minor"]
);

/// Lifecycle of one analysis run.
///
/// `pending → searching → analyzing → {completed, error}`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AnalysisStatus {
    /// Created, nothing done yet
    #[default]
    Pending,
    /// Scanning chapters for mentions
    Searching,
    /// Extracting and synthesizing
    Analyzing,
    /// Finished successfully
    Completed,
    /// Stopped by a stage failure
    Error,
}

impl AnalysisStatus {
    /// Whether the run has ended.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Error)
    }
}

/// A core trait with its supporting evidence.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreTrait {
    /// Trait keyword
    #[serde(rename = "trait")]
    pub name: String,
    /// How the trait shows
    pub description: String,
    /// A concrete quote or behaviour backing it
    pub evidence: String,
}

/// Everything known about one subject character.
///
/// # Examples
///
/// ```
/// use lorekeeper_core::{AnalysisStatus, Profile};
///
/// let profile = Profile::new("Mei");
/// assert_eq!(profile.analysis_status, AnalysisStatus::Pending);
/// assert!(profile.analyzed_chapters.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    /// Character name
    pub name: String,
    /// Other names for the character
    pub aliases: Vec<String>,
    /// Short biography
    pub description: String,
    /// Narrative role
    pub role: Role,
    /// Personality keywords
    pub personality: Vec<String>,
    /// One-line summary
    pub summary: String,
    /// Staged growth narrative
    pub growth_arc: String,
    /// Core traits with evidence
    pub core_traits: Vec<CoreTrait>,
    /// Strengths
    pub strengths: Vec<String>,
    /// Weaknesses
    pub weaknesses: Vec<String>,
    /// Quotes drawn from the analyzed material
    pub notable_quotes: Vec<String>,
    /// Model-reported confidence in the deep profile
    pub analysis_confidence: Confidence,
    /// Model-reported limitations of the analysis
    pub analysis_limitations: String,
    /// Other characters found while analyzing this one
    pub discovered_characters: BTreeSet<String>,
    /// Ranked relationships
    pub relations: Vec<Relation>,
    /// Per-chapter records, ascending by chapter index
    pub appearances: Vec<Appearance>,
    /// First chapter with a mention
    pub first_appearance: Option<usize>,
    /// Last chapter with a mention
    pub last_appearance: Option<usize>,
    /// Number of chapters with a mention
    pub total_chapters_found: usize,
    /// Chapters with a recorded appearance
    pub analyzed_chapters: BTreeSet<usize>,
    /// Run status
    pub analysis_status: AnalysisStatus,
    /// Set on not-found or stage failure
    pub error_message: Option<String>,
}

impl Profile {
    /// Create an empty, pending profile.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            analysis_confidence: Confidence::Low,
            ..Default::default()
        }
    }

    /// Whether the last search found the character anywhere.
    pub fn is_found(&self) -> bool {
        self.total_chapters_found > 0
    }

    /// Record search coverage.
    pub fn record_search(&mut self, mentions: &MentionResult) {
        self.first_appearance = mentions.first();
        self.last_appearance = mentions.last();
        self.total_chapters_found = mentions.found_count();
    }

    /// Chapter indices that have an appearance record.
    pub fn appearance_indices(&self) -> BTreeSet<usize> {
        self.appearances.iter().map(|a| a.chapter_index).collect()
    }

    /// Mark the run completed, keeping an informational message if given.
    pub fn mark_completed(&mut self, message: Option<String>) {
        self.analysis_status = AnalysisStatus::Completed;
        self.error_message = message;
    }

    /// Mark the run failed.
    pub fn mark_error(&mut self, message: impl Into<String>) {
        self.analysis_status = AnalysisStatus::Error;
        self.error_message = Some(message.into());
    }
}
