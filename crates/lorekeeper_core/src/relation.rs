//! Relations between the subject and other characters.

use crate::vocabulary::vocabulary;
use serde::{Deserialize, Serialize};

/// Relationship category.
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
pub enum RelationType {
    /// Friend
    #[display("friend")]
    Friend,
    /// Enemy
    #[display("enemy")]
    Enemy,
    /// Romantic partner
    #[display("lover")]
    Lover,
    /// Relative
    #[display("family")]
    Family,
    /// Teacher or guide
    #[display("mentor")]
    Mentor,
    /// Competitor
    #[display("rival")]
    Rival,
    /// Working partner
    #[display("partner")]
    Partner,
    /// Mixed or shifting relationship
    #[display("complex")]
    Complex,
    /// Not determinable
    #[display("unknown")]
    Unknown,
    /// Undocumented term reported by the model
    #[display("{_0}")]
    #[strum(default)]
    Other(String),
}

vocabulary!(
    RelationType,
    default = Unknown,
    terms = [
        "friend", "enemy", "lover", "family", "mentor", "rival", "partner", "complex", "unknown",
    ]
);

/// Self-reported certainty of a model judgment.
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
pub enum Confidence {
    /// Well supported
    #[display("high")]
    High,
    /// Partly supported
    #[display("medium")]
    Medium,
    /// Weakly supported
    #[display("low")]
    Low,
    /// Undocumented term reported by the model
    #[display("{_0}")]
    #[strum(default)]
    Other(String),
}

vocabulary!(
    Confidence,
    default = Medium,
    terms = ["high", "medium", "low"]
);

/// A ranked relationship of the subject with one counterpart.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Relation {
    /// The counterpart
    pub target_name: String,
    /// Relationship category
    pub relation_type: RelationType,
    /// Short description
    pub description: String,
    /// Chapters where the grouped interactions occurred
    pub evidence_chapters: Vec<usize>,
    /// Observable behaviour the judgment rests on
    pub objective_basis: String,
    /// First chapter the two interact in, if known
    pub first_interaction_chapter: Option<usize>,
    /// How the relationship changes over time
    pub evolution_note: String,
    /// Certainty of the judgment
    pub confidence: Confidence,
}
