//! Per-chapter appearance records.

use crate::Interaction;
use crate::vocabulary::vocabulary;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// How the first-person narration colours its account of the subject.
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
pub enum NarratorBias {
    /// Narrator speaks favourably of the subject
    #[display("positive")]
    Positive,
    /// Narrator is matter-of-fact
    #[display("neutral")]
    Neutral,
    /// Narrator disparages the subject
    #[display("negative")]
    Negative,
    /// Cannot tell
    #[display("unclear")]
    Unclear,
    /// Undocumented term reported by the model
    #[display("{_0}")]
    #[strum(default)]
    Other(String),
}

vocabulary!(
    NarratorBias,
    default = Unclear,
    terms = ["positive", "neutral", "negative", "unclear"]
);

/// How much a chapter matters for the subject.
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
pub enum Significance {
    /// Passing appearance
    #[display("low")]
    Low,
    /// Ordinary involvement
    #[display("medium")]
    Medium,
    /// Turning point for the subject
    #[display("high")]
    High,
    /// Undocumented term reported by the model
    #[display("{_0}")]
    #[strum(default)]
    Other(String),
}

vocabulary!(
    Significance,
    default = Medium,
    terms = ["low", "medium", "high"]
);

/// The subject character's behaviour within one chapter.
///
/// # Examples
///
/// ```
/// use lorekeeper_core::Appearance;
///
/// let mut appearance = Appearance::new(3, "Chapter 4");
/// appearance.refresh_mention_flag();
/// assert!(appearance.is_mentioned_only);
///
/// appearance.events.push("crosses the river".to_string());
/// appearance.refresh_mention_flag();
/// assert!(!appearance.is_mentioned_only);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Appearance {
    /// Zero-based chapter index in the source
    pub chapter_index: usize,
    /// Chapter title
    pub chapter_title: String,
    /// What the subject does (at most five)
    pub events: Vec<String>,
    /// Structured interactions (at most five)
    pub interactions: Vec<Interaction>,
    /// A literal line spoken by the subject, empty if none
    pub quote: String,
    /// Narrator bias towards the subject in this chapter
    pub narrator_bias: NarratorBias,
    /// Emotional state of the subject
    pub emotional_state: String,
    /// Importance of the chapter for the subject
    pub significance: Significance,
    /// Other characters connected to this chapter
    pub mentioned_characters: BTreeSet<String>,
    /// One sentence naming the key moment
    pub key_moment: String,
    /// Named but not dramatized: no events and no interactions
    pub is_mentioned_only: bool,
}

impl Appearance {
    /// Create an empty appearance for a chapter.
    pub fn new(chapter_index: usize, chapter_title: impl Into<String>) -> Self {
        Self {
            chapter_index,
            chapter_title: chapter_title.into(),
            is_mentioned_only: true,
            ..Default::default()
        }
    }

    /// Recompute `is_mentioned_only` from events and interactions.
    pub fn refresh_mention_flag(&mut self) {
        self.is_mentioned_only = self.events.is_empty() && self.interactions.is_empty();
    }

    /// Counterpart names of interactions that name one.
    pub fn counterparts(&self) -> impl Iterator<Item = &str> {
        self.interactions
            .iter()
            .filter(|interaction| interaction.has_counterpart())
            .map(|interaction| interaction.counterpart_name.trim())
    }
}

/// Names connected to the subject across appearances: mentioned characters
/// plus interaction counterparts, without the subject itself.
///
/// # Examples
///
/// ```
/// use lorekeeper_core::{Appearance, discovered_characters};
///
/// let mut appearance = Appearance::new(0, "Opening");
/// appearance.mentioned_characters.insert("Lin".to_string());
/// appearance.mentioned_characters.insert("Mei".to_string());
///
/// let found = discovered_characters("Mei", &[appearance]);
/// assert_eq!(found.into_iter().collect::<Vec<_>>(), vec!["Lin".to_string()]);
/// ```
pub fn discovered_characters(subject: &str, appearances: &[Appearance]) -> BTreeSet<String> {
    let subject = subject.trim();
    appearances
        .iter()
        .flat_map(|appearance| {
            appearance
                .mentioned_characters
                .iter()
                .map(|name| name.trim())
                .chain(appearance.counterparts())
        })
        .filter(|name| !name.is_empty() && *name != subject)
        .map(str::to_string)
        .collect()
}
