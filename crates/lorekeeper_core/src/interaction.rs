//! Structured interactions between the subject and another character.

use crate::vocabulary::vocabulary;
use serde::{Deserialize, Serialize};

/// What kind of contact took place.
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
pub enum InteractionKind {
    /// Spoken exchange
    #[display("dialogue")]
    Dialogue,
    /// Opposition or fight
    #[display("conflict")]
    Conflict,
    /// Working together
    #[display("cooperation")]
    Cooperation,
    /// Help given or received
    #[display("support")]
    Support,
    /// One side watches the other
    #[display("observation")]
    Observation,
    /// Undocumented term reported by the model
    #[display("{_0}")]
    #[strum(default)]
    Other(String),
}

vocabulary!(
    InteractionKind,
    default = Observation,
    terms = ["dialogue", "conflict", "cooperation", "support", "observation"]
);

/// Emotional tone of an interaction.
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
pub enum Sentiment {
    /// Friendly or warm
    #[display("positive")]
    Positive,
    /// Neither warm nor hostile
    #[display("neutral")]
    Neutral,
    /// Hostile or cold
    #[display("negative")]
    Negative,
    /// Undocumented term reported by the model
    #[display("{_0}")]
    #[strum(default)]
    Other(String),
}

vocabulary!(
    Sentiment,
    default = Neutral,
    terms = ["positive", "neutral", "negative"]
);

/// Who started an interaction.
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
#[strum(ascii_case_insensitive)]
pub enum Initiator {
    /// The subject character
    #[display("subject")]
    #[strum(serialize = "subject", serialize = "target")]
    Subject,
    /// The counterpart
    #[display("other")]
    #[strum(serialize = "other")]
    Counterpart,
    /// Both sides
    #[display("mutual")]
    #[strum(serialize = "mutual")]
    Mutual,
    /// Not stated
    #[display("")]
    #[strum(serialize = "")]
    Unspecified,
    /// Undocumented term reported by the model
    #[display("{_0}")]
    #[strum(default)]
    Other(String),
}

vocabulary!(
    Initiator,
    default = Unspecified,
    terms = ["subject", "other", "mutual"]
);

/// One interaction of the subject with a named counterpart in a chapter.
///
/// # Examples
///
/// ```
/// use lorekeeper_core::{Initiator, Interaction, InteractionKind, Sentiment};
///
/// let interaction = Interaction {
///     counterpart_name: "Lin".to_string(),
///     kind: InteractionKind::Dialogue,
///     description: "argue about the map".to_string(),
///     sentiment: Sentiment::Negative,
///     initiator: Initiator::Subject,
/// };
/// assert!(interaction.has_counterpart());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Interaction {
    /// Name of the other character
    pub counterpart_name: String,
    /// Interaction kind
    pub kind: InteractionKind,
    /// What happened
    pub description: String,
    /// Emotional tone
    pub sentiment: Sentiment,
    /// Who started it
    pub initiator: Initiator,
}

impl Interaction {
    /// Whether the interaction names a counterpart.
    pub fn has_counterpart(&self) -> bool {
        !self.counterpart_name.trim().is_empty()
    }
}
