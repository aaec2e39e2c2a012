//! Analysis configuration.

use crate::Vocabulary;
use derive_getters::Getters;
use lorekeeper_error::{ConfigError, LorekeeperResult};
use serde::{Deserialize, Serialize};

/// What to do with a model label outside the documented terms.
///
/// Missing or empty labels always take the field default; the policy only
/// applies to non-empty terms the vocabulary does not know.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum EnumPolicy {
    /// Replace with the field default
    #[default]
    Coerce,
    /// Keep the term verbatim
    Passthrough,
    /// Drop the record carrying the term
    Reject,
}

impl EnumPolicy {
    /// Apply the policy to a decoded term.
    ///
    /// Returns `None` only under [`EnumPolicy::Reject`].
    ///
    /// # Examples
    ///
    /// ```
    /// use lorekeeper_core::{EnumPolicy, Sentiment, Vocabulary};
    ///
    /// let odd = Sentiment::from_term("wistful");
    /// assert_eq!(EnumPolicy::Coerce.admit(odd.clone(), Sentiment::Neutral), Some(Sentiment::Neutral));
    /// assert_eq!(EnumPolicy::Passthrough.admit(odd.clone(), Sentiment::Neutral), Some(odd.clone()));
    /// assert_eq!(EnumPolicy::Reject.admit(odd, Sentiment::Neutral), None);
    /// ```
    pub fn admit<T: Vocabulary>(&self, value: T, fallback: T) -> Option<T> {
        if value.is_known() {
            return Some(value);
        }
        match self {
            Self::Coerce => Some(fallback),
            Self::Passthrough => Some(value),
            Self::Reject => None,
        }
    }
}

/// Tuning for one analysis pipeline.
///
/// # Examples
///
/// ```
/// use lorekeeper_core::{AnalysisConfig, EnumPolicy};
///
/// let config = AnalysisConfig::default()
///     .with_concurrency(2)
///     .with_narrator(Some("Zhang".to_string()));
/// assert_eq!(*config.concurrency(), 2);
/// assert_eq!(*config.max_chapter_chars(), 8000);
/// assert_eq!(*config.enum_policy(), EnumPolicy::Coerce);
/// ```
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Getters,
    derive_setters::Setters,
    derive_builder::Builder,
)]
#[setters(prefix = "with_")]
#[builder(default)]
pub struct AnalysisConfig {
    /// Chapter text is cut to this many chars before prompting
    #[serde(default = "default_max_chapter_chars")]
    max_chapter_chars: usize,

    /// Width of the bounded-parallel fan-out
    #[serde(default = "default_concurrency")]
    concurrency: usize,

    /// Sampling bound for full analysis
    #[serde(default = "default_max_chapters")]
    default_max_chapters: usize,

    /// Batch size for continuation
    #[serde(default = "default_additional_chapters")]
    default_additional_chapters: usize,

    /// First-person narrator of the book, if any
    #[serde(default)]
    narrator: Option<String>,

    /// Handling of undocumented model labels
    #[serde(default)]
    enum_policy: EnumPolicy,
}

fn default_max_chapter_chars() -> usize {
    8000
}

fn default_concurrency() -> usize {
    5
}

fn default_max_chapters() -> usize {
    30
}

fn default_additional_chapters() -> usize {
    30
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_chapter_chars: default_max_chapter_chars(),
            concurrency: default_concurrency(),
            default_max_chapters: default_max_chapters(),
            default_additional_chapters: default_additional_chapters(),
            narrator: None,
            enum_policy: EnumPolicy::default(),
        }
    }
}

impl AnalysisConfig {
    /// Creates a new config builder.
    pub fn builder() -> AnalysisConfigBuilder {
        AnalysisConfigBuilder::default()
    }

    /// Checks that every bound is usable.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] naming the first zero bound.
    pub fn validate(&self) -> LorekeeperResult<()> {
        let bounds = [
            ("max_chapter_chars", self.max_chapter_chars),
            ("concurrency", self.concurrency),
            ("default_max_chapters", self.default_max_chapters),
            ("default_additional_chapters", self.default_additional_chapters),
        ];
        for (key, value) in bounds {
            if value == 0 {
                return Err(ConfigError::new(format!("{} must be at least 1", key)).into());
            }
        }
        Ok(())
    }
}
