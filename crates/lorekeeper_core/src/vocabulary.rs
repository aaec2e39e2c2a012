//! Open enumerations for model-generated labels.

use std::fmt::Display;

/// A fixed set of documented terms that the model is asked to choose from.
///
/// Implementors keep any undocumented term in an `Other` variant, so the
/// value survives decoding and the configured policy decides its fate.
///
/// # Examples
///
/// ```
/// use lorekeeper_core::{Sentiment, Vocabulary};
///
/// assert_eq!(Sentiment::from_term(" Positive "), Sentiment::Positive);
/// assert!(!Sentiment::from_term("ecstatic").is_known());
/// assert!(Sentiment::TERMS.contains(&"neutral"));
/// ```
pub trait Vocabulary: Clone + Default + Display {
    /// Documented terms, spelled as they appear in prompts.
    const TERMS: &'static [&'static str];

    /// Parse a raw model term. Never fails; unknown terms land in `Other`.
    fn from_term(raw: &str) -> Self;

    /// Whether this value is one of [`Vocabulary::TERMS`].
    fn is_known(&self) -> bool;

    /// Documented terms joined with `/`, for prompt instructions.
    fn choices() -> String {
        Self::TERMS.join("/")
    }
}

/// Implements [`Vocabulary`], `Default` and the string conversions serde
/// uses for an enum that derives `strum::EnumString` with an `Other` default.
macro_rules! vocabulary {
    ($ty:ident, default = $default:ident, terms = [$($term:literal),+ $(,)?]) => {
        impl $crate::Vocabulary for $ty {
            const TERMS: &'static [&'static str] = &[$($term),+];

            fn from_term(raw: &str) -> Self {
                let raw = raw.trim();
                raw.parse()
                    .unwrap_or_else(|_| Self::Other(raw.to_string()))
            }

            fn is_known(&self) -> bool {
                !matches!(self, Self::Other(_))
            }
        }

        impl Default for $ty {
            fn default() -> Self {
                Self::$default
            }
        }

        impl From<String> for $ty {
            fn from(raw: String) -> Self {
                <Self as $crate::Vocabulary>::from_term(&raw)
            }
        }

        impl From<$ty> for String {
            fn from(value: $ty) -> Self {
                value.to_string()
            }
        }
    };
}

pub(crate) use vocabulary;
