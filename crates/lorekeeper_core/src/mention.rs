//! Literal mention search results.

use serde::{Deserialize, Serialize};

/// Chapters in which a character name occurs literally.
///
/// `chapter_indices`, `chapter_titles` and `mention_counts` are parallel and
/// ordered by chapter position in the source. Derived on every pipeline
/// entry and never persisted.
///
/// # Examples
///
/// ```
/// use lorekeeper_core::MentionResult;
///
/// let result = MentionResult::empty("Mei");
/// assert!(result.is_empty());
/// assert_eq!(result.first(), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MentionResult {
    /// The searched name
    pub name: String,
    /// Chapters with at least one occurrence, ascending
    pub chapter_indices: Vec<usize>,
    /// Titles of those chapters
    pub chapter_titles: Vec<String>,
    /// Occurrences per found chapter
    pub mention_counts: Vec<usize>,
    /// Sum of all occurrences
    pub total_mentions: usize,
}

impl MentionResult {
    /// A result with no hits.
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Whether the name was found nowhere.
    pub fn is_empty(&self) -> bool {
        self.chapter_indices.is_empty()
    }

    /// Number of chapters with at least one occurrence.
    pub fn found_count(&self) -> usize {
        self.chapter_indices.len()
    }

    /// First chapter with an occurrence.
    pub fn first(&self) -> Option<usize> {
        self.chapter_indices.first().copied()
    }

    /// Last chapter with an occurrence.
    pub fn last(&self) -> Option<usize> {
        self.chapter_indices.last().copied()
    }

    /// Title of a found chapter.
    pub fn title_of(&self, chapter_index: usize) -> Option<&str> {
        self.chapter_indices
            .binary_search(&chapter_index)
            .ok()
            .and_then(|pos| self.chapter_titles.get(pos))
            .map(String::as_str)
    }
}
