//! Chapter boundaries.

use serde::{Deserialize, Serialize};

/// One chapter: its position, title and byte span in the book content.
///
/// The span is half-open, `start..end`.
///
/// # Examples
///
/// ```
/// use lorekeeper_interface::Chapter;
///
/// let chapter = Chapter { index: 0, title: "Opening".to_string(), start: 0, end: 12 };
/// assert_eq!(chapter.span(), 0..12);
/// assert_eq!(chapter.display_number(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Chapter {
    /// Zero-based position in the book
    pub index: usize,
    /// Chapter title
    pub title: String,
    /// Byte offset where the chapter starts
    pub start: usize,
    /// Byte offset one past the chapter end
    pub end: usize,
}

impl Chapter {
    /// Byte range of the chapter text.
    pub fn span(&self) -> std::ops::Range<usize> {
        self.start..self.end
    }

    /// One-based number shown to readers and the model.
    pub fn display_number(&self) -> usize {
        self.index + 1
    }
}
