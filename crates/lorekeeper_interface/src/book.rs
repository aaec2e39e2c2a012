//! In-memory book with pre-segmented chapters.

use crate::{Chapter, ChapterSource};
use derive_getters::Getters;
use lorekeeper_error::{
    JsonError, LorekeeperResult, StorageError, StorageErrorKind, ValidationError,
    ValidationErrorKind,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A book whose chapters are spans over one content string.
///
/// # Examples
///
/// ```
/// use lorekeeper_interface::{Book, ChapterSource};
///
/// let book = Book::from_chapters("b1", "River", [("One", "Mei waits."), ("Two", "Lin runs.")]);
/// assert_eq!(book.chapter_count(), 2);
/// let second = &book.chapters()[1];
/// assert_eq!(book.text(second), Some("Lin runs."));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct Book {
    /// Book identifier
    id: String,
    /// Book title
    title: String,
    /// Full text
    content: String,
    /// Chapter spans over `content`
    chapters: Vec<Chapter>,
}

const CHAPTER_SEPARATOR: &str = "\n\n";

impl Book {
    /// Create a book from content and chapter spans.
    ///
    /// # Errors
    ///
    /// Returns a validation error if a span is out of bounds, not on a char
    /// boundary, or chapter indices do not match their positions.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
        chapters: Vec<Chapter>,
    ) -> LorekeeperResult<Self> {
        let book = Self {
            id: id.into(),
            title: title.into(),
            content: content.into(),
            chapters,
        };
        book.validate()?;
        Ok(book)
    }

    /// Build a book by concatenating chapter texts.
    pub fn from_chapters<T, S>(
        id: impl Into<String>,
        title: impl Into<String>,
        chapters: impl IntoIterator<Item = (T, S)>,
    ) -> Self
    where
        T: Into<String>,
        S: AsRef<str>,
    {
        let mut content = String::new();
        let mut spans = Vec::new();
        for (index, (chapter_title, text)) in chapters.into_iter().enumerate() {
            if index > 0 {
                content.push_str(CHAPTER_SEPARATOR);
            }
            let start = content.len();
            content.push_str(text.as_ref());
            spans.push(Chapter {
                index,
                title: chapter_title.into(),
                start,
                end: content.len(),
            });
        }
        Self {
            id: id.into(),
            title: title.into(),
            content,
            chapters: spans,
        }
    }

    /// Load a pre-segmented book from a JSON file.
    #[tracing::instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_json_file(path: impl AsRef<Path>) -> LorekeeperResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            StorageError::new(StorageErrorKind::FileRead(format!(
                "{}: {}",
                path.display(),
                e
            )))
        })?;
        let book: Self = serde_json::from_str(&raw)
            .map_err(|e| JsonError::new(format!("{}: {}", path.display(), e)))?;
        book.validate()?;
        tracing::debug!(
            book = %book.id,
            chapters = book.chapters.len(),
            "Loaded book"
        );
        Ok(book)
    }

    /// Check every chapter span against the content.
    pub fn validate(&self) -> LorekeeperResult<()> {
        for (position, chapter) in self.chapters.iter().enumerate() {
            let problem = if chapter.index != position {
                Some(format!(
                    "chapter at position {} has index {}",
                    position, chapter.index
                ))
            } else if chapter.start > chapter.end || chapter.end > self.content.len() {
                Some(format!(
                    "chapter {} span {}..{} exceeds content length {}",
                    chapter.index,
                    chapter.start,
                    chapter.end,
                    self.content.len()
                ))
            } else if !self.content.is_char_boundary(chapter.start)
                || !self.content.is_char_boundary(chapter.end)
            {
                Some(format!(
                    "chapter {} span {}..{} splits a character",
                    chapter.index, chapter.start, chapter.end
                ))
            } else {
                None
            };
            if let Some(problem) = problem {
                return Err(ValidationError::new(ValidationErrorKind::InvalidSpan(problem)).into());
            }
        }
        Ok(())
    }
}

impl ChapterSource for Book {
    fn chapters(&self) -> &[Chapter] {
        &self.chapters
    }

    fn text(&self, chapter: &Chapter) -> Option<&str> {
        self.content.get(chapter.span())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spans_cover_chapter_text_only() {
        let book = Book::from_chapters("b", "t", [("A", "梅在这里"), ("B", "second")]);
        let texts: Vec<_> = book
            .chapters()
            .iter()
            .map(|c| book.text(c).unwrap_or_default())
            .collect();
        assert_eq!(texts, vec!["梅在这里", "second"]);
        assert!(book.validate().is_ok());
    }

    #[test]
    fn rejects_span_inside_a_character() {
        let chapters = vec![Chapter {
            index: 0,
            title: "A".to_string(),
            start: 1,
            end: 3,
        }];
        assert!(Book::new("b", "t", "梅", chapters).is_err());
    }

    #[test]
    fn rejects_span_past_content() {
        let chapters = vec![Chapter {
            index: 0,
            title: "A".to_string(),
            start: 0,
            end: 10,
        }];
        assert!(Book::new("b", "t", "short", chapters).is_err());
    }

    #[test]
    fn rejects_misnumbered_chapters() {
        let chapters = vec![Chapter {
            index: 3,
            title: "A".to_string(),
            start: 0,
            end: 2,
        }];
        assert!(Book::new("b", "t", "ab", chapters).is_err());
    }
}
