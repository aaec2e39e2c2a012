//! Per-chapter extraction failures.
//!
//! These never abort a pipeline run: the orchestrator reports them as
//! `chapter_error` events and leaves the chapter out of the profile.

/// Why a single chapter could not be extracted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum ExtractionErrorKind {
    /// The structured-generation collaborator failed
    #[display("Generation failed: {}", _0)]
    Generation(String),
    /// The chapter could not be resolved from the source
    #[display("Chapter text unavailable")]
    ChapterUnavailable,
}

/// Extraction error for one chapter, with location tracking.
///
/// # Examples
///
/// ```
/// use lorekeeper_error::{ExtractionError, ExtractionErrorKind};
///
/// let err = ExtractionError::new(7, ExtractionErrorKind::ChapterUnavailable);
/// assert_eq!(err.chapter_index, 7);
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Extraction Error (chapter {}): {} at line {} in {}", chapter_index, kind, line, file)]
pub struct ExtractionError {
    /// Chapter whose extraction failed
    pub chapter_index: usize,
    /// The specific error condition
    pub kind: ExtractionErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl ExtractionError {
    /// Create a new ExtractionError with automatic location tracking.
    #[track_caller]
    pub fn new(chapter_index: usize, kind: ExtractionErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            chapter_index,
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_transport(kind: &ExtractionErrorKind) -> bool {
        match kind {
            ExtractionErrorKind::Generation(_) => true,
            ExtractionErrorKind::ChapterUnavailable => false,
        }
    }

    #[test]
    fn kinds_cover_transport_and_missing_text() {
        let err = ExtractionError::new(3, ExtractionErrorKind::Generation("timeout".into()));
        assert!(is_transport(&err.kind));
        assert!(err.to_string().contains("chapter 3"));
        assert!(!is_transport(&ExtractionErrorKind::ChapterUnavailable));
    }
}
