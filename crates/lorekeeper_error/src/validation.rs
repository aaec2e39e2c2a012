//! Caller-misuse errors, raised before any model call is made.

/// Specific ways a caller can misuse the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum ValidationErrorKind {
    /// Character name is empty or whitespace only
    #[display("Character name is required")]
    EmptyName,
    /// Character name exceeds the maximum length
    #[display("Character name too long ({} chars, max {})", length, max)]
    NameTooLong {
        /// Length of the rejected name in chars
        length: usize,
        /// Maximum accepted length
        max: usize,
    },
    /// Character name contains a path separator, `..` or NUL
    #[display("Invalid characters in character name: {}", _0)]
    InvalidNameCharacters(String),
    /// Chapter index outside the book
    #[display("Chapter {} out of range (book has {} chapters)", index, chapter_count)]
    ChapterOutOfRange {
        /// Requested chapter index
        index: usize,
        /// Number of chapters in the source
        chapter_count: usize,
    },
    /// A chapter budget of zero was requested
    #[display("{} must be at least 1", _0)]
    ZeroBudget(&'static str),
    /// Chapter span does not fit the book content
    #[display("Invalid chapter span: {}", _0)]
    InvalidSpan(String),
}

/// Validation error with location tracking.
///
/// # Examples
///
/// ```
/// use lorekeeper_error::{ValidationError, ValidationErrorKind};
///
/// let err = ValidationError::new(ValidationErrorKind::EmptyName);
/// assert!(format!("{}", err).contains("required"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Validation Error: {} at line {} in {}", kind, line, file)]
pub struct ValidationError {
    /// The specific error condition
    pub kind: ValidationErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl ValidationError {
    /// Create a new ValidationError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: ValidationErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
