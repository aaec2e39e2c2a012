//! Top-level error wrapper types.

use crate::{
    AnalysisError, ConfigError, ExtractionError, GenerationError, JsonError, StorageError,
    ValidationError,
};

/// Every error the workspace can produce.
///
/// # Examples
///
/// ```
/// use lorekeeper_error::{LorekeeperError, JsonError};
///
/// let err: LorekeeperError = JsonError::new("unexpected token").into();
/// assert!(format!("{}", err).contains("JSON Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum LorekeeperErrorKind {
    /// Caller misuse
    #[from(ValidationError)]
    Validation(ValidationError),
    /// Single-chapter extraction failure
    #[from(ExtractionError)]
    Extraction(ExtractionError),
    /// Model transport failure
    #[from(GenerationError)]
    Generation(GenerationError),
    /// Profile persistence failure
    #[from(StorageError)]
    Storage(StorageError),
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
    /// JSON serialization/deserialization error
    #[from(JsonError)]
    Json(JsonError),
    /// Pipeline-level failure
    #[from(AnalysisError)]
    Analysis(AnalysisError),
}

/// Lorekeeper error with kind discrimination.
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Lorekeeper Error: {}", _0)]
pub struct LorekeeperError(Box<LorekeeperErrorKind>);

impl LorekeeperError {
    /// Create a new error from a kind.
    pub fn new(kind: LorekeeperErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &LorekeeperErrorKind {
        &self.0
    }
}

impl<T> From<T> for LorekeeperError
where
    T: Into<LorekeeperErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for Lorekeeper operations.
pub type LorekeeperResult<T> = std::result::Result<T, LorekeeperError>;
