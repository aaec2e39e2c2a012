//! Structured-generation (LLM transport) error types.

/// Specific error conditions for model round trips.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum GenerationErrorKind {
    /// HTTP request failed before a response arrived
    #[display("HTTP request failed: {}", _0)]
    Http(String),
    /// API returned an error status
    #[display("API error {}: {}", status, message)]
    Api {
        /// HTTP status code
        status: u16,
        /// Response body
        message: String,
    },
    /// Rate limit exceeded
    #[display("Rate limit exceeded")]
    RateLimit,
    /// Response envelope could not be parsed
    #[display("Failed to parse response: {}", _0)]
    ResponseParsing(String),
    /// Required credential is missing
    #[display("Missing credential: {}", _0)]
    MissingCredential(String),
}

impl GenerationErrorKind {
    /// Whether a retry has a chance of succeeding.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(_) | Self::RateLimit => true,
            Self::Api { status, .. } => *status == 429 || *status >= 500,
            Self::ResponseParsing(_) | Self::MissingCredential(_) => false,
        }
    }
}

/// Generation error with location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Generation Error: {} at line {} in {}", kind, line, file)]
pub struct GenerationError {
    /// The specific error condition
    pub kind: GenerationErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl GenerationError {
    /// Create a new GenerationError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: GenerationErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Whether a retry has a chance of succeeding.
    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}
