//! Error types for the Lorekeeper workspace.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - Constructors use `#[track_caller]` for automatic location capture
//!
//! # Examples
//!
//! ```
//! use lorekeeper_error::{LorekeeperResult, ValidationError, ValidationErrorKind};
//!
//! fn check(name: &str) -> LorekeeperResult<()> {
//!     if name.is_empty() {
//!         Err(ValidationError::new(ValidationErrorKind::EmptyName))?
//!     }
//!     Ok(())
//! }
//!
//! assert!(check("").is_err());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod analysis;
mod config;
mod error;
mod extraction;
mod generation;
mod json;
mod storage;
mod validation;

pub use analysis::{AnalysisError, AnalysisErrorKind};
pub use config::ConfigError;
pub use error::{LorekeeperError, LorekeeperErrorKind, LorekeeperResult};
pub use extraction::{ExtractionError, ExtractionErrorKind};
pub use generation::{GenerationError, GenerationErrorKind};
pub use json::JsonError;
pub use storage::{StorageError, StorageErrorKind};
pub use validation::{ValidationError, ValidationErrorKind};
