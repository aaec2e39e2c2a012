//! Test utilities for pipeline tests.

pub mod mock_generator;

#[allow(unused_imports)]
pub use mock_generator::{MockGenerator, PromptKind, mei_book};
