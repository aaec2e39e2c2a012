//! Collaborator traits consumed by the Lorekeeper analysis pipeline.
//!
//! The pipeline talks to three collaborators: a [`StructuredGenerator`]
//! that performs one model round trip, a [`ChapterSource`] that resolves
//! chapter text, and a [`ProfileStore`] that persists profiles. [`Book`]
//! is the bundled in-memory chapter source.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod book;
mod chapter;
mod traits;

pub use book::Book;
pub use chapter::Chapter;
pub use traits::{ChapterSource, Mapping, ProfileStore, StructuredGenerator};
