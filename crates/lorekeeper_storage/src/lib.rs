//! Profile persistence for Lorekeeper.
//!
//! Two [`ProfileStore`](lorekeeper_interface::ProfileStore) backends:
//!
//! - [`FileSystemProfileStore`] writes one pretty-printed JSON document per
//!   character under `{data_dir}/characters/{name}/profile.json`
//! - [`InMemoryProfileStore`] keeps profiles in a map, for tests and embedding
//!
//! # Example
//!
//! ```rust
//! use lorekeeper_core::Profile;
//! use lorekeeper_interface::ProfileStore;
//! use lorekeeper_storage::InMemoryProfileStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = InMemoryProfileStore::new();
//! store.save(&Profile::new("Mei")).await?;
//! assert!(store.load("Mei").await?.is_some());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod filesystem;
mod memory;

pub use filesystem::FileSystemProfileStore;
pub use memory::InMemoryProfileStore;
