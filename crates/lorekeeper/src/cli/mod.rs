//! Command-line interface module.
//!
//! This module provides the CLI structure and command handlers for the lorekeeper binary.

mod commands;
mod profile;
mod run;

pub use commands::{Cli, Commands};
pub use profile::{list_profiles, repair_profile, show_status};
pub use run::{
    Session, analyze_character, continue_character, refresh_character, search_character,
};
