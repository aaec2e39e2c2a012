//! CLI command definitions.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Lorekeeper - on-demand LLM analysis of characters in long-form fiction
#[derive(Parser, Debug)]
#[command(name = "lorekeeper")]
#[command(about = "On-demand LLM analysis of characters in long-form fiction", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (replaces the layered defaults)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Count literal mentions of a character per chapter
    Search {
        /// Book JSON file
        #[arg(long)]
        book: PathBuf,

        /// Character name
        name: String,
    },

    /// Build a new profile from a sample of the chapters a character appears in
    Analyze {
        /// Book JSON file
        #[arg(long)]
        book: PathBuf,

        /// Character name
        name: String,

        /// Upper bound on sampled chapters
        #[arg(long)]
        max_chapters: Option<usize>,

        /// Print one JSON event per line while analyzing
        #[arg(long)]
        stream: bool,
    },

    /// Extend a stored profile to chapters not yet analyzed
    Continue {
        /// Book JSON file
        #[arg(long)]
        book: PathBuf,

        /// Character name
        name: String,

        /// How many more chapters to analyze
        #[arg(long)]
        chapters: Option<usize>,

        /// Re-run the synthesis stages over all appearances
        #[arg(long)]
        refresh_summary: bool,

        /// Print one JSON event per line while analyzing
        #[arg(long)]
        stream: bool,
    },

    /// Re-run the synthesis stages of a stored profile
    Refresh {
        /// Book JSON file
        #[arg(long)]
        book: PathBuf,

        /// Character name
        name: String,

        /// Print one JSON event per line while analyzing
        #[arg(long)]
        stream: bool,
    },

    /// Show a stored profile's progress
    Status {
        /// Character name
        name: String,

        /// Book JSON file, to report chapters still to analyze
        #[arg(long)]
        book: Option<PathBuf>,

        /// Print the whole profile as JSON
        #[arg(long)]
        json: bool,
    },

    /// Bring a stored profile's chapter bookkeeping back in line
    Repair {
        /// Character name
        name: String,
    },

    /// List stored profiles
    List,
}
