//! Lorekeeper CLI binary.
//!
//! This binary provides command-line access to Lorekeeper's functionality:
//! - Search a book for a character's mentions
//! - Analyze, continue and refresh character profiles
//! - Inspect and repair stored profiles

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use cli::{
        Cli, Commands, Session, analyze_character, continue_character, list_profiles,
        refresh_character, repair_profile, search_character, show_status,
    };

    // Load .env before reading the API key variable
    dotenvy::dotenv().ok();

    // Parse command-line arguments
    let cli = Cli::parse();

    // Initialize tracing; RUST_LOG wins over --verbose
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let session = Session::open(cli.config.as_deref())?;

    // Execute the requested command
    match cli.command {
        Commands::Search { book, name } => {
            search_character(&session, &book, &name)?;
        }

        Commands::Analyze {
            book,
            name,
            max_chapters,
            stream,
        } => {
            analyze_character(&session, &book, &name, max_chapters, stream).await?;
        }

        Commands::Continue {
            book,
            name,
            chapters,
            refresh_summary,
            stream,
        } => {
            continue_character(&session, &book, &name, chapters, refresh_summary, stream).await?;
        }

        Commands::Refresh { book, name, stream } => {
            refresh_character(&session, &book, &name, stream).await?;
        }

        Commands::Status { name, book, json } => {
            show_status(&session, &name, book.as_deref(), json).await?;
        }

        Commands::Repair { name } => {
            repair_profile(&session, &name).await?;
        }

        Commands::List => {
            list_profiles(&session).await?;
        }
    }

    Ok(())
}
