//! Stored profile command handlers.

use super::Session;
use lorekeeper::{
    AnalysisError, AnalysisErrorKind, Book, JsonError, LorekeeperResult, Profile, ProfileStore,
    search_mentions, validate_character_name,
};
use std::path::Path;
use tracing::{info, warn};

/// Load a stored profile under its validated, trimmed name.
async fn stored(store: &dyn ProfileStore, name: &str) -> LorekeeperResult<Profile> {
    let name = validate_character_name(name)?;
    store.load(name).await?.ok_or_else(|| {
        AnalysisError::new(AnalysisErrorKind::ProfileNotFound(name.to_string())).into()
    })
}

/// Print a stored profile's progress.
pub async fn show_status(
    session: &Session,
    name: &str,
    book: Option<&Path>,
    json: bool,
) -> LorekeeperResult<()> {
    let profile = stored(session.store(), name).await?;
    if json {
        let text = serde_json::to_string_pretty(&profile)
            .map_err(|e| JsonError::new(format!("Failed to encode profile: {}", e)))?;
        println!("{}", text);
        return Ok(());
    }

    println!("{} [{}]", profile.name, profile.analysis_status);
    println!("  Appearances: {}", profile.appearances.len());
    println!("  Analyzed chapters: {:?}", display_indices(&profile));
    println!("  Relations: {}", profile.relations.len());
    if !profile.discovered_characters.is_empty() {
        let names: Vec<&str> = profile
            .discovered_characters
            .iter()
            .map(String::as_str)
            .collect();
        println!("  Discovered: {}", names.join(", "));
    }

    let report = profile.sync_report();
    if !report.is_consistent() {
        warn!(character = %profile.name, ?report, "Profile bookkeeping is out of sync");
        println!("  Out of sync; run `lorekeeper repair {}`", profile.name);
    }

    if let Some(path) = book {
        let book = Book::from_json_file(path)?;
        let mentions = search_mentions(&book, &profile.name);
        let remaining: Vec<usize> = mentions
            .chapter_indices
            .iter()
            .filter(|index| !profile.analyzed_chapters.contains(*index))
            .map(|index| index + 1)
            .collect();
        println!(
            "  Coverage: {}/{} chapter(s) with mentions",
            mentions.found_count() - remaining.len(),
            mentions.found_count()
        );
        if !remaining.is_empty() {
            println!("  Remaining: {:?}", remaining);
        }
    }
    Ok(())
}

/// Repair a stored profile and save it if anything changed.
pub async fn repair_profile(session: &Session, name: &str) -> LorekeeperResult<()> {
    let mut profile = stored(session.store(), name).await?;
    let report = profile.repair();
    if report.is_consistent() {
        println!("{} is consistent", profile.name);
        return Ok(());
    }
    session.store().save(&profile).await?;
    info!(character = %profile.name, ?report, "Repaired profile");
    println!("Repaired {}", profile.name);
    for (label, indices) in [
        ("dropped from analyzed", &report.missing_appearances),
        ("added to analyzed", &report.unrecorded_appearances),
        ("deduplicated", &report.duplicate_appearances),
    ] {
        if !indices.is_empty() {
            let shown: Vec<usize> = indices.iter().map(|index| index + 1).collect();
            println!("  {}: {:?}", label, shown);
        }
    }
    if report.unsorted {
        println!("  appearances re-sorted");
    }
    Ok(())
}

/// Print stored profile names.
pub async fn list_profiles(session: &Session) -> LorekeeperResult<()> {
    let names = session.store().list().await?;
    if names.is_empty() {
        println!("No stored profiles");
    }
    for name in names {
        println!("{}", name);
    }
    Ok(())
}

fn display_indices(profile: &Profile) -> Vec<usize> {
    profile
        .analyzed_chapters
        .iter()
        .map(|index| index + 1)
        .collect()
}
