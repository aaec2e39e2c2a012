//! Analysis command handlers.

use futures::StreamExt;
use lorekeeper::{
    AnalysisError, AnalysisErrorKind, AnalysisEvent, AnalysisStream, Book, CachedProfileStore,
    CharacterAnalyzer, ChatCompletionsClient, FileSystemProfileStore, JsonError,
    LorekeeperConfig, LorekeeperResult, Profile, ProfileStore,
};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, instrument};

/// Loaded configuration plus the profile store it describes.
pub struct Session {
    config: LorekeeperConfig,
    store: Arc<dyn ProfileStore>,
}

impl Session {
    /// Load configuration and open the profile store.
    ///
    /// An explicit `config_path` replaces the layered lookup.
    #[instrument(skip(config_path))]
    pub fn open(config_path: Option<&Path>) -> LorekeeperResult<Self> {
        let config = match config_path {
            Some(path) => LorekeeperConfig::from_file(path)?,
            None => LorekeeperConfig::load()?,
        };
        let disk = FileSystemProfileStore::new(config.storage().data_dir())?;
        let store: Arc<dyn ProfileStore> =
            Arc::new(CachedProfileStore::new(disk, config.cache().clone()));
        Ok(Self { config, store })
    }

    /// The profile store.
    pub fn store(&self) -> &dyn ProfileStore {
        self.store.as_ref()
    }

    fn analyzer(&self, book: &Path) -> LorekeeperResult<CharacterAnalyzer<ChatCompletionsClient>> {
        let book = Arc::new(Book::from_json_file(book)?);
        info!(title = %book.title(), chapters = book.chapters().len(), "Loaded book");
        let client = ChatCompletionsClient::new(self.config.model().client_settings()?)?;
        CharacterAnalyzer::new(
            client,
            book,
            Arc::clone(&self.store),
            self.config.analysis().clone(),
        )
    }
}

/// Print the chapters that mention `name`.
pub fn search_character(session: &Session, book: &Path, name: &str) -> LorekeeperResult<()> {
    let analyzer = session.analyzer(book)?;
    let mentions = analyzer.search(name)?;
    if mentions.is_empty() {
        println!("'{}' is not mentioned in any chapter", mentions.name);
        return Ok(());
    }
    println!(
        "'{}': {} mention(s) in {} chapter(s)",
        mentions.name,
        mentions.total_mentions,
        mentions.found_count()
    );
    for ((index, title), count) in mentions
        .chapter_indices
        .iter()
        .zip(&mentions.chapter_titles)
        .zip(&mentions.mention_counts)
    {
        println!("  Chapter {:>4}  {:>3}x  {}", index + 1, count, title);
    }
    Ok(())
}

/// Run a full analysis.
pub async fn analyze_character(
    session: &Session,
    book: &Path,
    name: &str,
    max_chapters: Option<usize>,
    stream: bool,
) -> LorekeeperResult<()> {
    let analyzer = session.analyzer(book)?;
    if stream {
        return emit(analyzer.analyze_stream(name, max_chapters)?).await;
    }
    let profile = analyzer.analyze_full(name, max_chapters).await?;
    print_summary(&profile);
    Ok(())
}

/// Extend a stored profile.
pub async fn continue_character(
    session: &Session,
    book: &Path,
    name: &str,
    chapters: Option<usize>,
    refresh_summary: bool,
    stream: bool,
) -> LorekeeperResult<()> {
    let analyzer = session.analyzer(book)?;
    let existing = analyzer.load_profile(name).await?;
    if stream {
        return emit(analyzer.continue_stream(existing, chapters, refresh_summary)?).await;
    }
    let profile = analyzer
        .continue_analysis(existing, chapters, refresh_summary)
        .await?;
    print_summary(&profile);
    Ok(())
}

/// Re-run synthesis for a stored profile.
pub async fn refresh_character(
    session: &Session,
    book: &Path,
    name: &str,
    stream: bool,
) -> LorekeeperResult<()> {
    let analyzer = session.analyzer(book)?;
    let existing = analyzer.load_profile(name).await?;
    if stream {
        return emit(analyzer.refresh_stream(existing)?).await;
    }
    let profile = analyzer.refresh(existing).await?;
    print_summary(&profile);
    Ok(())
}

/// Write each event as one JSON line and fail if the run ended in error.
async fn emit(mut events: AnalysisStream<'_>) -> LorekeeperResult<()> {
    while let Some(event) = events.next().await {
        let line = serde_json::to_string(&event)
            .map_err(|e| JsonError::new(format!("Failed to encode event: {}", e)))?;
        println!("{}", line);
        if let AnalysisEvent::Error { stage, message } = event {
            return Err(AnalysisError::new(AnalysisErrorKind::StageFailed { stage, message }).into());
        }
    }
    Ok(())
}

fn print_summary(profile: &Profile) {
    println!("{} [{}]", profile.name, profile.analysis_status);
    if let Some(message) = &profile.error_message {
        println!("  {}", message);
        return;
    }
    println!("  Role: {}", profile.role);
    if !profile.summary.is_empty() {
        println!("  {}", profile.summary);
    }
    println!(
        "  Analyzed {} of {} chapter(s) with mentions",
        profile.analyzed_chapters.len(),
        profile.total_chapters_found
    );
    for relation in &profile.relations {
        println!(
            "  - {} ({}, {})",
            relation.target_name, relation.relation_type, relation.confidence
        );
    }
}
