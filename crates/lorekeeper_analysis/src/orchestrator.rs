//! The character analysis pipeline.

use crate::{
    AnalysisEvent, AppearanceExtractor, ChapterJob, DeepProfileSynthesizer,
    PersonalitySynthesizer, RelationSynthesizer, Scheduler, merge_outcomes, sample_chapters,
    search_mentions,
};
use async_stream::stream;
use futures::{Stream, StreamExt, pin_mut};
use lorekeeper_core::{
    AnalysisConfig, AnalysisStatus, MentionResult, Profile, discovered_characters,
    validate_budget, validate_chapter_index, validate_character_name,
};
use lorekeeper_error::{AnalysisError, AnalysisErrorKind, LorekeeperResult};
use lorekeeper_interface::{ChapterSource, ProfileStore, StructuredGenerator};
use std::collections::BTreeSet;
use std::pin::Pin;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// Progress events of one run, ending in `completed` or `error`.
pub type AnalysisStream<'a> = Pin<Box<dyn Stream<Item = AnalysisEvent> + Send + 'a>>;

/// What a run does after searching.
#[derive(Debug)]
enum RunMode {
    Full {
        max_chapters: usize,
    },
    Continue {
        existing: Box<Profile>,
        additional_chapters: usize,
        refresh_summary: bool,
    },
    Refresh {
        existing: Box<Profile>,
    },
}

/// Chapters to extract and whether synthesis runs afterwards.
#[derive(Debug)]
struct Plan {
    profile: Profile,
    chapters: Vec<usize>,
    synthesize: bool,
}

/// Drives search, extraction and synthesis for one book.
///
/// Every entry point comes in two shapes: an awaited call that returns the
/// final [`Profile`] and extracts chapters concurrently, and a `*_stream`
/// call that extracts chapters one at a time and yields an
/// [`AnalysisEvent`] per step. Both run the same pipeline.
///
/// Runs against the same character must not overlap; callers serialize
/// them.
pub struct CharacterAnalyzer<G> {
    generator: G,
    source: Arc<dyn ChapterSource>,
    store: Arc<dyn ProfileStore>,
    config: AnalysisConfig,
}

impl<G> std::fmt::Debug for CharacterAnalyzer<G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CharacterAnalyzer")
            .field("chapters", &self.source.chapter_count())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<G: StructuredGenerator> CharacterAnalyzer<G> {
    /// Create an analyzer.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when a bound in `config` is zero.
    pub fn new(
        generator: G,
        source: Arc<dyn ChapterSource>,
        store: Arc<dyn ProfileStore>,
        config: AnalysisConfig,
    ) -> LorekeeperResult<Self> {
        config.validate()?;
        Ok(Self {
            generator,
            source,
            store,
            config,
        })
    }

    /// Analysis settings.
    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Literal mention search over the whole book.
    pub fn search(&self, name: &str) -> LorekeeperResult<MentionResult> {
        let name = validate_character_name(name)?;
        Ok(search_mentions(self.source.as_ref(), name))
    }

    /// Stored profile of a character.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisErrorKind::ProfileNotFound`] when nothing is stored.
    pub async fn load_profile(&self, name: &str) -> LorekeeperResult<Profile> {
        let name = validate_character_name(name)?;
        self.store.load(name).await?.ok_or_else(|| {
            AnalysisError::new(AnalysisErrorKind::ProfileNotFound(name.to_string())).into()
        })
    }

    /// Full analysis with bounded-parallel extraction.
    ///
    /// `max_chapters` defaults to the configured sampling bound. A character
    /// that is never mentioned yields a completed profile with an
    /// `error_message` and no model calls.
    #[instrument(skip(self), fields(character = name))]
    pub async fn analyze_full(
        &self,
        name: &str,
        max_chapters: Option<usize>,
    ) -> LorekeeperResult<Profile> {
        let request = self.full_request(name, max_chapters)?;
        drive(self.run(request, self.bounded())).await
    }

    /// Full analysis as a stream of progress events.
    pub fn analyze_stream(
        &self,
        name: &str,
        max_chapters: Option<usize>,
    ) -> LorekeeperResult<AnalysisStream<'_>> {
        let request = self.full_request(name, max_chapters)?;
        Ok(self.run(request, Scheduler::Sequential))
    }

    /// Extend an existing profile to chapters not yet analyzed.
    ///
    /// Takes up to `additional_chapters` (default from config) of the
    /// remaining chapters in chapter order. Synthesis stages re-run over all
    /// appearances only when `refresh_summary` is set. Recorded chapters
    /// that no longer mention the character are dropped first.
    ///
    /// # Errors
    ///
    /// Returns a validation error, before any model call, when a recorded
    /// chapter index is outside the source.
    #[instrument(skip(self, existing), fields(character = %existing.name))]
    pub async fn continue_analysis(
        &self,
        existing: Profile,
        additional_chapters: Option<usize>,
        refresh_summary: bool,
    ) -> LorekeeperResult<Profile> {
        let request = self.continue_request(existing, additional_chapters, refresh_summary)?;
        drive(self.run(request, self.bounded())).await
    }

    /// Continuation as a stream of progress events.
    pub fn continue_stream(
        &self,
        existing: Profile,
        additional_chapters: Option<usize>,
        refresh_summary: bool,
    ) -> LorekeeperResult<AnalysisStream<'_>> {
        let request = self.continue_request(existing, additional_chapters, refresh_summary)?;
        Ok(self.run(request, Scheduler::Sequential))
    }

    /// Re-run the synthesis stages over the existing appearances.
    #[instrument(skip(self, existing), fields(character = %existing.name))]
    pub async fn refresh(&self, existing: Profile) -> LorekeeperResult<Profile> {
        let request = self.refresh_request(existing)?;
        drive(self.run(request, self.bounded())).await
    }

    /// Summary refresh as a stream of progress events.
    pub fn refresh_stream(&self, existing: Profile) -> LorekeeperResult<AnalysisStream<'_>> {
        let request = self.refresh_request(existing)?;
        Ok(self.run(request, Scheduler::Sequential))
    }

    fn bounded(&self) -> Scheduler {
        Scheduler::bounded(*self.config.concurrency())
    }

    fn full_request(
        &self,
        name: &str,
        max_chapters: Option<usize>,
    ) -> LorekeeperResult<(String, RunMode)> {
        let name = validate_character_name(name)?.to_string();
        let max_chapters = validate_budget(
            "max_chapters",
            max_chapters.unwrap_or(*self.config.default_max_chapters()),
        )?;
        Ok((name, RunMode::Full { max_chapters }))
    }

    fn continue_request(
        &self,
        existing: Profile,
        additional_chapters: Option<usize>,
        refresh_summary: bool,
    ) -> LorekeeperResult<(String, RunMode)> {
        let name = validate_character_name(&existing.name)?.to_string();
        self.validate_recorded(&existing)?;
        let additional_chapters = validate_budget(
            "additional_chapters",
            additional_chapters.unwrap_or(*self.config.default_additional_chapters()),
        )?;
        Ok((
            name,
            RunMode::Continue {
                existing: Box::new(existing),
                additional_chapters,
                refresh_summary,
            },
        ))
    }

    fn refresh_request(&self, existing: Profile) -> LorekeeperResult<(String, RunMode)> {
        let name = validate_character_name(&existing.name)?.to_string();
        self.validate_recorded(&existing)?;
        Ok((
            name,
            RunMode::Refresh {
                existing: Box::new(existing),
            },
        ))
    }

    /// Every recorded chapter index must exist in the source.
    fn validate_recorded(&self, existing: &Profile) -> LorekeeperResult<()> {
        let chapter_count = self.source.chapter_count();
        existing
            .analyzed_chapters
            .iter()
            .copied()
            .chain(existing.appearances.iter().map(|a| a.chapter_index))
            .try_for_each(|index| validate_chapter_index(index, chapter_count))
    }

    fn job(&self, chapter_index: usize) -> ChapterJob<'_> {
        let chapter = self
            .source
            .chapters()
            .iter()
            .find(|chapter| chapter.index == chapter_index);
        ChapterJob {
            index: chapter_index,
            title: chapter.map(|chapter| chapter.title.as_str()).unwrap_or_default(),
            text: chapter.and_then(|chapter| self.source.text(chapter)),
        }
    }

    /// The single pipeline body behind every entry point.
    fn run(&self, (name, mode): (String, RunMode), scheduler: Scheduler) -> AnalysisStream<'_> {
        Box::pin(stream! {
            let mentions = search_mentions(self.source.as_ref(), &name);
            info!(
                character = %name,
                found = mentions.found_count(),
                total_mentions = mentions.total_mentions,
                "Search complete"
            );
            yield AnalysisEvent::SearchComplete(mentions.clone());

            let plan = match mode {
                RunMode::Full { max_chapters } => {
                    let mut profile = Profile::new(name.as_str());
                    profile.analysis_status = AnalysisStatus::Searching;
                    profile.record_search(&mentions);
                    if mentions.is_empty() {
                        info!(character = %name, "Character not found");
                        profile.mark_completed(Some(format!(
                            "Character '{name}' was not found in any chapter"
                        )));
                        yield AnalysisEvent::Completed(Box::new(profile));
                        return;
                    }
                    Plan {
                        profile,
                        chapters: sample_chapters(&mentions.chapter_indices, max_chapters),
                        synthesize: true,
                    }
                }
                RunMode::Continue { existing, additional_chapters, refresh_summary } => {
                    let mut profile = *existing;
                    let repaired = !profile.repair().is_consistent();
                    let dropped = drop_unfound(&mut profile, &mentions);
                    let changed = repaired || !dropped.is_empty();
                    let remaining: Vec<usize> = mentions
                        .chapter_indices
                        .iter()
                        .copied()
                        .filter(|index| !profile.analyzed_chapters.contains(index))
                        .collect();
                    let will_analyze: Vec<usize> =
                        remaining.iter().copied().take(additional_chapters).collect();
                    yield AnalysisEvent::ContinueInfo {
                        already_analyzed: profile.analyzed_chapters.len(),
                        remaining: remaining.len(),
                        will_analyze: will_analyze.clone(),
                        refresh_summary,
                        dropped,
                    };

                    if will_analyze.is_empty() {
                        let message = if mentions.is_empty() {
                            format!("Character '{name}' was not found in any chapter")
                        } else {
                            format!("All {} chapters mentioning '{name}' are already analyzed", mentions.found_count())
                        };
                        info!(character = %name, "{message}");
                        yield AnalysisEvent::Info { message };
                        if changed {
                            if let Err(e) = self.store.save(&profile).await {
                                error!(character = %name, error = %e, "Failed to save repaired profile");
                                yield AnalysisEvent::Error { stage: "save".to_string(), message: e.to_string() };
                                return;
                            }
                        }
                        yield AnalysisEvent::Completed(Box::new(profile));
                        return;
                    }

                    profile.analysis_status = AnalysisStatus::Searching;
                    profile.record_search(&mentions);
                    Plan { profile, chapters: will_analyze, synthesize: refresh_summary }
                }
                RunMode::Refresh { existing } => {
                    let mut profile = *existing;
                    profile.repair();
                    drop_unfound(&mut profile, &mentions);
                    profile.analysis_status = AnalysisStatus::Searching;
                    profile.record_search(&mentions);
                    Plan { profile, chapters: Vec::new(), synthesize: true }
                }
            };

            let Plan { mut profile, chapters, synthesize } = plan;
            profile.analysis_status = AnalysisStatus::Analyzing;

            if !chapters.is_empty() {
                info!(character = %name, chapters = chapters.len(), ?scheduler, "Extracting appearances");
                let to_analyze = chapters.len();
                let mut outcomes = Vec::with_capacity(to_analyze);
                let extracted = scheduler.map(chapters.iter().copied(), |index| {
                    let job = self.job(index);
                    let name = name.as_str();
                    async move {
                        AppearanceExtractor::new(&self.generator, &self.config)
                            .extract_job(name, job)
                            .await
                    }
                });
                pin_mut!(extracted);
                while let Some(outcome) = extracted.next().await {
                    match &outcome {
                        Ok(appearance) => {
                            debug!(chapter_index = appearance.chapter_index, "Chapter analyzed");
                            yield AnalysisEvent::ChapterAnalyzed {
                                chapter_index: appearance.chapter_index,
                                chapter_title: appearance.chapter_title.clone(),
                                appearance: appearance.clone(),
                                chapters_to_analyze: to_analyze,
                            };
                        }
                        Err(e) => {
                            warn!(chapter_index = e.chapter_index, error = %e.kind, "Chapter extraction failed");
                            yield AnalysisEvent::ChapterError {
                                chapter_index: e.chapter_index,
                                error: e.kind.to_string(),
                            };
                        }
                    }
                    outcomes.push(outcome);
                }

                let merged = merge_outcomes(std::mem::take(&mut profile.appearances), outcomes);
                info!(
                    character = %name,
                    added = merged.added.len(),
                    failed = merged.failures.len(),
                    analyzed = merged.analyzed.len(),
                    "Appearances merged"
                );
                profile.appearances = merged.appearances;
                profile.analyzed_chapters = merged.analyzed;
            }

            if synthesize {
                let relations = match RelationSynthesizer::new(&self.generator, &self.config)
                    .synthesize(&name, &profile.appearances)
                    .await
                {
                    Ok(relations) => relations,
                    Err(e) => {
                        error!(character = %name, error = %e, "Relation synthesis failed");
                        profile.mark_error(e.to_string());
                        yield AnalysisEvent::Error { stage: "relations".to_string(), message: e.to_string() };
                        return;
                    }
                };
                profile.relations = relations;
                yield AnalysisEvent::RelationsAnalyzed { relations: profile.relations.clone() };

                let sketch = match PersonalitySynthesizer::new(&self.generator, &self.config)
                    .synthesize(&name, &profile.appearances)
                    .await
                {
                    Ok(sketch) => sketch,
                    Err(e) => {
                        error!(character = %name, error = %e, "Personality synthesis failed");
                        profile.mark_error(e.to_string());
                        yield AnalysisEvent::Error { stage: "personality".to_string(), message: e.to_string() };
                        return;
                    }
                };
                sketch.apply_to(&mut profile);
                yield AnalysisEvent::personality(&sketch);

                let deep = match DeepProfileSynthesizer::new(&self.generator, &self.config)
                    .synthesize(
                        &name,
                        &profile.appearances,
                        &profile.relations,
                        &profile.description,
                        &profile.personality,
                    )
                    .await
                {
                    Ok(deep) => deep,
                    Err(e) => {
                        error!(character = %name, error = %e, "Deep profile synthesis failed");
                        profile.mark_error(e.to_string());
                        yield AnalysisEvent::Error { stage: "deep_profile".to_string(), message: e.to_string() };
                        return;
                    }
                };
                deep.apply_to(&mut profile);
                yield AnalysisEvent::DeepProfileAnalyzed(deep);
            } else {
                let discovered: BTreeSet<String> = discovered_characters(&name, &profile.appearances);
                profile.discovered_characters.extend(discovered);
                yield AnalysisEvent::SummarySkipped {
                    message: "Summary not refreshed; synthesized fields kept from the previous run".to_string(),
                };
            }

            profile.mark_completed(None);
            if let Err(e) = self.store.save(&profile).await {
                error!(character = %name, error = %e, "Failed to save profile");
                yield AnalysisEvent::Error { stage: "save".to_string(), message: e.to_string() };
                return;
            }
            info!(
                character = %name,
                analyzed = profile.analyzed_chapters.len(),
                relations = profile.relations.len(),
                "Analysis completed"
            );
            yield AnalysisEvent::Completed(Box::new(profile));
        })
    }
}

/// Remove recorded chapters where the name no longer occurs.
///
/// Keeps `analyzed_chapters` within the found set. Returns the dropped
/// indices, ascending.
fn drop_unfound(profile: &mut Profile, mentions: &MentionResult) -> Vec<usize> {
    let found: BTreeSet<usize> = mentions.chapter_indices.iter().copied().collect();
    let dropped: BTreeSet<usize> = profile
        .analyzed_chapters
        .iter()
        .copied()
        .chain(profile.appearances.iter().map(|a| a.chapter_index))
        .filter(|index| !found.contains(index))
        .collect();
    if !dropped.is_empty() {
        warn!(
            character = %profile.name,
            ?dropped,
            "Dropping recorded chapters that no longer mention the character"
        );
        profile
            .appearances
            .retain(|appearance| found.contains(&appearance.chapter_index));
        profile.analyzed_chapters.retain(|index| found.contains(index));
    }
    dropped.into_iter().collect()
}

/// Run a stream to its terminal event.
async fn drive(mut stream: AnalysisStream<'_>) -> LorekeeperResult<Profile> {
    while let Some(event) = stream.next().await {
        match event {
            AnalysisEvent::Completed(profile) => return Ok(*profile),
            AnalysisEvent::Error { stage, message } => {
                return Err(
                    AnalysisError::new(AnalysisErrorKind::StageFailed { stage, message }).into(),
                );
            }
            _ => {}
        }
    }
    Err(AnalysisError::new(AnalysisErrorKind::Incomplete).into())
}
