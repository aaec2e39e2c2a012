//! Progress events of an analysis run.

use crate::{DeepProfile, PersonalitySketch};
use lorekeeper_core::{Appearance, MentionResult, Profile, Relation, Role};
use serde::{Deserialize, Serialize};

/// One progress step of an analysis run.
///
/// A run yields `search_complete` first and ends with exactly one of
/// `completed` or `error`. Serialized as `{"event": <name>, "data": <payload>}`.
///
/// # Examples
///
/// ```
/// use lorekeeper_analysis::AnalysisEvent;
///
/// let event = AnalysisEvent::Info { message: "nothing to do".into() };
/// assert_eq!(event.name(), "info");
/// let json = serde_json::to_value(&event).unwrap();
/// assert_eq!(json["event"], "info");
/// assert_eq!(json["data"]["message"], "nothing to do");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, strum::IntoStaticStr)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AnalysisEvent {
    /// Mention search finished
    SearchComplete(MentionResult),
    /// Informational note, e.g. no remaining chapters
    Info {
        /// Message for the caller
        message: String,
    },
    /// Plan of a continuation run
    ContinueInfo {
        /// Chapters already recorded before this run
        already_analyzed: usize,
        /// Found chapters not yet recorded
        remaining: usize,
        /// Chapters this run will extract
        will_analyze: Vec<usize>,
        /// Whether synthesis stages re-run
        refresh_summary: bool,
        /// Recorded chapters dropped because the name no longer occurs there
        dropped: Vec<usize>,
    },
    /// One chapter extracted
    ChapterAnalyzed {
        /// Chapter index
        chapter_index: usize,
        /// Chapter title
        chapter_title: String,
        /// The extracted appearance
        appearance: Appearance,
        /// Chapters scheduled in this run
        chapters_to_analyze: usize,
    },
    /// One chapter failed; the run continues
    ChapterError {
        /// Chapter index
        chapter_index: usize,
        /// Failure description
        error: String,
    },
    /// Relation stage finished
    RelationsAnalyzed {
        /// Ranked relations
        relations: Vec<Relation>,
    },
    /// Personality stage finished
    PersonalityAnalyzed {
        /// Short biography
        description: String,
        /// Personality keywords
        personality: Vec<String>,
        /// Narrative role
        role: Role,
    },
    /// Deep-profile stage finished
    DeepProfileAnalyzed(DeepProfile),
    /// Synthesis stages were not re-run
    SummarySkipped {
        /// Message for the caller
        message: String,
    },
    /// Terminal success, carrying the full profile
    Completed(Box<Profile>),
    /// Terminal failure
    Error {
        /// Stage that failed
        stage: String,
        /// Failure description
        message: String,
    },
}

impl AnalysisEvent {
    /// Wire name of the event.
    pub fn name(&self) -> &'static str {
        self.into()
    }

    /// Whether the event ends a run.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed(_) | Self::Error { .. })
    }

    pub(crate) fn personality(sketch: &PersonalitySketch) -> Self {
        Self::PersonalityAnalyzed {
            description: sketch.description.clone(),
            personality: sketch.personality.clone(),
            role: sketch.role.clone(),
        }
    }
}
