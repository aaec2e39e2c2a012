//! Per-chapter appearance extraction.

use crate::decode;
use crate::prompts::{chapter_label, narrator_context, truncate_chars};
use lorekeeper_core::{
    AnalysisConfig, Appearance, EnumPolicy, Initiator, Interaction, InteractionKind,
    NarratorBias, Sentiment, Significance, Vocabulary,
};
use lorekeeper_error::{ExtractionError, ExtractionErrorKind};
use lorekeeper_interface::{Mapping, StructuredGenerator};
use serde_json::Value;
use tracing::{debug, instrument};

/// Events kept per appearance.
pub const MAX_EVENTS: usize = 5;
/// Interactions kept per appearance.
pub const MAX_INTERACTIONS: usize = 5;

const SYSTEM_PROMPT: &str = "You are a literary analyst. You extract objective, structured \
information about one character from a novel chapter, completely and precisely.";

/// Kind recorded for interactions given as bare text.
const LEGACY_INTERACTION_KIND: &str = "interaction";

/// One chapter scheduled for extraction.
#[derive(Debug, Clone, Copy)]
pub struct ChapterJob<'a> {
    /// Chapter index in the source
    pub index: usize,
    /// Chapter title
    pub title: &'a str,
    /// Chapter text, `None` when the source could not resolve it
    pub text: Option<&'a str>,
}

/// Extracts one [`Appearance`] per chapter through the model.
#[derive(Debug)]
pub struct AppearanceExtractor<'a, G: ?Sized> {
    generator: &'a G,
    config: &'a AnalysisConfig,
}

impl<'a, G: StructuredGenerator + ?Sized> AppearanceExtractor<'a, G> {
    /// Create an extractor.
    pub fn new(generator: &'a G, config: &'a AnalysisConfig) -> Self {
        Self { generator, config }
    }

    /// Extract the subject's appearance in one chapter.
    ///
    /// The text is cut to `max_chapter_chars` first; the tail of a longer
    /// chapter is not seen by the model. Malformed model output yields an
    /// appearance with default fields. Only a failed model call is an error.
    #[instrument(
        skip(self, chapter_title, chapter_text),
        fields(character = name, chapter_index, chars = chapter_text.len())
    )]
    pub async fn extract(
        &self,
        name: &str,
        chapter_index: usize,
        chapter_title: &str,
        chapter_text: &str,
    ) -> Result<Appearance, ExtractionError> {
        let text = truncate_chars(chapter_text, *self.config.max_chapter_chars());
        if text.len() < chapter_text.len() {
            debug!(kept_bytes = text.len(), "Chapter text truncated");
        }

        let prompt = appearance_prompt(self.config, name, chapter_index, chapter_title, text);
        let mapping = self
            .generator
            .generate_structured(&prompt, SYSTEM_PROMPT)
            .await
            .map_err(|e| {
                ExtractionError::new(chapter_index, ExtractionErrorKind::Generation(e.to_string()))
            })?;

        let appearance = decode_appearance(
            &mapping,
            chapter_index,
            chapter_title,
            *self.config.enum_policy(),
        );
        debug!(
            events = appearance.events.len(),
            interactions = appearance.interactions.len(),
            mentioned_only = appearance.is_mentioned_only,
            "Extracted appearance"
        );
        Ok(appearance)
    }

    /// Extract a scheduled chapter.
    pub async fn extract_job(
        &self,
        name: &str,
        job: ChapterJob<'_>,
    ) -> Result<Appearance, ExtractionError> {
        match job.text {
            Some(text) => self.extract(name, job.index, job.title, text).await,
            None => Err(ExtractionError::new(
                job.index,
                ExtractionErrorKind::ChapterUnavailable,
            )),
        }
    }
}

fn appearance_prompt(
    config: &AnalysisConfig,
    name: &str,
    chapter_index: usize,
    chapter_title: &str,
    text: &str,
) -> String {
    format!(
        r#"{context}Analyze everything the character "{name}" does in the chapter below, and record every character connected to {name}.

{label}: {chapter_title}
Text:
{text}

Return JSON:
{{
  "events": ["one sentence per concrete event {name} takes part in; objective facts only; at most {max_events}, most important first"],
  "interactions": [
    {{
      "character": "full name of the other character",
      "type": "{kinds}",
      "description": "what happened, one sentence",
      "sentiment": "{sentiments}",
      "initiated_by": "subject/other/mutual ({name} / the other character / both)"
    }}
  ],
  "quote": "one line spoken by {name} that best shows their character, verbatim; empty string if {name} does not speak",
  "narrator_bias": "attitude of the narration towards {name}: {biases}",
  "emotional_state": "main emotional state of {name} in this chapter",
  "chapter_significance": "importance of this chapter for {name}: {significance}",
  "mentioned_characters": ["every character connected to {name} in this chapter, including ones only mentioned"],
  "key_moment": "the single moment that best shows {name}, one sentence, empty if none"
}}

Rules:
1. At most {max_interactions} interactions, most important first.
2. dialogue = conversation, conflict = opposition, cooperation = working together, support = help, observation = one-sided watching without direct contact.
3. If {name} is only mentioned and does not appear, leave events empty and explain in key_moment.
"#,
        context = narrator_context(config),
        label = chapter_label(chapter_index),
        kinds = InteractionKind::choices(),
        sentiments = Sentiment::choices(),
        biases = NarratorBias::choices(),
        significance = Significance::choices(),
        max_events = MAX_EVENTS,
        max_interactions = MAX_INTERACTIONS,
    )
}

/// Build an [`Appearance`] from the extraction reply.
///
/// Missing keys take their defaults. Interactions whose labels the policy
/// rejects are dropped; interactions given as bare text are kept with no
/// counterpart.
pub fn decode_appearance(
    map: &Mapping,
    chapter_index: usize,
    chapter_title: &str,
    policy: EnumPolicy,
) -> Appearance {
    let interactions = decode::items(map, "interactions")
        .filter_map(|item| decode_interaction(item, policy))
        .take(MAX_INTERACTIONS)
        .collect();

    let mut appearance = Appearance {
        chapter_index,
        chapter_title: chapter_title.to_string(),
        events: decode::string_list(map, "events", MAX_EVENTS),
        interactions,
        quote: decode::text(map, "quote"),
        narrator_bias: decode::scalar_term(map, &["narrator_bias"], policy, NarratorBias::Unclear),
        emotional_state: decode::text(map, "emotional_state"),
        significance: decode::scalar_term(
            map,
            &["chapter_significance", "significance"],
            policy,
            Significance::Medium,
        ),
        mentioned_characters: decode::string_list(map, "mentioned_characters", usize::MAX)
            .into_iter()
            .collect(),
        key_moment: decode::text(map, "key_moment"),
        is_mentioned_only: true,
    };
    appearance.refresh_mention_flag();
    appearance
}

fn decode_interaction(item: &Value, policy: EnumPolicy) -> Option<Interaction> {
    match item {
        Value::Object(map) => Some(Interaction {
            counterpart_name: decode::text_any(map, &["character", "counterpart_name"]),
            kind: decode::term(map, &["type", "kind"], policy, InteractionKind::Observation)?,
            description: decode::text(map, "description"),
            sentiment: decode::term(map, &["sentiment"], policy, Sentiment::Neutral)?,
            initiator: decode::term(
                map,
                &["initiated_by", "initiator"],
                policy,
                Initiator::Unspecified,
            )?,
        }),
        Value::String(description) if !description.trim().is_empty() => Some(Interaction {
            counterpart_name: String::new(),
            kind: policy.admit(
                InteractionKind::from_term(LEGACY_INTERACTION_KIND),
                InteractionKind::Observation,
            )?,
            description: description.trim().to_string(),
            ..Default::default()
        }),
        _ => None,
    }
}
