//! Personality sketch: description, traits and role.

use crate::decode;
use crate::prompts::{chapter_label, lines_or, narrator_context};
use lorekeeper_core::{AnalysisConfig, Appearance, EnumPolicy, Profile, Role, Vocabulary};
use lorekeeper_error::LorekeeperResult;
use lorekeeper_interface::{Mapping, StructuredGenerator};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

/// Personality keywords kept.
pub const MAX_TRAITS: usize = 5;
const EVENTS_PER_CHAPTER: usize = 2;
const MAX_EVENTS: usize = 25;
const MAX_QUOTES: usize = 8;
const MAX_EMOTIONAL_STATES: usize = 15;
const MAX_KEY_MOMENTS: usize = 10;

const SYSTEM_PROMPT: &str = "You are a literary analyst. You describe a character's \
personality objectively from their recorded behaviour.";

/// Output of the personality stage.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonalitySketch {
    /// Short third-person biography
    pub description: String,
    /// Personality keywords, most prominent first
    pub personality: Vec<String>,
    /// Narrative role
    pub role: Role,
}

impl PersonalitySketch {
    /// Write the sketch into a profile.
    pub fn apply_to(&self, profile: &mut Profile) {
        profile.description = self.description.clone();
        profile.personality = self.personality.clone();
        profile.role = self.role.clone();
    }
}

/// Capped evidence handed to the personality prompt.
#[derive(Debug, Default)]
struct Material {
    events: Vec<String>,
    quotes: Vec<String>,
    emotional_states: Vec<String>,
    key_moments: Vec<String>,
    bias_counts: Vec<(String, usize)>,
    bias_total: usize,
}

impl Material {
    fn collect(appearances: &[Appearance]) -> Self {
        let mut material = Self::default();
        for appearance in appearances {
            let label = chapter_label(appearance.chapter_index);
            material.events.extend(
                appearance
                    .events
                    .iter()
                    .take(EVENTS_PER_CHAPTER)
                    .map(|event| format!("{label}: {event}")),
            );
            if !appearance.quote.is_empty() {
                material.quotes.push(format!("\"{}\"", appearance.quote));
            }
            if !appearance.emotional_state.is_empty() {
                material
                    .emotional_states
                    .push(format!("{label}: {}", appearance.emotional_state));
            }
            if !appearance.key_moment.is_empty() {
                material
                    .key_moments
                    .push(format!("{label}: {}", appearance.key_moment));
            }

            let bias = appearance.narrator_bias.to_string();
            if !bias.is_empty() {
                material.bias_total += 1;
                match material.bias_counts.iter_mut().find(|(term, _)| *term == bias) {
                    Some((_, count)) => *count += 1,
                    None => material.bias_counts.push((bias, 1)),
                }
            }
        }
        material.events.truncate(MAX_EVENTS);
        material.quotes.truncate(MAX_QUOTES);
        material.emotional_states.truncate(MAX_EMOTIONAL_STATES);
        material.key_moments.truncate(MAX_KEY_MOMENTS);
        material.bias_counts.sort_by(|a, b| b.1.cmp(&a.1));
        material
    }

    fn bias_summary(&self) -> String {
        if self.bias_counts.is_empty() {
            return "(no data)".to_string();
        }
        let counts = self
            .bias_counts
            .iter()
            .map(|(term, count)| format!("{term}({count}/{})", self.bias_total))
            .collect::<Vec<_>>()
            .join(", ");
        format!("Narrator attitude: {counts}")
    }
}

/// Sketches the subject's personality through the model.
#[derive(Debug)]
pub struct PersonalitySynthesizer<'a, G: ?Sized> {
    generator: &'a G,
    config: &'a AnalysisConfig,
}

impl<'a, G: StructuredGenerator + ?Sized> PersonalitySynthesizer<'a, G> {
    /// Create a synthesizer.
    pub fn new(generator: &'a G, config: &'a AnalysisConfig) -> Self {
        Self { generator, config }
    }

    /// Description, personality keywords and role of `name`.
    #[instrument(skip(self, appearances), fields(character = name, appearances = appearances.len()))]
    pub async fn synthesize(
        &self,
        name: &str,
        appearances: &[Appearance],
    ) -> LorekeeperResult<PersonalitySketch> {
        let material = Material::collect(appearances);
        let prompt = personality_prompt(self.config, name, &material);
        let mapping = self
            .generator
            .generate_structured(&prompt, SYSTEM_PROMPT)
            .await?;
        let sketch = decode_personality(&mapping, *self.config.enum_policy());
        info!(traits = sketch.personality.len(), role = %sketch.role, "Personality synthesized");
        Ok(sketch)
    }
}

fn personality_prompt(config: &AnalysisConfig, name: &str, material: &Material) -> String {
    format!(
        r#"{context}From the material below, analyze the personality of "{name}".

## Main events (observed behaviour)
{events}

## Representative lines (verbatim)
{quotes}

## Emotional states
{emotional_states}

## Key moments
{key_moments}

## Narrator bias
{bias}

Return JSON:
{{
  "description": "objective third-person introduction, 2 to 4 sentences: background, main traits, role in the story",
  "personality": ["trait backed by repeated behaviour", "at most {max_traits}, most prominent first"],
  "role": "{roles}",
  "role_basis": "one sentence on why"
}}

Rules:
1. Only keep traits supported by several behaviours.
2. Choices at key moments show character best.
3. Ignore one-off opinions of the narrator.
4. role describes narrative function, not moral judgment.
"#,
        context = narrator_context(config),
        events = lines_or(&material.events, "(none recorded)"),
        quotes = lines_or(&material.quotes, "(none recorded)"),
        emotional_states = lines_or(&material.emotional_states, "(none recorded)"),
        key_moments = lines_or(&material.key_moments, "(none recorded)"),
        bias = material.bias_summary(),
        max_traits = MAX_TRAITS,
        roles = Role::choices(),
    )
}

/// Build a [`PersonalitySketch`] from the reply.
///
/// A role the policy rejects falls back to [`Role::Unknown`].
pub fn decode_personality(map: &Mapping, policy: EnumPolicy) -> PersonalitySketch {
    PersonalitySketch {
        description: decode::text(map, "description"),
        personality: decode::string_list(map, "personality", MAX_TRAITS),
        role: decode::scalar_term(map, &["role"], policy, Role::Unknown),
    }
}
