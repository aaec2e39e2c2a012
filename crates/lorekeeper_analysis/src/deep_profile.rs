//! Final synthesis pass over all evidence.

use crate::decode;
use crate::prompts::{chapter_label, lines_or, narrator_context};
use lorekeeper_core::{
    AnalysisConfig, Appearance, Confidence, CoreTrait, EnumPolicy, Profile, Relation,
    Significance, Vocabulary, discovered_characters,
};
use lorekeeper_error::LorekeeperResult;
use lorekeeper_interface::{Mapping, StructuredGenerator};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use tracing::{debug, info, instrument};

/// Core traits kept.
pub const MAX_CORE_TRAITS: usize = 5;
/// Strengths and weaknesses kept, each.
pub const MAX_QUALITIES: usize = 5;
/// Notable quotes kept.
pub const MAX_NOTABLE_QUOTES: usize = 5;
const MAX_EVENTS: usize = 35;
const MAX_EMOTIONAL_STATES: usize = 20;
const MAX_KEY_MOMENTS: usize = 15;
const MAX_QUOTES: usize = 12;
const MAX_HIGH_SIGNIFICANCE: usize = 10;

const SYSTEM_PROMPT: &str = "You are a senior literary analyst. You reconstruct the \
objective picture of a character precisely and without the narrator's colouring.";

const QUOTE_MARKS: &[char] = &['"', '\'', '“', '”', '‘', '’', '「', '」', '『', '』'];

/// Output of the deep-profile stage.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DeepProfile {
    /// One-line encyclopedic summary
    pub summary: String,
    /// Staged growth narrative
    pub growth_arc: String,
    /// Core traits with evidence
    pub core_traits: Vec<CoreTrait>,
    /// Strengths
    pub strengths: Vec<String>,
    /// Weaknesses
    pub weaknesses: Vec<String>,
    /// Quotes found in the supplied material
    pub notable_quotes: Vec<String>,
    /// Self-reported confidence
    pub analysis_confidence: Confidence,
    /// Self-reported limitations
    pub analysis_limitations: String,
    /// Model-reported names merged with locally discovered ones
    pub discovered_characters: BTreeSet<String>,
}

impl DeepProfile {
    /// Write the deep profile into a profile.
    ///
    /// `discovered_characters` replaces the profile's set.
    pub fn apply_to(&self, profile: &mut Profile) {
        profile.summary = self.summary.clone();
        profile.growth_arc = self.growth_arc.clone();
        profile.core_traits = self.core_traits.clone();
        profile.strengths = self.strengths.clone();
        profile.weaknesses = self.weaknesses.clone();
        profile.notable_quotes = self.notable_quotes.clone();
        profile.analysis_confidence = self.analysis_confidence.clone();
        profile.analysis_limitations = self.analysis_limitations.clone();
        profile.discovered_characters = self.discovered_characters.clone();
    }
}

/// Evidence handed to the deep-profile prompt.
#[derive(Debug, Default)]
struct Material {
    events: Vec<String>,
    emotional_states: Vec<String>,
    key_moments: Vec<String>,
    quotes: Vec<String>,
    raw_quotes: Vec<String>,
    high_significance: Vec<usize>,
}

impl Material {
    fn collect(appearances: &[Appearance]) -> Self {
        let mut material = Self::default();
        for appearance in appearances {
            let label = chapter_label(appearance.chapter_index);
            material
                .events
                .extend(appearance.events.iter().map(|event| format!("{label}: {event}")));
            if !appearance.quote.is_empty() {
                material
                    .quotes
                    .push(format!("\"{}\" ({label})", appearance.quote));
                material.raw_quotes.push(appearance.quote.clone());
            }
            if !appearance.key_moment.is_empty() {
                material
                    .key_moments
                    .push(format!("{label}: {}", appearance.key_moment));
            }
            if !appearance.emotional_state.is_empty() {
                material
                    .emotional_states
                    .push(format!("{label}: {}", appearance.emotional_state));
            }
            if appearance.significance == Significance::High {
                material.high_significance.push(appearance.chapter_index + 1);
            }
        }
        material.events.truncate(MAX_EVENTS);
        material.emotional_states.truncate(MAX_EMOTIONAL_STATES);
        material.key_moments.truncate(MAX_KEY_MOMENTS);
        material.quotes.truncate(MAX_QUOTES);
        material.raw_quotes.truncate(MAX_QUOTES);
        material.high_significance.truncate(MAX_HIGH_SIGNIFICANCE);
        material
    }
}

/// Produces the final deep profile through the model.
#[derive(Debug)]
pub struct DeepProfileSynthesizer<'a, G: ?Sized> {
    generator: &'a G,
    config: &'a AnalysisConfig,
}

impl<'a, G: StructuredGenerator + ?Sized> DeepProfileSynthesizer<'a, G> {
    /// Create a synthesizer.
    pub fn new(generator: &'a G, config: &'a AnalysisConfig) -> Self {
        Self { generator, config }
    }

    /// Deep profile of `name` from all evidence gathered so far.
    #[instrument(
        skip(self, appearances, relations, description, personality),
        fields(character = name, appearances = appearances.len(), relations = relations.len())
    )]
    pub async fn synthesize(
        &self,
        name: &str,
        appearances: &[Appearance],
        relations: &[Relation],
        description: &str,
        personality: &[String],
    ) -> LorekeeperResult<DeepProfile> {
        let material = Material::collect(appearances);
        let prompt = deep_profile_prompt(
            self.config,
            name,
            appearances.len(),
            &material,
            relations,
            description,
            personality,
        );
        let mapping = self
            .generator
            .generate_structured(&prompt, SYSTEM_PROMPT)
            .await?;

        let local = discovered_characters(name, appearances);
        let deep = decode_deep_profile(
            &mapping,
            name,
            &material.raw_quotes,
            local,
            *self.config.enum_policy(),
        );
        info!(
            traits = deep.core_traits.len(),
            quotes = deep.notable_quotes.len(),
            discovered = deep.discovered_characters.len(),
            confidence = %deep.analysis_confidence,
            "Deep profile synthesized"
        );
        Ok(deep)
    }
}

fn relation_lines(relations: &[Relation]) -> Vec<String> {
    relations
        .iter()
        .map(|relation| {
            let evolution = relation.evolution_note.trim();
            let mut line = format!(
                "- {} ({}): {}",
                relation.target_name, relation.relation_type, relation.description
            );
            if !evolution.is_empty() && !evolution.eq_ignore_ascii_case("stable") {
                line.push_str(&format!(" [evolution: {evolution}]"));
            }
            line
        })
        .collect()
}

fn deep_profile_prompt(
    config: &AnalysisConfig,
    name: &str,
    analyzed: usize,
    material: &Material,
    relations: &[Relation],
    description: &str,
    personality: &[String],
) -> String {
    let high_significance = if material.high_significance.is_empty() {
        "none".to_string()
    } else {
        material
            .high_significance
            .iter()
            .map(usize::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    };
    format!(
        r#"{context}From everything below, write the definitive analysis of "{name}".

## Basics
Description: {description}
Personality: {personality}
Chapters analyzed: {analyzed}
High-significance chapters: {high_significance}

## Relationships
{relations}

## Events
{events}

## Emotional journey
{emotional_states}

## Key moments
{key_moments}

## Representative lines
{quotes}

Return JSON:
{{
  "summary": "one objective sentence, like the opening of an encyclopedia entry",
  "growth_arc": "how the character's observable behaviour changes, early to middle to late",
  "core_traits": [
    {{"trait": "core trait", "description": "how it shows, one sentence", "evidence": "strongest evidence: a concrete action or a verbatim line"}}
  ],
  "strengths": ["objective strength"],
  "weaknesses": ["objective weakness"],
  "notable_quotes": ["a line of {name}, chosen from the representative lines above"],
  "analysis_confidence": "{confidence}",
  "analysis_limitations": "honest statement of what the analysis may miss or distort",
  "discovered_characters": ["other characters met during this analysis"]
}}

Rules:
1. At most {max_traits} core traits, each with clear evidence.
2. At most {max_qualities} strengths and {max_qualities} weaknesses, based on behaviour.
3. At most {max_quotes} notable quotes; never invent a quote.
4. Base analysis_confidence on sample size, objectivity and coverage.
"#,
        context = narrator_context(config),
        personality = personality.join(", "),
        relations = lines_or(&relation_lines(relations), "(no relationship data)"),
        events = lines_or(&material.events, "(not enough data)"),
        emotional_states = lines_or(&material.emotional_states, "(not enough data)"),
        key_moments = lines_or(&material.key_moments, "(not enough data)"),
        quotes = lines_or(&material.quotes, "(no lines recorded)"),
        confidence = Confidence::choices(),
        max_traits = MAX_CORE_TRAITS,
        max_qualities = MAX_QUALITIES,
        max_quotes = MAX_NOTABLE_QUOTES,
    )
}

fn strip_quote_marks(text: &str) -> &str {
    text.trim().trim_matches(QUOTE_MARKS).trim()
}

/// Whether `quote` overlaps one of the supplied quotes.
fn is_supported(quote: &str, supplied: &[String]) -> bool {
    let quote = strip_quote_marks(quote);
    !quote.is_empty()
        && supplied.iter().any(|source| {
            let source = strip_quote_marks(source);
            !source.is_empty() && (source.contains(quote) || quote.contains(source))
        })
}

/// Build a [`DeepProfile`] from the reply.
///
/// Notable quotes without support in `supplied_quotes` are dropped.
/// `local_discovered` is merged into the model-reported names and the
/// subject is removed.
pub fn decode_deep_profile(
    map: &Mapping,
    subject: &str,
    supplied_quotes: &[String],
    local_discovered: BTreeSet<String>,
    policy: EnumPolicy,
) -> DeepProfile {
    let core_traits = decode::items(map, "core_traits")
        .filter_map(|item| match item {
            Value::Object(entry) => Some(CoreTrait {
                name: decode::text_any(entry, &["trait", "name"]),
                description: decode::text(entry, "description"),
                evidence: decode::text(entry, "evidence"),
            }),
            _ => None,
        })
        .filter(|core_trait| !core_trait.name.is_empty())
        .take(MAX_CORE_TRAITS)
        .collect();

    let reported_quotes = decode::string_list(map, "notable_quotes", usize::MAX);
    let notable_quotes: Vec<String> = reported_quotes
        .iter()
        .filter(|quote| is_supported(quote, supplied_quotes))
        .take(MAX_NOTABLE_QUOTES)
        .cloned()
        .collect();
    if notable_quotes.len() < reported_quotes.len().min(MAX_NOTABLE_QUOTES) {
        debug!(
            reported = reported_quotes.len(),
            kept = notable_quotes.len(),
            "Dropped unsupported quotes"
        );
    }

    let subject = subject.trim();
    let mut discovered = local_discovered;
    discovered.extend(decode::string_list(map, "discovered_characters", usize::MAX));
    discovered.retain(|name| name != subject);

    DeepProfile {
        summary: decode::text(map, "summary"),
        growth_arc: decode::text(map, "growth_arc"),
        core_traits,
        strengths: decode::string_list(map, "strengths", MAX_QUALITIES),
        weaknesses: decode::string_list(map, "weaknesses", MAX_QUALITIES),
        notable_quotes,
        analysis_confidence: decode::scalar_term(
            map,
            &["analysis_confidence", "confidence"],
            policy,
            Confidence::Low,
        ),
        analysis_limitations: decode::text(map, "analysis_limitations"),
        discovered_characters: discovered,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lorekeeper_core::RelationType;
    use serde_json::json;

    fn map(value: Value) -> Mapping {
        match value {
            Value::Object(map) => map,
            _ => Mapping::new(),
        }
    }

    #[test]
    fn quotes_must_come_from_material() {
        let supplied = vec!["We leave at dawn, with or without you.".to_string()];
        let reply = map(json!({"notable_quotes": [
            "「We leave at dawn」",
            "I never said that.",
            "\"We leave at dawn, with or without you.\"",
            "",
        ]}));
        let deep = decode_deep_profile(&reply, "Mei", &supplied, BTreeSet::new(), EnumPolicy::Coerce);
        assert_eq!(deep.notable_quotes.len(), 2);
        assert!(deep.notable_quotes.iter().all(|q| q.contains("We leave at dawn")));
    }

    #[test]
    fn discovered_merges_local_and_reported_without_subject() {
        let local: BTreeSet<String> = ["Lin".to_string()].into();
        let reply = map(json!({"discovered_characters": ["Zhou", "Mei", "Lin"]}));
        let deep = decode_deep_profile(&reply, "Mei", &[], local, EnumPolicy::Coerce);
        assert_eq!(
            deep.discovered_characters.into_iter().collect::<Vec<_>>(),
            vec!["Lin".to_string(), "Zhou".to_string()]
        );
    }

    #[test]
    fn traits_are_capped_and_need_a_name() {
        let traits: Vec<_> = (0..7)
            .map(|i| json!({"trait": format!("t{i}"), "evidence": "e"}))
            .chain([json!({"description": "nameless"}), json!("loose text")])
            .collect();
        let reply = map(json!({"core_traits": traits, "strengths": "single"}));
        let deep = decode_deep_profile(&reply, "Mei", &[], BTreeSet::new(), EnumPolicy::Coerce);
        assert_eq!(deep.core_traits.len(), MAX_CORE_TRAITS);
        assert_eq!(deep.core_traits[0].name, "t0");
        assert_eq!(deep.strengths, vec!["single"]);
        assert_eq!(deep.analysis_confidence, Confidence::Low);
    }

    #[test]
    fn material_lists_high_significance_one_based() {
        let mut high = Appearance::new(4, "Five");
        high.significance = Significance::High;
        high.quote = "Enough.".into();
        let material = Material::collect(&[Appearance::new(1, "Two"), high]);
        assert_eq!(material.high_significance, vec![5]);
        assert_eq!(material.quotes, vec!["\"Enough.\" (Chapter 5)"]);
        assert_eq!(material.raw_quotes, vec!["Enough."]);
    }

    #[test]
    fn relation_lines_hide_stable_evolution() {
        let relations = vec![
            Relation {
                target_name: "Lin".into(),
                relation_type: RelationType::Rival,
                description: "competes".into(),
                evolution_note: "stable".into(),
                ..Default::default()
            },
            Relation {
                target_name: "Zhou".into(),
                relation_type: RelationType::Friend,
                description: "helps".into(),
                evolution_note: "grows closer".into(),
                ..Default::default()
            },
        ];
        let lines = relation_lines(&relations);
        assert_eq!(lines[0], "- Lin (rival): competes");
        assert_eq!(lines[1], "- Zhou (friend): helps [evolution: grows closer]");
    }
}
