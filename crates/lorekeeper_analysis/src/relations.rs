//! Relation synthesis from grouped interactions.

use crate::decode;
use crate::prompts::{chapter_label, narrator_context};
use lorekeeper_core::{
    AnalysisConfig, Appearance, Confidence, EnumPolicy, Interaction, Relation, RelationType,
    Vocabulary,
};
use lorekeeper_error::LorekeeperResult;
use lorekeeper_interface::{Mapping, StructuredGenerator};
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, info, instrument};

/// Relations kept from one reply.
pub const MAX_RELATIONS: usize = 8;
/// Counterparts shown to the model.
pub const MAX_COUNTERPARTS: usize = 10;
/// Interactions shown per counterpart.
pub const INTERACTIONS_SHOWN: usize = 5;
/// Evidence chapters attached to one relation.
pub const MAX_EVIDENCE_CHAPTERS: usize = 10;

const SYSTEM_PROMPT: &str = "You are a literary analyst. You reconstruct the objective \
relationship network of a character from structured interaction records.";

/// Interactions of the subject with one counterpart, in chapter order.
#[derive(Debug, Clone)]
pub struct CounterpartGroup<'a> {
    /// Counterpart name, trimmed
    pub name: &'a str,
    /// `(chapter_index, interaction)` pairs
    pub records: Vec<(usize, &'a Interaction)>,
}

impl CounterpartGroup<'_> {
    /// First distinct chapters of the grouped interactions, ascending.
    pub fn evidence_chapters(&self) -> Vec<usize> {
        self.records
            .iter()
            .map(|(chapter_index, _)| *chapter_index)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .take(MAX_EVIDENCE_CHAPTERS)
            .collect()
    }
}

/// Group interactions by counterpart.
///
/// Interactions without a counterpart are skipped. Groups are ranked by
/// interaction count, most first; ties keep first-seen order.
pub fn group_interactions(appearances: &[Appearance]) -> Vec<CounterpartGroup<'_>> {
    let mut groups: Vec<CounterpartGroup<'_>> = Vec::new();
    let mut positions: HashMap<&str, usize> = HashMap::new();

    for appearance in appearances {
        for interaction in &appearance.interactions {
            let name = interaction.counterpart_name.trim();
            if name.is_empty() {
                continue;
            }
            let position = *positions.entry(name).or_insert_with(|| {
                groups.push(CounterpartGroup {
                    name,
                    records: Vec::new(),
                });
                groups.len() - 1
            });
            groups[position]
                .records
                .push((appearance.chapter_index, interaction));
        }
    }

    groups.sort_by(|a, b| b.records.len().cmp(&a.records.len()));
    groups
}

/// Ranks the subject's relationships through the model.
#[derive(Debug)]
pub struct RelationSynthesizer<'a, G: ?Sized> {
    generator: &'a G,
    config: &'a AnalysisConfig,
}

impl<'a, G: StructuredGenerator + ?Sized> RelationSynthesizer<'a, G> {
    /// Create a synthesizer.
    pub fn new(generator: &'a G, config: &'a AnalysisConfig) -> Self {
        Self { generator, config }
    }

    /// Ranked relations of `name` across `appearances`.
    ///
    /// Returns an empty list without calling the model when no interaction
    /// names a counterpart.
    #[instrument(skip(self, appearances), fields(character = name, appearances = appearances.len()))]
    pub async fn synthesize(
        &self,
        name: &str,
        appearances: &[Appearance],
    ) -> LorekeeperResult<Vec<Relation>> {
        let groups = group_interactions(appearances);
        if groups.is_empty() {
            debug!("No counterparts, skipping relation synthesis");
            return Ok(Vec::new());
        }

        let prompt = relation_prompt(self.config, name, &groups);
        let mapping = self
            .generator
            .generate_structured(&prompt, SYSTEM_PROMPT)
            .await?;
        let relations = decode_relations(&mapping, &groups, *self.config.enum_policy());
        info!(
            counterparts = groups.len(),
            relations = relations.len(),
            "Relations synthesized"
        );
        Ok(relations)
    }
}

fn group_summary(group: &CounterpartGroup<'_>) -> String {
    let mut summary = format!(
        "[{}] {} interaction(s)\n",
        group.name,
        group.records.len()
    );
    for (chapter_index, interaction) in group.records.iter().take(INTERACTIONS_SHOWN) {
        summary.push_str(&format!(
            "  - {} [{}] {} ({})\n",
            chapter_label(*chapter_index),
            interaction.kind,
            interaction.description,
            interaction.sentiment
        ));
    }
    if group.records.len() > INTERACTIONS_SHOWN {
        summary.push_str(&format!(
            "  - ... {} more\n",
            group.records.len() - INTERACTIONS_SHOWN
        ));
    }
    summary
}

fn relation_prompt(config: &AnalysisConfig, name: &str, groups: &[CounterpartGroup<'_>]) -> String {
    let summaries = groups
        .iter()
        .take(MAX_COUNTERPARTS)
        .map(group_summary)
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        r#"{context}Using the interaction records below, analyze the relationship network of "{name}".

{summaries}
Return JSON:
{{
  "relations": [
    {{
      "target_name": "exact full name of the other character",
      "relation_type": "{types}",
      "description": "nature of the relationship in one sentence, based on the interactions",
      "objective_basis": "the concrete behaviour or dialogue the judgment rests on",
      "first_interaction_chapter": 1,
      "relation_evolution": "how the relationship changes, or 'stable'",
      "confidence": "{confidence}"
    }}
  ]
}}

Rules:
1. Characters with more interactions come first.
2. Judge relation_type from behaviour, not from the narration's opinion.
3. Use confidence low when the records are not enough.
4. Return at most {max_relations} relations, most important first.
"#,
        context = narrator_context(config),
        types = RelationType::choices(),
        confidence = Confidence::choices(),
        max_relations = MAX_RELATIONS,
    )
}

/// Build relations from the synthesis reply.
///
/// Evidence chapters come from `groups`, never from the model. Entries
/// without a target name, or with labels the policy rejects, are dropped.
pub fn decode_relations(
    map: &Mapping,
    groups: &[CounterpartGroup<'_>],
    policy: EnumPolicy,
) -> Vec<Relation> {
    decode::items(map, "relations")
        .filter_map(|item| match item {
            Value::Object(entry) => decode_relation(entry, groups, policy),
            _ => None,
        })
        .take(MAX_RELATIONS)
        .collect()
}

fn decode_relation(
    entry: &Mapping,
    groups: &[CounterpartGroup<'_>],
    policy: EnumPolicy,
) -> Option<Relation> {
    let target_name = decode::text_any(entry, &["target_name", "name"]);
    if target_name.is_empty() {
        return None;
    }
    let relation_type = decode::term(entry, &["relation_type", "type"], policy, RelationType::Unknown)?;
    let confidence = decode::term(entry, &["confidence"], policy, Confidence::Medium)?;

    let evidence_chapters = groups
        .iter()
        .find(|group| group.name == target_name)
        .map(CounterpartGroup::evidence_chapters)
        .unwrap_or_default();
    let first_interaction_chapter = decode::chapter_number(entry, "first_interaction_chapter")
        .or_else(|| evidence_chapters.first().copied());

    Some(Relation {
        relation_type,
        description: decode::text(entry, "description"),
        objective_basis: decode::text(entry, "objective_basis"),
        evolution_note: decode::text_any(entry, &["relation_evolution", "evolution_note"]),
        confidence,
        evidence_chapters,
        first_interaction_chapter,
        target_name,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use lorekeeper_core::InteractionKind;
    use serde_json::json;

    fn appearance(chapter_index: usize, counterparts: &[&str]) -> Appearance {
        let mut appearance = Appearance::new(chapter_index, format!("Title {chapter_index}"));
        appearance.interactions = counterparts
            .iter()
            .map(|name| Interaction {
                counterpart_name: name.to_string(),
                kind: InteractionKind::Dialogue,
                description: format!("talks in {chapter_index}"),
                ..Default::default()
            })
            .collect();
        appearance.refresh_mention_flag();
        appearance
    }

    fn map(value: Value) -> Mapping {
        match value {
            Value::Object(map) => map,
            _ => Mapping::new(),
        }
    }

    #[test]
    fn groups_rank_by_count_then_first_seen() {
        let appearances = vec![
            appearance(1, &["Zhou", "Lin", " "]),
            appearance(3, &["Lin", "Wu"]),
            appearance(5, &["Wu"]),
        ];
        let groups = group_interactions(&appearances);
        let names: Vec<_> = groups.iter().map(|g| g.name).collect();
        assert_eq!(names, vec!["Lin", "Wu", "Zhou"]);
        assert_eq!(groups[0].evidence_chapters(), vec![1, 3]);
    }

    #[test]
    fn evidence_is_capped_and_distinct() {
        let appearances: Vec<_> = (0..14).map(|i| appearance(i, &["Lin", "Lin"])).collect();
        let groups = group_interactions(&appearances);
        assert_eq!(groups[0].records.len(), 28);
        assert_eq!(groups[0].evidence_chapters(), (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn summary_shows_overflow_line() {
        let appearances: Vec<_> = (0..7).map(|i| appearance(i, &["Lin"])).collect();
        let groups = group_interactions(&appearances);
        let summary = group_summary(&groups[0]);
        assert!(summary.starts_with("[Lin] 7 interaction(s)"));
        assert!(summary.contains("Chapter 5 [dialogue]"));
        assert!(!summary.contains("Chapter 6 [dialogue]"));
        assert!(summary.contains("... 2 more"));
    }

    #[test]
    fn decode_takes_evidence_from_groups() {
        let appearances = vec![appearance(2, &["Lin"]), appearance(6, &["Lin"])];
        let groups = group_interactions(&appearances);
        let reply = map(json!({"relations": [
            {"target_name": "Lin", "relation_type": "rival", "evidence_chapters": [99]},
            {"target_name": "", "relation_type": "friend"},
            {"target_name": "Ghost", "relation_type": "friend", "first_interaction_chapter": 4},
            "not an object",
        ]}));
        let relations = decode_relations(&reply, &groups, EnumPolicy::Coerce);
        assert_eq!(relations.len(), 2);
        assert_eq!(relations[0].evidence_chapters, vec![2, 6]);
        assert_eq!(relations[0].first_interaction_chapter, Some(2));
        assert_eq!(relations[0].confidence, Confidence::Medium);
        assert!(relations[1].evidence_chapters.is_empty());
        assert_eq!(relations[1].first_interaction_chapter, Some(3));
    }

    #[test]
    fn policy_governs_unknown_relation_types() {
        let reply = map(json!({"relations": [{"target_name": "Lin", "relation_type": "frenemy"}]}));
        let coerced = decode_relations(&reply, &[], EnumPolicy::Coerce);
        assert_eq!(coerced[0].relation_type, RelationType::Unknown);
        let kept = decode_relations(&reply, &[], EnumPolicy::Passthrough);
        assert_eq!(kept[0].relation_type, RelationType::Other("frenemy".to_string()));
        assert!(decode_relations(&reply, &[], EnumPolicy::Reject).is_empty());
    }

    #[test]
    fn caps_relation_count() {
        let entries: Vec<_> = (0..12)
            .map(|i| json!({"target_name": format!("C{i}"), "relation_type": "friend"}))
            .collect();
        let reply = map(json!({ "relations": entries }));
        assert_eq!(decode_relations(&reply, &[], EnumPolicy::Coerce).len(), MAX_RELATIONS);
    }
}
