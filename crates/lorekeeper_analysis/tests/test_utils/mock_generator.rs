//! Scripted structured generator.

use async_trait::async_trait;
use lorekeeper_error::{GenerationError, GenerationErrorKind, LorekeeperResult};
use lorekeeper_interface::{Book, Mapping, StructuredGenerator};
use serde_json::{Value, json};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

/// Which stage a prompt belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PromptKind {
    Appearance,
    Relations,
    Personality,
    DeepProfile,
}

impl PromptKind {
    fn of(prompt: &str) -> Self {
        if prompt.contains("relationship network") {
            Self::Relations
        } else if prompt.contains("analyze the personality") {
            Self::Personality
        } else if prompt.contains("definitive analysis") {
            Self::DeepProfile
        } else {
            Self::Appearance
        }
    }
}

#[derive(Debug, Default)]
struct State {
    calls: BTreeMap<PromptKind, usize>,
    chapters_seen: Vec<usize>,
}

/// Replies per prompt kind and records every call.
///
/// Appearance prompts are answered from the chapter number in the prompt,
/// so each appearance quotes its own chapter. Personality replies carry a
/// running counter so re-runs are visible.
#[derive(Debug, Default)]
pub struct MockGenerator {
    state: Mutex<State>,
    failing_chapters: BTreeSet<usize>,
    failing_stage: Option<PromptKind>,
    appearance_reply: Option<Mapping>,
    relations_reply: Option<Mapping>,
}

impl MockGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail extraction of these zero-based chapters.
    pub fn failing_chapters(mut self, chapters: impl IntoIterator<Item = usize>) -> Self {
        self.failing_chapters = chapters.into_iter().collect();
        self
    }

    /// Fail every call of one synthesis stage.
    pub fn failing_stage(mut self, kind: PromptKind) -> Self {
        self.failing_stage = Some(kind);
        self
    }

    /// Answer every appearance prompt with this reply.
    #[allow(dead_code)]
    pub fn appearance_reply(mut self, reply: Value) -> Self {
        self.appearance_reply = as_mapping(reply);
        self
    }

    /// Answer every relation prompt with this reply.
    #[allow(dead_code)]
    pub fn relations_reply(mut self, reply: Value) -> Self {
        self.relations_reply = as_mapping(reply);
        self
    }

    pub fn calls(&self, kind: PromptKind) -> usize {
        self.state
            .lock()
            .unwrap()
            .calls
            .get(&kind)
            .copied()
            .unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.state.lock().unwrap().calls.values().sum()
    }

    /// Zero-based chapters sent to extraction, in call order.
    #[allow(dead_code)]
    pub fn chapters_seen(&self) -> Vec<usize> {
        self.state.lock().unwrap().chapters_seen.clone()
    }

    fn reply(&self, kind: PromptKind, prompt: &str) -> LorekeeperResult<Mapping> {
        let call = {
            let mut state = self.state.lock().unwrap();
            let count = state.calls.entry(kind).or_insert(0);
            *count += 1;
            *count
        };

        if self.failing_stage == Some(kind) {
            return Err(GenerationError::new(GenerationErrorKind::Api {
                status: 400,
                message: format!("{kind:?} refused"),
            })
            .into());
        }

        let reply = match kind {
            PromptKind::Appearance => {
                let chapter = chapter_in(prompt).unwrap_or(0);
                self.state.lock().unwrap().chapters_seen.push(chapter);
                if self.failing_chapters.contains(&chapter) {
                    return Err(GenerationError::new(GenerationErrorKind::Http(format!(
                        "connection reset in chapter {chapter}"
                    )))
                    .into());
                }
                if let Some(reply) = &self.appearance_reply {
                    return Ok(reply.clone());
                }
                appearance(chapter)
            }
            PromptKind::Relations => {
                if let Some(reply) = &self.relations_reply {
                    return Ok(reply.clone());
                }
                json!({"relations": [{
                    "target_name": "Lin",
                    "relation_type": "friend",
                    "description": "travels with Mei",
                    "objective_basis": "shared journeys",
                    "relation_evolution": "stable",
                    "confidence": "high"
                }]})
            }
            PromptKind::Personality => json!({
                "description": format!("Sketch #{call}"),
                "personality": ["steady", "curious"],
                "role": "protagonist"
            }),
            PromptKind::DeepProfile => json!({
                "summary": format!("Summary #{call}"),
                "growth_arc": "From wary to trusting.",
                "core_traits": [{"trait": "steady", "description": "keeps calm", "evidence": "chapter 3"}],
                "strengths": ["patience"],
                "weaknesses": ["reticence"],
                "notable_quotes": ["Line from chapter 3", "An invented line"],
                "analysis_confidence": "medium",
                "analysis_limitations": "sampled chapters only",
                "discovered_characters": ["Wu"]
            }),
        };
        Ok(as_mapping(reply).unwrap_or_default())
    }
}

#[async_trait]
impl StructuredGenerator for MockGenerator {
    async fn generate_structured(&self, prompt: &str, _system: &str) -> LorekeeperResult<Mapping> {
        tokio::task::yield_now().await;
        self.reply(PromptKind::of(prompt), prompt)
    }
}

/// Zero-based chapter index from the first `Chapter N` label.
fn chapter_in(prompt: &str) -> Option<usize> {
    let rest = &prompt[prompt.find("Chapter ")? + "Chapter ".len()..];
    let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
    digits.parse::<usize>().ok()?.checked_sub(1)
}

fn appearance(chapter: usize) -> Value {
    json!({
        "events": [format!("Mei crosses the river in chapter {}", chapter + 1)],
        "interactions": [{
            "character": "Lin",
            "type": "dialogue",
            "description": "they plan the route",
            "sentiment": "positive",
            "initiated_by": "subject"
        }],
        "quote": format!("Line from chapter {}", chapter + 1),
        "narrator_bias": "neutral",
        "emotional_state": "calm",
        "chapter_significance": if chapter % 4 == 2 { "high" } else { "medium" },
        "mentioned_characters": ["Lin", "Zhou"],
        "key_moment": "Mei decides to go on."
    })
}

fn as_mapping(value: Value) -> Option<Mapping> {
    match value {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

/// Ten chapters; "Mei" appears in chapters 2, 4, 6 and 8, twice in 4.
pub fn mei_book() -> Book {
    let chapters = (0..10).map(|index| {
        let text = match index {
            4 => "Mei met Lin at the ferry. Later Mei left alone.".to_string(),
            2 | 6 | 8 => format!("Mei walked the road in part {index}."),
            _ => format!("Lin waited at the inn, part {index}."),
        };
        (format!("Part {index}"), text)
    });
    Book::from_chapters("mei-book", "The Ferry", chapters)
}
