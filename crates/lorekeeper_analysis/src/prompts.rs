//! Prompt fragments shared by the stages.

use lorekeeper_core::AnalysisConfig;

/// Reminder that every account is filtered through a first-person narrator.
pub fn narrator_context(config: &AnalysisConfig) -> String {
    let Some(narrator) = config.narrator().as_deref().filter(|n| !n.trim().is_empty()) else {
        return String::new();
    };
    format!(
        "Background: the novel is told in the first person by {narrator}. \
Everything below is what {narrator} saw, heard or assumed.\n\
Keep apart:\n\
1. Objective facts: dialogue, concrete actions, physical description.\n\
2. Subjective guesses: {narrator}'s reading of other people's thoughts or motives.\n\
3. Relationship bias: {narrator}'s feelings about a person colour how that person is described.\n\
Prefer dialogue and actions as evidence, treat {narrator}'s judgments with reserve, \
and say which statements are inference.\n\n"
    )
}

/// One-based chapter label for prompts.
pub fn chapter_label(chapter_index: usize) -> String {
    format!("Chapter {}", chapter_index + 1)
}

/// Lines joined with newlines, or a placeholder when empty.
pub fn lines_or(lines: &[String], placeholder: &str) -> String {
    if lines.is_empty() {
        placeholder.to_string()
    } else {
        lines.join("\n")
    }
}

/// Cut text to at most `max_chars` chars, on a char boundary.
///
/// # Examples
///
/// ```
/// use lorekeeper_analysis::truncate_chars;
///
/// assert_eq!(truncate_chars("梅花开了", 2), "梅花");
/// assert_eq!(truncate_chars("short", 100), "short");
/// ```
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => &text[..cut],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn narrator_context_only_when_configured() {
        assert!(narrator_context(&AnalysisConfig::default()).is_empty());
        let config = AnalysisConfig::default().with_narrator(Some("Zhang".to_string()));
        assert!(narrator_context(&config).contains("first person by Zhang"));
        let blank = AnalysisConfig::default().with_narrator(Some("  ".to_string()));
        assert!(narrator_context(&blank).is_empty());
    }

    #[test]
    fn truncation_keeps_char_boundaries() {
        assert_eq!(truncate_chars("", 3), "");
        assert_eq!(truncate_chars("abc", 0), "");
        assert_eq!(truncate_chars("ab梅cd", 3), "ab梅");
    }
}
