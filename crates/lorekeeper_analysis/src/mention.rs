//! Literal name search over a chapter source.

use lorekeeper_core::MentionResult;
use lorekeeper_interface::ChapterSource;

/// Find every chapter that contains `name` literally.
///
/// The name is matched as plain text, so punctuation such as `.` or `(`
/// has no special meaning. Occurrences are counted without overlap. An
/// empty name finds nothing.
///
/// # Examples
///
/// ```
/// use lorekeeper_analysis::search_mentions;
/// use lorekeeper_interface::Book;
///
/// let book = Book::from_chapters("b", "t", [("One", "Mei and Mei"), ("Two", "Lin"), ("Three", "Mei")]);
/// let result = search_mentions(&book, "Mei");
/// assert_eq!(result.chapter_indices, vec![0, 2]);
/// assert_eq!(result.total_mentions, 3);
/// ```
#[tracing::instrument(skip(source), fields(chapters = source.chapter_count()))]
pub fn search_mentions<S: ChapterSource + ?Sized>(source: &S, name: &str) -> MentionResult {
    let mut result = MentionResult::empty(name);
    if name.is_empty() {
        return result;
    }

    for chapter in source.chapters() {
        let Some(text) = source.text(chapter) else {
            tracing::warn!(chapter = chapter.index, "Chapter text unavailable, skipping");
            continue;
        };
        let count = text.matches(name).count();
        if count > 0 {
            result.chapter_indices.push(chapter.index);
            result.chapter_titles.push(chapter.title.clone());
            result.mention_counts.push(count);
            result.total_mentions += count;
        }
    }

    tracing::debug!(
        found = result.found_count(),
        total_mentions = result.total_mentions,
        "Mention search finished"
    );
    result
}
