//! Merging fan-out results into a profile's coverage.

use lorekeeper_core::Appearance;
use lorekeeper_error::ExtractionError;
use std::collections::BTreeSet;
use tracing::warn;

/// Coverage after merging one batch of extraction outcomes.
#[derive(Debug, Clone)]
pub struct MergeResult {
    /// All appearances, ascending by chapter index, one per chapter
    pub appearances: Vec<Appearance>,
    /// Chapter indices of `appearances`
    pub analyzed: BTreeSet<usize>,
    /// Chapters newly recorded by this batch, ascending
    pub added: Vec<usize>,
    /// Failed chapters, ascending
    pub failures: Vec<ExtractionError>,
}

/// Merge extraction outcomes into existing appearances.
///
/// Outcomes may arrive in any order. Failed chapters are left out of both
/// `appearances` and `analyzed`. An existing appearance wins over a new
/// one for the same chapter, as does the first of two new ones.
///
/// # Examples
///
/// ```
/// use lorekeeper_analysis::merge_outcomes;
/// use lorekeeper_core::Appearance;
/// use lorekeeper_error::{ExtractionError, ExtractionErrorKind};
///
/// let outcomes = vec![
///     Ok(Appearance::new(8, "Nine")),
///     Err(ExtractionError::new(5, ExtractionErrorKind::ChapterUnavailable)),
///     Ok(Appearance::new(4, "Five")),
/// ];
/// let merged = merge_outcomes(vec![Appearance::new(2, "Three")], outcomes);
/// assert_eq!(merged.analyzed.into_iter().collect::<Vec<_>>(), vec![2, 4, 8]);
/// assert_eq!(merged.added, vec![4, 8]);
/// assert_eq!(merged.failures[0].chapter_index, 5);
/// ```
pub fn merge_outcomes(
    existing: Vec<Appearance>,
    outcomes: Vec<Result<Appearance, ExtractionError>>,
) -> MergeResult {
    let mut analyzed: BTreeSet<usize> = BTreeSet::new();
    let mut appearances = Vec::with_capacity(existing.len() + outcomes.len());
    for appearance in existing {
        if analyzed.insert(appearance.chapter_index) {
            appearances.push(appearance);
        }
    }

    let mut added = Vec::new();
    let mut failures = Vec::new();
    for outcome in outcomes {
        match outcome {
            Ok(appearance) => {
                if analyzed.insert(appearance.chapter_index) {
                    added.push(appearance.chapter_index);
                    appearances.push(appearance);
                } else {
                    warn!(
                        chapter_index = appearance.chapter_index,
                        "Chapter already recorded, keeping the earlier appearance"
                    );
                }
            }
            Err(error) => failures.push(error),
        }
    }

    appearances.sort_by_key(|appearance| appearance.chapter_index);
    added.sort_unstable();
    failures.sort_by_key(|error| error.chapter_index);

    MergeResult {
        appearances,
        analyzed,
        added,
        failures,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lorekeeper_error::ExtractionErrorKind;

    fn appearance(chapter_index: usize, quote: &str) -> Appearance {
        let mut appearance = Appearance::new(chapter_index, "t");
        appearance.quote = quote.to_string();
        appearance
    }

    #[test]
    fn out_of_order_outcomes_are_sorted() {
        let merged = merge_outcomes(
            Vec::new(),
            vec![Ok(appearance(9, "")), Ok(appearance(1, "")), Ok(appearance(5, ""))],
        );
        let order: Vec<_> = merged.appearances.iter().map(|a| a.chapter_index).collect();
        assert_eq!(order, vec![1, 5, 9]);
        assert_eq!(merged.added, vec![1, 5, 9]);
    }

    #[test]
    fn existing_appearance_wins() {
        let merged = merge_outcomes(
            vec![appearance(3, "old")],
            vec![Ok(appearance(3, "new")), Ok(appearance(3, "newer"))],
        );
        assert_eq!(merged.appearances.len(), 1);
        assert_eq!(merged.appearances[0].quote, "old");
        assert!(merged.added.is_empty());
    }

    #[test]
    fn failures_are_excluded_from_both_sets() {
        let merged = merge_outcomes(
            vec![appearance(0, "")],
            vec![
                Err(ExtractionError::new(
                    7,
                    ExtractionErrorKind::Generation("timeout".into()),
                )),
                Ok(appearance(2, "")),
                Err(ExtractionError::new(1, ExtractionErrorKind::ChapterUnavailable)),
            ],
        );
        assert!(!merged.analyzed.contains(&7));
        assert!(merged.appearances.iter().all(|a| a.chapter_index != 7));
        let failed: Vec<_> = merged.failures.iter().map(|e| e.chapter_index).collect();
        assert_eq!(failed, vec![1, 7]);
        let indices: BTreeSet<_> = merged.appearances.iter().map(|a| a.chapter_index).collect();
        assert_eq!(indices, merged.analyzed);
    }
}
