//! Coverage sampling of found chapters.

use std::collections::BTreeSet;

/// Reduce found chapters to at most `max_count`, spread over the whole range.
///
/// When `found` fits it is returned unchanged. Otherwise the first and last
/// found chapters are always kept and the remaining `max_count - 2` slots
/// take the chapters at positions `round(i * len / max_count)` for
/// `i = 1..=max_count - 2`. The result is ascending without duplicates.
/// Positions exactly halfway between two chapters round up (away from zero).
///
/// # Examples
///
/// ```
/// use lorekeeper_analysis::sample_chapters;
///
/// assert_eq!(sample_chapters(&[2, 4, 6, 8], 2), vec![2, 8]);
/// assert_eq!(sample_chapters(&[2, 4, 6, 8], 10), vec![2, 4, 6, 8]);
/// assert_eq!(sample_chapters(&(0..100).collect::<Vec<_>>(), 5), vec![0, 20, 40, 60, 99]);
/// ```
pub fn sample_chapters(found: &[usize], max_count: usize) -> Vec<usize> {
    let total = found.len();
    if total <= max_count {
        return found.to_vec();
    }
    match max_count {
        0 => return Vec::new(),
        1 => return vec![found[0]],
        _ => {}
    }

    let mut sampled = BTreeSet::from([found[0], found[total - 1]]);
    for i in 1..=max_count - 2 {
        let position = (i as f64 * total as f64 / max_count as f64).round() as usize;
        sampled.insert(found[position.min(total - 1)]);
    }

    tracing::info!(
        found = total,
        sampled = sampled.len(),
        first = found[0],
        last = found[total - 1],
        "Sampled chapters for analysis"
    );
    sampled.into_iter().collect()
}
