//! Consistency between `analyzed_chapters` and `appearances`.

use crate::Profile;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

/// Differences between a profile's analyzed set and its appearances.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SyncReport {
    /// Recorded as analyzed but with no appearance
    pub missing_appearances: BTreeSet<usize>,
    /// Appearances not recorded as analyzed
    pub unrecorded_appearances: BTreeSet<usize>,
    /// Chapter indices with more than one appearance
    pub duplicate_appearances: BTreeSet<usize>,
    /// Appearances out of chapter order
    pub unsorted: bool,
}

impl SyncReport {
    /// Whether the profile is internally consistent.
    pub fn is_consistent(&self) -> bool {
        self.missing_appearances.is_empty()
            && self.unrecorded_appearances.is_empty()
            && self.duplicate_appearances.is_empty()
            && !self.unsorted
    }
}

impl Profile {
    /// Compare `analyzed_chapters` with the appearance records.
    ///
    /// # Examples
    ///
    /// ```
    /// use lorekeeper_core::{Appearance, Profile};
    ///
    /// let mut profile = Profile::new("Mei");
    /// profile.appearances.push(Appearance::new(2, "Three"));
    /// profile.analyzed_chapters.extend([2, 5]);
    ///
    /// let report = profile.sync_report();
    /// assert!(!report.is_consistent());
    /// assert!(report.missing_appearances.contains(&5));
    /// ```
    pub fn sync_report(&self) -> SyncReport {
        let mut seen = HashSet::new();
        let mut duplicate_appearances = BTreeSet::new();
        for appearance in &self.appearances {
            if !seen.insert(appearance.chapter_index) {
                duplicate_appearances.insert(appearance.chapter_index);
            }
        }
        let present = self.appearance_indices();
        SyncReport {
            missing_appearances: self
                .analyzed_chapters
                .difference(&present)
                .copied()
                .collect(),
            unrecorded_appearances: present
                .difference(&self.analyzed_chapters)
                .copied()
                .collect(),
            duplicate_appearances,
            unsorted: !self
                .appearances
                .windows(2)
                .all(|pair| pair[0].chapter_index <= pair[1].chapter_index),
        }
    }

    /// Bring `analyzed_chapters` back in line with the appearances.
    ///
    /// Keeps the first appearance per chapter, sorts them, recomputes the
    /// mention-only flags and sets `analyzed_chapters` to the appearance
    /// indices. Returns the report taken before repairing.
    pub fn repair(&mut self) -> SyncReport {
        let report = self.sync_report();
        if !report.is_consistent() {
            tracing::warn!(
                character = %self.name,
                missing = report.missing_appearances.len(),
                unrecorded = report.unrecorded_appearances.len(),
                duplicates = report.duplicate_appearances.len(),
                "Repairing desynchronized profile"
            );
        }

        let mut seen = HashSet::new();
        self.appearances
            .retain(|appearance| seen.insert(appearance.chapter_index));
        self.appearances.sort_by_key(|appearance| appearance.chapter_index);
        for appearance in &mut self.appearances {
            appearance.refresh_mention_flag();
        }
        self.analyzed_chapters = self.appearance_indices();
        report
    }
}
