//! Diff/intersect result container.

use crate::group::KeyDiagnostic;

/// One of the two compared collections.
///
/// `New` is collection A, `Old` is collection B. Used to pick which side's
/// records are reported as the intersection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Side {
    /// Collection A
    #[default]
    New,
    /// Collection B
    Old,
}

/// Statistics from a diff operation
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct DiffStats {
    /// Records only in the new collection
    pub new_only: usize,
    /// Records only in the old collection
    pub old_only: usize,
    /// Records reported as the intersection
    pub intersect: usize,
    /// New records in no output: null key, empty or all-null flattened
    /// list, or failed extraction
    pub skipped_new: usize,
    /// Old records in no output, counted like `skipped_new`
    pub skipped_old: usize,
}

impl DiffStats {
    /// Total number of skipped records
    pub fn skipped(&self) -> usize {
        self.skipped_new + self.skipped_old
    }
}

/// Result of comparing a new and an old collection.
///
/// Records are borrowed from the compared slices.
#[derive(Debug)]
#[must_use]
pub struct DiffResult<'a, T> {
    diff_a: Vec<&'a T>,
    diff_b: Vec<&'a T>,
    intersect: Vec<&'a T>,
    stats: DiffStats,
    diagnostics_new: Vec<KeyDiagnostic>,
    diagnostics_old: Vec<KeyDiagnostic>,
}

impl<'a, T> DiffResult<'a, T> {
    pub(crate) fn new(diff_a: Vec<&'a T>, diff_b: Vec<&'a T>, intersect: Vec<&'a T>) -> Self {
        let stats = DiffStats {
            new_only: diff_a.len(),
            old_only: diff_b.len(),
            intersect: intersect.len(),
            ..DiffStats::default()
        };
        Self {
            diff_a,
            diff_b,
            intersect,
            stats,
            diagnostics_new: Vec::new(),
            diagnostics_old: Vec::new(),
        }
    }

    pub(crate) fn with_skipped(
        mut self,
        side: Side,
        skipped: usize,
        diagnostics: Vec<KeyDiagnostic>,
    ) -> Self {
        match side {
            Side::New => {
                self.stats.skipped_new = skipped;
                self.diagnostics_new = diagnostics;
            }
            Side::Old => {
                self.stats.skipped_old = skipped;
                self.diagnostics_old = diagnostics;
            }
        }
        self
    }

    /// Records only in the new collection (A).
    pub fn diff_a(&self) -> &[&'a T] {
        &self.diff_a
    }

    /// Records only in the old collection (B).
    pub fn diff_b(&self) -> &[&'a T] {
        &self.diff_b
    }

    /// Records present in both collections, taken from the preferred side.
    pub fn intersect(&self) -> &[&'a T] {
        &self.intersect
    }

    /// Counts of each output and of skipped records.
    pub fn stats(&self) -> DiffStats {
        self.stats
    }

    /// Key extraction failures on one side.
    pub fn diagnostics(&self, side: Side) -> &[KeyDiagnostic] {
        match side {
            Side::New => &self.diagnostics_new,
            Side::Old => &self.diagnostics_old,
        }
    }

    /// Check whether either collection has records not in the other.
    pub fn has_changes(&self) -> bool {
        !self.diff_a.is_empty() || !self.diff_b.is_empty()
    }

    /// Check whether any record was left out of all three outputs.
    pub fn is_partial(&self) -> bool {
        self.stats.skipped() > 0
    }

    /// Split into `(diff_a, diff_b, intersect)`.
    pub fn into_parts(self) -> (Vec<&'a T>, Vec<&'a T>, Vec<&'a T>) {
        (self.diff_a, self.diff_b, self.intersect)
    }

    /// Clone the records into owned `(diff_a, diff_b, intersect)`.
    pub fn cloned_parts(&self) -> (Vec<T>, Vec<T>, Vec<T>)
    where
        T: Clone,
    {
        (
            self.diff_a.iter().copied().cloned().collect(),
            self.diff_b.iter().copied().cloned().collect(),
            self.intersect.iter().copied().cloned().collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExtractError;
    use compact_str::CompactString;

    #[test]
    fn test_side_defaults_to_new() {
        assert_eq!(Side::default(), Side::New);
    }

    #[test]
    fn test_stats_follow_outputs() {
        let records = [1, 2, 3, 4];
        let result = DiffResult::new(
            vec![&records[0]],
            vec![&records[1], &records[2]],
            vec![&records[3]],
        );

        assert_eq!(
            result.stats(),
            DiffStats { new_only: 1, old_only: 2, intersect: 1, skipped_new: 0, skipped_old: 0 }
        );
        assert!(result.has_changes());
        assert!(!result.is_partial());
    }

    #[test]
    fn test_no_changes() {
        let records = [1];
        let result = DiffResult::new(Vec::new(), Vec::new(), vec![&records[0]]);
        assert!(!result.has_changes());
    }

    #[test]
    fn test_skipped_marks_partial() {
        let diagnostic = KeyDiagnostic {
            index: 0,
            extractor: CompactString::from("id"),
            error: ExtractError::missing("id"),
        };
        let result = DiffResult::<u8>::new(Vec::new(), Vec::new(), Vec::new())
            .with_skipped(Side::Old, 2, vec![diagnostic.clone()]);

        assert!(result.is_partial());
        assert_eq!(result.stats().skipped_old, 2);
        assert_eq!(result.stats().skipped(), 2);
        assert_eq!(result.diagnostics(Side::Old), &[diagnostic]);
        assert!(result.diagnostics(Side::New).is_empty());
    }

    #[test]
    fn test_parts() {
        let records = [String::from("a"), String::from("b")];
        let result = DiffResult::new(vec![&records[0]], vec![&records[1]], Vec::new());

        let (a, b, both) = result.cloned_parts();
        assert_eq!(a, vec!["a".to_string()]);
        assert_eq!(b, vec!["b".to_string()]);
        assert!(both.is_empty());

        let (a, _, _) = result.into_parts();
        assert!(std::ptr::eq(a[0], &records[0]));
    }

    #[test]
    fn test_result_is_send_sync() {
        static_assertions::assert_impl_all!(DiffResult<'static, String>: Send, Sync);
        static_assertions::assert_impl_all!(DiffStats: Send, Sync, Copy);
    }
}
