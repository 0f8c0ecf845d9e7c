//! Hash-based diff/intersect
//!
//! Groups both collections by key, then walks the key union.
//!
//! # Algorithm
//!
//! 1. Group the new (A) and old (B) collections with the same extractor
//! 2. For every key in either grouping:
//!    - absent or empty in A: B's records go to `diff_b`
//!    - absent or empty in B: A's records go to `diff_a`
//!    - otherwise the preferred side's records go to `intersect`
//!
//! The union is walked as A's keys in first-occurrence order followed by the
//! B-only keys in first-occurrence order. Records keep their group order.
//!
//! # Complexity
//!
//! - Time: O(|A| + |B|) expected
//! - Space: O(|A| + |B|) for the two groupings
//!
//! # Dropped records
//!
//! Records whose key is null or fails to resolve, or that flatten to an
//! empty or all-null list, appear in no output. They are counted in
//! [`DiffStats`](crate::result::DiffStats) and make
//! [`DiffResult::is_partial`] return true.

use crate::group::{group, GroupMapping, GroupOptions};
use crate::key::KeyExtractor;
use crate::result::{DiffResult, Side};

/// Diff `new` against `old` by key, using the default grouping options.
///
/// # Example
///
/// ```
/// use tola_setdiff::{hash_diff, key::by, Side};
///
/// let new = [1, 2];
/// let old = [2, 3];
/// let result = hash_diff(&new, &old, &by("n", |n: &i32| *n), Side::New);
///
/// assert_eq!(result.diff_a(), &[&1]);
/// assert_eq!(result.diff_b(), &[&3]);
/// assert_eq!(result.intersect(), &[&2]);
/// ```
pub fn hash_diff<'a, T, E>(
    new: &'a [T],
    old: &'a [T],
    extractor: &E,
    prefer: Side,
) -> DiffResult<'a, T>
where
    E: KeyExtractor<T> + ?Sized,
{
    hash_diff_with(new, old, extractor, prefer, GroupOptions::default())
}

/// Diff `new` against `old` by key, grouping both sides with `options`.
///
/// With `flatten` enabled a record can land in several outputs, once per
/// element of its key.
pub fn hash_diff_with<'a, T, E>(
    new: &'a [T],
    old: &'a [T],
    extractor: &E,
    prefer: Side,
    options: GroupOptions,
) -> DiffResult<'a, T>
where
    E: KeyExtractor<T> + ?Sized,
{
    let groups_a = group(new, extractor, options);
    let groups_b = group(old, extractor, options);

    let mut diff_a = Vec::new();
    let mut diff_b = Vec::new();
    let mut intersect = Vec::new();

    for (key, records_a) in groups_a.iter() {
        if records_a.is_empty() {
            continue;
        }
        match groups_b.get(key) {
            Some(records_b) if !records_b.is_empty() => match prefer {
                Side::New => intersect.extend_from_slice(records_a),
                Side::Old => intersect.extend_from_slice(records_b),
            },
            _ => diff_a.extend_from_slice(records_a),
        }
    }

    for (key, records_b) in groups_b.iter() {
        let in_a = groups_a.get(key).is_some_and(|records_a| !records_a.is_empty());
        if !in_a {
            diff_b.extend_from_slice(records_b);
        }
    }

    finish(DiffResult::new(diff_a, diff_b, intersect), groups_a, groups_b)
}

fn finish<'a, T, K>(
    result: DiffResult<'a, T>,
    groups_a: GroupMapping<'a, T, K>,
    groups_b: GroupMapping<'a, T, K>,
) -> DiffResult<'a, T> {
    let skipped_new = groups_a.skipped();
    let skipped_old = groups_b.skipped();
    let (_, diagnostics_new) = groups_a.into_parts();
    let (_, diagnostics_old) = groups_b.into_parts();

    let result = result
        .with_skipped(Side::New, skipped_new, diagnostics_new)
        .with_skipped(Side::Old, skipped_old, diagnostics_old);

    let stats = result.stats();
    tracing::trace!(
        mode = "hash",
        new_only = stats.new_only,
        old_only = stats.old_only,
        intersect = stats.intersect,
        "diff complete"
    );
    if result.is_partial() {
        tracing::debug!(
            skipped_new = stats.skipped_new,
            skipped_old = stats.skipped_old,
            "diff is partial: records without a resolvable key were left out"
        );
    }

    result
}
