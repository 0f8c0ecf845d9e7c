//! Comparator-based diff/intersect
//!
//! For records without a hashable key. Every old record is matched against
//! the new records with a caller-supplied equivalence predicate.
//!
//! # Algorithm
//!
//! For each record `b` of the old collection, in order, the first new record
//! `a` not yet matched for which `equivalent(a, b)` holds is consumed:
//!
//! - found: `a` (prefer `New`) or `b` (prefer `Old`) goes to `intersect`
//! - not found: `b` goes to `diff_b`
//!
//! New records never consumed form `diff_a`, in input order. Matching is
//! greedy: a new record matches at most one old record, and ties go to the
//! earliest new record.
//!
//! Neither input is modified; consumed records are tracked in a mask.
//!
//! # Complexity
//!
//! - Time: O(|A| * |B|) predicate calls in the worst case
//! - Space: O(|A|) for the mask

use std::convert::Infallible;

use crate::error::{BoxError, SetDiffError};
use crate::result::{DiffResult, Side};

/// Diff `new` against `old` with an equivalence predicate.
///
/// # Example
///
/// ```
/// use tola_setdiff::{iterate_diff, Side};
///
/// let new = [(1, "a"), (2, "b")];
/// let old = [(2, "b"), (3, "c")];
/// let result = iterate_diff(&new, &old, |x, y| x.0 == y.0, Side::New);
///
/// assert_eq!(result.diff_a(), &[&(1, "a")]);
/// assert_eq!(result.diff_b(), &[&(3, "c")]);
/// assert_eq!(result.intersect(), &[&(2, "b")]);
/// ```
pub fn iterate_diff<'a, T, F>(
    new: &'a [T],
    old: &'a [T],
    mut equivalent: F,
    prefer: Side,
) -> DiffResult<'a, T>
where
    F: FnMut(&T, &T) -> bool,
{
    match greedy_match(new, old, |a, b| Ok::<_, Infallible>(equivalent(a, b)), prefer) {
        Ok(result) => result,
        Err((_, _, never)) => match never {},
    }
}

/// Diff `new` against `old` with a fallible equivalence predicate.
///
/// The first predicate error aborts the diff; it is returned with the
/// indices of the two records being compared.
pub fn try_iterate_diff<'a, T, F, E>(
    new: &'a [T],
    old: &'a [T],
    equivalent: F,
    prefer: Side,
) -> Result<DiffResult<'a, T>, SetDiffError>
where
    F: FnMut(&T, &T) -> Result<bool, E>,
    E: Into<BoxError>,
{
    greedy_match(new, old, equivalent, prefer).map_err(|(new_index, old_index, err)| {
        let err = SetDiffError::comparator(new_index, old_index, err);
        tracing::debug!(error = %err, "comparator diff aborted");
        err
    })
}

fn greedy_match<'a, T, F, E>(
    new: &'a [T],
    old: &'a [T],
    mut equivalent: F,
    prefer: Side,
) -> Result<DiffResult<'a, T>, (usize, usize, E)>
where
    F: FnMut(&T, &T) -> Result<bool, E>,
{
    let mut consumed = vec![false; new.len()];
    let mut diff_b = Vec::new();
    let mut intersect = Vec::new();

    for (old_index, b) in old.iter().enumerate() {
        let mut hit = None;
        for (new_index, a) in new.iter().enumerate() {
            if consumed[new_index] {
                continue;
            }
            if equivalent(a, b).map_err(|err| (new_index, old_index, err))? {
                hit = Some(new_index);
                break;
            }
        }

        match hit {
            Some(new_index) => {
                consumed[new_index] = true;
                intersect.push(match prefer {
                    Side::New => &new[new_index],
                    Side::Old => b,
                });
            }
            None => diff_b.push(b),
        }
    }

    let diff_a = new
        .iter()
        .zip(&consumed)
        .filter_map(|(a, &used)| (!used).then_some(a))
        .collect();

    let result = DiffResult::new(diff_a, diff_b, intersect);
    let stats = result.stats();
    tracing::trace!(
        mode = "iterate",
        new_only = stats.new_only,
        old_only = stats.old_only,
        intersect = stats.intersect,
        "diff complete"
    );
    Ok(result)
}

// =============================================================================
// Predicate helpers
// =============================================================================

/// Check whether any record is equivalent to `entity`.
pub fn contains_equivalent<T, F>(records: &[T], entity: &T, equivalent: F) -> bool
where
    F: FnMut(&T, &T) -> bool,
{
    position_equivalent(records, entity, equivalent).is_some()
}

/// Position of the first record equivalent to `entity`.
pub fn position_equivalent<T, F>(records: &[T], entity: &T, mut equivalent: F) -> Option<usize>
where
    F: FnMut(&T, &T) -> bool,
{
    records.iter().position(|record| equivalent(record, entity))
}

/// Remove every record equivalent to `entity`, returning how many were
/// removed.
pub fn remove_equivalent<T, F>(records: &mut Vec<T>, entity: &T, mut equivalent: F) -> usize
where
    F: FnMut(&T, &T) -> bool,
{
    let before = records.len();
    records.retain(|record| !equivalent(record, entity));
    before - records.len()
}
