//! Key grouping
//!
//! Groups a collection of records into an insertion-ordered one-to-many
//! mapping from [`KeyValue`] to the records sharing it.
//!
//! # Ordering
//!
//! - Groups appear in order of the first record that produced their key.
//! - Records inside a group keep their input order.
//!
//! # Skipped records
//!
//! A record is left out when none of its keys lands in a group: its key is
//! null (and null keys are ignored), it flattens to an empty or all-null
//! list, or the extractor fails. Failures never abort the grouping:
//! each one is recorded as a [`KeyDiagnostic`] on the returned mapping and
//! emitted as a `tracing` debug event.
//!
//! # Example
//!
//! ```
//! use tola_setdiff::group::{group, GroupOptions};
//! use tola_setdiff::key::by_list;
//!
//! struct Post { title: &'static str, tags: Vec<&'static str> }
//!
//! let posts = [
//!     Post { title: "a", tags: vec!["rust", "diff"] },
//!     Post { title: "b", tags: vec!["rust"] },
//! ];
//! let tags = by_list("tags", |p: &Post| p.tags.clone());
//! let groups = group(&posts, &tags, GroupOptions::flattened());
//!
//! assert_eq!(groups.get_scalar(&"rust").map(<[_]>::len), Some(2));
//! assert_eq!(groups.get_scalar(&"diff").map(<[_]>::len), Some(1));
//! ```

use compact_str::CompactString;
use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;
use smallvec::SmallVec;

use crate::error::ExtractError;
use crate::key::{KeyExtractor, KeyValue, ScalarRef};

// =============================================================================
// Options
// =============================================================================

/// Grouping behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupOptions {
    /// Skip records whose key resolves to null.
    /// Default: true
    pub ignore_null_key: bool,
    /// Register a record under every element of a list-typed key.
    /// Default: false
    pub flatten: bool,
}

impl Default for GroupOptions {
    fn default() -> Self {
        Self {
            ignore_null_key: true,
            flatten: false,
        }
    }
}

impl GroupOptions {
    /// Create options with explicit flags.
    pub fn new(ignore_null_key: bool, flatten: bool) -> Self {
        Self { ignore_null_key, flatten }
    }

    /// Default options, but null keys form their own group.
    pub fn keep_null() -> Self {
        Self::default().with_ignore_null_key(false)
    }

    /// Default options, but list keys are flattened.
    pub fn flattened() -> Self {
        Self::default().with_flatten(true)
    }

    /// Set whether null keys are skipped.
    pub fn with_ignore_null_key(mut self, ignore: bool) -> Self {
        self.ignore_null_key = ignore;
        self
    }

    /// Set whether list keys are flattened.
    pub fn with_flatten(mut self, flatten: bool) -> Self {
        self.flatten = flatten;
        self
    }
}

// =============================================================================
// Diagnostics
// =============================================================================

/// A record skipped because its key could not be extracted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyDiagnostic {
    /// Position of the record in the input collection
    pub index: usize,
    /// Name of the extractor that failed
    pub extractor: CompactString,
    /// Why extraction failed
    pub error: ExtractError,
}

impl std::fmt::Display for KeyDiagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "record {} skipped by `{}`: {}", self.index, self.extractor, self.error)
    }
}

// =============================================================================
// GroupMapping
// =============================================================================

/// Records sharing a key. Most groups hold one or two records.
pub type Group<'a, T> = SmallVec<[&'a T; 2]>;

type GroupMap<'a, T, K> = IndexMap<KeyValue<K>, Group<'a, T>, FxBuildHasher>;

/// Insertion-ordered mapping from key to the records sharing it.
#[derive(Debug)]
#[must_use]
pub struct GroupMapping<'a, T, K> {
    groups: GroupMap<'a, T, K>,
    diagnostics: Vec<KeyDiagnostic>,
    null_skipped: usize,
    ungrouped: usize,
}

impl<T, K> Default for GroupMapping<'_, T, K> {
    fn default() -> Self {
        Self {
            groups: IndexMap::default(),
            diagnostics: Vec::new(),
            null_skipped: 0,
            ungrouped: 0,
        }
    }
}

impl<'a, T, K: Eq + std::hash::Hash> GroupMapping<'a, T, K> {
    /// Records grouped under `key`.
    pub fn get(&self, key: &KeyValue<K>) -> Option<&[&'a T]> {
        self.groups.get(key).map(SmallVec::as_slice)
    }

    /// Records grouped under the scalar key `key`.
    pub fn get_scalar(&self, key: &K) -> Option<&[&'a T]> {
        self.groups.get(&ScalarRef(key)).map(SmallVec::as_slice)
    }

    /// Check whether a group exists for `key`.
    pub fn contains_key(&self, key: &KeyValue<K>) -> bool {
        self.groups.contains_key(key)
    }

    /// Returns whether the record joined a group.
    fn insert(&mut self, key: KeyValue<K>, record: &'a T, ignore_null_key: bool) -> bool {
        if ignore_null_key && key.is_null() {
            self.null_skipped += 1;
            return false;
        }
        self.groups.entry(key).or_default().push(record);
        true
    }
}

impl<'a, T, K> GroupMapping<'a, T, K> {
    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Check if no record was grouped.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Keys in first-occurrence order.
    pub fn keys(&self) -> impl Iterator<Item = &KeyValue<K>> {
        self.groups.keys()
    }

    /// Groups in first-occurrence order.
    pub fn iter(&self) -> impl Iterator<Item = (&KeyValue<K>, &[&'a T])> {
        self.groups.iter().map(|(key, records)| (key, records.as_slice()))
    }

    /// Extraction failures, in input order.
    pub fn diagnostics(&self) -> &[KeyDiagnostic] {
        &self.diagnostics
    }

    /// Number of null keys skipped.
    ///
    /// A flattened record counts once per null element, even when its other
    /// elements were grouped.
    pub fn null_keys_skipped(&self) -> usize {
        self.null_skipped
    }

    /// Number of records left out of every group.
    pub fn skipped(&self) -> usize {
        self.ungrouped + self.diagnostics.len()
    }

    /// Split into the raw map and the diagnostics.
    pub fn into_parts(self) -> (GroupMap<'a, T, K>, Vec<KeyDiagnostic>) {
        (self.groups, self.diagnostics)
    }
}

impl<'m, 'a, T, K> IntoIterator for &'m GroupMapping<'a, T, K> {
    type Item = (&'m KeyValue<K>, &'m Group<'a, T>);
    type IntoIter = indexmap::map::Iter<'m, KeyValue<K>, Group<'a, T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.iter()
    }
}

// =============================================================================
// Grouping
// =============================================================================

/// Group `records` by the key `extractor` resolves for each of them.
pub fn group<'a, T, E>(
    records: &'a [T],
    extractor: &E,
    options: GroupOptions,
) -> GroupMapping<'a, T, E::Key>
where
    E: KeyExtractor<T> + ?Sized,
{
    let mut mapping: GroupMapping<'a, T, E::Key> = GroupMapping::default();

    for (index, record) in records.iter().enumerate() {
        let value = match extractor.extract(record) {
            Ok(value) => value,
            Err(error) => {
                tracing::debug!(
                    extractor = extractor.name(),
                    index,
                    error = %error,
                    "skipping record: key extraction failed"
                );
                mapping.diagnostics.push(KeyDiagnostic {
                    index,
                    extractor: CompactString::from(extractor.name()),
                    error,
                });
                continue;
            }
        };

        let grouped = match value {
            KeyValue::List(items) if options.flatten => {
                let mut grouped = false;
                for item in items {
                    let key = KeyValue::from(item);
                    grouped |= mapping.insert(key, record, options.ignore_null_key);
                }
                grouped
            }
            key => mapping.insert(key, record, options.ignore_null_key),
        };
        if !grouped {
            mapping.ungrouped += 1;
        }
    }

    tracing::trace!(
        extractor = extractor.name(),
        records = records.len(),
        groups = mapping.len(),
        null_skipped = mapping.null_skipped,
        ungrouped = mapping.ungrouped,
        failures = mapping.diagnostics.len(),
        "grouped records"
    );

    mapping
}

/// Group `records` with the default options (null keys ignored, lists not
/// flattened).
pub fn group_by<'a, T, E>(records: &'a [T], extractor: &E) -> GroupMapping<'a, T, E::Key>
where
    E: KeyExtractor<T> + ?Sized,
{
    group(records, extractor, GroupOptions::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::{by, by_list, by_optional, try_by};
    use smallvec::smallvec;

    #[derive(Debug, PartialEq)]
    struct Rec {
        id: u32,
        team: Option<&'static str>,
        tags: Vec<Option<&'static str>>,
    }

    fn rec(id: u32, team: Option<&'static str>) -> Rec {
        Rec { id, team, tags: Vec::new() }
    }

    fn ids(records: &[&Rec]) -> Vec<u32> {
        records.iter().map(|r| r.id).collect()
    }

    fn tagged(id: u32, tags: Vec<Option<&'static str>>) -> Rec {
        Rec { id, team: None, tags }
    }

    fn tags() -> impl KeyExtractor<Rec, Key = &'static str> {
        try_by("tags", |r: &Rec| Ok(KeyValue::List(r.tags.iter().copied().collect())))
    }

    #[test]
    fn test_empty_input() {
        let records: Vec<Rec> = Vec::new();
        let groups = group_by(&records, &by("id", |r: &Rec| r.id));
        assert!(groups.is_empty());
        assert_eq!(groups.skipped(), 0);
    }

    #[test]
    fn test_groups_preserve_first_occurrence_order() {
        let records = [
            rec(1, Some("b")),
            rec(2, Some("a")),
            rec(3, Some("b")),
            rec(4, Some("c")),
            rec(5, Some("a")),
        ];
        let groups = group_by(&records, &by_optional("team", |r: &Rec| r.team));

        let keys: Vec<_> = groups.keys().cloned().collect();
        assert_eq!(
            keys,
            vec![KeyValue::Scalar("b"), KeyValue::Scalar("a"), KeyValue::Scalar("c")]
        );
        assert_eq!(ids(groups.get_scalar(&"b").unwrap()), vec![1, 3]);
        assert_eq!(ids(groups.get_scalar(&"a").unwrap()), vec![2, 5]);
        assert_eq!(ids(groups.get_scalar(&"c").unwrap()), vec![4]);
    }

    #[test]
    fn test_ignore_null_key() {
        let records = [rec(1, None), rec(2, Some("a")), rec(3, None)];
        let groups = group_by(&records, &by_optional("team", |r: &Rec| r.team));

        assert_eq!(groups.len(), 1);
        assert!(!groups.contains_key(&KeyValue::Null));
        assert_eq!(groups.null_keys_skipped(), 2);
        assert_eq!(groups.skipped(), 2);
    }

    #[test]
    fn test_keep_null_key() {
        let records = [rec(1, None), rec(2, Some("a")), rec(3, None)];
        let team = by_optional("team", |r: &Rec| r.team);
        let groups = group(&records, &team, GroupOptions::keep_null());

        assert_eq!(groups.len(), 2);
        assert_eq!(ids(groups.get(&KeyValue::Null).unwrap()), vec![1, 3]);
        assert_eq!(groups.keys().next(), Some(&KeyValue::Null));
        assert_eq!(groups.null_keys_skipped(), 0);
    }

    #[test]
    fn test_flatten_registers_record_under_each_element() {
        let records = [
            Rec { id: 1, team: None, tags: vec![Some("x"), Some("y")] },
            Rec { id: 2, team: None, tags: vec![Some("y")] },
        ];
        let extractor = tags();
        let groups = group(&records, &extractor, GroupOptions::flattened());

        assert_eq!(ids(groups.get_scalar(&"x").unwrap()), vec![1]);
        assert_eq!(ids(groups.get_scalar(&"y").unwrap()), vec![1, 2]);
        assert_eq!(groups.len(), 2);
    }

    #[test]
    fn test_flatten_skips_null_elements() {
        let records = [Rec { id: 1, team: None, tags: vec![Some("x"), None] }];
        let extractor = tags();

        let groups = group(&records, &extractor, GroupOptions::flattened());
        assert_eq!(groups.len(), 1);
        assert_eq!(groups.null_keys_skipped(), 1);
        assert_eq!(groups.skipped(), 0);

        let groups = group(&records, &extractor, GroupOptions::new(false, true));
        assert_eq!(groups.len(), 2);
        assert_eq!(ids(groups.get(&KeyValue::Null).unwrap()), vec![1]);
    }

    #[test]
    fn test_flatten_counts_ungrouped_records_once() {
        let records = [
            tagged(1, vec![]),
            tagged(2, vec![None, None]),
            tagged(3, vec![Some("x"), None, None]),
        ];

        let groups = group(&records, &tags(), GroupOptions::flattened());
        assert_eq!(groups.len(), 1);
        assert_eq!(ids(groups.get_scalar(&"x").unwrap()), vec![3]);
        assert_eq!(groups.null_keys_skipped(), 4);
        assert_eq!(groups.skipped(), 2);

        // Kept nulls still leave the empty list with nowhere to go.
        let groups = group(&records, &tags(), GroupOptions::new(false, true));
        assert_eq!(ids(groups.get(&KeyValue::Null).unwrap()), vec![2, 2, 3, 3]);
        assert_eq!(groups.skipped(), 1);
    }

    #[test]
    fn test_unflattened_list_is_one_key() {
        let records = [
            Rec { id: 1, team: None, tags: vec![Some("x"), Some("y")] },
            Rec { id: 2, team: None, tags: vec![Some("x"), Some("y")] },
            Rec { id: 3, team: None, tags: vec![Some("y")] },
        ];
        let extractor = by_list("tags", |r: &Rec| {
            r.tags.iter().flatten().copied().collect::<Vec<_>>()
        });
        let groups = group_by(&records, &extractor);

        assert_eq!(groups.len(), 2);
        let pair = KeyValue::List(smallvec![Some("x"), Some("y")]);
        assert_eq!(ids(groups.get(&pair).unwrap()), vec![1, 2]);
        assert!(groups.get_scalar(&"x").is_none());
    }

    #[test]
    fn test_extraction_failure_skips_record_and_continues() {
        let records = [rec(1, Some("a")), rec(2, Some("a")), rec(3, Some("b"))];
        let extractor = try_by("team", |r: &Rec| {
            if r.id == 2 {
                Err(ExtractError::failed("corrupt"))
            } else {
                Ok(KeyValue::from(r.team))
            }
        });
        let groups = group_by(&records, &extractor);

        assert_eq!(ids(groups.get_scalar(&"a").unwrap()), vec![1]);
        assert_eq!(ids(groups.get_scalar(&"b").unwrap()), vec![3]);
        assert_eq!(
            groups.diagnostics(),
            &[KeyDiagnostic {
                index: 1,
                extractor: CompactString::from("team"),
                error: ExtractError::failed("corrupt"),
            }]
        );
        assert_eq!(groups.skipped(), 1);
        assert_eq!(
            groups.diagnostics()[0].to_string(),
            "record 1 skipped by `team`: key extraction failed: corrupt"
        );
    }

    #[test]
    fn test_iter_and_into_parts() {
        let records = [rec(1, Some("a")), rec(2, Some("b"))];
        let groups = group_by(&records, &by("id", |r: &Rec| r.id));

        let collected: Vec<_> = groups.iter().map(|(k, rs)| (k.clone(), rs.len())).collect();
        assert_eq!(collected, vec![(KeyValue::Scalar(1), 1), (KeyValue::Scalar(2), 1)]);
        assert_eq!((&groups).into_iter().count(), 2);

        let (map, diagnostics) = groups.into_parts();
        assert_eq!(map.len(), 2);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_options_builders() {
        assert_eq!(GroupOptions::default(), GroupOptions::new(true, false));
        assert_eq!(GroupOptions::keep_null(), GroupOptions::new(false, false));
        assert_eq!(GroupOptions::flattened(), GroupOptions::new(true, true));
        assert_eq!(
            GroupOptions::default().with_flatten(true).with_ignore_null_key(false),
            GroupOptions::new(false, true)
        );
    }
}
