//! tola-setdiff - Keyed grouping and diff/intersect for record snapshots
//!
//! ## Core Concepts
//!
//! **Key extraction**: a [`KeyExtractor`] resolves the key a record is grouped
//! and compared under. Stock extractors wrap closures or look up a field of a
//! map-shaped record; failures are typed, not panics.
//!
//! **Two comparison modes**:
//! - hash mode ([`hash_diff`]) groups both collections by key and compares
//!   the key sets, O(|A| + |B|)
//! - comparator mode ([`iterate_diff`]) pairs records with an equivalence
//!   predicate, greedy first match, O(|A| * |B|)
//!
//! Both return a [`DiffResult`]: records only in the new collection (A), only
//! in the old collection (B), and in both (taken from the preferred [`Side`]).
//!
//! ## Modules
//! - `key`: `KeyExtractor` and the stock strategies
//! - `group`: grouping into an insertion-ordered key mapping
//! - `algo`: hash and comparator diff/intersect
//! - `result`: `DiffResult`, `DiffStats`, `Side`
//! - `error`: error types
//!
//! ## Usage
//!
//! ```
//! use tola_setdiff::prelude::*;
//!
//! #[derive(Debug, Clone, PartialEq)]
//! struct User { id: u32, name: &'static str }
//!
//! let synced = vec![User { id: 1, name: "ann" }, User { id: 2, name: "bob" }];
//! let fetched = vec![User { id: 2, name: "bobby" }, User { id: 3, name: "cy" }];
//!
//! let result = hash_diff(&fetched, &synced, &by("id", |u: &User| u.id), Side::New);
//!
//! assert_eq!(result.diff_a()[0].name, "cy");      // added
//! assert_eq!(result.diff_b()[0].name, "ann");     // removed
//! assert_eq!(result.intersect()[0].name, "bobby"); // kept, new copy
//! ```
//!
//! ## Logging
//!
//! Skipped records and diff summaries are reported through `tracing`. The
//! crate never installs a subscriber.

pub mod algo;
pub mod error;
pub mod group;
pub mod key;
pub mod prelude;
pub mod result;

// =============================================================================
// Re-exports
// =============================================================================

pub use algo::{
    contains_equivalent, hash_diff, hash_diff_with, iterate_diff, position_equivalent,
    remove_equivalent, try_iterate_diff,
};
pub use error::{ExtractError, SetDiffError};
pub use group::{group, group_by, GroupMapping, GroupOptions, KeyDiagnostic};
pub use key::{KeyExtractor, KeyValue};
pub use result::{DiffResult, DiffStats, Side};

// =============================================================================
// Tests
// =============================================================================
