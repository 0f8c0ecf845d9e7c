//! Prelude module for common imports.
//!
//! ```
//! use tola_setdiff::prelude::*;
//! ```

// Key strategies
pub use crate::key::{by, by_list, by_optional, field, try_by, KeyExtractor, KeyValue};

// Grouping
pub use crate::group::{group, group_by, GroupMapping, GroupOptions, KeyDiagnostic};

// Algorithms
pub use crate::algo::{
    contains_equivalent, hash_diff, hash_diff_with, iterate_diff, position_equivalent,
    remove_equivalent, try_iterate_diff,
};

// Results
pub use crate::result::{DiffResult, DiffStats, Side};

// Errors
pub use crate::error::{ExtractError, SetDiffError};
