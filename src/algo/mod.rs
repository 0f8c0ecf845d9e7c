//! Diff/intersect algorithms.
//!
//! - `hash`: key-hash comparison, O(|A| + |B|)
//! - `iterate`: pairwise predicate comparison, O(|A| * |B|)

mod hash;
mod iterate;

pub use hash::{hash_diff, hash_diff_with};
pub use iterate::{
    contains_equivalent, iterate_diff, position_equivalent, remove_equivalent, try_iterate_diff,
};
