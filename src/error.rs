//! Error types for tola-setdiff.
//!
//! Key extraction failures are recovered by the grouper and never reach the
//! caller as errors. Comparator failures are fatal and returned as
//! [`SetDiffError`].

use compact_str::CompactString;
use thiserror::Error;

/// Boxed error produced by a caller-supplied predicate.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A key extractor could not resolve a key for a record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    /// The record has no field the extractor needs
    #[error("missing field `{0}`")]
    MissingField(CompactString),

    /// Extraction failed for any other reason
    #[error("key extraction failed: {0}")]
    Failed(String),
}

impl ExtractError {
    /// Create a missing-field error.
    pub fn missing(field: impl Into<CompactString>) -> Self {
        Self::MissingField(field.into())
    }

    /// Create a failure with a message.
    pub fn failed(msg: impl Into<String>) -> Self {
        Self::Failed(msg.into())
    }

    /// Create a failure from any error type.
    pub fn from_error(err: impl std::error::Error) -> Self {
        Self::Failed(err.to_string())
    }
}

/// Errors returned by the diff engines.
#[derive(Debug, Error)]
pub enum SetDiffError {
    /// The equivalence predicate failed while comparing two records
    #[error("comparator failed on new[{new_index}] vs old[{old_index}]: {source}")]
    Comparator {
        /// Index of the record in the new collection
        new_index: usize,
        /// Index of the record in the old collection
        old_index: usize,
        /// Error returned by the predicate
        #[source]
        source: BoxError,
    },
}

impl SetDiffError {
    /// Create a comparator error from any predicate error.
    pub fn comparator(new_index: usize, old_index: usize, source: impl Into<BoxError>) -> Self {
        Self::Comparator {
            new_index,
            old_index,
            source: source.into(),
        }
    }
}
