//! Key extraction strategies
//!
//! A [`KeyExtractor`] maps a record to the [`KeyValue`] it is grouped and
//! compared under. Extraction is statically typed: callers hand in a closure
//! (or a map-field lookup) instead of naming a getter at runtime.
//!
//! # Stock strategies
//!
//! | Constructor | Closure | Resolves to |
//! |-------------|---------|-------------|
//! | [`by`] | `Fn(&T) -> K` | `Scalar` |
//! | [`by_optional`] | `Fn(&T) -> Option<K>` | `Scalar` or `Null` |
//! | [`by_list`] | `Fn(&T) -> impl IntoIterator<Item = K>` | `List` |
//! | [`try_by`] | `Fn(&T) -> Result<KeyValue<K>, ExtractError>` | anything |
//! | [`field`] | lookup in a `String`-keyed map record | `Scalar` or `Null` |
//!
//! # Example
//!
//! ```
//! use tola_setdiff::key::{by, KeyExtractor, KeyValue};
//!
//! struct User { id: u32 }
//!
//! let key = by("id", |u: &User| u.id);
//! assert_eq!(key.extract(&User { id: 7 }), Ok(KeyValue::Scalar(7)));
//! assert_eq!(key.name(), "id");
//! ```

use std::collections::{BTreeMap, HashMap};
use std::hash::{BuildHasher, Hash, Hasher};
use std::marker::PhantomData;

use compact_str::CompactString;
use indexmap::{Equivalent, IndexMap};
use smallvec::SmallVec;

use crate::error::ExtractError;

// =============================================================================
// KeyValue
// =============================================================================

/// Elements of a list-typed key. Inline up to four elements.
pub type KeyList<K> = SmallVec<[Option<K>; 4]>;

/// The key a record resolves to.
///
/// Also the key type of a [`GroupMapping`](crate::group::GroupMapping): a
/// `Null` group exists when null keys are kept, and an unflattened list is
/// grouped as one key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyValue<K> {
    /// No key
    Null,
    /// A single key
    Scalar(K),
    /// A list-typed key; elements may be null
    List(KeyList<K>),
}

impl<K> KeyValue<K> {
    /// Check if this is the null key
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Get the scalar key, if this is one
    #[inline]
    pub fn as_scalar(&self) -> Option<&K> {
        match self {
            Self::Scalar(key) => Some(key),
            _ => None,
        }
    }

    /// Build a list key from non-null elements
    pub fn list(items: impl IntoIterator<Item = K>) -> Self {
        Self::List(items.into_iter().map(Some).collect())
    }
}

impl<K> From<Option<K>> for KeyValue<K> {
    fn from(key: Option<K>) -> Self {
        key.map_or(Self::Null, Self::Scalar)
    }
}

// Tags are written by hand so `Scalar` lookups can hash a borrowed key the
// same way (see `ScalarRef`).
const TAG_NULL: u8 = 0;
const TAG_SCALAR: u8 = 1;
const TAG_LIST: u8 = 2;

impl<K: Hash> Hash for KeyValue<K> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Self::Null => state.write_u8(TAG_NULL),
            Self::Scalar(key) => {
                state.write_u8(TAG_SCALAR);
                key.hash(state);
            }
            Self::List(items) => {
                state.write_u8(TAG_LIST);
                items.hash(state);
            }
        }
    }
}

/// Borrowed scalar key, hashed identically to `KeyValue::Scalar`.
pub(crate) struct ScalarRef<'q, K>(pub(crate) &'q K);

impl<K: Hash> Hash for ScalarRef<'_, K> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u8(TAG_SCALAR);
        self.0.hash(state);
    }
}

impl<K: Eq> Equivalent<KeyValue<K>> for ScalarRef<'_, K> {
    fn equivalent(&self, key: &KeyValue<K>) -> bool {
        key.as_scalar() == Some(self.0)
    }
}

// =============================================================================
// KeyExtractor
// =============================================================================

/// Resolves the key of a record.
pub trait KeyExtractor<T: ?Sized> {
    /// Key type. Equal keys must hash identically.
    type Key: Eq + Hash;

    /// Resolve the key of `record`.
    ///
    /// An `Err` makes the grouper skip the record and record a diagnostic.
    fn extract(&self, record: &T) -> Result<KeyValue<Self::Key>, ExtractError>;

    /// Name used in diagnostics.
    fn name(&self) -> &str {
        "key"
    }
}

impl<T: ?Sized, E: KeyExtractor<T> + ?Sized> KeyExtractor<T> for &E {
    type Key = E::Key;

    #[inline]
    fn extract(&self, record: &T) -> Result<KeyValue<Self::Key>, ExtractError> {
        (**self).extract(record)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

// =============================================================================
// Closure-backed accessors
// =============================================================================

/// Scalar accessor. See [`by`].
#[derive(Clone, Copy)]
pub struct Accessor<F, K> {
    name: &'static str,
    f: F,
    _key: PhantomData<fn() -> K>,
}

/// Key every record by `f(record)`.
pub fn by<T: ?Sized, K, F>(name: &'static str, f: F) -> Accessor<F, K>
where
    F: Fn(&T) -> K,
{
    Accessor { name, f, _key: PhantomData }
}

impl<T: ?Sized, K, F> KeyExtractor<T> for Accessor<F, K>
where
    F: Fn(&T) -> K,
    K: Eq + Hash,
{
    type Key = K;

    #[inline]
    fn extract(&self, record: &T) -> Result<KeyValue<K>, ExtractError> {
        Ok(KeyValue::Scalar((self.f)(record)))
    }

    fn name(&self) -> &str {
        self.name
    }
}

/// Nullable accessor. See [`by_optional`].
#[derive(Clone, Copy)]
pub struct OptionalAccessor<F, K> {
    name: &'static str,
    f: F,
    _key: PhantomData<fn() -> K>,
}

/// Key records by `f(record)`; `None` resolves to [`KeyValue::Null`].
pub fn by_optional<T: ?Sized, K, F>(name: &'static str, f: F) -> OptionalAccessor<F, K>
where
    F: Fn(&T) -> Option<K>,
{
    OptionalAccessor { name, f, _key: PhantomData }
}

impl<T: ?Sized, K, F> KeyExtractor<T> for OptionalAccessor<F, K>
where
    F: Fn(&T) -> Option<K>,
    K: Eq + Hash,
{
    type Key = K;

    #[inline]
    fn extract(&self, record: &T) -> Result<KeyValue<K>, ExtractError> {
        Ok((self.f)(record).into())
    }

    fn name(&self) -> &str {
        self.name
    }
}

/// List accessor. See [`by_list`].
#[derive(Clone, Copy)]
pub struct ListAccessor<F, I> {
    name: &'static str,
    f: F,
    _iter: PhantomData<fn() -> I>,
}

/// Key records by a list of keys.
///
/// The list is one key unless the grouper flattens it, in which case the
/// record joins one group per element.
pub fn by_list<T: ?Sized, I, F>(name: &'static str, f: F) -> ListAccessor<F, I>
where
    F: Fn(&T) -> I,
    I: IntoIterator,
{
    ListAccessor { name, f, _iter: PhantomData }
}

impl<T: ?Sized, I, F> KeyExtractor<T> for ListAccessor<F, I>
where
    F: Fn(&T) -> I,
    I: IntoIterator,
    I::Item: Eq + Hash,
{
    type Key = I::Item;

    fn extract(&self, record: &T) -> Result<KeyValue<I::Item>, ExtractError> {
        Ok(KeyValue::list((self.f)(record)))
    }

    fn name(&self) -> &str {
        self.name
    }
}

/// Fallible accessor. See [`try_by`].
#[derive(Clone, Copy)]
pub struct TryAccessor<F, K> {
    name: &'static str,
    f: F,
    _key: PhantomData<fn() -> K>,
}

/// Key records by a closure that may fail or return any [`KeyValue`].
pub fn try_by<T: ?Sized, K, F>(name: &'static str, f: F) -> TryAccessor<F, K>
where
    F: Fn(&T) -> Result<KeyValue<K>, ExtractError>,
{
    TryAccessor { name, f, _key: PhantomData }
}

impl<T: ?Sized, K, F> KeyExtractor<T> for TryAccessor<F, K>
where
    F: Fn(&T) -> Result<KeyValue<K>, ExtractError>,
    K: Eq + Hash,
{
    type Key = K;

    #[inline]
    fn extract(&self, record: &T) -> Result<KeyValue<K>, ExtractError> {
        (self.f)(record)
    }

    fn name(&self) -> &str {
        self.name
    }
}

impl<F, K> std::fmt::Debug for Accessor<F, K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Accessor").field(&self.name).finish()
    }
}

impl<F, K> std::fmt::Debug for OptionalAccessor<F, K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("OptionalAccessor").field(&self.name).finish()
    }
}

impl<F, I> std::fmt::Debug for ListAccessor<F, I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ListAccessor").field(&self.name).finish()
    }
}

impl<F, K> std::fmt::Debug for TryAccessor<F, K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("TryAccessor").field(&self.name).finish()
    }
}

// =============================================================================
// Map records
// =============================================================================

/// Looks a field up in map-shaped records. See [`field`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapField {
    field: CompactString,
}

/// Key map records (`HashMap`, `BTreeMap`, `IndexMap` with `String` keys) by
/// the value stored under `name`. An absent entry resolves to
/// [`KeyValue::Null`].
pub fn field(name: impl Into<CompactString>) -> MapField {
    MapField { field: name.into() }
}

impl MapField {
    /// The looked-up field name
    pub fn as_str(&self) -> &str {
        &self.field
    }

    #[inline]
    fn resolve<V: Clone>(value: Option<&V>) -> Result<KeyValue<V>, ExtractError> {
        Ok(value.cloned().into())
    }
}

impl<V, S> KeyExtractor<HashMap<String, V, S>> for MapField
where
    V: Eq + Hash + Clone,
    S: BuildHasher,
{
    type Key = V;

    fn extract(&self, record: &HashMap<String, V, S>) -> Result<KeyValue<V>, ExtractError> {
        Self::resolve(record.get(self.field.as_str()))
    }

    fn name(&self) -> &str {
        &self.field
    }
}

impl<V> KeyExtractor<BTreeMap<String, V>> for MapField
where
    V: Eq + Hash + Clone,
{
    type Key = V;

    fn extract(&self, record: &BTreeMap<String, V>) -> Result<KeyValue<V>, ExtractError> {
        Self::resolve(record.get(self.field.as_str()))
    }

    fn name(&self) -> &str {
        &self.field
    }
}

impl<V, S> KeyExtractor<IndexMap<String, V, S>> for MapField
where
    V: Eq + Hash + Clone,
    S: BuildHasher,
{
    type Key = V;

    fn extract(&self, record: &IndexMap<String, V, S>) -> Result<KeyValue<V>, ExtractError> {
        Self::resolve(record.get(self.field.as_str()))
    }

    fn name(&self) -> &str {
        &self.field
    }
}
