//! Dependency keys: ordered tuples of fixed-width values.
//!
//! A [`DepKey`] identifies a cached result by the inputs it was computed
//! from. Equality is element-wise, hashing folds over the elements in
//! declared order, and the binary encoding is the concatenation of the
//! element encodings - so two keys are equal exactly when their encoded
//! bytes are equal.

use std::hash::Hash;

use crate::codec::FixedWidth;
use crate::error::CodecError;

/// Marker trait for types usable as a cache key.
///
/// Keys must hash and compare consistently with their encoded form and be
/// cheap to copy into the map's key slot. Float-containing tuples are
/// rejected here at compile time (`f64` is not `Eq`); floats remain valid
/// as cached *values*.
pub trait CacheKey: FixedWidth + Eq + Hash + Copy {}

impl<T: FixedWidth + Eq + Hash + Copy> CacheKey for T {}

/// Marker trait for types usable as a cached value.
pub trait CacheValue: FixedWidth + Clone {}

impl<T: FixedWidth + Clone> CacheValue for T {}

/// An ordered tuple of dependency values acting as a cache key.
///
/// # Example
///
/// ```
/// use mnemo_core::{DepKey, FixedWidth};
///
/// let key = DepKey::new((1_i32, 42_u64));
/// assert_eq!(<DepKey<(i32, u64)>>::WIDTH, 12);
/// assert_eq!(key, DepKey::new((1, 42)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DepKey<T>(T);

impl<T> DepKey<T> {
    /// Create a key from its dependency values.
    pub fn new(values: T) -> Self {
        Self(values)
    }

    /// Borrow the underlying value tuple.
    pub fn values(&self) -> &T {
        &self.0
    }

    /// Consume the key, returning the value tuple.
    pub fn into_values(self) -> T {
        self.0
    }
}

impl<T> From<T> for DepKey<T> {
    fn from(values: T) -> Self {
        Self::new(values)
    }
}

impl<T: FixedWidth> FixedWidth for DepKey<T> {
    const WIDTH: usize = T::WIDTH;

    fn push_tokens(out: &mut Vec<&'static str>) {
        T::push_tokens(out);
    }

    fn encode_into(&self, out: &mut [u8]) {
        self.0.encode_into(out);
    }

    fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        T::decode(bytes).map(Self)
    }
}
