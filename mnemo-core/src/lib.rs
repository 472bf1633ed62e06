//! mnemo core - fixed-width codec and dependency keys
//!
//! Pure data layer with no I/O. The store crate depends on this.
//! This crate contains ONLY the serialization contract and key types -
//! no storage logic.

pub mod codec;
pub mod error;
pub mod key;

pub use codec::FixedWidth;
pub use error::CodecError;
pub use key::{CacheKey, CacheValue, DepKey};
