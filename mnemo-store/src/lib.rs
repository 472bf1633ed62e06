//! mnemo store - file-backed memoization cache.
//!
//! A [`Cache`] maps dependency keys to computed values and persists its
//! full contents across process restarts: opening a cache loads the
//! associated snapshot file, dropping it rewrites the file. The snapshot
//! is a flat sequence of fixed-size records with no header, so the record
//! width alone determines the layout.
//!
//! [`ConcurrentCache`] wraps the same storage behind a readers-writer
//! lock and adds a switchable read path for read-mostly phases after
//! writes have ceased.
//!
//! # Example
//!
//! ```
//! use mnemo_store::{Cache, CacheConfig, DepKey};
//!
//! # let dir = tempfile::tempdir().expect("tempdir");
//! let config = CacheConfig::new().with_dir(dir.path());
//!
//! {
//!     let mut cache: Cache<DepKey<(i32,)>, f64> =
//!         Cache::open(&config).expect("open");
//!     cache.store(DepKey::new((1,)), 4.5);
//! } // dropped: snapshot written
//!
//! let cache: Cache<DepKey<(i32,)>, f64> = Cache::open(&config).expect("open");
//! assert_eq!(cache.load(&DepKey::new((1,))), Some(4.5));
//! ```

pub mod cache;
pub mod concurrent;
pub mod config;
pub mod error;

pub use cache::Cache;
pub use concurrent::{ConcurrentCache, ReadMode};
pub use config::CacheConfig;
pub use error::StoreError;

// Re-export the codec layer so consumers need only one crate.
pub use mnemo_core::{CacheKey, CacheValue, CodecError, DepKey, FixedWidth};
