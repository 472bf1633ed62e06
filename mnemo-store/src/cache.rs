//! Single-owner memoization cache with snapshot persistence.
//!
//! The map lives entirely in memory; the associated file is only touched
//! at the edges of the lifecycle. Opening a cache loads the full snapshot
//! (a missing file means an empty cache), dropping it rewrites the file
//! from scratch. There is no incremental or write-ahead durability.
//!
//! # Snapshot format
//!
//! A flat concatenation of fixed-size records, `key bytes ++ value bytes`,
//! with no header, version field, or checksum. The record count is the
//! file length divided by [`Cache::RECORD_WIDTH`], which must divide
//! evenly.
//!
//! # Malformed snapshots
//!
//! A snapshot whose length is not a whole number of records, or whose
//! bytes fail to decode, is discarded in full and the cache starts empty.
//! A cache file is derived state; losing it costs recomputation, not
//! data. The discard is logged at `warn` level and the in-memory map is
//! never left partially populated.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use mnemo_core::{CacheKey, CacheValue, FixedWidth};
use tracing::{error, warn};

use crate::config::CacheConfig;
use crate::error::StoreError;

/// In-process memoization cache keyed by dependency tuples.
///
/// One instance per (key, value, tag) combination owns the associated
/// snapshot file. The design assumes single-owner-process access to that
/// file; there is no cross-process locking.
///
/// # Example
///
/// ```
/// use mnemo_store::{Cache, CacheConfig, DepKey};
///
/// # let dir = tempfile::tempdir().expect("tempdir");
/// let config = CacheConfig::new().with_dir(dir.path());
/// let mut cache: Cache<DepKey<(i32, u32)>, f64> = Cache::open(&config).expect("open");
///
/// let deps = DepKey::new((1, 46));
/// let value = match cache.load(&deps) {
///     Some(value) => value,
///     None => {
///         let value = 1.5; // heavy calculation
///         cache.store(deps, value);
///         value
///     }
/// };
/// assert_eq!(value, 1.5);
/// ```
pub struct Cache<K: CacheKey, V: CacheValue> {
    path: PathBuf,
    map: HashMap<K, V>,
}

impl<K: CacheKey, V: CacheValue> Cache<K, V> {
    /// Byte width of one snapshot record: key bytes followed by value bytes.
    pub const RECORD_WIDTH: usize = K::WIDTH + V::WIDTH;

    /// Open the cache, loading any prior snapshot for this
    /// (key, value, tag) combination.
    ///
    /// A missing or empty snapshot file yields an empty cache. A
    /// malformed one is discarded (see module docs). The snapshot
    /// directory is created if absent so the drop-time dump can succeed.
    ///
    /// # Errors
    ///
    /// Returns an error only if the snapshot directory cannot be created.
    pub fn open(config: &CacheConfig) -> Result<Self, StoreError> {
        assert!(Self::RECORD_WIDTH > 0, "zero-width record");

        fs::create_dir_all(&config.dir).map_err(|source| StoreError::io(&config.dir, source))?;

        let path = config.file_path::<K, V>();
        let map = Self::load_snapshot(&path);
        Ok(Self { path, map })
    }

    /// Look up the value stored for `key`.
    ///
    /// A miss is not an error and has no side effects.
    #[must_use]
    pub fn load(&self, key: &K) -> Option<V> {
        self.map.get(key).cloned()
    }

    /// Insert or overwrite the value for `key`.
    ///
    /// Unconditional: no capacity bound, no eviction.
    pub fn store(&mut self, key: K, value: V) {
        self.map.insert(key, value);
    }

    /// Number of cached entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Path of the associated snapshot file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the full current contents to the snapshot file, replacing
    /// whatever was there.
    ///
    /// Writes to a temporary file in the same directory and renames it
    /// over the snapshot, so a crash mid-dump leaves the previous
    /// snapshot intact rather than a half-written one.
    pub fn dump(&self) -> Result<(), StoreError> {
        let mut data = Vec::with_capacity(self.map.len() * Self::RECORD_WIDTH);
        let mut record = vec![0u8; Self::RECORD_WIDTH];
        for (key, value) in &self.map {
            key.encode_into(&mut record[..K::WIDTH]);
            value.encode_into(&mut record[K::WIDTH..]);
            data.extend_from_slice(&record);
        }

        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, &data).map_err(|source| StoreError::io(&tmp, source))?;
        fs::rename(&tmp, &self.path).map_err(|source| StoreError::io(&self.path, source))?;
        Ok(())
    }

    /// Read the snapshot at `path`, applying the discard policy on any
    /// failure other than the file being absent.
    fn load_snapshot(path: &Path) -> HashMap<K, V> {
        let data = match fs::read(path) {
            Ok(data) => data,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return HashMap::new(),
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "cache snapshot unreadable, starting empty"
                );
                return HashMap::new();
            }
        };

        match Self::decode_snapshot(&data) {
            Ok(map) => map,
            Err(err) => {
                warn!(
                    path = %path.display(),
                    file_len = data.len(),
                    record_width = Self::RECORD_WIDTH,
                    error = %err,
                    "malformed cache snapshot discarded, starting empty"
                );
                HashMap::new()
            }
        }
    }

    /// Decode a full snapshot into a fresh map.
    ///
    /// Iterates strictly over `0..record_count`; a length that does not
    /// divide evenly is rejected before any record is read.
    fn decode_snapshot(data: &[u8]) -> Result<HashMap<K, V>, StoreError> {
        if data.len() % Self::RECORD_WIDTH != 0 {
            return Err(StoreError::TruncatedSnapshot {
                file_len: data.len(),
                record_width: Self::RECORD_WIDTH,
            });
        }

        let record_count = data.len() / Self::RECORD_WIDTH;
        let mut map = HashMap::with_capacity(record_count);
        for i in 0..record_count {
            let start = i * Self::RECORD_WIDTH;
            let key = K::decode(&data[start..start + K::WIDTH])?;
            let value = V::decode(&data[start + K::WIDTH..start + Self::RECORD_WIDTH])?;
            map.insert(key, value);
        }
        Ok(map)
    }
}

impl<K: CacheKey, V: CacheValue> Drop for Cache<K, V> {
    /// Dump the full state on teardown. A failed dump is logged and
    /// swallowed; teardown must not panic the host process.
    fn drop(&mut self) {
        if let Err(err) = self.dump() {
            error!(
                path = %self.path.display(),
                error = %err,
                "failed to dump cache snapshot on drop"
            );
        }
    }
}
