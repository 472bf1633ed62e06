//! Concurrency-safe cache with a switchable read path.
//!
//! [`ConcurrentCache`] decorates [`Cache`] with one readers-writer lock
//! per instance guarding both the map and the read-mode selector. Every
//! operation is synchronous: it either completes immediately or blocks on
//! lock acquisition. There is no per-key locking or striping.
//!
//! # Read modes
//!
//! `load` runs in one of two modes, an explicit two-state machine:
//!
//! - [`ReadMode::Protected`] (initial): acquire the shared lock, then
//!   read.
//! - [`ReadMode::Unprotected`]: read with no synchronization at all.
//!
//! The only transition source is [`ConcurrentCache::set_stores_availability`];
//! there is no automatic reversion. Unprotected mode exists for
//! read-mostly phases after writes have ceased: the cache cannot verify
//! that no store runs concurrently, so entering the mode is an `unsafe`
//! caller promise rather than a checked guarantee.

use std::cell::UnsafeCell;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use mnemo_core::{CacheKey, CacheValue};

use crate::cache::Cache;
use crate::config::CacheConfig;
use crate::error::StoreError;

/// Whether `load` acquires the shared lock before reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadMode {
    /// Loads take the shared lock. Safe under arbitrary concurrency.
    Protected,
    /// Loads skip the lock entirely. Valid only while the caller
    /// guarantees no concurrent `store`.
    Unprotected,
}

const MODE_PROTECTED: u8 = 0;
const MODE_UNPROTECTED: u8 = 1;

/// Convert a ReadMode to its stored byte.
fn read_mode_to_byte(mode: ReadMode) -> u8 {
    match mode {
        ReadMode::Protected => MODE_PROTECTED,
        ReadMode::Unprotected => MODE_UNPROTECTED,
    }
}

/// Convert a stored byte back to a ReadMode.
fn byte_to_read_mode(byte: u8) -> ReadMode {
    // Only the two constants are ever stored.
    match byte {
        MODE_UNPROTECTED => ReadMode::Unprotected,
        _ => ReadMode::Protected,
    }
}

/// Shared-state cache over the same storage and snapshot format as
/// [`Cache`].
///
/// `store` always takes the exclusive lock; `load` takes the shared lock
/// in [`ReadMode::Protected`] and nothing in [`ReadMode::Unprotected`].
/// Dropping the cache dumps the full state to the snapshot file, exactly
/// as for the single-owner variant (drop has exclusive access by
/// construction).
///
/// # Example
///
/// ```
/// use mnemo_store::{CacheConfig, ConcurrentCache, DepKey};
///
/// # let dir = tempfile::tempdir().expect("tempdir");
/// let config = CacheConfig::new().with_dir(dir.path());
/// let cache: ConcurrentCache<DepKey<(i32,)>, f64> =
///     ConcurrentCache::open(&config).expect("open");
///
/// cache.store(DepKey::new((1,)), 4.5);
/// assert_eq!(cache.load(&DepKey::new((1,))), Some(4.5));
/// ```
pub struct ConcurrentCache<K: CacheKey, V: CacheValue> {
    /// Guards the inner cache and serializes mode transitions.
    lock: RwLock<()>,
    /// Current read mode; written only under the exclusive lock, read
    /// without it on the unprotected path.
    mode: AtomicU8,
    inner: UnsafeCell<Cache<K, V>>,
}

// SAFETY: every mutable access to `inner` happens behind the exclusive
// lock. The unlocked shared reads are gated on the caller contracts of
// `set_stores_availability` and the `*_unprotected` methods, which
// require that no store runs concurrently.
unsafe impl<K, V> Sync for ConcurrentCache<K, V>
where
    K: CacheKey + Send + Sync,
    V: CacheValue + Send + Sync,
{
}

impl<K: CacheKey, V: CacheValue> ConcurrentCache<K, V> {
    /// Open the cache, loading any prior snapshot. Starts in
    /// [`ReadMode::Protected`].
    ///
    /// # Errors
    ///
    /// Returns an error only if the snapshot directory cannot be created.
    pub fn open(config: &CacheConfig) -> Result<Self, StoreError> {
        Ok(Self {
            lock: RwLock::new(()),
            mode: AtomicU8::new(MODE_PROTECTED),
            inner: UnsafeCell::new(Cache::open(config)?),
        })
    }

    /// Look up the value stored for `key`, honoring the current read
    /// mode. Mode affects locking only, never the result.
    #[must_use]
    pub fn load(&self, key: &K) -> Option<V> {
        match self.read_mode() {
            ReadMode::Protected => {
                let _guard = self.read_guard();
                // SAFETY: shared lock held; all writers take the
                // exclusive lock.
                unsafe { (*self.inner.get()).load(key) }
            }
            // SAFETY: Unprotected is only entered through the
            // `set_stores_availability` contract, under which no store
            // runs while the mode is active.
            ReadMode::Unprotected => unsafe { (*self.inner.get()).load(key) },
        }
    }

    /// Insert or overwrite the value for `key` under the exclusive lock.
    pub fn store(&self, key: K, value: V) {
        let _guard = self.write_guard();
        debug_assert_eq!(
            self.read_mode(),
            ReadMode::Protected,
            "store while stores are marked unavailable"
        );
        // SAFETY: exclusive lock held.
        unsafe { (*self.inner.get()).store(key, value) }
    }

    /// Switch the read path: `false` makes subsequent loads
    /// [`ReadMode::Unprotected`], `true` restores
    /// [`ReadMode::Protected`]. The switch itself runs under the
    /// exclusive lock, so no load observes a torn selector.
    ///
    /// # Safety
    ///
    /// Passing `false` asserts that no call to [`store`](Self::store)
    /// (or [`store_unprotected`](Self::store_unprotected)) will execute
    /// until the mode is restored with `true`; the cache cannot verify
    /// this. The caller must also establish a happens-before edge
    /// between the switch and loads on other threads, e.g. by switching
    /// before spawning the readers. Restoring with `true` is always
    /// permissible.
    pub unsafe fn set_stores_availability(&self, available: bool) {
        let _guard = self.write_guard();
        let mode = if available {
            ReadMode::Protected
        } else {
            ReadMode::Unprotected
        };
        self.mode.store(read_mode_to_byte(mode), Ordering::Release);
    }

    /// The read mode currently in effect.
    pub fn read_mode(&self) -> ReadMode {
        byte_to_read_mode(self.mode.load(Ordering::Acquire))
    }

    /// Look up `key` with no synchronization, regardless of mode.
    ///
    /// # Safety
    ///
    /// The caller must guarantee that no store executes concurrently.
    #[must_use]
    pub unsafe fn load_unprotected(&self, key: &K) -> Option<V> {
        // SAFETY: exclusivity guaranteed by the caller.
        unsafe { (*self.inner.get()).load(key) }
    }

    /// Insert or overwrite with no synchronization.
    ///
    /// # Safety
    ///
    /// The caller must guarantee exclusive access for the duration of
    /// the call: no concurrent store *or* load of any kind.
    pub unsafe fn store_unprotected(&self, key: K, value: V) {
        // SAFETY: exclusivity guaranteed by the caller.
        unsafe { (*self.inner.get()).store(key, value) }
    }

    /// Write the full current contents to the snapshot file.
    pub fn dump(&self) -> Result<(), StoreError> {
        let _guard = self.read_guard();
        // SAFETY: shared lock held; dump only reads the map.
        unsafe { (*self.inner.get()).dump() }
    }

    /// Number of cached entries.
    #[must_use]
    pub fn len(&self) -> usize {
        let _guard = self.read_guard();
        // SAFETY: shared lock held.
        unsafe { (*self.inner.get()).len() }
    }

    /// Whether the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Path of the associated snapshot file.
    pub fn path(&self) -> PathBuf {
        let _guard = self.read_guard();
        // SAFETY: shared lock held.
        unsafe { (*self.inner.get()).path().to_path_buf() }
    }

    /// Shared guard, recovering from poisoning: a panicked writer must
    /// not block the drop-time dump.
    fn read_guard(&self) -> RwLockReadGuard<'_, ()> {
        self.lock.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Exclusive guard, recovering from poisoning.
    fn write_guard(&self) -> RwLockWriteGuard<'_, ()> {
        self.lock.write().unwrap_or_else(PoisonError::into_inner)
    }
}
