//! Cache configuration and snapshot file naming.
//!
//! Storage location is explicit: a [`CacheConfig`] carries the directory
//! the snapshot lives in and an optional tag distinguishing otherwise
//! identical caches. The file *name* stays a deterministic function of
//! the key and value schemas, so a cache instantiated over the same types
//! (and tag) always finds its prior snapshot.

use std::path::{Path, PathBuf};

use mnemo_core::FixedWidth;

/// Configuration for a file-backed cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Directory the snapshot file is resolved in.
    pub dir: PathBuf,
    /// Optional tag appended to the file name, isolating caches that
    /// share a (key, value) schema.
    pub tag: Option<String>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            // Relative to the process working directory.
            dir: PathBuf::from("."),
            tag: None,
        }
    }
}

impl CacheConfig {
    /// Create a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the snapshot directory.
    pub fn with_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.dir = dir.as_ref().to_path_buf();
        self
    }

    /// Set the isolation tag.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Snapshot file name for a (key, value) instantiation.
    ///
    /// Pattern: `_cache` + `_<token>` per key element + `__<value-tokens>`
    /// + `_<tag>` if set + `.bin`. Deterministic per schema; two configs
    /// differing only by tag never collide.
    pub fn file_name<K: FixedWidth, V: FixedWidth>(&self) -> String {
        let mut name = String::from("_cache");
        for token in K::tokens() {
            name.push('_');
            name.push_str(token);
        }
        name.push_str("__");
        name.push_str(&V::tokens().join("_"));
        if let Some(tag) = &self.tag {
            name.push('_');
            name.push_str(tag);
        }
        name.push_str(".bin");
        name
    }

    /// Full snapshot path for a (key, value) instantiation.
    pub fn file_path<K: FixedWidth, V: FixedWidth>(&self) -> PathBuf {
        self.dir.join(self.file_name::<K, V>())
    }
}
