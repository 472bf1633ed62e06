//! Error types for store operations

use std::path::{Path, PathBuf};

use mnemo_core::CodecError;
use thiserror::Error;

/// Errors produced by cache persistence.
///
/// Cache misses are not errors; `load` returns `None`. Only snapshot I/O
/// and codec failures surface here, and a failed snapshot load never
/// leaves a cache partially populated.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem operation failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A record's key or value bytes did not decode.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// Snapshot length is not a whole number of records.
    #[error("snapshot length {file_len} is not a multiple of the {record_width}-byte record")]
    TruncatedSnapshot { file_len: usize, record_width: usize },
}

impl StoreError {
    /// Create an I/O error tagged with the path it occurred on.
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}
