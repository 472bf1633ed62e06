//! Error types for codec operations

use thiserror::Error;

/// Errors produced while encoding or decoding fixed-width values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CodecError {
    /// The provided buffer does not match the type's fixed width.
    #[error("{type_token}: expected exactly {expected} bytes, got {actual}")]
    SizeMismatch {
        type_token: &'static str,
        expected: usize,
        actual: usize,
    },

    /// The buffer has the right width but holds no valid value of the type.
    #[error("{type_token}: invalid encoding: {reason}")]
    InvalidEncoding {
        type_token: &'static str,
        reason: String,
    },
}
