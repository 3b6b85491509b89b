//! # Asset Error Types
//!
//! Errors raised when building pixel buffers from external data.

use thiserror::Error;

/// Errors that can occur in the asset tables.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssetError {
    /// The pixel format has no storage layout.
    #[error("unknown pixel format")]
    UnknownFormat,

    /// A raw byte buffer does not match the pixel count and format.
    #[error("pixel buffer size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch {
        /// Byte count the format and dimensions require.
        expected: usize,
        /// Byte count provided.
        actual: usize,
    },
}

/// Result type for asset operations.
pub type AssetResult<T> = Result<T, AssetError>;
