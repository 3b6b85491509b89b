//! # Core Error Types
//!
//! Errors raised while loading engine configuration.

use thiserror::Error;

/// Errors that can occur in the core crate.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration file could not be read.
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file is not valid TOML for the expected schema.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// Configuration parsed but holds an unusable value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
