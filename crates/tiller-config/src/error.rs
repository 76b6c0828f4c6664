//! Error types for configuration loading and validation.

use thiserror::Error;

/// A specialized Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors produced while resolving an environment configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A config file or environment variable failed to parse or merge.
    #[error("configuration extraction failed: {0}")]
    Extraction(#[from] figment::Error),

    /// A resolved value is outside the range the navigation layer accepts.
    #[error("invalid config value for '{field}': {hint}")]
    InvalidValue {
        /// The offending field, dotted-path style (e.g. `max_attempts`).
        field: String,
        /// What a valid value would look like.
        hint: String,
    },

    /// I/O errors while reading configuration files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
