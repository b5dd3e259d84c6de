//! Error types for the variable database.

use thiserror::Error;

/// Errors raised when reading variables.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required variable is not defined.
    #[error("variable `{key}` not defined")]
    Missing {
        /// The key that was looked up.
        key: String,
    },

    /// A variable exists but holds the wrong kind of value.
    #[error("variable `{key}`: expected {expected}, found {found}")]
    TypeMismatch {
        /// The key that was looked up.
        key: String,
        /// What the caller asked for.
        expected: &'static str,
        /// What the store holds.
        found: String,
    },

    /// A variable file could not be parsed.
    #[error("failed to parse variables: {0}")]
    Parse(String),

    /// A variable file could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConfigError {
    /// Missing-variable error for `key`.
    pub fn missing(key: impl Into<String>) -> Self {
        ConfigError::Missing { key: key.into() }
    }

    /// True if this is a missing-variable error.
    pub fn is_missing(&self) -> bool {
        matches!(self, ConfigError::Missing { .. })
    }
}

/// Result type for variable lookups.
pub type Result<T> = std::result::Result<T, ConfigError>;
