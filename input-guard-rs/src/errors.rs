//! Error handling for the guard library
//!
//! Validation itself never fails: problems with user input are reported
//! through [`crate::ValidationResult`] and friends. The errors here cover
//! the caller side instead, such as a malformed rule pattern, an unknown
//! input kind or a file that could not be read.

use thiserror::Error;

/// Result type for fallible guard operations
pub type Result<T> = std::result::Result<T, GuardError>;

/// Errors raised while configuring or feeding the guard
#[derive(Error, Debug)]
pub enum GuardError {
    /// A caller-supplied regular expression failed to compile
    #[error("Invalid rule pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// The requested input kind is not one the orchestrator knows
    #[error("Unknown input kind: {0}")]
    UnknownKind(String),

    /// A configuration value could not be interpreted
    #[error("Invalid configuration for {key}: {message}")]
    Configuration { key: String, message: String },

    /// Reading file bytes for signature verification failed
    #[error("Failed to read file contents: {0}")]
    Io(#[from] std::io::Error),
}

impl GuardError {
    /// Create a configuration error for the given key
    pub fn configuration<K: Into<String>, M: Into<String>>(key: K, message: M) -> Self {
        GuardError::Configuration {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Wrap a regex compilation failure together with the offending pattern
    pub fn invalid_pattern<P: Into<String>>(pattern: P, source: regex::Error) -> Self {
        GuardError::InvalidPattern {
            pattern: pattern.into(),
            source,
        }
    }
}
