//! Caller-supplied structural rules
//!
//! Applied by the orchestrator after type-specific sanitization.

use crate::errors::{GuardError, Result};
use regex::Regex;
use std::fmt;
use std::sync::Arc;

/// Predicate run against the sanitized value
pub type CustomValidator = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Structural constraints for one field
#[derive(Clone, Default)]
pub struct ValidationRules {
    /// Empty or missing input is invalid
    pub required: bool,
    /// Minimum length in characters of the trimmed input
    pub min_length: Option<usize>,
    /// Hard cap in characters; longer input is truncated
    pub max_length: Option<usize>,
    /// The sanitized value must match this expression
    pub pattern: Option<Regex>,
    /// Single-character class every character must match
    pub allowed_characters: Option<Regex>,
    /// Content removed wherever found
    pub blocked_patterns: Vec<Regex>,
    /// Arbitrary predicate over the sanitized value
    pub custom_validator: Option<CustomValidator>,
    /// Warning used when `custom_validator` returns false
    pub custom_message: Option<String>,
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| GuardError::invalid_pattern(pattern, e))
}

impl ValidationRules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn min_length(mut self, min: usize) -> Self {
        self.min_length = Some(min);
        self
    }

    pub fn max_length(mut self, max: usize) -> Self {
        self.max_length = Some(max);
        self
    }

    /// Require the sanitized value to match `pattern`
    pub fn with_pattern(mut self, pattern: &str) -> Result<Self> {
        self.pattern = Some(compile(pattern)?);
        Ok(self)
    }

    /// Restrict input to characters matching `class`, e.g. `[a-zA-Z0-9 ]`
    pub fn with_allowed_characters(mut self, class: &str) -> Result<Self> {
        self.allowed_characters = Some(compile(class)?);
        Ok(self)
    }

    /// Strip anything matching `pattern`
    pub fn with_blocked_pattern(mut self, pattern: &str) -> Result<Self> {
        self.blocked_patterns.push(compile(pattern)?);
        Ok(self)
    }

    pub fn with_custom_validator<F>(mut self, validator: F, message: impl Into<String>) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        self.custom_validator = Some(Arc::new(validator));
        self.custom_message = Some(message.into());
        self
    }

    /// Whether `c` is accepted by the allowed-character class
    pub(crate) fn allows_char(&self, c: char) -> bool {
        match &self.allowed_characters {
            Some(re) => {
                let mut buf = [0u8; 4];
                re.is_match(c.encode_utf8(&mut buf))
            }
            None => true,
        }
    }
}

impl fmt::Debug for ValidationRules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationRules")
            .field("required", &self.required)
            .field("min_length", &self.min_length)
            .field("max_length", &self.max_length)
            .field("pattern", &self.pattern.as_ref().map(Regex::as_str))
            .field(
                "allowed_characters",
                &self.allowed_characters.as_ref().map(Regex::as_str),
            )
            .field(
                "blocked_patterns",
                &self.blocked_patterns.iter().map(Regex::as_str).collect::<Vec<_>>(),
            )
            .field("custom_validator", &self.custom_validator.is_some())
            .finish()
    }
}
