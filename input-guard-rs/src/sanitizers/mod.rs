//! Type-specific sanitizers
//!
//! One pure function per semantic input kind. Each receives the buffer after
//! threat stripping and only normalizes the shape of the value.

pub mod cpf;
pub mod email;
pub mod html;
pub mod phone;
pub mod search;
pub mod text;
pub mod url;

pub use cpf::{is_valid_cpf, sanitize_cpf};
pub use email::sanitize_email;
pub use html::{encode_html_entities, sanitize_html};
pub use phone::sanitize_phone;
pub use search::sanitize_search;
pub use text::{collapse_whitespace, remove_control_chars, sanitize_text};
pub use url::sanitize_url;

use crate::config::GuardConfig;
use crate::errors::GuardError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Sanitized content and whether any step changed it
#[derive(Debug, Clone, PartialEq)]
pub struct SanitizeResult<T> {
    pub sanitized: T,
    pub was_modified: bool,
}

impl<T> SanitizeResult<T> {
    pub fn unmodified(content: T) -> Self {
        Self {
            sanitized: content,
            was_modified: false,
        }
    }

    pub fn modified(content: T) -> Self {
        Self {
            sanitized: content,
            was_modified: true,
        }
    }
}

impl SanitizeResult<String> {
    /// Compare against the input to decide whether anything changed
    pub(crate) fn compare(input: &str, output: String) -> Self {
        if output == input {
            Self::unmodified(output)
        } else {
            Self::modified(output)
        }
    }
}

/// Run multiple sanitizers in sequence
pub fn chain_sanitizers<T, F>(input: T, sanitizers: Vec<F>) -> SanitizeResult<T>
where
    F: FnOnce(T) -> SanitizeResult<T>,
{
    sanitizers
        .into_iter()
        .fold(SanitizeResult::unmodified(input), |acc, sanitizer| {
            let current = sanitizer(acc.sanitized);
            SanitizeResult {
                sanitized: current.sanitized,
                was_modified: acc.was_modified || current.was_modified,
            }
        })
}

/// Keep at most `max` characters
pub fn truncate_chars(input: &str, max: usize) -> String {
    match input.char_indices().nth(max) {
        Some((idx, _)) => input[..idx].to_string(),
        None => input.to_string(),
    }
}

/// Semantic type of a form field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    #[default]
    Text,
    Email,
    Search,
    Html,
    Url,
    Phone,
    /// Brazilian individual taxpayer number
    #[serde(alias = "tax-id")]
    Cpf,
}

impl InputKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InputKind::Text => "text",
            InputKind::Email => "email",
            InputKind::Search => "search",
            InputKind::Html => "html",
            InputKind::Url => "url",
            InputKind::Phone => "phone",
            InputKind::Cpf => "cpf",
        }
    }
}

impl fmt::Display for InputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InputKind {
    type Err = GuardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" => Ok(InputKind::Text),
            "email" => Ok(InputKind::Email),
            "search" => Ok(InputKind::Search),
            "html" => Ok(InputKind::Html),
            "url" => Ok(InputKind::Url),
            "phone" => Ok(InputKind::Phone),
            "cpf" | "tax-id" | "tax_id" => Ok(InputKind::Cpf),
            other => Err(GuardError::UnknownKind(other.to_string())),
        }
    }
}

/// Outcome of a type-specific sanitizer
#[derive(Debug, Clone, PartialEq)]
pub struct KindOutcome {
    pub sanitized: String,
    /// False when the value violates the kind's format rules
    pub is_valid: bool,
    pub warnings: Vec<String>,
}

impl KindOutcome {
    pub fn valid(sanitized: String) -> Self {
        Self {
            sanitized,
            is_valid: true,
            warnings: Vec::new(),
        }
    }

    pub fn invalid(sanitized: String, warning: impl Into<String>) -> Self {
        Self {
            sanitized,
            is_valid: false,
            warnings: vec![warning.into()],
        }
    }

    /// Attach an advisory without changing validity
    pub fn flag(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }
}

/// Dispatch to the sanitizer for `kind`
pub fn sanitize_for_kind(kind: InputKind, input: &str, config: &GuardConfig) -> KindOutcome {
    match kind {
        InputKind::Text => KindOutcome::valid(sanitize_text(input).sanitized),
        InputKind::Email => sanitize_email(input),
        InputKind::Search => KindOutcome::valid(sanitize_search(input, config.search_max_length)),
        InputKind::Html => KindOutcome::valid(sanitize_html(input).sanitized),
        InputKind::Url => sanitize_url(input),
        InputKind::Phone => sanitize_phone(input),
        InputKind::Cpf => sanitize_cpf(input),
    }
}
