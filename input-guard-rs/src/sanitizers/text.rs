//! Free-text sanitization

use super::{chain_sanitizers, SanitizeResult};
use lazy_static::lazy_static;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    // C0 and C1 controls, minus tab, line feed and carriage return
    static ref CONTROL_CHARS_REGEX: Regex =
        Regex::new(r"[\x00-\x08\x0B\x0C\x0E-\x1F\x7F-\x9F]").unwrap();
    static ref WHITESPACE_REGEX: Regex = Regex::new(r"\s+").unwrap();
}

/// Remove null bytes and control characters
pub fn remove_control_chars(input: &str) -> SanitizeResult<String> {
    let sanitized = CONTROL_CHARS_REGEX.replace_all(input, "").into_owned();
    SanitizeResult::compare(input, sanitized)
}

/// Collapse runs of whitespace into a single space
pub fn collapse_whitespace(input: &str) -> SanitizeResult<String> {
    let result = WHITESPACE_REGEX.replace_all(input, " ").into_owned();
    SanitizeResult::compare(input, result)
}

/// Normalize Unicode text (NFC form)
pub fn normalize_unicode(input: &str) -> SanitizeResult<String> {
    let normalized = input.nfc().collect::<String>();
    SanitizeResult::compare(input, normalized)
}

/// Default sanitizer for free text
pub fn sanitize_text(input: &str) -> SanitizeResult<String> {
    let sanitizers: Vec<Box<dyn Fn(String) -> SanitizeResult<String>>> = vec![
        Box::new(|s| remove_control_chars(&s)),
        Box::new(|s| normalize_unicode(&s)),
        Box::new(|s| collapse_whitespace(&s)),
        Box::new(|s| {
            let trimmed = s.trim().to_string();
            SanitizeResult::compare(&s, trimmed)
        }),
    ];

    chain_sanitizers(input.to_string(), sanitizers)
}
