//! Phone number sanitization (Brazilian numbering)

use super::text::collapse_whitespace;
use super::KindOutcome;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref PHONE_DISALLOWED_REGEX: Regex = Regex::new(r"[^0-9+ ()\-]").unwrap();
}

/// Area code plus 8 or 9 digit subscriber number
const MIN_DIGITS: usize = 10;
const MAX_DIGITS: usize = 11;

pub fn sanitize_phone(input: &str) -> KindOutcome {
    let kept = PHONE_DISALLOWED_REGEX.replace_all(input, "");
    let sanitized = collapse_whitespace(&kept).sanitized.trim().to_string();

    let digits = sanitized.chars().filter(char::is_ascii_digit).count();
    let outcome = KindOutcome::valid(sanitized);

    if (MIN_DIGITS..=MAX_DIGITS).contains(&digits) {
        outcome
    } else {
        outcome.flag(format!(
            "Phone number should have {} or {} digits, found {}",
            MIN_DIGITS, MAX_DIGITS, digits
        ))
    }
}
