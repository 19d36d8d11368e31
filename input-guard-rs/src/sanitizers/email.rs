//! Email address sanitization

use super::KindOutcome;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref EMAIL_SHAPE_REGEX: Regex = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();
    static ref EMAIL_DISALLOWED_REGEX: Regex = Regex::new(r"[^a-z0-9@._+\-]").unwrap();
}

/// Check the shape, lowercase and drop characters outside the allowlist
pub fn sanitize_email(input: &str) -> KindOutcome {
    let sanitized = EMAIL_DISALLOWED_REGEX
        .replace_all(&input.to_lowercase(), "")
        .into_owned();

    if EMAIL_SHAPE_REGEX.is_match(input) {
        KindOutcome::valid(sanitized)
    } else {
        KindOutcome::invalid(sanitized, "Invalid email format")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_email_is_lowercased() {
        let outcome = sanitize_email("Maria.Silva+loja@Example.COM");
        assert!(outcome.is_valid);
        assert_eq!(outcome.sanitized, "maria.silva+loja@example.com");
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn test_disallowed_characters_are_dropped() {
        let outcome = sanitize_email("jo\"ão<x>@mail.com");
        assert!(outcome.is_valid);
        assert_eq!(outcome.sanitized, "joox@mail.com");
    }

    #[test]
    fn test_invalid_shapes() {
        for bad in ["user@@bad", "no-at-sign.com", "user@nodot", "a b@c.com"] {
            let outcome = sanitize_email(bad);
            assert!(!outcome.is_valid, "{bad} should be rejected");
            assert_eq!(outcome.warnings, vec!["Invalid email format".to_string()]);
        }
    }
}
