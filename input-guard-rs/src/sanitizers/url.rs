//! URL field sanitization

use super::KindOutcome;
use url::Url;

/// Schemes a URL field may carry
pub const ALLOWED_SCHEMES: [&str; 3] = ["http", "https", "mailto"];

/// Parse and re-serialize; anything unparsable or with another scheme
/// becomes an empty, invalid value
pub fn sanitize_url(input: &str) -> KindOutcome {
    match Url::parse(input) {
        Ok(url) if ALLOWED_SCHEMES.contains(&url.scheme()) => KindOutcome::valid(url.to_string()),
        Ok(url) => KindOutcome::invalid(
            String::new(),
            format!("URL scheme '{}' is not allowed", url.scheme()),
        ),
        Err(e) => KindOutcome::invalid(String::new(), format!("Invalid URL: {}", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_schemes() {
        let outcome = sanitize_url("https://Example.com/curso?id=1");
        assert!(outcome.is_valid);
        assert_eq!(outcome.sanitized, "https://example.com/curso?id=1");

        let outcome = sanitize_url("mailto:contato@loja.com");
        assert!(outcome.is_valid);
        assert_eq!(outcome.sanitized, "mailto:contato@loja.com");
    }

    #[test]
    fn test_rejected_schemes() {
        for bad in ["javascript:alert(1)", "ftp://files.example.com", "data:text/html,hi"] {
            let outcome = sanitize_url(bad);
            assert!(!outcome.is_valid, "{bad} should be rejected");
            assert_eq!(outcome.sanitized, "");
        }
    }

    #[test]
    fn test_unparsable() {
        let outcome = sanitize_url("not a url");
        assert!(!outcome.is_valid);
        assert!(outcome.warnings[0].starts_with("Invalid URL"));
    }

    #[test]
    fn test_normalization_is_stable() {
        let first = sanitize_url("HTTPS://example.com");
        assert_eq!(first.sanitized, "https://example.com/");
        assert_eq!(sanitize_url(&first.sanitized).sanitized, first.sanitized);
    }
}
