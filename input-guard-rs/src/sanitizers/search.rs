//! Search query sanitization

use super::text::collapse_whitespace;
use super::truncate_chars;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref SQL_KEYWORD_REGEX: Regex =
        Regex::new(r"(?i)\b(?:select|insert|update|delete|drop|create|alter|exec|union)\b\s+")
            .unwrap();
    static ref SQL_COMMENT_REGEX: Regex = Regex::new(r"--|/\*|\*/").unwrap();
    static ref SEARCH_SPECIAL_CHARS_REGEX: Regex = Regex::new(r"[<>{}\[\]\\]").unwrap();
}

fn strip_once(input: &str) -> String {
    let result = SQL_KEYWORD_REGEX.replace_all(input, "");
    let result = SQL_COMMENT_REGEX.replace_all(&result, "");
    let result = SEARCH_SPECIAL_CHARS_REGEX.replace_all(&result, "");
    collapse_whitespace(&result).sanitized.trim().to_string()
}

/// Strip SQL keywords, comment delimiters and bracket characters, then cap
/// the query at `max_length` characters
pub fn sanitize_search(input: &str, max_length: usize) -> String {
    let mut current = input.to_string();
    loop {
        let next = strip_once(&current);
        if next == current {
            break;
        }
        current = next;
    }

    truncate_chars(&current, max_length).trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keywords_and_comments_removed() {
        let result = sanitize_search("SELECT * FROM users; --", 200);
        assert!(!result.to_lowercase().contains("select"));
        assert!(!result.contains("--"));
        assert_eq!(result, "* FROM users;");
    }

    #[test]
    fn test_brackets_removed() {
        assert_eq!(sanitize_search("curso {react} [2024] <novo>", 200), "curso react 2024 novo");
        assert_eq!(sanitize_search(r"a\b", 200), "ab");
    }

    #[test]
    fn test_nested_keywords_collapse() {
        let result = sanitize_search("drop drop  table", 200);
        assert_eq!(result, "table");
        assert_eq!(sanitize_search(&result, 200), result);
    }

    #[test]
    fn test_truncation() {
        let long = "a".repeat(250);
        assert_eq!(sanitize_search(&long, 200).len(), 200);
        assert_eq!(sanitize_search("abc def", 4), "abc");
    }

    #[test]
    fn test_plain_query_untouched() {
        assert_eq!(sanitize_search("violão para iniciantes", 200), "violão para iniciantes");
    }
}
