//! HTML fragment sanitization
//!
//! Removes active content and then entity-encodes what is left, so the
//! result is safe to render as text.

use super::SanitizeResult;
use lazy_static::lazy_static;
use regex::Regex;

/// Tags removed together with everything between them
const DANGEROUS_TAGS: [&str; 8] = [
    "script", "iframe", "object", "embed", "form", "input", "textarea", "button",
];

lazy_static! {
    static ref TAG_PAIR_REGEXES: Vec<Regex> = DANGEROUS_TAGS
        .iter()
        .map(|tag| Regex::new(&format!(r"(?is)<\s*{tag}\b[^>]*>.*?<\s*/\s*{tag}\s*>")).unwrap())
        .collect();

    static ref LONE_TAG_REGEX: Regex = Regex::new(&format!(
        r"(?i)<\s*/?\s*(?:{})\b[^>]*>",
        DANGEROUS_TAGS.join("|")
    ))
    .unwrap();

    static ref EVENT_HANDLER_REGEX: Regex = Regex::new(
        r#"(?i)\s*\bon[a-z]+\s*=\s*(?:"[^"]*"|'[^']*'|[^\s>]+)"#
    )
    .unwrap();

    static ref DANGEROUS_URI_ATTR_REGEX: Regex = Regex::new(
        r#"(?i)\s*\b[\w:-]+\s*=\s*(?:"\s*(?:javascript|vbscript|data)\s*:[^"]*"|'\s*(?:javascript|vbscript|data)\s*:[^']*'|(?:javascript|vbscript|data)\s*:[^\s>]*)"#
    )
    .unwrap();

    static ref ENTITY_REGEX: Regex =
        Regex::new(r"^&(?:#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[a-zA-Z][a-zA-Z0-9]{1,31});").unwrap();
}

/// Remove dangerous elements, event handlers and script URIs
pub fn strip_active_content(input: &str) -> SanitizeResult<String> {
    let mut result = TAG_PAIR_REGEXES
        .iter()
        .fold(input.to_string(), |acc, re| re.replace_all(&acc, "").into_owned());
    result = LONE_TAG_REGEX.replace_all(&result, "").into_owned();
    result = EVENT_HANDLER_REGEX.replace_all(&result, "").into_owned();
    result = DANGEROUS_URI_ATTR_REGEX.replace_all(&result, "").into_owned();

    SanitizeResult::compare(input, result)
}

/// Encode `& < > " ' ` = /` in a single pass. An `&` that already starts an
/// entity is left alone so encoded text is a fixed point.
pub fn encode_html_entities(input: &str) -> SanitizeResult<String> {
    let mut encoded = String::with_capacity(input.len());

    for (idx, c) in input.char_indices() {
        match c {
            '&' if ENTITY_REGEX.is_match(&input[idx..]) => encoded.push('&'),
            '&' => encoded.push_str("&amp;"),
            '<' => encoded.push_str("&lt;"),
            '>' => encoded.push_str("&gt;"),
            '"' => encoded.push_str("&quot;"),
            '\'' => encoded.push_str("&#x27;"),
            '`' => encoded.push_str("&#x60;"),
            '=' => encoded.push_str("&#x3D;"),
            '/' => encoded.push_str("&#x2F;"),
            other => encoded.push(other),
        }
    }

    SanitizeResult::compare(input, encoded)
}

/// Strip active content, then encode the remainder
pub fn sanitize_html(input: &str) -> SanitizeResult<String> {
    let stripped = strip_active_content(input);
    let encoded = encode_html_entities(&stripped.sanitized);

    if stripped.was_modified || encoded.was_modified {
        SanitizeResult::modified(encoded.sanitized)
    } else {
        SanitizeResult::unmodified(encoded.sanitized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_html_entities() {
        let result = encode_html_entities(r#"<a href="/x">'tick` = 1</a>"#);
        assert!(result.was_modified);
        assert_eq!(
            result.sanitized,
            "&lt;a href&#x3D;&quot;&#x2F;x&quot;&gt;&#x27;tick&#x60; &#x3D; 1&lt;&#x2F;a&gt;"
        );
    }

    #[test]
    fn test_ampersand_is_encoded_once() {
        assert_eq!(encode_html_entities("Tom & Jerry").sanitized, "Tom &amp; Jerry");
        assert_eq!(encode_html_entities("Tom &amp; Jerry").sanitized, "Tom &amp; Jerry");
        assert_eq!(encode_html_entities("&#39; &#x2F; &copy;").sanitized, "&#39; &#x2F; &copy;");
        assert_eq!(encode_html_entities("a &b c").sanitized, "a &amp;b c");
    }

    #[test]
    fn test_dangerous_pairs_removed_with_content() {
        let result = strip_active_content("<p>ok</p><form action=x><input name=a></form><textarea>t</textarea>");
        assert_eq!(result.sanitized, "<p>ok</p>");

        let result = strip_active_content("<button onclick=\"go()\">Buy</button> now");
        assert_eq!(result.sanitized, " now");
    }

    #[test]
    fn test_attributes_removed() {
        let result = strip_active_content(r#"<img src="a.png" onerror="alert(1)">"#);
        assert_eq!(result.sanitized, r#"<img src="a.png">"#);

        let result = strip_active_content(r#"<a href="javascript:alert(1)">x</a>"#);
        assert_eq!(result.sanitized, "<a>x</a>");

        let result = strip_active_content("<a href='data:text/html,x'>y</a>");
        assert_eq!(result.sanitized, "<a>y</a>");
    }

    #[test]
    fn test_sanitize_html_is_a_fixed_point() {
        let first = sanitize_html("<b onclick=x>Promo</b> 50% off & more <script>steal()</script>");
        assert!(first.was_modified);
        assert!(!first.sanitized.contains('<'));

        let second = sanitize_html(&first.sanitized);
        assert!(!second.was_modified);
        assert_eq!(second.sanitized, first.sanitized);
    }
}
