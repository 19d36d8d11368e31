//! Screening of external links pasted by users (video embeds, shared
//! documents). Well-formedness and safety are reported separately.

use glob_match::glob_match;
use serde::{Deserialize, Serialize};
use url::{Host, Url};

const EXTERNAL_SCHEMES: [&str; 2] = ["http", "https"];

/// Link shorteners hide the final destination
const SHORTENER_HOSTS: &[&str] = &[
    "bit.ly", "tinyurl.com", "goo.gl", "t.co", "ow.ly", "is.gd", "buff.ly", "rebrand.ly",
    "cutt.ly", "shorturl.at",
];

/// Providers recognized for embedded content, subdomains included
pub const RECOGNIZED_DOMAINS: &[&str] = &[
    "youtube.com",
    "*.youtube.com",
    "youtu.be",
    "vimeo.com",
    "*.vimeo.com",
    "drive.google.com",
    "docs.google.com",
    "dropbox.com",
    "*.dropbox.com",
    "github.com",
    "*.github.com",
    "*.githubusercontent.com",
];

/// Outcome of screening a link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UrlValidationResult {
    /// Parsed, with an http(s) scheme
    pub is_valid: bool,
    /// No malicious pattern matched
    pub is_safe: bool,
    /// Normalized URL, empty when invalid
    pub sanitized_url: String,
    pub warnings: Vec<String>,
}

impl UrlValidationResult {
    fn invalid(warning: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            is_safe: false,
            sanitized_url: String::new(),
            warnings: vec![warning.into()],
        }
    }

    fn unsafe_because(&mut self, warning: impl Into<String>) {
        self.is_safe = false;
        self.warnings.push(warning.into());
    }
}

fn is_shortener(domain: &str) -> bool {
    SHORTENER_HOSTS
        .iter()
        .any(|s| domain == *s || domain.ends_with(&format!(".{}", s)))
}

fn is_localhost(domain: &str) -> bool {
    domain == "localhost" || domain.ends_with(".localhost")
}

/// Credentials or a bare `@` in the authority (`https://youtube.com@evil.example`).
/// An `@` in the path, query or fragment is ordinary.
fn has_userinfo(raw: &str, url: &Url) -> bool {
    if !url.username().is_empty() || url.password().is_some() {
        return true;
    }

    let rest = raw.split_once("://").map_or(raw, |(_, rest)| rest);
    let authority = rest.split(['/', '?', '#', '\\']).next().unwrap_or_default();
    authority.contains('@')
}

/// Whether `host` belongs to one of the [`RECOGNIZED_DOMAINS`]
pub fn is_recognized_domain(host: &str) -> bool {
    let host = host.to_lowercase();
    RECOGNIZED_DOMAINS.iter().any(|pattern| glob_match(pattern, &host))
}

/// Parse and screen an external link
pub fn validate_external_url(input: &str) -> UrlValidationResult {
    let url = match Url::parse(input.trim()) {
        Ok(url) => url,
        Err(e) => return UrlValidationResult::invalid(format!("Invalid URL: {}", e)),
    };

    if !EXTERNAL_SCHEMES.contains(&url.scheme()) {
        return UrlValidationResult::invalid(format!(
            "URL scheme '{}' is not allowed, use http or https",
            url.scheme()
        ));
    }

    let mut result = UrlValidationResult {
        is_valid: true,
        is_safe: true,
        sanitized_url: url.to_string(),
        warnings: Vec::new(),
    };

    match url.host() {
        Some(Host::Domain(domain)) => {
            if is_shortener(domain) {
                result.unsafe_because("Shortened links are not allowed");
            }
            if is_localhost(domain) {
                result.unsafe_because("Local addresses are not allowed");
            }
        }
        Some(Host::Ipv4(_)) | Some(Host::Ipv6(_)) => {
            result.unsafe_because("Links to IP addresses are not allowed");
        }
        None => result.unsafe_because("URL has no host"),
    }

    if has_userinfo(input.trim(), &url) {
        result.unsafe_because("URL contains '@' before the host, which can disguise the real host");
    }

    if let Some(host) = url.host_str() {
        if !is_recognized_domain(host) {
            result
                .warnings
                .push(format!("Domain '{}' is not a recognized content provider", host));
        }
    }

    if !result.is_safe {
        log::warn!("Unsafe link {}: {}", result.sanitized_url, result.warnings.join("; "));
    }

    result
}
