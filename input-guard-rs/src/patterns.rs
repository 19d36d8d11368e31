//! Threat pattern library
//!
//! Static regular expressions grouped by threat class. The orchestrator walks
//! [`PATTERN_LIBRARY`] generically, so a new class only needs a new
//! [`ThreatCategory`] variant and a [`PatternSet`] entry here.
//!
//! None of the patterns may match inside HTML entities (`&lt;`, `&#x2F;`),
//! otherwise re-validating encoded output would mangle it.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Tags whose presence in free input is treated as script injection
const XSS_TAGS: [&str; 5] = ["script", "iframe", "object", "embed", "form"];

/// A named class of attack pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreatCategory {
    Xss,
    SqlInjection,
    CommandInjection,
    PathTraversal,
}

impl ThreatCategory {
    /// Identifier used in warnings and logs
    pub fn name(&self) -> &'static str {
        match self {
            ThreatCategory::Xss => "xss",
            ThreatCategory::SqlInjection => "sql_injection",
            ThreatCategory::CommandInjection => "command_injection",
            ThreatCategory::PathTraversal => "path_traversal",
        }
    }

    /// Score contributed to the risk classification when the class matches
    pub fn weight(&self) -> u32 {
        match self {
            ThreatCategory::Xss => 3,
            ThreatCategory::SqlInjection => 2,
            ThreatCategory::CommandInjection => 3,
            ThreatCategory::PathTraversal => 2,
        }
    }
}

impl fmt::Display for ThreatCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// All patterns belonging to one threat class
#[derive(Debug, Clone)]
pub struct PatternSet {
    pub category: ThreatCategory,
    pub patterns: Vec<Regex>,
}

impl PatternSet {
    fn compile(category: ThreatCategory, patterns: &[String]) -> Self {
        Self {
            category,
            patterns: patterns.iter().map(|p| Regex::new(p).unwrap()).collect(),
        }
    }

    /// Whether any pattern of the class occurs in `input`
    pub fn is_match(&self, input: &str) -> bool {
        self.patterns.iter().any(|re| re.is_match(input))
    }

    /// Remove every match of every pattern in order, or `None` when the
    /// class does not occur at all
    pub fn strip(&self, input: &str) -> Option<String> {
        if !self.is_match(input) {
            return None;
        }

        let stripped = self
            .patterns
            .iter()
            .fold(input.to_string(), |acc, re| re.replace_all(&acc, "").into_owned());
        Some(stripped)
    }
}

fn xss_patterns() -> Vec<String> {
    let mut patterns: Vec<String> = XSS_TAGS
        .iter()
        .map(|tag| format!(r"(?is)<\s*{tag}\b[^>]*>.*?<\s*/\s*{tag}\s*>"))
        .collect();
    patterns.push(format!(r"(?i)<\s*/?\s*(?:{})\b[^>]*>?", XSS_TAGS.join("|")));
    patterns.push(r"(?i)\b(?:javascript|vbscript)\s*:".to_string());
    patterns.push(
        r"(?i)\bon(?:abort|animation\w*|beforeunload|blur|change|click|contextmenu|copy|cut|dblclick|drag\w*|drop|error|focus\w*|hashchange|input|invalid|key\w+|load|message|mouse\w+|paste|pause|play\w*|pointer\w+|popstate|reset|resize|scroll|search|select|show|submit|toggle|touch\w+|transition\w*|unload|wheel)\s*="
            .to_string(),
    );
    patterns
}

fn sql_patterns() -> Vec<String> {
    [
        r"(?i)\bunion\s+(?:all\s+)?select\b",
        r"(?i)\bselect\s+[\w*,.()\s]+?\s+from\b",
        r"(?i)\binsert\s+into\b",
        r"(?i)\bdelete\s+from\b",
        r"(?i)\bdrop\s+(?:table|database|schema)\b",
        r"(?i)\btruncate\s+table\b",
        r"(?i)\balter\s+table\b",
        r"(?i)\bupdate\s+\w+\s+set\b",
        r"(?i)\bexec(?:ute)?\s*\(",
        r"(?i)'\s*or\s+'?\w+'?\s*=\s*'?\w+",
        r"'\s*;",
        r"--",
        r"/\*",
        r"\*/",
    ]
    .iter()
    .map(|p| p.to_string())
    .collect()
}

fn command_patterns() -> Vec<String> {
    [
        r"\$\([^)]*\)",
        r"\$\{[^}]*\}",
        r"`[^`]*`",
        r"(?i)(?:\|\||&&|\|)\s*(?:rm|wget|curl|nc|netcat|bash|sh|zsh|chmod|chown|mkfs|dd|shutdown|reboot|kill)\b",
        r"(?i)\brm\s+-[a-z]*[rf][a-z]*\b",
    ]
    .iter()
    .map(|p| p.to_string())
    .collect()
}

fn path_traversal_patterns() -> Vec<String> {
    [
        r"\.\.[/\\]",
        r"(?i)(?:\.\.|%2e%2e)(?:%2f|%5c)",
        r"(?i)%2e%2e[/\\]",
    ]
    .iter()
    .map(|p| p.to_string())
    .collect()
}

lazy_static! {
    /// Every threat class, in the order the orchestrator tests them
    pub static ref PATTERN_LIBRARY: Vec<PatternSet> = vec![
        PatternSet::compile(ThreatCategory::Xss, &xss_patterns()),
        PatternSet::compile(ThreatCategory::SqlInjection, &sql_patterns()),
        PatternSet::compile(ThreatCategory::CommandInjection, &command_patterns()),
        PatternSet::compile(ThreatCategory::PathTraversal, &path_traversal_patterns()),
    ];
}

/// Buffer and detections threaded through the pattern fold
#[derive(Debug, Clone, PartialEq)]
pub struct ThreatScan {
    /// Input with every detected match removed
    pub sanitized: String,
    /// Matched classes in order of first detection, without repeats
    pub categories: Vec<ThreatCategory>,
}

impl ThreatScan {
    fn clean(input: &str) -> Self {
        Self {
            sanitized: input.to_string(),
            categories: Vec::new(),
        }
    }

    fn with_detection(mut self, category: ThreatCategory, stripped: String) -> Self {
        if !self.categories.contains(&category) {
            self.categories.push(category);
        }
        self.sanitized = stripped;
        self
    }

    /// True when nothing was found
    pub fn is_clean(&self) -> bool {
        self.categories.is_empty()
    }
}

/// One pass over `library`, each class seeing the output of the previous one
pub fn scan_once_with(library: &[PatternSet], input: &str) -> ThreatScan {
    library
        .iter()
        .fold(ThreatScan::clean(input), |scan, set| match set.strip(&scan.sanitized) {
            Some(stripped) => scan.with_detection(set.category, stripped),
            None => scan,
        })
}

/// Repeat passes until one detects nothing, so removals cannot assemble a
/// new match (`<scr<script>ipt>`). A detecting round either shrinks the
/// buffer or leaves it unchanged, and an unchanged buffer ends the loop.
pub fn scan_threats_with(library: &[PatternSet], input: &str) -> ThreatScan {
    let mut scan = ThreatScan::clean(input);

    loop {
        let round = scan_once_with(library, &scan.sanitized);
        if round.is_clean() {
            break;
        }
        let stalled = round.sanitized == scan.sanitized;
        scan = round
            .categories
            .into_iter()
            .fold(scan, |acc, category| acc.with_detection(category, round.sanitized.clone()));
        if stalled {
            break;
        }
    }

    scan
}

/// Scan `input` against the built-in library
pub fn scan_threats(input: &str) -> ThreatScan {
    scan_threats_with(&PATTERN_LIBRARY, input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn set(category: ThreatCategory) -> &'static PatternSet {
        PATTERN_LIBRARY
            .iter()
            .find(|s| s.category == category)
            .unwrap()
    }

    #[test_case("<script>alert(1)</script>" ; "script pair")]
    #[test_case("<SCRIPT src=x>" ; "unpaired uppercase tag")]
    #[test_case("<iframe src=\"evil\"></iframe>" ; "iframe")]
    #[test_case("javascript:alert(1)" ; "javascript uri")]
    #[test_case("<img src=x onerror=alert(1)>" ; "event handler")]
    fn test_xss_detected(input: &str) {
        assert!(set(ThreatCategory::Xss).is_match(input));
    }

    #[test_case("SELECT * FROM users" ; "select from")]
    #[test_case("1 UNION ALL SELECT password" ; "union select")]
    #[test_case("x'; DROP TABLE users" ; "stacked drop")]
    #[test_case("admin' OR '1'='1" ; "tautology")]
    #[test_case("name -- comment" ; "comment")]
    fn test_sql_detected(input: &str) {
        assert!(set(ThreatCategory::SqlInjection).is_match(input));
    }

    #[test_case("$(whoami)" ; "substitution")]
    #[test_case("`id`" ; "backticks")]
    #[test_case("file.txt | sh" ; "pipe to shell")]
    #[test_case("; rm -rf /" ; "rm rf")]
    fn test_command_injection_detected(input: &str) {
        assert!(set(ThreatCategory::CommandInjection).is_match(input));
    }

    #[test_case("../../etc/passwd" ; "unix")]
    #[test_case("..\\..\\windows" ; "windows")]
    #[test_case("%2e%2e%2fsecret" ; "encoded")]
    fn test_path_traversal_detected(input: &str) {
        assert!(set(ThreatCategory::PathTraversal).is_match(input));
    }

    #[test_case("Curso de fotografia para iniciantes" ; "plain text")]
    #[test_case("Please select your size" ; "select without from")]
    #[test_case("Tom &amp; Jerry &lt;select&gt; &#x2F;" ; "html entities")]
    #[test_case("someone@example.com" ; "email")]
    fn test_benign_input_is_clean(input: &str) {
        assert!(scan_threats(input).is_clean(), "false positive on {input:?}");
    }

    #[test]
    fn test_weights() {
        assert_eq!(ThreatCategory::Xss.weight(), 3);
        assert_eq!(ThreatCategory::SqlInjection.weight(), 2);
        assert_eq!(ThreatCategory::CommandInjection.weight(), 3);
        assert_eq!(ThreatCategory::PathTraversal.weight(), 2);
    }

    #[test]
    fn test_scan_strips_and_records_in_library_order() {
        let scan = scan_threats("hi <script>x</script> ../ SELECT a FROM b");

        assert_eq!(
            scan.categories,
            vec![
                ThreatCategory::Xss,
                ThreatCategory::SqlInjection,
                ThreatCategory::PathTraversal
            ]
        );
        assert!(!scan.sanitized.to_lowercase().contains("<script"));
        assert!(!scan.sanitized.contains("../"));
    }

    #[test]
    fn test_scan_reaches_fixed_point() {
        let scan = scan_threats("<scr<script>x</script>ipt>alert(1)</script>");
        assert!(!scan.sanitized.to_lowercase().contains("<script"));
        assert!(scan_threats(&scan.sanitized).is_clean());

        // a comment delimiter hiding a tag is caught on the next round
        let scan = scan_threats("<scr--ipt>");
        assert_eq!(
            scan.categories,
            vec![ThreatCategory::SqlInjection, ThreatCategory::Xss]
        );
        assert!(scan_threats(&scan.sanitized).is_clean());
    }

    #[test]
    fn test_deeply_nested_tags_are_peeled() {
        let input = format!(
            "<script>a</script> {}<script>{}",
            "<scr".repeat(20),
            "ipt>".repeat(20)
        );

        let scan = scan_threats(&input);
        assert_eq!(scan.categories, vec![ThreatCategory::Xss]);
        assert!(!scan.sanitized.to_lowercase().contains("<script"));
        assert!(scan_threats(&scan.sanitized).is_clean());
    }

    #[test]
    fn test_empty_match_does_not_spin() {
        let library = vec![PatternSet {
            category: ThreatCategory::SqlInjection,
            patterns: vec![Regex::new("x*").unwrap()],
        }];

        let scan = scan_threats_with(&library, "axxb");
        assert_eq!(scan.categories, vec![ThreatCategory::SqlInjection]);
        assert_eq!(scan.sanitized, "ab");
    }

    #[test]
    fn test_custom_library_is_walked_generically() {
        let library = vec![PatternSet {
            category: ThreatCategory::PathTraversal,
            patterns: vec![Regex::new("forbidden").unwrap()],
        }];

        let scan = scan_threats_with(&library, "a forbidden word");
        assert_eq!(scan.categories, vec![ThreatCategory::PathTraversal]);
        assert_eq!(scan.sanitized, "a  word");
    }
}
