//! Risk classification
//!
//! Maps the threat classes matched during one validation call to a
//! qualitative level. Used for logging and telemetry only, never for
//! blocking.

use crate::patterns::ThreatCategory;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity derived from accumulated threat weight
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    #[default]
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sum of the weights of the matched classes
pub fn threat_score(categories: &[ThreatCategory]) -> u32 {
    categories.iter().map(ThreatCategory::weight).sum()
}

/// Level for a numeric score
pub fn classify(score: u32) -> RiskLevel {
    match score {
        s if s >= 3 => RiskLevel::Critical,
        2 => RiskLevel::High,
        1 => RiskLevel::Medium,
        _ => RiskLevel::Low,
    }
}

/// Level for a set of matched classes
pub fn assess(categories: &[ThreatCategory]) -> RiskLevel {
    classify(threat_score(categories))
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(0, RiskLevel::Low)]
    #[test_case(1, RiskLevel::Medium)]
    #[test_case(2, RiskLevel::High)]
    #[test_case(3, RiskLevel::Critical)]
    #[test_case(10, RiskLevel::Critical)]
    fn test_classify(score: u32, expected: RiskLevel) {
        assert_eq!(classify(score), expected);
    }

    #[test]
    fn test_assess() {
        assert_eq!(assess(&[]), RiskLevel::Low);
        assert_eq!(assess(&[ThreatCategory::SqlInjection]), RiskLevel::High);
        assert_eq!(assess(&[ThreatCategory::PathTraversal]), RiskLevel::High);
        assert_eq!(assess(&[ThreatCategory::Xss]), RiskLevel::Critical);
        assert_eq!(
            threat_score(&[ThreatCategory::SqlInjection, ThreatCategory::PathTraversal]),
            4
        );
    }

    #[test]
    fn test_levels_are_ordered() {
        assert!(RiskLevel::Low < RiskLevel::Medium);
        assert!(RiskLevel::High < RiskLevel::Critical);
        assert_eq!(serde_json::to_string(&RiskLevel::High).unwrap(), "\"high\"");
    }
}
