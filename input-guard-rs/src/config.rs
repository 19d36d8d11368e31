//! Guard configuration
//!
//! Policies that decide how strictly detections are enforced. Defaults keep
//! the lenient behavior: threats are stripped and reported, signature
//! mismatches are only logged.

use crate::errors::{GuardError, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

/// Environment variable selecting the [`ThreatPolicy`]
pub const ENV_THREAT_POLICY: &str = "INPUT_GUARD_THREAT_POLICY";
/// Environment variable selecting the [`SignaturePolicy`]
pub const ENV_SIGNATURE_POLICY: &str = "INPUT_GUARD_SIGNATURE_POLICY";
/// Environment variable overriding the search query length cap
pub const ENV_SEARCH_MAX_LENGTH: &str = "INPUT_GUARD_SEARCH_MAX_LENGTH";

/// Default cap applied by the search sanitizer
pub const DEFAULT_SEARCH_MAX_LENGTH: usize = 200;

/// Number of leading bytes inspected by the signature check
pub const DEFAULT_SIGNATURE_PROBE_BYTES: usize = 512;

/// What to do with input in which a threat pattern was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThreatPolicy {
    /// Strip the match, warn and raise the risk level
    #[default]
    Sanitize,
    /// Same as `Sanitize`, and also mark the input invalid
    Reject,
}

/// What to do when file bytes contradict the declared MIME type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignaturePolicy {
    /// Log at error level and report a warning
    #[default]
    LogOnly,
    /// Report the mismatch as a hard error
    Reject,
}

impl FromStr for ThreatPolicy {
    type Err = GuardError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "sanitize" => Ok(ThreatPolicy::Sanitize),
            "reject" => Ok(ThreatPolicy::Reject),
            other => Err(GuardError::configuration(
                ENV_THREAT_POLICY,
                format!("expected 'sanitize' or 'reject', got '{}'", other),
            )),
        }
    }
}

impl FromStr for SignaturePolicy {
    type Err = GuardError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "log_only" | "log" => Ok(SignaturePolicy::LogOnly),
            "reject" => Ok(SignaturePolicy::Reject),
            other => Err(GuardError::configuration(
                ENV_SIGNATURE_POLICY,
                format!("expected 'log_only' or 'reject', got '{}'", other),
            )),
        }
    }
}

/// Configuration shared by the orchestrator and the file checks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuardConfig {
    /// Enforcement of detected threat content
    pub threat_policy: ThreatPolicy,
    /// Enforcement of byte-signature mismatches
    pub signature_policy: SignaturePolicy,
    /// Maximum length of a sanitized search query
    pub search_max_length: usize,
    /// Bytes read from the head of a file for signature checks
    pub signature_probe_bytes: usize,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            threat_policy: ThreatPolicy::default(),
            signature_policy: SignaturePolicy::default(),
            search_max_length: DEFAULT_SEARCH_MAX_LENGTH,
            signature_probe_bytes: DEFAULT_SIGNATURE_PROBE_BYTES,
        }
    }
}

impl GuardConfig {
    /// Load the configuration from process environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load the configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup(ENV_THREAT_POLICY) {
            config.threat_policy = value.parse()?;
        }
        if let Some(value) = lookup(ENV_SIGNATURE_POLICY) {
            config.signature_policy = value.parse()?;
        }
        if let Some(value) = lookup(ENV_SEARCH_MAX_LENGTH) {
            config.search_max_length = value.trim().parse::<usize>().map_err(|e| {
                GuardError::configuration(ENV_SEARCH_MAX_LENGTH, e.to_string())
            })?;
        }

        Ok(config)
    }

    /// Builder-style setter for the threat policy
    pub fn with_threat_policy(mut self, policy: ThreatPolicy) -> Self {
        self.threat_policy = policy;
        self
    }

    /// Builder-style setter for the signature policy
    pub fn with_signature_policy(mut self, policy: SignaturePolicy) -> Self {
        self.signature_policy = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = GuardConfig::default();
        assert_eq!(config.threat_policy, ThreatPolicy::Sanitize);
        assert_eq!(config.signature_policy, SignaturePolicy::LogOnly);
        assert_eq!(config.search_max_length, DEFAULT_SEARCH_MAX_LENGTH);
        assert_eq!(config.signature_probe_bytes, DEFAULT_SIGNATURE_PROBE_BYTES);
    }

    #[test]
    fn test_from_lookup() {
        let vars: HashMap<&str, &str> = [
            (ENV_THREAT_POLICY, "Reject"),
            (ENV_SIGNATURE_POLICY, "log-only"),
            (ENV_SEARCH_MAX_LENGTH, " 120 "),
        ]
        .into_iter()
        .collect();

        let config = GuardConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(config.threat_policy, ThreatPolicy::Reject);
        assert_eq!(config.signature_policy, SignaturePolicy::LogOnly);
        assert_eq!(config.search_max_length, 120);
    }

    #[test]
    fn test_from_lookup_rejects_garbage() {
        let result = GuardConfig::from_lookup(|k| {
            (k == ENV_THREAT_POLICY).then(|| "sometimes".to_string())
        });
        assert!(matches!(result, Err(GuardError::Configuration { .. })));

        let result = GuardConfig::from_lookup(|k| {
            (k == ENV_SEARCH_MAX_LENGTH).then(|| "lots".to_string())
        });
        assert!(result.is_err());
    }
}
