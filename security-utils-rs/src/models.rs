//! Wire types of the security-utils function
//!
//! Every request is a JSON object whose `action` field selects the
//! operation; the remaining fields are the payload of that action.

use chrono::{DateTime, Utc};
use input_guard::{InputKind, ValidationRules};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Request body sent to the function
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum SecurityAction {
    ValidateInput(ValidateInputPayload),
    RateLimitCheck(RateLimitPayload),
    SecurityLog(SecurityLogEntry),
}

impl SecurityAction {
    pub fn name(&self) -> &'static str {
        match self {
            SecurityAction::ValidateInput(_) => "validate_input",
            SecurityAction::RateLimitCheck(_) => "rate_limit_check",
            SecurityAction::SecurityLog(_) => "security_log",
        }
    }
}

/// Rule fields the remote side understands
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteRules {
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

impl From<&ValidationRules> for RemoteRules {
    fn from(rules: &ValidationRules) -> Self {
        Self {
            required: rules.required,
            min_length: rules.min_length,
            max_length: rules.max_length,
            pattern: rules.pattern.as_ref().map(|re| re.as_str().to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidateInputPayload {
    pub input: String,
    #[serde(rename = "type")]
    pub kind: InputKind,
    pub rules: RemoteRules,
}

#[derive(Debug, Clone, Serialize)]
pub struct RateLimitPayload {
    pub identifier: String,
    pub action_type: String,
    pub max_requests: u32,
    pub window_seconds: u64,
}

/// Answer to a rate limit check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitStatus {
    pub allowed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining: Option<u32>,
}

impl RateLimitStatus {
    /// Decision used when the limiter cannot be reached
    pub fn fail_open() -> Self {
        Self {
            allowed: true,
            remaining: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

/// Event reported by the application
#[derive(Debug, Clone, PartialEq)]
pub struct SecurityEvent {
    pub event_type: String,
    pub severity: Severity,
    pub details: Value,
}

impl SecurityEvent {
    pub fn new(event_type: impl Into<String>, severity: Severity, details: Value) -> Self {
        Self {
            event_type: event_type.into(),
            severity,
            details,
        }
    }
}

/// Event as recorded remotely
#[derive(Debug, Clone, Serialize)]
pub struct SecurityLogEntry {
    pub event_type: String,
    pub severity: Severity,
    pub details: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub event_id: Uuid,
}

impl SecurityLogEntry {
    /// Stamp an event with a fresh id and the current time
    pub fn from_event(event: SecurityEvent, ip_address: Option<String>) -> Self {
        Self {
            event_type: event.event_type,
            severity: event.severity,
            details: event.details,
            ip_address,
            timestamp: Utc::now(),
            event_id: Uuid::new_v4(),
        }
    }
}
