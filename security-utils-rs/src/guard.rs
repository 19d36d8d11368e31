//! Server-side delegation with graceful degradation
//!
//! Each call goes to the remote backend once. Validation falls back to the
//! local orchestrator, rate limiting fails open and audit logging is
//! fail-silent, so an outage never blocks the user-facing action.

use std::sync::Arc;
use std::time::Duration;

use input_guard::{InputKind, InputValidator, ValidationResult, ValidationRules};
use log::{debug, warn};

use crate::client::{SecurityBackend, SecurityUtilsClient};
use crate::config::SecurityUtilsConfig;
use crate::error::Result;
use crate::ip::{HttpIpResolver, IpResolver, NoopIpResolver};
use crate::models::{RateLimitStatus, RemoteRules, SecurityEvent, SecurityLogEntry};

pub struct RemoteGuard {
    backend: Arc<dyn SecurityBackend>,
    ip_resolver: Arc<dyn IpResolver>,
    local: InputValidator,
}

impl RemoteGuard {
    /// Guard without IP lookup, falling back to a default local validator
    pub fn new(backend: Arc<dyn SecurityBackend>) -> Self {
        Self {
            backend,
            ip_resolver: Arc::new(NoopIpResolver),
            local: InputValidator::default(),
        }
    }

    /// Guard backed by [`SecurityUtilsClient`] and [`HttpIpResolver`]
    pub fn from_config(config: SecurityUtilsConfig) -> Result<Self> {
        let resolver = HttpIpResolver::new(
            config.ip_lookup_url.clone(),
            Duration::from_secs(config.timeout_seconds),
        )?;
        let client = SecurityUtilsClient::new(config)?;

        Ok(Self::new(Arc::new(client)).with_ip_resolver(Arc::new(resolver)))
    }

    pub fn with_ip_resolver(mut self, resolver: Arc<dyn IpResolver>) -> Self {
        self.ip_resolver = resolver;
        self
    }

    pub fn with_local_validator(mut self, validator: InputValidator) -> Self {
        self.local = validator;
        self
    }

    /// Validate remotely; any failure falls back to local validation
    pub async fn validate_input_server(
        &self,
        input: &str,
        kind: InputKind,
        rules: &ValidationRules,
    ) -> ValidationResult {
        let remote_rules = RemoteRules::from(rules);

        match self.backend.validate_input(input, kind, &remote_rules).await {
            Ok(result) => {
                debug!("Server-side validation of {} input: valid {}", kind, result.is_valid);
                result
            }
            Err(e) => {
                warn!("Server-side validation unavailable, validating locally: {}", e);
                self.local.validate(Some(input), kind, rules)
            }
        }
    }

    /// Rate limit decision; allowed when the backend cannot answer
    pub async fn check_rate_limit(
        &self,
        identifier: &str,
        action_type: &str,
        max_requests: u32,
        window_seconds: u64,
    ) -> RateLimitStatus {
        match self
            .backend
            .rate_limit_check(identifier, action_type, max_requests, window_seconds)
            .await
        {
            Ok(status) => status,
            Err(e) => {
                warn!("Rate limit check for '{}' failed, allowing: {}", action_type, e);
                RateLimitStatus::fail_open()
            }
        }
    }

    /// Record an event with the caller's IP when it can be resolved
    pub async fn log_security_event(&self, event: SecurityEvent) {
        let ip_address = self.ip_resolver.client_ip().await;
        let entry = SecurityLogEntry::from_event(event, ip_address);

        if let Err(e) = self.backend.security_log(&entry).await {
            debug!("Dropped security event {} ({}): {}", entry.event_id, entry.event_type, e);
        }
    }
}
