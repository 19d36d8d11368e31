//! HTTP client for the security-utils function

use std::time::Duration;

use async_trait::async_trait;
use input_guard::{InputKind, ValidationResult};
use log::debug;
use reqwest::{header, Client, Response};
use serde::de::DeserializeOwned;

use crate::config::SecurityUtilsConfig;
use crate::error::{Result, ServiceError};
use crate::models::{
    RateLimitPayload, RateLimitStatus, RemoteRules, SecurityAction, SecurityLogEntry,
    ValidateInputPayload,
};

const USER_AGENT: &str = concat!("input-guard/", env!("CARGO_PKG_VERSION"), " (security-utils)");

/// Remote collaborator performing validation, rate limiting and audit logging
#[async_trait]
pub trait SecurityBackend: Send + Sync {
    /// Server-side validation of one value
    async fn validate_input(
        &self,
        input: &str,
        kind: InputKind,
        rules: &RemoteRules,
    ) -> Result<ValidationResult>;

    /// Ask whether `identifier` may perform `action_type` again
    async fn rate_limit_check(
        &self,
        identifier: &str,
        action_type: &str,
        max_requests: u32,
        window_seconds: u64,
    ) -> Result<RateLimitStatus>;

    /// Record a security event
    async fn security_log(&self, entry: &SecurityLogEntry) -> Result<()>;
}

/// Build the HTTP client shared by the function and IP lookup calls
pub(crate) fn build_http_client(timeout: Duration) -> Result<Client> {
    let mut headers = header::HeaderMap::new();
    headers.insert(header::USER_AGENT, header::HeaderValue::from_static(USER_AGENT));

    Client::builder()
        .default_headers(headers)
        .timeout(timeout)
        .gzip(true)
        .build()
        .map_err(|e| ServiceError::configuration(format!("Failed to build HTTP client: {}", e)))
}

/// [`SecurityBackend`] calling `POST {base_url}/functions/v1/{function}`
pub struct SecurityUtilsClient {
    http_client: Client,
    config: SecurityUtilsConfig,
}

impl SecurityUtilsClient {
    pub fn new(config: SecurityUtilsConfig) -> Result<Self> {
        config.validate()?;
        let http_client = build_http_client(Duration::from_secs(config.timeout_seconds))?;

        Ok(Self {
            http_client,
            config,
        })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(SecurityUtilsConfig::from_env()?)
    }

    pub fn config(&self) -> &SecurityUtilsConfig {
        &self.config
    }

    async fn send(&self, action: &SecurityAction) -> Result<Response> {
        let url = self.config.function_url();
        debug!("Invoking security-utils action {}: POST {}", action.name(), url);

        let response = self
            .http_client
            .post(&url)
            .header("apikey", &self.config.api_key)
            .bearer_auth(&self.config.api_key)
            .json(action)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|e| format!("Failed to read error response: {}", e));
        Err(ServiceError::from_status(status, &body))
    }

    async fn invoke<R>(&self, action: &SecurityAction) -> Result<R>
    where
        R: DeserializeOwned,
    {
        let response = self.send(action).await?;
        response
            .json::<R>()
            .await
            .map_err(|e| ServiceError::parsing(format!("Failed to parse {} response: {}", action.name(), e)))
    }
}

#[async_trait]
impl SecurityBackend for SecurityUtilsClient {
    async fn validate_input(
        &self,
        input: &str,
        kind: InputKind,
        rules: &RemoteRules,
    ) -> Result<ValidationResult> {
        let action = SecurityAction::ValidateInput(ValidateInputPayload {
            input: input.to_string(),
            kind,
            rules: rules.clone(),
        });
        self.invoke(&action).await
    }

    async fn rate_limit_check(
        &self,
        identifier: &str,
        action_type: &str,
        max_requests: u32,
        window_seconds: u64,
    ) -> Result<RateLimitStatus> {
        let action = SecurityAction::RateLimitCheck(RateLimitPayload {
            identifier: identifier.to_string(),
            action_type: action_type.to_string(),
            max_requests,
            window_seconds,
        });
        self.invoke(&action).await
    }

    async fn security_log(&self, entry: &SecurityLogEntry) -> Result<()> {
        let action = SecurityAction::SecurityLog(entry.clone());
        self.send(&action).await?;
        Ok(())
    }
}
