//! Best-effort lookup of the caller's public IP, attached to audit events

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::Deserialize;

use crate::client::build_http_client;
use crate::error::Result;

#[async_trait]
pub trait IpResolver: Send + Sync {
    /// Public address, or `None` when it cannot be determined
    async fn client_ip(&self) -> Option<String>;
}

#[derive(Debug, Deserialize)]
struct IpResponse {
    ip: String,
}

/// Resolver asking an HTTP service that answers `{"ip": "..."}`
pub struct HttpIpResolver {
    http_client: Client,
    lookup_url: String,
}

impl HttpIpResolver {
    pub fn new(lookup_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            http_client: build_http_client(timeout)?,
            lookup_url: lookup_url.into(),
        })
    }
}

#[async_trait]
impl IpResolver for HttpIpResolver {
    async fn client_ip(&self) -> Option<String> {
        let response = match self.http_client.get(&self.lookup_url).send().await {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                debug!("IP lookup answered {}", response.status());
                return None;
            }
            Err(e) => {
                debug!("IP lookup failed: {}", e);
                return None;
            }
        };

        match response.json::<IpResponse>().await {
            Ok(body) if !body.ip.is_empty() => Some(body.ip),
            Ok(_) => None,
            Err(e) => {
                debug!("IP lookup returned an unexpected body: {}", e);
                None
            }
        }
    }
}

/// Resolver that never knows the address
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopIpResolver;

#[async_trait]
impl IpResolver for NoopIpResolver {
    async fn client_ip(&self) -> Option<String> {
        None
    }
}
