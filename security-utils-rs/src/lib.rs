//! # Security Utils
//!
//! Client for the remote "security-utils" function that backs the input
//! guard: server-side validation, rate limiting and security event logging.
//!
//! - `SecurityBackend`: the remote collaborator, implemented over HTTP by
//!   `SecurityUtilsClient`
//! - `RemoteGuard`: the application-facing API, which degrades to local
//!   validation, fail-open rate limiting and silent logging on any failure
//! - `IpResolver`: best-effort public IP lookup for audit events

pub mod client;
pub mod config;
pub mod error;
pub mod guard;
pub mod ip;
pub mod models;

pub use client::{SecurityBackend, SecurityUtilsClient};
pub use config::{ConfigProvider, EnvConfigProvider, MemoryConfigProvider, SecurityUtilsConfig};
pub use error::{Result, ServiceError};
pub use guard::RemoteGuard;
pub use ip::{HttpIpResolver, IpResolver, NoopIpResolver};
pub use models::{RateLimitStatus, RemoteRules, SecurityEvent, Severity};

#[cfg(test)]
mod tests;
