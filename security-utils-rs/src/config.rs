//! Configuration for the security-utils client
//!
//! Values come from a [`ConfigProvider`]; the environment provider maps a
//! key such as `api_key` to `SECURITY_UTILS_API_KEY` (with an optional
//! extra prefix in front).

use std::collections::HashMap;
use std::env;

use once_cell::sync::Lazy;
use url::Url;

use crate::error::{Result, ServiceError};

/// Namespace of every environment variable read by the client
pub const ENV_NAMESPACE: &str = "SECURITY_UTILS";

pub const DEFAULT_TIMEOUT_SECONDS: u64 = 10;
pub const DEFAULT_IP_LOOKUP_URL: &str = "https://api.ipify.org?format=json";
pub const DEFAULT_FUNCTION_NAME: &str = "security-utils";

/// Provider reading `SECURITY_UTILS_*` variables
pub static DEFAULT_PROVIDER: Lazy<EnvConfigProvider> =
    Lazy::new(|| EnvConfigProvider::new().with_namespace(ENV_NAMESPACE));

/// Base trait for configuration providers
pub trait ConfigProvider: Send + Sync {
    /// Get a string configuration value
    fn get_string(&self, key: &str) -> Result<String>;
}

/// Extension methods for configuration providers
pub trait ConfigProviderExt: ConfigProvider {
    /// Get an unsigned integer configuration value
    fn get_u64(&self, key: &str) -> Result<u64> {
        let value = self.get_string(key)?;
        value
            .trim()
            .parse::<u64>()
            .map_err(|e| ServiceError::configuration(format!("Invalid integer for key {}: {}", key, e)))
    }

    /// Get a string configuration value with a default
    fn get_string_or(&self, key: &str, default: &str) -> String {
        self.get_string(key).unwrap_or_else(|_| default.to_string())
    }
}

impl<T: ConfigProvider + ?Sized> ConfigProviderExt for T {}

/// Environment variable based configuration provider
#[derive(Debug, Clone, Default)]
pub struct EnvConfigProvider {
    /// Optional prefix for environment variables
    prefix: Option<String>,

    /// Optional namespace for variables
    namespace: Option<String>,
}

impl EnvConfigProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Format a configuration key as an environment variable
    pub fn format_key(&self, key: &str) -> String {
        let mut env_key = String::new();

        if let Some(ref prefix) = self.prefix {
            env_key.push_str(prefix);
            env_key.push('_');
        }

        if let Some(ref namespace) = self.namespace {
            env_key.push_str(namespace);
            env_key.push('_');
        }

        env_key.push_str(&key.to_uppercase().replace(|c: char| !c.is_ascii_alphanumeric(), "_"));
        env_key
    }
}

impl ConfigProvider for EnvConfigProvider {
    fn get_string(&self, key: &str) -> Result<String> {
        let env_key = self.format_key(key);

        env::var(&env_key).map_err(|e| match e {
            env::VarError::NotPresent => {
                ServiceError::configuration(format!("Environment variable not set: {}", env_key))
            }
            env::VarError::NotUnicode(_) => ServiceError::configuration(format!(
                "Environment variable is not valid unicode: {}",
                env_key
            )),
        })
    }
}

/// In-memory provider for tests or static configuration
#[derive(Debug, Clone, Default)]
pub struct MemoryConfigProvider {
    values: HashMap<String, String>,
}

impl MemoryConfigProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: ToString,
    {
        self.values.insert(key.into(), value.to_string());
    }
}

impl ConfigProvider for MemoryConfigProvider {
    fn get_string(&self, key: &str) -> Result<String> {
        self.values
            .get(key)
            .cloned()
            .ok_or_else(|| ServiceError::configuration(format!("Configuration key not found: {}", key)))
    }
}

/// Settings of the remote security-utils function
#[derive(Debug, Clone, PartialEq)]
pub struct SecurityUtilsConfig {
    /// Project URL; the function lives under `/functions/v1/`
    pub base_url: String,
    pub api_key: String,
    pub timeout_seconds: u64,
    /// Endpoint answering `{"ip": "..."}`
    pub ip_lookup_url: String,
    pub function_name: String,
}

impl SecurityUtilsConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            ip_lookup_url: DEFAULT_IP_LOOKUP_URL.to_string(),
            function_name: DEFAULT_FUNCTION_NAME.to_string(),
        }
    }

    /// Load configuration from a config provider
    pub fn from_provider<P: ConfigProvider + ?Sized>(provider: &P) -> Result<Self> {
        let timeout_seconds = match provider.get_string("timeout_seconds") {
            Ok(_) => provider.get_u64("timeout_seconds")?,
            Err(_) => DEFAULT_TIMEOUT_SECONDS,
        };

        let config = Self {
            base_url: provider.get_string("url")?,
            api_key: provider.get_string("api_key")?,
            timeout_seconds,
            ip_lookup_url: provider.get_string_or("ip_lookup_url", DEFAULT_IP_LOOKUP_URL),
            function_name: provider.get_string_or("function", DEFAULT_FUNCTION_NAME),
        };

        config.validate()?;
        Ok(config)
    }

    /// Load `.env`, then read `SECURITY_UTILS_*`
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_provider(&*DEFAULT_PROVIDER)
    }

    /// Same as [`Self::from_env`] with `{prefix}_SECURITY_UTILS_*` variables
    pub fn from_env_with_prefix(prefix: &str) -> Result<Self> {
        dotenv::dotenv().ok();
        let provider = EnvConfigProvider::new()
            .with_prefix(prefix)
            .with_namespace(ENV_NAMESPACE);
        Self::from_provider(&provider)
    }

    pub fn validate(&self) -> Result<()> {
        if self.base_url.is_empty() {
            return Err(ServiceError::configuration("security-utils base URL is required"));
        }
        Url::parse(&self.base_url).map_err(|e| {
            ServiceError::configuration(format!("Invalid security-utils base URL: {}", e))
        })?;

        if self.api_key.is_empty() {
            return Err(ServiceError::configuration("security-utils API key is required"));
        }

        if self.timeout_seconds == 0 {
            return Err(ServiceError::configuration("Timeout must be greater than zero"));
        }

        if self.function_name.is_empty() {
            return Err(ServiceError::configuration("Function name is required"));
        }

        Ok(())
    }

    /// Full URL of the function endpoint
    pub fn function_url(&self) -> String {
        format!(
            "{}/functions/v1/{}",
            self.base_url.trim_end_matches('/'),
            self.function_name
        )
    }
}
