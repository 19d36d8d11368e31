//! Tests against mock security-utils and IP lookup servers


use crate::config::SecurityUtilsConfig;
use wiremock::MockServer;

pub(crate) const FUNCTION_PATH: &str = "/functions/v1/security-utils";
pub(crate) const API_KEY: &str = "mock-anon-key";

/// Config pointing the client at the mock server
pub(crate) fn mock_config(server: &MockServer) -> SecurityUtilsConfig {
    let mut config = SecurityUtilsConfig::new(server.uri(), API_KEY);
    config.timeout_seconds = 1;
    config.ip_lookup_url = format!("{}/ip", server.uri());
    config
}
