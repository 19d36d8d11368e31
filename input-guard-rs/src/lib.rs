//! # Input Guard
//!
//! Sanitization and threat detection for values typed into storefront forms
//! and files or links handed to upload components, applied before anything
//! is sent to the backend or rendered back to users.
//!
//! ## Features
//!
//! - Threat pattern library (XSS, SQL injection, command injection, path traversal)
//! - Sanitizers per input kind (text, email, search, html, url, phone, CPF)
//! - A single orchestrator returning a structured [`ValidationResult`]
//! - Risk classification of detected threats
//! - Upload checks: extension blacklist, MIME whitelist, size ceilings, byte signatures
//! - External link screening

mod config;
mod errors;
mod rules;
mod validator;
pub mod files;
pub mod patterns;
pub mod risk;
pub mod sanitizers;
pub mod url_safety;

pub use config::{
    GuardConfig, SignaturePolicy, ThreatPolicy, DEFAULT_SEARCH_MAX_LENGTH,
    DEFAULT_SIGNATURE_PROBE_BYTES, ENV_SEARCH_MAX_LENGTH, ENV_SIGNATURE_POLICY, ENV_THREAT_POLICY,
};
pub use errors::{GuardError, Result};
pub use files::{
    check_file_signature, check_path_signature, validate_file, validate_file_with_contents,
    FileCategory, FileDescriptor, FileValidationResult,
};
pub use patterns::{scan_threats, ThreatCategory, ThreatScan};
pub use risk::RiskLevel;
pub use rules::{CustomValidator, ValidationRules};
pub use sanitizers::InputKind;
pub use url_safety::{validate_external_url, UrlValidationResult};
pub use validator::{validate_input, InputValidator, ValidationResult};

/// Re-export commonly used items for convenience
pub mod prelude {
    pub use crate::config::GuardConfig;
    pub use crate::errors::{GuardError, Result};
    pub use crate::files::{validate_file, FileDescriptor, FileValidationResult};
    pub use crate::rules::ValidationRules;
    pub use crate::sanitizers::InputKind;
    pub use crate::url_safety::{validate_external_url, UrlValidationResult};
    pub use crate::validator::{validate_input, InputValidator, ValidationResult};
    pub use crate::RiskLevel;
}

/// Version of the guard library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
