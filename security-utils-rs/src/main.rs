//! `input-guard` command line tool
//!
//! Validates a value, a declared upload or an external link and prints the
//! result as JSON. Values go through the remote security-utils function when
//! `SECURITY_UTILS_URL` is set.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use input_guard::{
    validate_external_url, validate_file, FileDescriptor, GuardConfig, InputKind, InputValidator,
    ValidationRules,
};
use security_utils::{RemoteGuard, SecurityUtilsConfig};
use serde::Serialize;

/// Sanitize and screen user input
#[derive(Parser, Debug)]
#[command(name = "input-guard")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate a form value
    Check {
        /// text, email, search, html, url, phone or cpf
        kind: InputKind,

        value: String,

        #[arg(long)]
        max_length: Option<usize>,

        #[arg(long)]
        min_length: Option<usize>,

        #[arg(long)]
        required: bool,

        /// Only validate locally, even when the remote function is configured
        #[arg(long)]
        local: bool,
    },

    /// Validate a declared upload
    File {
        name: String,

        mime_type: String,

        /// Size in bytes
        size: u64,
    },

    /// Screen an external link
    Link { url: String },
}

fn print_json<T: Serialize>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn exit_code(valid: bool) -> ExitCode {
    if valid {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Load environment variables
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    let config = GuardConfig::from_env()?;

    match cli.command {
        Command::Check {
            kind,
            value,
            max_length,
            min_length,
            required,
            local,
        } => {
            let mut rules = ValidationRules::new();
            rules.required = required;
            rules.min_length = min_length;
            rules.max_length = max_length;

            let validator = InputValidator::new(config);
            let remote = if local || std::env::var("SECURITY_UTILS_URL").is_err() {
                None
            } else {
                match SecurityUtilsConfig::from_env().and_then(RemoteGuard::from_config) {
                    Ok(guard) => Some(guard.with_local_validator(validator.clone())),
                    Err(e) => {
                        log::warn!("Remote validation disabled: {}", e);
                        None
                    }
                }
            };

            let result = match remote {
                Some(guard) => guard.validate_input_server(&value, kind, &rules).await,
                None => validator.validate(Some(&value), kind, &rules),
            };

            print_json(&result)?;
            Ok(exit_code(result.is_valid))
        }
        Command::File {
            name,
            mime_type,
            size,
        } => {
            let result = validate_file(&FileDescriptor::new(name, mime_type, size));
            print_json(&result)?;
            Ok(exit_code(result.is_valid))
        }
        Command::Link { url } => {
            let result = validate_external_url(&url);
            print_json(&result)?;
            Ok(exit_code(result.is_valid && result.is_safe))
        }
    }
}
