//! `signbridge-config` — bridge runtime configuration.
//!
//! Provides:
//! - Typed config schema with built-in defaults
//! - Optional YAML file with `${ENV_VAR}` substitution
//! - Environment overlay (`REDIS_URL`, `WALLETCONNECT_PROJECT_ID`, `SIGNBRIDGE_*`)
//! - Validation report and redaction for safe logging

pub mod defaults;
pub mod env;
pub mod error;
pub mod io;
pub mod redact;
pub mod schema;
pub mod validation;

pub use env::{apply_env, apply_env_with, resolve_env_vars, resolve_env_vars_with};
pub use error::ConfigError;
pub use io::{discover_config, load_file};
pub use redact::{redact, redact_url};
pub use schema::{BridgeConfig, LoggingConfig, QueueNames, Timeouts};
pub use validation::{validate, ConfigValidationError, ValidationReport};

use anyhow::{bail, Result};
use std::path::Path;

/// Built-in defaults, then the optional YAML file, then the environment.
///
/// Without an explicit `path`, [`io::discover_config`] picks the file, if any.
pub async fn load(path: Option<&Path>) -> Result<BridgeConfig> {
    let path = path.map(Path::to_path_buf).or_else(io::discover_config);
    let config = match path {
        Some(path) => load_file(&path).await?,
        None => BridgeConfig::default(),
    };
    Ok(apply_env(config)?)
}

/// Validate `config`, logging every finding. Fails when any error was found.
pub fn prepare(config: BridgeConfig) -> Result<BridgeConfig> {
    let report = validate(&config);
    for warning in &report.warnings {
        tracing::warn!(path = %warning.path, message = %warning.message, "Config warning");
    }
    for error in &report.errors {
        tracing::error!(path = %error.path, message = %error.message, "Config error");
    }
    if !report.is_valid() {
        bail!("invalid configuration: {} error(s)", report.errors.len());
    }
    Ok(config)
}
