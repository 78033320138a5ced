//! Environment handling for config values.
//!
//! Two passes run against the environment:
//! - `${VAR_NAME}` substitution inside string values of the YAML file.
//!   Only uppercase `[A-Z_][A-Z0-9_]*` names match; `$${VAR}` escapes to `${VAR}`.
//! - An overlay of well-known variables on top of the loaded config.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::Value;
use std::collections::HashMap;

use crate::error::ConfigError;
use crate::schema::BridgeConfig;

/// Matches `${VAR}` and its escaped form `$${VAR}`.
static ENV_VAR_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\$?)\$\{([A-Z_][A-Z0-9_]*)\}").unwrap());

pub const REDIS_URL: &str = "REDIS_URL";
pub const PROJECT_ID: &str = "WALLETCONNECT_PROJECT_ID";
pub const RUST_LOG: &str = "RUST_LOG";

/// Prefix of bridge-specific overrides, e.g. `SIGNBRIDGE_NETWORK`.
pub const PREFIX: &str = "SIGNBRIDGE_";

/// Substitute `${VAR}` references using the process environment.
pub fn resolve_env_vars(value: &Value) -> Result<Value, ConfigError> {
    resolve_env_vars_with(value, &std::env::vars().collect())
}

/// Substitute env vars using a provided map (useful for testing).
///
/// Walks the whole value tree; only string leaves are touched. A reference
/// to a variable that is unset or empty is an error.
pub fn resolve_env_vars_with(
    value: &Value,
    env: &HashMap<String, String>,
) -> Result<Value, ConfigError> {
    substitute_value(value, env, "")
}

fn substitute_value(
    value: &Value,
    env: &HashMap<String, String>,
    path: &str,
) -> Result<Value, ConfigError> {
    match value {
        Value::String(s) => Ok(Value::String(substitute_string(s, env, path)?)),
        Value::Array(arr) => arr
            .iter()
            .enumerate()
            .map(|(i, v)| substitute_value(v, env, &format!("{path}[{i}]")))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Value::Object(map) => {
            let mut result = serde_json::Map::new();
            for (k, v) in map {
                let child_path = if path.is_empty() {
                    k.clone()
                } else {
                    format!("{path}.{k}")
                };
                result.insert(k.clone(), substitute_value(v, env, &child_path)?);
            }
            Ok(Value::Object(result))
        }
        other => Ok(other.clone()),
    }
}

fn substitute_string(
    s: &str,
    env: &HashMap<String, String>,
    path: &str,
) -> Result<String, ConfigError> {
    if !s.contains('$') {
        return Ok(s.to_string());
    }

    let mut missing: Option<String> = None;
    let substituted = ENV_VAR_PATTERN.replace_all(s, |caps: &Captures| {
        let name = &caps[2];
        if !caps[1].is_empty() {
            return format!("${{{name}}}");
        }
        match env.get(name) {
            Some(val) if !val.is_empty() => val.clone(),
            _ => {
                missing.get_or_insert_with(|| name.to_string());
                String::new()
            }
        }
    });

    match missing {
        Some(var_name) => Err(ConfigError::MissingEnvVar {
            var_name,
            config_path: path.to_string(),
        }),
        None => Ok(substituted.into_owned()),
    }
}

/// Overlay the process environment onto `config`.
pub fn apply_env(config: BridgeConfig) -> Result<BridgeConfig, ConfigError> {
    apply_env_with(config, &std::env::vars().collect())
}

/// Overlay variables from `env` onto `config`. Empty values are ignored.
pub fn apply_env_with(
    mut config: BridgeConfig,
    env: &HashMap<String, String>,
) -> Result<BridgeConfig, ConfigError> {
    let get = |name: &str| env.get(name).map(|v| v.trim()).filter(|v| !v.is_empty());
    let prefixed = |name: &str| get(&format!("{PREFIX}{name}"));

    if let Some(url) = prefixed("REDIS_URL").or_else(|| get(REDIS_URL)) {
        config.redis_url = Some(url.to_string());
    }
    if let Some(id) = prefixed("PROJECT_ID").or_else(|| get(PROJECT_ID)) {
        config.project_id = id.to_string();
    }
    if let Some(network) = prefixed("NETWORK") {
        config.network = network.to_string();
    }

    let queues = &mut config.queues;
    for (name, slot) in [
        ("PAIRING_QUEUE", &mut queues.pairing_requests),
        ("STATUS_QUEUE", &mut queues.status_events),
        ("SIGNING_QUEUE", &mut queues.signing_requests),
        ("REPLY_PREFIX", &mut queues.reply_prefix),
        ("WALLET_COMMAND_QUEUE", &mut queues.wallet_commands),
        ("WALLET_EVENT_QUEUE", &mut queues.wallet_events),
        ("WALLET_REPLY_PREFIX", &mut queues.wallet_reply_prefix),
    ] {
        if let Some(value) = prefixed(name) {
            *slot = value.to_string();
        }
    }

    let timeouts = &mut config.timeouts;
    for (name, slot) in [
        ("REQUEST_TIMEOUT_SECS", &mut timeouts.request_secs),
        ("POLL_TICK_SECS", &mut timeouts.poll_tick_secs),
        ("CONSUMER_BACKOFF_MS", &mut timeouts.consumer_backoff_ms),
        ("WALLET_COMMAND_TIMEOUT_SECS", &mut timeouts.wallet_command_secs),
    ] {
        if let Some(value) = prefixed(name) {
            *slot = parse_number(&format!("{PREFIX}{name}"), value)?;
        }
    }

    if let Some(methods) = prefixed("METHODS") {
        config.default_methods = split_list(methods);
    }
    if let Some(events) = prefixed("EVENTS") {
        config.default_events = split_list(events);
    }

    if let Some(level) = prefixed("LOG_LEVEL").or_else(|| get(RUST_LOG)) {
        config.logging.level = level.to_string();
    }
    if let Some(dir) = prefixed("LOG_DIR") {
        config.logging.dir = Some(dir.into());
    }
    if let Some(json) = prefixed("LOG_JSON") {
        config.logging.json = matches!(json.to_ascii_lowercase().as_str(), "1" | "true" | "yes");
    }

    Ok(config)
}

fn parse_number(name: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidVar {
        name: name.to_string(),
        value: value.to_string(),
    })
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn substitutes_nested_strings() {
        let value = json!({
            "redis_url": "redis://:${REDIS_PASS}@cache:6379/0",
            "queues": { "signing_requests": "${NS}:sign" },
            "default_methods": ["${METHOD}"],
            "timeouts": { "request_secs": 300 }
        });
        let out = resolve_env_vars_with(
            &value,
            &env(&[("REDIS_PASS", "hunter2"), ("NS", "prod"), ("METHOD", "stellar_signXDR")]),
        )
        .unwrap();
        assert_eq!(out["redis_url"], "redis://:hunter2@cache:6379/0");
        assert_eq!(out["queues"]["signing_requests"], "prod:sign");
        assert_eq!(out["default_methods"][0], "stellar_signXDR");
        assert_eq!(out["timeouts"]["request_secs"], 300);
    }

    #[test]
    fn missing_var_reports_path() {
        let value = json!({ "queues": { "status_events": "${UNSET_VAR}" } });
        let err = resolve_env_vars_with(&value, &HashMap::new()).unwrap_err();
        match err {
            ConfigError::MissingEnvVar { var_name, config_path } => {
                assert_eq!(var_name, "UNSET_VAR");
                assert_eq!(config_path, "queues.status_events");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn escaped_reference_is_literal() {
        let value = json!("keep $${HOME} as-is");
        let out = resolve_env_vars_with(&value, &HashMap::new()).unwrap();
        assert_eq!(out, "keep ${HOME} as-is");
    }

    #[test]
    fn lowercase_names_are_not_substituted() {
        let value = json!("${lower}");
        let out = resolve_env_vars_with(&value, &HashMap::new()).unwrap();
        assert_eq!(out, "${lower}");
    }

    #[test]
    fn overlay_well_known_vars() {
        let cfg = apply_env_with(
            BridgeConfig::default(),
            &env(&[
                ("REDIS_URL", "redis://localhost:6379"),
                ("WALLETCONNECT_PROJECT_ID", "abc123"),
                ("RUST_LOG", "debug"),
            ]),
        )
        .unwrap();
        assert_eq!(cfg.redis_url.as_deref(), Some("redis://localhost:6379"));
        assert_eq!(cfg.project_id, "abc123");
        assert_eq!(cfg.logging.level, "debug");
    }

    #[test]
    fn prefixed_vars_win() {
        let cfg = apply_env_with(
            BridgeConfig::default(),
            &env(&[
                ("REDIS_URL", "redis://plain"),
                ("SIGNBRIDGE_REDIS_URL", "redis://prefixed"),
                ("SIGNBRIDGE_NETWORK", "stellar:testnet"),
                ("SIGNBRIDGE_SIGNING_QUEUE", "custom:sign"),
                ("SIGNBRIDGE_REQUEST_TIMEOUT_SECS", "60"),
                ("SIGNBRIDGE_METHODS", "stellar_signXDR, ,custom_method"),
                ("SIGNBRIDGE_LOG_JSON", "true"),
            ]),
        )
        .unwrap();
        assert_eq!(cfg.redis_url.as_deref(), Some("redis://prefixed"));
        assert_eq!(cfg.network, "stellar:testnet");
        assert_eq!(cfg.queues.signing_requests, "custom:sign");
        assert_eq!(cfg.timeouts.request_secs, 60);
        assert_eq!(cfg.default_methods, vec!["stellar_signXDR", "custom_method"]);
        assert!(cfg.logging.json);
    }

    #[test]
    fn empty_values_are_ignored() {
        let cfg = apply_env_with(
            BridgeConfig::default(),
            &env(&[("WALLETCONNECT_PROJECT_ID", "  "), ("SIGNBRIDGE_NETWORK", "")]),
        )
        .unwrap();
        assert_eq!(cfg, BridgeConfig::default());
    }

    #[test]
    fn bad_number_is_rejected() {
        let err = apply_env_with(
            BridgeConfig::default(),
            &env(&[("SIGNBRIDGE_POLL_TICK_SECS", "soon")]),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidVar { .. }));
    }
}
