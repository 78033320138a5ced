//! Config validation: field checks with readable error messages.

use crate::schema::BridgeConfig;
use thiserror::Error;

/// A config validation error with field path and message.
#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

/// A collection of validation errors found in one pass.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }
}

/// Validate the config and return a report of all errors and warnings.
pub fn validate(config: &BridgeConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_connection(config, &mut report);
    validate_network(config, &mut report);
    validate_queues(config, &mut report);
    validate_timeouts(config, &mut report);
    validate_defaults(config, &mut report);
    report
}

fn validate_connection(config: &BridgeConfig, report: &mut ValidationReport) {
    match config.redis_url.as_deref().map(str::trim) {
        None | Some("") => report.error("redis_url", "Not set; use REDIS_URL or the config file"),
        Some(url) if !(url.starts_with("redis://") || url.starts_with("rediss://")) => {
            report.error("redis_url", "Must start with redis:// or rediss://")
        }
        Some(_) => {}
    }
    if config.project_id.trim().is_empty() {
        report.error("project_id", "Must not be empty");
    }
}

fn validate_network(config: &BridgeConfig, report: &mut ValidationReport) {
    // CAIP-2: namespace:reference
    match config.network.split_once(':') {
        Some((ns, reference)) if !ns.is_empty() && !reference.is_empty() => {}
        _ => report.error(
            "network",
            format!("'{}' is not a CAIP-2 chain id (namespace:reference)", config.network),
        ),
    }
}

fn validate_queues(config: &BridgeConfig, report: &mut ValidationReport) {
    let q = &config.queues;
    let names = [
        ("queues.pairing_requests", &q.pairing_requests),
        ("queues.status_events", &q.status_events),
        ("queues.signing_requests", &q.signing_requests),
        ("queues.reply_prefix", &q.reply_prefix),
        ("queues.wallet_commands", &q.wallet_commands),
        ("queues.wallet_events", &q.wallet_events),
        ("queues.wallet_reply_prefix", &q.wallet_reply_prefix),
    ];
    for (path, name) in names {
        if name.trim().is_empty() {
            report.error(path, "Must not be empty");
        }
    }
    if q.pairing_requests == q.signing_requests {
        report.error(
            "queues.signing_requests",
            "Must differ from queues.pairing_requests",
        );
    }
    if q.pairing_requests == q.status_events {
        report.warn(
            "queues.status_events",
            "Same as queues.pairing_requests; the bridge would consume its own events",
        );
    }
}

fn validate_timeouts(config: &BridgeConfig, report: &mut ValidationReport) {
    let t = &config.timeouts;
    if t.request_secs == 0 {
        report.error("timeouts.request_secs", "Must be greater than zero");
    }
    if t.poll_tick_secs == 0 {
        report.error("timeouts.poll_tick_secs", "Must be greater than zero");
    } else if t.poll_tick_secs > 5 {
        report.warn("timeouts.poll_tick_secs", "Values above 5 are capped to 5");
    }
    if t.wallet_command_secs == 0 {
        report.error("timeouts.wallet_command_secs", "Must be greater than zero");
    }
    if t.consumer_backoff_ms == 0 {
        report.warn(
            "timeouts.consumer_backoff_ms",
            "Zero backoff will spin on a failing connection",
        );
    }
}

fn validate_defaults(config: &BridgeConfig, report: &mut ValidationReport) {
    if config.default_methods.is_empty() {
        report.warn(
            "default_methods",
            "Empty; proposals without methods will get none",
        );
    }
}
