//! `signbridge check-config`: print the effective config with secrets masked,
//! then the validation findings.

use std::path::Path;

use anyhow::{bail, Result};
use signbridge_config::{ValidationReport, redact, validate};

use crate::terminal_output::{GREEN, RED, YELLOW, heading, paint, supports_color};

pub async fn run(path: Option<&Path>) -> Result<()> {
    let config = signbridge_config::load(path).await?;
    let color = supports_color();

    println!("{}", heading("effective config", color));
    println!("{}", serde_json::to_string_pretty(&redact(&config))?);

    let report = validate(&config);
    print!("{}", render_report(&report, color));
    if !report.is_valid() {
        bail!("configuration has {} error(s)", report.errors.len());
    }
    Ok(())
}

fn render_report(report: &ValidationReport, color: bool) -> String {
    let mut out = heading("validation", color);
    out.push('\n');
    for error in &report.errors {
        out.push_str(&format!("  {} {}: {}\n", paint("✗", RED, color), error.path, error.message));
    }
    for warning in &report.warnings {
        out.push_str(&format!(
            "  {} {}: {}\n",
            paint("⚠", YELLOW, color),
            warning.path,
            warning.message
        ));
    }
    if report.is_valid() {
        out.push_str(&format!("  {} configuration is valid\n", paint("✓", GREEN, color)));
    }
    out
}
