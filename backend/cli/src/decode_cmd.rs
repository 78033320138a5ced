//! `signbridge decode`: show what the bridge would read from a queue payload.

use std::path::Path;

use anyhow::{Context, Result};
use signbridge_codec::{DecodedMessage, decode};
use tokio::io::AsyncReadExt;

use crate::terminal_output::{heading, supports_color};

pub async fn run(path: Option<&Path>) -> Result<()> {
    let bytes = match path {
        Some(path) => tokio::fs::read(path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?,
        None => {
            let mut buf = Vec::new();
            tokio::io::stdin()
                .read_to_end(&mut buf)
                .await
                .context("failed to read stdin")?;
            buf
        }
    };

    print!("{}", render(&decode(&bytes), supports_color()));
    Ok(())
}

fn render(message: &DecodedMessage, color: bool) -> String {
    let mut out = String::new();

    out.push_str(&heading("headers", color));
    out.push('\n');
    match &message.headers {
        Some(headers) if !headers.is_empty() => {
            for (key, value) in headers {
                let value = value.as_str().map_or_else(|| value.to_string(), String::from);
                out.push_str(&format!("{key}: {value}\n"));
            }
        }
        _ => out.push_str("(none)\n"),
    }

    out.push_str(&heading("body", color));
    out.push('\n');
    match message.json() {
        Ok(json) => {
            out.push_str(&serde_json::to_string_pretty(&json).unwrap_or_else(|_| message.body.clone()))
        }
        Err(_) => out.push_str(&message.body),
    }
    out.push('\n');
    out
}
