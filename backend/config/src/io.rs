//! Config file discovery and loading.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::info;

use crate::env::resolve_env_vars;
use crate::error::ConfigError;
use crate::schema::BridgeConfig;

const CONFIG_FILE_NAME: &str = "config.yaml";

/// Env var naming an explicit config file.
pub const CONFIG_PATH_VAR: &str = "SIGNBRIDGE_CONFIG";

/// Config file to use when none is given on the command line.
///
/// Priority: `SIGNBRIDGE_CONFIG` > `~/.signbridge/config.yaml` when it exists.
pub fn discover_config() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os(CONFIG_PATH_VAR).filter(|p| !p.is_empty()) {
        return Some(PathBuf::from(path));
    }
    let candidate = dirs::home_dir()?.join(".signbridge").join(CONFIG_FILE_NAME);
    candidate.is_file().then_some(candidate)
}

/// Read a YAML config file, substitute `${VAR}` references, and parse it.
///
/// Unlike the environment overlay, a named file that is missing is an error.
pub async fn load_file(path: &Path) -> Result<BridgeConfig, ConfigError> {
    let raw = fs::read_to_string(path).await.map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config = parse_yaml(&raw, path)?;
    info!(path = %path.display(), "Loaded config");
    Ok(config)
}

fn parse_yaml(raw: &str, path: &Path) -> Result<BridgeConfig, ConfigError> {
    if raw.trim().is_empty() {
        return Ok(BridgeConfig::default());
    }
    let yaml_err = |source| ConfigError::Yaml {
        path: path.to_path_buf(),
        source,
    };
    let value: serde_json::Value = serde_yaml::from_str(raw).map_err(yaml_err)?;
    // A document holding only comments parses as null.
    if value.is_null() {
        return Ok(BridgeConfig::default());
    }
    let value = resolve_env_vars(&value)?;
    Ok(serde_json::from_value(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn loads_yaml_file() {
        let file = write_temp(
            "redis_url: redis://cache:6379\nnetwork: stellar:testnet\ntimeouts:\n  request_secs: 42\n",
        );
        let cfg = load_file(file.path()).await.unwrap();
        assert_eq!(cfg.redis_url.as_deref(), Some("redis://cache:6379"));
        assert_eq!(cfg.network, "stellar:testnet");
        assert_eq!(cfg.timeouts.request_secs, 42);
        assert_eq!(cfg.timeouts.poll_tick_secs, 5);
    }

    #[tokio::test]
    async fn empty_file_is_defaults() {
        let file = write_temp("");
        let cfg = load_file(file.path()).await.unwrap();
        assert_eq!(cfg, BridgeConfig::default());
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let err = load_file(Path::new("/nonexistent/signbridge.yaml"))
            .await
            .unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[tokio::test]
    async fn wrong_type_is_schema_error() {
        let file = write_temp("timeouts:\n  request_secs: soon\n");
        let err = load_file(file.path()).await.unwrap_err();
        assert!(matches!(err, ConfigError::Schema(_)));
    }

    #[tokio::test]
    async fn invalid_yaml_is_reported() {
        let file = write_temp("queues: [unterminated\n");
        let err = load_file(file.path()).await.unwrap_err();
        assert!(matches!(err, ConfigError::Yaml { .. }));
    }
}
