use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config YAML at {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("config does not match the schema: {0}")]
    Schema(#[from] serde_json::Error),

    #[error("missing env var \"{var_name}\" referenced at config path: {config_path}")]
    MissingEnvVar {
        var_name: String,
        config_path: String,
    },

    #[error("invalid value {value:?} for {name}")]
    InvalidVar { name: String, value: String },

    #[error("{0} is not configured")]
    Missing(&'static str),
}
