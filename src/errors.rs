//! Configuration-level errors

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or rendering [`Settings`](crate::config::Settings).
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("config source: {0}")]
    Source(#[from] config::ConfigError),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
