//! Optional TOML configuration for the recorder.
//!
//! A config file is only read when the caller names one; there is no implicit
//! lookup location.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::recorder::ExitPolicy;

/// Settings read from the config file. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RecorderConfig {
    /// Results log location.
    #[serde(default)]
    pub log: Option<PathBuf>,
    /// Load generator binary.
    #[serde(default)]
    pub wrk_bin: Option<PathBuf>,
    /// Extra arguments passed to the load generator.
    #[serde(default)]
    pub wrk_args: Vec<String>,
    /// Behaviour on an unsuccessful tool exit.
    #[serde(default)]
    pub exit_policy: Option<ExitPolicy>,
}

impl RecorderConfig {
    /// Reads and parses the config file at `path`, which must exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "loaded recorder config");
        Self::from_toml(&contents, path)
    }

    /// Parses a config document. `path` is only used in error messages.
    pub fn from_toml(contents: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config {path}: {source}")]
    Read {
        /// Config file path.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
    /// The file is not valid TOML for this config, or holds an unknown value.
    #[error("failed to parse config {path}: {source}")]
    Parse {
        /// Config file path.
        path: PathBuf,
        /// Underlying error.
        source: toml::de::Error,
    },
}
