use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::DEFAULT_PBKDF2_ROUNDS;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Runtime settings for the gatekeeper binary.
///
/// Every field has a default, so a config file only lists what it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateKeeperConfig {
    /// Directory holding one password file per user
    pub store_dir: PathBuf,
    /// Service name the signing keys are stored under in the system keyring
    pub keyring_service: String,
    /// PBKDF2 rounds used to diversify the password key with each salt
    pub pbkdf2_rounds: u32,
    /// Append logs here instead of stderr
    pub log_file: Option<PathBuf>,
    /// Default log filter when RUST_LOG is not set
    pub log_level: String,
}

impl Default for GateKeeperConfig {
    fn default() -> Self {
        Self {
            store_dir: PathBuf::from("gatekeeper"),
            keyring_service: "gatekeeper".to_string(),
            pbkdf2_rounds: DEFAULT_PBKDF2_ROUNDS,
            log_file: None,
            log_level: "info".to_string(),
        }
    }
}

impl GateKeeperConfig {
    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let data = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&data)
    }

    /// Load the file if given, defaults otherwise
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn from_json(data: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(data)?;
        Ok(config)
    }
}
