//! TOML sync configuration and the data directory helper.
//!
//! Configuration lives at `~/.config/cradle[-dev]/cradle.toml`. A missing
//! file is not an error: without a remote endpoint the session runs in
//! permanent local-only mode and every sync operation is a guarded no-op.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Returns `~/.config/cradle[-dev]/` based on CRADLE_ENV.
///
/// Set CRADLE_ENV=dev to use the development data directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, std::io::Error> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("CRADLE_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("cradle-dev")
    } else {
        base_dir.join("cradle")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

fn default_shared_key() -> String {
    "household".to_string()
}

fn default_dose_start_hour() -> u32 {
    8
}

/// Remote sync configuration.
///
/// One logical record per household, keyed by `shared_key`; every device in
/// the household converges on that record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Base URL of the remote datastore REST endpoint. Absent = local-only.
    #[serde(default)]
    pub endpoint_url: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    /// Key of the single shared remote record for this household.
    #[serde(default = "default_shared_key")]
    pub shared_key: String,
    /// Whole-hour start for synthesized dose times on legacy documents.
    #[serde(default = "default_dose_start_hour")]
    pub dose_start_hour: u32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            endpoint_url: None,
            api_key: None,
            shared_key: default_shared_key(),
            dose_start_hour: default_dose_start_hour(),
        }
    }
}

impl SyncConfig {
    /// Load from the default data directory, falling back to defaults when
    /// the file is absent.
    pub fn load() -> Result<Self, ConfigError> {
        let dir = data_dir().map_err(|e| ConfigError::LoadFailed {
            path: PathBuf::from("~/.config/cradle"),
            message: e.to_string(),
        })?;
        Self::load_from(&dir.join("cradle.toml"))
    }

    /// Load from an explicit path; a missing file yields the default config.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::ParseFailed(e.to_string()))
    }

    /// Persist to an explicit path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        std::fs::write(path, content).map_err(|e| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Capability check gating every remote operation.
    pub fn is_remote_configured(&self) -> bool {
        self.endpoint_url.is_some()
    }
}
