use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use graft_util::errors::GraftError;

use crate::manifest::{RegistryConfig, ResolutionConfig};

/// Global user configuration loaded from `~/.graft/config.toml`.
///
/// Rules in `[resolution]` apply to every project resolved on this machine,
/// after the project's own rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalConfig {
    #[serde(default)]
    pub resolution: ResolutionConfig,

    /// Fallback registry used when a project does not name one.
    #[serde(default)]
    pub registry: Option<RegistryConfig>,
}

impl GlobalConfig {
    /// Load the global configuration, or return defaults if the file doesn't exist.
    pub fn load() -> miette::Result<Self> {
        Self::load_from(&Self::default_path())
    }

    pub fn load_from(path: &Path) -> miette::Result<Self> {
        if !path.is_file() {
            tracing::debug!("no global config at {}", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|e| GraftError::Config {
            message: format!("Failed to read global config: {e}"),
        })?;
        toml::from_str(&content).map_err(|e| {
            GraftError::Config {
                message: format!("Failed to parse global config: {e}"),
            }
            .into()
        })
    }

    /// Returns the default path to the global config file.
    pub fn default_path() -> PathBuf {
        dirs_path().join("config.toml")
    }
}

/// Returns the Graft data directory: `$GRAFT_HOME`, or `~/.graft/`.
pub fn dirs_path() -> PathBuf {
    if let Ok(home) = std::env::var("GRAFT_HOME") {
        if !home.is_empty() {
            return PathBuf::from(home);
        }
    }
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string());
    Path::new(&home).join(".graft")
}
