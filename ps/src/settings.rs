//! Persisted tool settings
//!
//! The one piece of state the CLI keeps between runs: which directory holds
//! the prompt registry. Stored as YAML under the user's config directory; an
//! explicit path override exists for tests and the `--settings` flag.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Error;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Directory the prompt registry reads templates and configs from
    #[serde(default)]
    pub registry_dir: Option<PathBuf>,
}

impl Settings {
    /// Default location: `<config dir>/promptstore/settings.yml`.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("promptstore")
            .join("settings.yml")
    }

    /// Load settings from the override path or the default location.
    /// A missing file yields default settings.
    pub fn load(path: Option<&Path>) -> Result<Self, Error> {
        let path = path.map(Path::to_path_buf).unwrap_or_else(Self::default_path);
        if !path.exists() {
            return Ok(Settings::default());
        }
        let content = std::fs::read_to_string(&path)?;
        Ok(serde_yaml::from_str(&content)?)
    }

    /// Save settings to the override path or the default location, creating
    /// parent directories as needed.
    pub fn save(&self, path: Option<&Path>) -> Result<(), Error> {
        let path = path.map(Path::to_path_buf).unwrap_or_else(Self::default_path);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_yaml::to_string(self)?;
        std::fs::write(&path, content)?;
        Ok(())
    }
}
