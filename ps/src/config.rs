//! Configuration values for templates
//!
//! A configuration is an arbitrary nested JSON object, persisted
//! pretty-printed. Validation against a required schema is deliberately
//! shallow: only top-level key presence is checked, and skeleton synthesis
//! fills absent top-level keys with the empty-string placeholder regardless
//! of how deep the requirement goes.

use std::path::PathBuf;

use serde_json::{Map, Value};
use templatekit::{Schema, leaf};

use crate::error::Error;

/// One configuration document and where it lives
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub data: Map<String, Value>,
    pub path: PathBuf,
}

impl Config {
    pub fn new(data: Map<String, Value>, path: impl Into<PathBuf>) -> Self {
        Config {
            data,
            path: path.into(),
        }
    }

    /// Parse a configuration from a JSON document.
    pub fn from_json_str(json: &str, path: impl Into<PathBuf>) -> Result<Self, Error> {
        let data: Map<String, Value> = serde_json::from_str(json)?;
        Ok(Config::new(data, path))
    }

    /// Load a configuration from a JSON file.
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, Error> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                Error::ConfigNotFound {
                    path: path.display().to_string(),
                }
            } else {
                Error::Io(err)
            }
        })?;
        Config::from_json_str(&content, path)
    }

    /// Write the configuration to its path as pretty-printed JSON, creating
    /// parent directories as needed.
    pub fn save(&self) -> Result<(), Error> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(&self.data)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }

    /// Required top-level keys absent from this configuration. Value shape is
    /// never inspected: a scalar where the schema wants a nested object still
    /// counts as present.
    pub fn missing_fields(&self, required: &Schema) -> Vec<String> {
        required
            .keys()
            .filter(|key| !self.data.contains_key(*key))
            .cloned()
            .collect()
    }
}

/// Build a configuration object covering every top-level key of `required`:
/// keys already present in `existing` are copied untouched (even when their
/// shape disagrees with the requirement); absent keys are filled with the
/// empty placeholder. Mirrors the validator's shallow contract.
pub fn synthesize(required: &Schema, existing: Option<&Config>) -> Map<String, Value> {
    let mut data = existing.map(|config| config.data.clone()).unwrap_or_default();
    for key in required.keys() {
        if !data.contains_key(key) {
            data.insert(key.clone(), leaf());
        }
    }
    data
}
