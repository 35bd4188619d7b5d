//! Template and configuration registry
//!
//! The registry is an explicit value passed into every resolution; there is
//! no ambient process-wide template directory.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::Config;
use crate::error::Error;
use crate::template::Template;

/// Extension every registry template file carries
pub const TEMPLATE_EXT: &str = ".tmpl";

/// Append the template extension when an inclusion names a template without it.
pub fn normalize_name(name: &str) -> String {
    if name.ends_with(TEMPLATE_EXT) {
        name.to_string()
    } else {
        format!("{name}{TEMPLATE_EXT}")
    }
}

/// Source of templates and configurations for a prompt system
pub trait Registry {
    /// Load the template at a registry-relative path.
    fn find(&self, path: &str) -> Result<Template, Error>;

    /// Load a configuration at a registry-relative path.
    fn load_config(&self, path: &str) -> Result<Config, Error>;

    /// Persist a configuration.
    fn save_config(&self, config: &Config) -> Result<(), Error>;
}

/// Registry backed by a directory of `.tmpl` and `.json` files
#[derive(Debug, Clone)]
pub struct LocalRegistry {
    directory: PathBuf,
}

impl LocalRegistry {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        LocalRegistry {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.directory.join(path)
    }
}

impl Registry for LocalRegistry {
    fn find(&self, path: &str) -> Result<Template, Error> {
        if !path.ends_with(TEMPLATE_EXT) {
            return Err(Error::InvalidExtension {
                path: path.to_string(),
            });
        }
        let full_path = self.resolve(path);
        debug!(path = %full_path.display(), "loading template");
        let source = std::fs::read_to_string(&full_path).map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                Error::TemplateNotFound {
                    path: path.to_string(),
                }
            } else {
                Error::Io(err)
            }
        })?;
        Ok(Template::new(path, source))
    }

    fn load_config(&self, path: &str) -> Result<Config, Error> {
        Config::from_file(self.resolve(path))
    }

    fn save_config(&self, config: &Config) -> Result<(), Error> {
        // Relative config paths live under the registry directory.
        if config.path.is_relative() {
            let mut resolved = config.clone();
            resolved.path = self.directory.join(&config.path);
            resolved.save()
        } else {
            config.save()
        }
    }
}
