//! The prompt system: resolve, validate, render, and synthesize configs
//!
//! Ties the resolver, validator, and rendering engine together behind the
//! two operations callers actually want: build a prompt from a template and
//! configuration, and generate (or top up) the configuration a template
//! requires.

use serde_json::Value;
use templatekit::Schema;
use tracing::{debug, info};

use crate::config::{Config, synthesize};
use crate::error::Error;
use crate::registry::Registry;
use crate::resolver::{ResolvedSet, resolve};

/// A prompt system over one registry. The registry is an explicit value;
/// separate systems are fully independent.
pub struct PromptSystem<R: Registry> {
    registry: R,
}

impl<R: Registry> PromptSystem<R> {
    pub fn new(registry: R) -> Self {
        PromptSystem { registry }
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    /// Resolve a template's inclusion closure and the combined schema of
    /// required configuration.
    pub fn resolve(&self, template_path: &str) -> Result<(ResolvedSet, Schema), Error> {
        resolve(template_path, &self.registry)
    }

    /// Build the prompt: resolve, validate the configuration against the
    /// combined schema, then render.
    ///
    /// Fails with [`Error::MissingFields`] (recoverable) when required
    /// top-level keys are absent from the configuration.
    pub fn build(&self, template_path: &str, config: &Config) -> Result<String, Error> {
        let (set, schema) = self.resolve(template_path)?;
        let missing = config.missing_fields(&schema);
        if !missing.is_empty() {
            return Err(Error::MissingFields { fields: missing });
        }
        debug!(template = %template_path, templates = set.len(), "rendering");
        templatekit::render(template_path, &set, &Value::Object(config.data.clone())).map_err(
            |source| Error::Render {
                template: template_path.to_string(),
                source,
            },
        )
    }

    /// Build the prompt, loading the configuration from the registry.
    pub fn build_from_paths(&self, template_path: &str, config_path: &str) -> Result<String, Error> {
        let config = self.registry.load_config(config_path)?;
        self.build(template_path, &config)
    }

    /// Generate or update the configuration a template requires: resolve the
    /// closure, then cover every required top-level key, keeping whatever the
    /// existing configuration already holds. The result is saved through the
    /// registry and returned.
    pub fn generate_config(
        &self,
        template_path: &str,
        config_path: &str,
    ) -> Result<Config, Error> {
        let (_, schema) = self.resolve(template_path)?;
        let existing = match self.registry.load_config(config_path) {
            Ok(config) => Some(config),
            Err(Error::ConfigNotFound { .. }) => None,
            Err(err) => return Err(err),
        };
        let data = synthesize(&schema, existing.as_ref());
        let config = Config::new(data, config_path);
        self.registry.save_config(&config)?;
        info!(template = %template_path, config = %config_path, "generated config");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::LocalRegistry;
    use serde_json::json;
    use std::path::Path;
    use tempfile::TempDir;

    fn write_file(dir: &Path, name: &str, content: &str) {
        std::fs::write(dir.join(name), content).unwrap();
    }

    fn system(dir: &Path) -> PromptSystem<LocalRegistry> {
        PromptSystem::new(LocalRegistry::new(dir))
    }

    #[test]
    fn test_build_renders_with_sufficient_config() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "greeting.tmpl", "Hello [[.user.name]]");
        write_file(dir.path(), "config.json", "{\"user\": {\"name\": \"Ada\"}}");
        let system = system(dir.path());
        let prompt = system.build_from_paths("greeting.tmpl", "config.json").unwrap();
        assert_eq!(prompt, "Hello Ada");
    }

    #[test]
    fn test_build_reports_missing_fields() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "greeting.tmpl", "Hello [[.user.name]], [[.title]]");
        write_file(dir.path(), "config.json", "{\"user\": {\"name\": \"Ada\"}}");
        let system = system(dir.path());
        let err = system
            .build_from_paths("greeting.tmpl", "config.json")
            .unwrap_err();
        assert!(matches!(err, Error::MissingFields { ref fields } if fields == &["title"]));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_build_with_inclusions() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "a.tmpl", "[[template \"b.tmpl\" .]]");
        write_file(dir.path(), "b.tmpl", "[[.title]]");
        write_file(dir.path(), "config.json", "{\"title\": \"Report\"}");
        let system = system(dir.path());
        let prompt = system.build_from_paths("a.tmpl", "config.json").unwrap();
        assert_eq!(prompt, "Report");
    }

    #[test]
    fn test_generate_config_creates_skeleton() {
        let dir = TempDir::new().unwrap();
        write_file(
            dir.path(),
            "main.tmpl",
            "Hello [[.user.name]], welcome to [[.site]]",
        );
        let system = system(dir.path());
        let config = system.generate_config("main.tmpl", "config.json").unwrap();
        assert_eq!(Value::Object(config.data), json!({"user": "", "site": ""}));
        // Saved under the registry directory.
        let saved = Config::from_file(dir.path().join("config.json")).unwrap();
        assert_eq!(Value::Object(saved.data), json!({"user": "", "site": ""}));
    }

    #[test]
    fn test_generate_config_keeps_existing_values() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "main.tmpl", "[[.kept]] [[.added]]");
        write_file(dir.path(), "config.json", "{\"kept\": \"value\"}");
        let system = system(dir.path());
        let config = system.generate_config("main.tmpl", "config.json").unwrap();
        assert_eq!(
            Value::Object(config.data),
            json!({"kept": "value", "added": ""})
        );
    }

    #[test]
    fn test_generate_then_build_round_trip() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "main.tmpl", "Hi [[.name]]");
        let system = system(dir.path());
        system.generate_config("main.tmpl", "config.json").unwrap();
        // The skeleton's empty strings are sufficient for rendering.
        let prompt = system.build_from_paths("main.tmpl", "config.json").unwrap();
        assert_eq!(prompt, "Hi ");
    }

    #[test]
    fn test_build_missing_config_is_recoverable() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "main.tmpl", "Hi [[.name]]");
        let system = system(dir.path());
        let err = system.build_from_paths("main.tmpl", "absent.json").unwrap_err();
        assert!(err.is_recoverable());
    }
}
