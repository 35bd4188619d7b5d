//! Error types for the prompt system

use thiserror::Error;

/// Errors that can occur while resolving, validating, or building prompts
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed template syntax; fatal to the enclosing resolution
    #[error("template {template}: {source}")]
    Parse {
        template: String,
        #[source]
        source: templatekit::Error,
    },

    /// An included template could not be located during resolution
    #[error("included template not found: {name}")]
    DependencyNotFound {
        name: String,
        #[source]
        source: Box<Error>,
    },

    /// The requested template does not exist in the registry
    #[error("template not found: {path}")]
    TemplateNotFound { path: String },

    /// The requested configuration file does not exist
    #[error("config not found: {path}")]
    ConfigNotFound { path: String },

    /// Registry template paths must carry the .tmpl extension
    #[error("template file must have the .tmpl extension: {path}")]
    InvalidExtension { path: String },

    /// The supplied configuration lacks required top-level fields.
    /// Recoverable: synthesize or update the configuration and retry.
    #[error("missing required fields: {}", fields.join(", "))]
    MissingFields { fields: Vec<String> },

    /// Rendering failed after resolution and validation succeeded
    #[error("render failed for {template}: {source}")]
    Render {
        template: String,
        #[source]
        source: templatekit::Error,
    },

    /// No registry directory has been configured
    #[error("registry directory is not set; run `ps set --directory <path>` first")]
    RegistryNotSet,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    /// True for conditions a caller can repair by synthesizing or updating
    /// the configuration and retrying the build.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::MissingFields { .. } | Error::ConfigNotFound { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_lists_names() {
        let err = Error::MissingFields {
            fields: vec!["user".to_string(), "site".to_string()],
        };
        assert_eq!(err.to_string(), "missing required fields: user, site");
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_fatal_errors_are_not_recoverable() {
        assert!(
            !Error::TemplateNotFound {
                path: "a.tmpl".to_string()
            }
            .is_recoverable()
        );
        assert!(!Error::RegistryNotSet.is_recoverable());
    }
}
