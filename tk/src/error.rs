//! Error types for templatekit

use thiserror::Error;

/// Errors produced while parsing, inferring schemas for, or rendering templates
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed template syntax; fatal to the enclosing resolution or walk
    #[error("parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    /// The set merger was handed something that is not a mapping
    #[error("cannot merge non-mapping values")]
    InvalidMerge,

    /// An action evaluated a field path with no value in the configuration
    #[error("no value for field {path}")]
    MissingValue { path: String },

    /// A pipe referenced a variable that was never declared in scope
    #[error("undefined variable {name}")]
    UndefinedVariable { name: String },

    /// A range action was given a value that is not a sequence or mapping
    #[error("cannot iterate over {kind} value")]
    NotIterable { kind: &'static str },

    /// An action produced a value with no text form
    #[error("cannot render {kind} value")]
    Unrenderable { kind: &'static str },

    /// A command applied arguments to something that is not callable
    #[error("call of non-function {what}")]
    NotCallable { what: String },

    /// An inclusion named a template missing from the resolved set
    #[error("template {name:?} not defined")]
    UnknownTemplate { name: String },

    /// Nested inclusions exceeded the expansion limit (cyclic template sets)
    #[error("include depth exceeded {max} levels")]
    IncludeDepth { max: usize },
}

impl Error {
    pub(crate) fn parse(line: usize, message: impl Into<String>) -> Self {
        Error::Parse {
            line,
            message: message.into(),
        }
    }

    /// True when the error came from template source syntax rather than evaluation
    pub fn is_parse(&self) -> bool {
        matches!(self, Error::Parse { .. })
    }
}
