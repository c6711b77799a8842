use annex9_traits::ResourceError;
use thiserror::Error;

/// A template that cannot be used. Raised at load time, before any render.
#[derive(Error, Debug, Clone)]
pub enum TemplateError {
    #[error("Template '{0}' not found")]
    NotFound(String),

    #[error("Template '{version}' is malformed: {reason}")]
    Malformed { version: String, reason: String },

    #[error("Template '{version}' is invalid: {reason}")]
    Invalid { version: String, reason: String },

    #[error("Template '{version}' could not load asset '{path}': {source}")]
    Asset {
        version: String,
        path: String,
        source: ResourceError,
    },
}

impl TemplateError {
    pub(crate) fn invalid(version: impl Into<String>, reason: impl Into<String>) -> Self {
        TemplateError::Invalid {
            version: version.into(),
            reason: reason.into(),
        }
    }
}

/// Order data that does not satisfy a template field.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Field '{field}': {reason}")]
pub struct ValidationError {
    pub field: String,
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn missing(field: impl Into<String>) -> Self {
        Self::new(field, "required value is missing")
    }
}
