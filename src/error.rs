use crate::snapshot::SnapshotError;
use annex9_render::RenderError;
use annex9_template::{TemplateError, ValidationError};
use annex9_types::SnapshotId;
use thiserror::Error;

/// Everything a render, reproduction or batch item can fail with.
///
/// No variant is ever paired with a partial document: when an error is
/// returned, nothing was written and no snapshot was recorded.
#[derive(Error, Debug)]
pub enum Annex9Error {
    #[error("Validation failed for field '{field}': {reason}")]
    Validation { field: String, reason: String },

    #[error("Template error: {reason}")]
    Template { reason: String },

    #[error("Render failed at '{field}': {reason}")]
    Render { field: String, reason: String },

    #[error("Render timed out after {elapsed_ms}ms (budget {budget_ms}ms)")]
    RenderTimeout { elapsed_ms: u64, budget_ms: u64 },

    #[error("Snapshot store error: {0}")]
    Snapshot(#[from] SnapshotError),

    #[error("Reproduction of snapshot {snapshot} differs: expected {expected}, got {actual}")]
    ReproductionMismatch {
        snapshot: SnapshotId,
        expected: String,
        actual: String,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Annex9Error {
    /// Only timeouts are worth retrying unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Annex9Error::RenderTimeout { .. })
    }

    /// The offending field key, for validation and render failures.
    pub fn field(&self) -> Option<&str> {
        match self {
            Annex9Error::Validation { field, .. } | Annex9Error::Render { field, .. } => {
                Some(field)
            }
            _ => None,
        }
    }
}

impl From<ValidationError> for Annex9Error {
    fn from(err: ValidationError) -> Self {
        Annex9Error::Validation {
            field: err.field,
            reason: err.reason,
        }
    }
}

impl From<TemplateError> for Annex9Error {
    fn from(err: TemplateError) -> Self {
        Annex9Error::Template {
            reason: err.to_string(),
        }
    }
}

impl From<RenderError> for Annex9Error {
    fn from(err: RenderError) -> Self {
        match err {
            RenderError::Field { field, reason } => Annex9Error::Render { field, reason },
            RenderError::Decoration { index, reason } => Annex9Error::Render {
                field: format!("decoration #{index}"),
                reason,
            },
            RenderError::Timeout {
                elapsed_ms,
                budget_ms,
            } => Annex9Error::RenderTimeout {
                elapsed_ms,
                budget_ms,
            },
            RenderError::Composer(e) => Annex9Error::Render {
                field: "<document>".to_string(),
                reason: e.to_string(),
            },
        }
    }
}
