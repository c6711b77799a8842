use annex9_layout::LayoutError;
use annex9_pdf_composer::ComposerError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Field '{field}' could not be rendered: {reason}")]
    Field { field: String, reason: String },

    #[error("Decoration #{index} could not be drawn: {reason}")]
    Decoration { index: usize, reason: String },

    #[error("Render exceeded its time budget ({elapsed_ms}ms of {budget_ms}ms)")]
    Timeout { elapsed_ms: u64, budget_ms: u64 },

    #[error("PDF composition failed: {0}")]
    Composer(#[from] ComposerError),
}

impl RenderError {
    /// Attributes a layout failure to `field`. Budget overruns stay timeouts.
    pub fn for_field(field: &str, err: LayoutError) -> Self {
        match err {
            LayoutError::Timeout { elapsed_ms, budget_ms } => {
                RenderError::Timeout { elapsed_ms, budget_ms }
            }
            other => RenderError::Field {
                field: field.to_string(),
                reason: other.to_string(),
            },
        }
    }

    pub fn field(field: &str, reason: impl Into<String>) -> Self {
        RenderError::Field {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}
