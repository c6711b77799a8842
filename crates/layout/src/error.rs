use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LayoutError {
    #[error("Invalid coordinates: {0}")]
    InvalidCoordinates(String),

    #[error("Unknown font '{0}'")]
    UnknownFont(String),

    #[error("Font '{name}' could not be loaded: {reason}")]
    InvalidFont { name: String, reason: String },

    #[error("Box of {width_pt:.2}x{height_pt:.2}pt leaves no room after padding")]
    BoxTooSmall { width_pt: f32, height_pt: f32 },

    #[error("Invalid layout parameter: {0}")]
    InvalidParameter(String),

    #[error("Layout exceeded its budget of {budget_ms} ms ({elapsed_ms} ms elapsed)")]
    Timeout { elapsed_ms: u64, budget_ms: u64 },
}
