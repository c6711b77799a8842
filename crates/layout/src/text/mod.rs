mod engine;
mod wrapper;

pub use engine::{FitOutcome, TextLayout, TextLayoutEngine, TextLine, TextRequest};

/// Tolerance for width comparisons, in points. A line whose measured width
/// equals the available width still fits.
pub const WIDTH_EPSILON_PT: f32 = 0.01;
