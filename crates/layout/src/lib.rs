//! Placement primitives for overlay rendering.
//!
//! The [`CoordinateMapper`] turns top-left millimetre boxes into PDF user space,
//! the [`FontLibrary`] answers width and ascent questions for declared fonts and
//! the [`TextLayoutEngine`] decides how a value is wrapped, shrunk or clipped so
//! that it stays inside its box.

pub mod budget;
pub mod config;
pub mod coords;
pub mod error;
pub mod fonts;
pub mod text;

pub use budget::RenderBudget;
pub use config::{LayoutConfig, MAX_FONT_SIZE_PT, MIN_SHRINK_STEP_PT, ShrinkPolicy};
pub use coords::{CoordinateMapper, to_page_units};
pub use error::LayoutError;
pub use fonts::{FontFace, FontLibrary, FontMetrics, FontProgram, winansi};
pub use text::{FitOutcome, TextLayout, TextLayoutEngine, TextLine, TextRequest};
