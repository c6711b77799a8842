//! Overlay rendering of resolved template fields.
//!
//! [`FieldRenderer`] draws each field into an [`OverlaySurface`] using the
//! layout engine, and [`DocumentCompositor`] places that overlay on the
//! template's background page and writes the final document.

mod compositor;
mod decorations;
mod error;
mod field;
mod fonts;
mod signature;
mod surface;

pub use compositor::{DEFAULT_PRODUCER, DocumentCompositor, file_id};
pub use error::RenderError;
pub use field::{DrawTarget, FieldRenderer};
pub use fonts::FontResources;
pub use signature::DecodedImage;
pub use surface::OverlaySurface;
