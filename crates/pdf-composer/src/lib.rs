//! Single-page PDF composition.
//!
//! - Parsing and checking of a one-page background document
//! - Deep object copying with cycle handling
//! - Overlay content streams and resource registration
//! - Deterministic serialization

mod assembly;
mod background;
mod copier;
mod error;
mod writer;

pub use assembly::PageAssembly;
pub use background::BackgroundPage;
pub use error::ComposerError;
pub use writer::{deflate, format_number, write_document};
