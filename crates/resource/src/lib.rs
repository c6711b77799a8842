//! Resource providers for template assets.
//!
//! - [`FilesystemResourceProvider`]: files under an asset directory
//! - [`LayeredResourceProvider`]: first provider that has the path wins
//! - [`InMemoryResourceProvider`]: re-exported from annex9-traits

mod filesystem;
mod layered;

pub use filesystem::FilesystemResourceProvider;
pub use layered::LayeredResourceProvider;

pub use annex9_traits::{InMemoryResourceProvider, ResourceError, ResourceProvider};
