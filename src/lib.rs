//! Annex 9 order form generation.
//!
//! A [`Generator`] loads versioned field layouts, resolves order data
//! against them, draws the values over a fixed background page and writes a
//! byte-for-byte reproducible PDF. Every successful render can be recorded
//! in a [`SnapshotStore`] and regenerated later with
//! [`Generator::reproduce`].
//!
//! ```no_run
//! use annex9::{Generator, OrderData, RenderMetadata};
//! use chrono::NaiveDate;
//!
//! let generator = Generator::builder()
//!     .with_template_dir("assets/templates")
//!     .build()?;
//! let data = OrderData::new().with("client_name", "Jean Dupont");
//! let created = NaiveDate::from_ymd_opt(2024, 3, 1)
//!     .and_then(|d| d.and_hms_opt(9, 30, 0))
//!     .ok_or("bad date")?;
//! let doc = generator.render("Annex9_v2009", &data, &RenderMetadata::new("TC-1", created))?;
//! std::fs::write(&doc.file_name, &doc.bytes)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod error;
pub mod generator;
pub mod naming;
pub mod snapshot;

pub use config::GeneratorConfig;
pub use error::Annex9Error;
pub use generator::{
    BatchItemResult, BatchSuccess, Generator, GeneratorBuilder, RenderJob, RenderedDocument,
};
pub use naming::{content_hash, file_name};
pub use snapshot::{
    InMemorySnapshotStore, JsonDirSnapshotStore, NewSnapshot, OrderSnapshot, SnapshotError,
    SnapshotStore,
};

pub use annex9_executor::ExecutorImpl;
pub use annex9_layout::{LayoutConfig, ShrinkPolicy};
pub use annex9_template::{FieldValue, OrderData, RenderMetadata, RuleRegistry, TemplateVersion};
pub use annex9_traits::{InMemoryResourceProvider, ResourceProvider};
pub use annex9_types::{POINTS_PER_MM, SnapshotId, TemplateVersionId};
