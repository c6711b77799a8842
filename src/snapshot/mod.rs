//! Append-only records of what each rendered document was made from.
//!
//! A snapshot holds the template version, the order data and the metadata
//! of one successful render together with the hash of its output, which is
//! enough to render the same bytes again.

mod json_dir;
mod memory;

pub use json_dir::JsonDirSnapshotStore;
pub use memory::InMemorySnapshotStore;

use annex9_template::{OrderData, RenderMetadata};
use annex9_types::{SnapshotId, TemplateVersionId};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("Snapshot {0} not found")]
    NotFound(SnapshotId),

    #[error("Snapshot file '{path}' is unreadable: {reason}")]
    Corrupt { path: String, reason: String },

    #[error("Snapshot storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// What a render hands to the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSnapshot {
    pub template_version: TemplateVersionId,
    pub data: OrderData,
    pub metadata: RenderMetadata,
    /// Lowercase hex SHA-256 of the output bytes.
    pub output_hash: String,
    pub file_name: String,
}

/// A stored snapshot. Never modified after it is saved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderSnapshot {
    pub id: SnapshotId,
    /// 1 for the first render of a reference, then 2, 3, ...
    pub version: u32,
    pub record: NewSnapshot,
}

impl OrderSnapshot {
    pub fn reference(&self) -> &str {
        &self.record.metadata.reference
    }
}

pub trait SnapshotStore: Send + Sync + Debug {
    /// Appends `record` and returns its new id. Existing snapshots are never
    /// touched.
    fn save(&self, record: NewSnapshot) -> Result<SnapshotId, SnapshotError>;

    fn get(&self, id: SnapshotId) -> Result<Arc<OrderSnapshot>, SnapshotError>;

    /// Every snapshot of `reference`, oldest first.
    fn history(&self, reference: &str) -> Result<Vec<Arc<OrderSnapshot>>, SnapshotError>;

    fn latest(&self, reference: &str) -> Result<Option<Arc<OrderSnapshot>>, SnapshotError> {
        Ok(self.history(reference)?.pop())
    }

    fn name(&self) -> &'static str;
}
