use super::{NewSnapshot, OrderSnapshot, SnapshotError, SnapshotStore};
use annex9_types::SnapshotId;
use std::sync::{Arc, PoisonError, RwLock};

/// Snapshots kept in an arena; the id of a snapshot is its position plus one.
#[derive(Debug, Default)]
pub struct InMemorySnapshotStore {
    records: RwLock<Vec<Arc<OrderSnapshot>>>,
}

impl InMemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SnapshotStore for InMemorySnapshotStore {
    fn save(&self, record: NewSnapshot) -> Result<SnapshotId, SnapshotError> {
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        let reference = &record.metadata.reference;
        let version = records
            .iter()
            .filter(|s| s.reference() == reference)
            .count() as u32
            + 1;
        let id = SnapshotId::new(records.len() as u64 + 1);
        records.push(Arc::new(OrderSnapshot {
            id,
            version,
            record,
        }));
        Ok(id)
    }

    fn get(&self, id: SnapshotId) -> Result<Arc<OrderSnapshot>, SnapshotError> {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        id.get()
            .checked_sub(1)
            .and_then(|i| records.get(i as usize))
            .cloned()
            .ok_or(SnapshotError::NotFound(id))
    }

    fn history(&self, reference: &str) -> Result<Vec<Arc<OrderSnapshot>>, SnapshotError> {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        Ok(records
            .iter()
            .filter(|s| s.reference() == reference)
            .cloned()
            .collect())
    }

    fn name(&self) -> &'static str {
        "InMemorySnapshotStore"
    }
}
