use super::{NewSnapshot, OrderSnapshot, SnapshotError, SnapshotStore};
use annex9_types::SnapshotId;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tempfile::NamedTempFile;

const PREFIX: &str = "snapshot-";
const SUFFIX: &str = ".json";

/// One pretty-printed JSON file per snapshot in a directory.
///
/// Files are written to a temporary name and moved into place without
/// replacing an existing file, so a snapshot is either fully present or
/// absent. Saves from this process are serialized; the directory is the
/// only state.
#[derive(Debug)]
pub struct JsonDirSnapshotStore {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonDirSnapshotStore {
    /// Opens `dir`, creating it if needed.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            write_lock: Mutex::new(()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: SnapshotId) -> PathBuf {
        self.dir.join(format!("{PREFIX}{:08}{SUFFIX}", id.get()))
    }

    /// Ids present on disk, ascending.
    fn ids(&self) -> Result<Vec<SnapshotId>, SnapshotError> {
        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let name = entry?.file_name();
            let Some(name) = name.to_str() else { continue };
            if let Some(id) = name
                .strip_prefix(PREFIX)
                .and_then(|rest| rest.strip_suffix(SUFFIX))
                .and_then(|digits| digits.parse::<u64>().ok())
            {
                ids.push(SnapshotId::new(id));
            }
        }
        ids.sort();
        Ok(ids)
    }

    fn read(&self, id: SnapshotId) -> Result<OrderSnapshot, SnapshotError> {
        let path = self.path_for(id);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(SnapshotError::NotFound(id));
            }
            Err(e) => return Err(e.into()),
        };
        serde_json::from_slice(&bytes).map_err(|e| SnapshotError::Corrupt {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    fn all(&self) -> Result<Vec<OrderSnapshot>, SnapshotError> {
        self.ids()?.into_iter().map(|id| self.read(id)).collect()
    }
}

impl SnapshotStore for JsonDirSnapshotStore {
    fn save(&self, record: NewSnapshot) -> Result<SnapshotId, SnapshotError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let existing = self.all()?;
        let id = SnapshotId::new(existing.last().map_or(0, |s| s.id.get()) + 1);
        let version = existing
            .iter()
            .filter(|s| s.reference() == record.metadata.reference)
            .count() as u32
            + 1;
        let snapshot = OrderSnapshot {
            id,
            version,
            record,
        };

        let json = serde_json::to_vec_pretty(&snapshot).map_err(|e| SnapshotError::Corrupt {
            path: self.path_for(id).display().to_string(),
            reason: e.to_string(),
        })?;
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(&json)?;
        tmp.as_file().sync_all()?;
        tmp.persist_noclobber(self.path_for(id))
            .map_err(|e| SnapshotError::Io(e.error))?;
        log::debug!(
            "Saved snapshot {} (version {} of '{}')",
            id,
            version,
            snapshot.reference()
        );
        Ok(id)
    }

    fn get(&self, id: SnapshotId) -> Result<Arc<OrderSnapshot>, SnapshotError> {
        self.read(id).map(Arc::new)
    }

    fn history(&self, reference: &str) -> Result<Vec<Arc<OrderSnapshot>>, SnapshotError> {
        Ok(self
            .all()?
            .into_iter()
            .filter(|s| s.reference() == reference)
            .map(Arc::new)
            .collect())
    }

    fn name(&self) -> &'static str {
        "JsonDirSnapshotStore"
    }
}
