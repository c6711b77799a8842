mod common;

use annex9::{
    Annex9Error, GeneratorConfig, InMemorySnapshotStore, NewSnapshot, OrderSnapshot, RenderJob,
    SnapshotError, SnapshotId, SnapshotStore,
};
use common::fixtures::full_order;
use common::*;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Accepts `capacity` saves, then reports a full disk.
#[derive(Debug)]
struct FullDiskStore {
    inner: InMemorySnapshotStore,
    capacity: usize,
    saves: AtomicUsize,
}

impl FullDiskStore {
    fn new(capacity: usize) -> Self {
        Self {
            inner: InMemorySnapshotStore::new(),
            capacity,
            saves: AtomicUsize::new(0),
        }
    }
}

impl SnapshotStore for FullDiskStore {
    fn save(&self, record: NewSnapshot) -> Result<SnapshotId, SnapshotError> {
        if self.saves.fetch_add(1, Ordering::SeqCst) >= self.capacity {
            return Err(SnapshotError::Io(std::io::Error::other("disk full")));
        }
        self.inner.save(record)
    }

    fn get(&self, id: SnapshotId) -> Result<Arc<OrderSnapshot>, SnapshotError> {
        self.inner.get(id)
    }

    fn history(&self, reference: &str) -> Result<Vec<Arc<OrderSnapshot>>, SnapshotError> {
        self.inner.history(reference)
    }

    fn name(&self) -> &'static str {
        "full-disk"
    }
}

fn entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn documents_land_under_their_conventional_name() -> TestResult {
    let dir = tempfile::tempdir()?;
    let job = RenderJob::new(TEMPLATE, full_order(), metadata("TC-2024-000042"));
    let (doc, path) = generator().render_to_dir(&job, dir.path())?;

    assert_eq!(path, dir.path().join("annex9_order_TC-2024-000042_20241105.pdf"));
    assert_eq!(entries(dir.path()), vec![doc.file_name.clone()]);
    assert_eq!(std::fs::read(&path)?, doc.bytes);
    Ok(())
}

#[test]
fn rendering_again_replaces_the_file_whole() -> TestResult {
    let dir = tempfile::tempdir()?;
    let generator = generator();
    let job = RenderJob::new(TEMPLATE, full_order(), metadata("TC-O2"));
    generator.render_to_dir(&job, dir.path())?;

    let corrected = RenderJob::new(
        TEMPLATE,
        full_order().with("client_name", "Marie Lambert"),
        metadata("TC-O2"),
    );
    let (doc, path) = generator.render_to_dir(&corrected, dir.path())?;
    assert_eq!(entries(dir.path()).len(), 1);
    assert_eq!(annex9::content_hash(&std::fs::read(path)?), doc.hash);
    Ok(())
}

#[test]
fn a_failed_snapshot_keeps_the_previously_recorded_file() -> TestResult {
    let dir = tempfile::tempdir()?;
    let store = Arc::new(FullDiskStore::new(1));
    let generator = generator_with(GeneratorConfig::default(), Some(store.clone()));
    let job = RenderJob::new(TEMPLATE, full_order(), metadata("TC-O6"));
    let (first, path) = generator.render_to_dir(&job, dir.path())?;

    let corrected = RenderJob::new(
        TEMPLATE,
        full_order().with("client_name", "Marie Lambert"),
        metadata("TC-O6"),
    );
    let err = generator.render_to_dir(&corrected, dir.path()).unwrap_err();
    assert!(matches!(err, Annex9Error::Snapshot(_)), "{err}");

    assert_eq!(entries(dir.path()), vec![first.file_name.clone()]);
    let on_disk = std::fs::read(&path)?;
    assert_eq!(on_disk, first.bytes);
    let recorded = store.latest("TC-O6")?.expect("first snapshot");
    assert_eq!(recorded.record.output_hash, annex9::content_hash(&on_disk));
    Ok(())
}

#[test]
fn failed_renders_leave_no_file_behind() -> TestResult {
    let dir = tempfile::tempdir()?;
    let mut data = full_order();
    data.remove("operator_name");
    let job = RenderJob::new(TEMPLATE, data, metadata("TC-O3"));
    assert!(generator().render_to_dir(&job, dir.path()).is_err());
    assert!(entries(dir.path()).is_empty());
    Ok(())
}

#[test]
fn an_exhausted_budget_times_out_cleanly() -> TestResult {
    let dir = tempfile::tempdir()?;
    let store = Arc::new(InMemorySnapshotStore::new());
    let generator = generator_with(
        GeneratorConfig {
            render_timeout_ms: 0,
            ..GeneratorConfig::default()
        },
        Some(store.clone()),
    );
    let job = RenderJob::new(TEMPLATE, full_order(), metadata("TC-O4"));

    let err = generator.render_to_dir(&job, dir.path()).unwrap_err();
    assert!(matches!(err, Annex9Error::RenderTimeout { budget_ms: 0, .. }), "{err}");
    assert!(err.is_retryable());
    assert!(entries(dir.path()).is_empty());
    assert!(store.history("TC-O4")?.is_empty());
    Ok(())
}

#[test]
fn a_generous_budget_does_not_interfere() -> TestResult {
    let generator = generator_with(
        GeneratorConfig {
            render_timeout_ms: 60_000,
            ..GeneratorConfig::default()
        },
        None,
    );
    let timed = generator.render(TEMPLATE, &full_order(), &metadata("TC-O5"))?;
    let default = common::generator().render(TEMPLATE, &full_order(), &metadata("TC-O5"))?;
    assert_eq!(timed.hash, default.hash);
    Ok(())
}
