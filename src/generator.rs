//! The public entry points: render, reproduce and batch generation.

use crate::naming::{content_hash, file_name};
use crate::snapshot::{NewSnapshot, SnapshotStore};
use crate::{Annex9Error, GeneratorConfig};
use annex9_executor::{Executor, ExecutorImpl};
use annex9_render::DocumentCompositor;
use annex9_resource::{FilesystemResourceProvider, LayeredResourceProvider};
use annex9_template::{
    OrderData, RenderMetadata, RuleRegistry, TemplateLoader, TemplateResolver, TemplateVersion,
};
use annex9_traits::ResourceProvider;
use annex9_types::{SnapshotId, TemplateVersionId};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::NamedTempFile;

/// One order to render.
#[derive(Debug, Clone)]
pub struct RenderJob {
    pub template_version: TemplateVersionId,
    pub data: OrderData,
    pub metadata: RenderMetadata,
}

impl RenderJob {
    pub fn new(
        template_version: impl Into<TemplateVersionId>,
        data: OrderData,
        metadata: RenderMetadata,
    ) -> Self {
        Self {
            template_version: template_version.into(),
            data,
            metadata,
        }
    }
}

/// A finished document.
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    pub bytes: Vec<u8>,
    /// Lowercase hex SHA-256 of `bytes`.
    pub hash: String,
    pub file_name: String,
    pub template_version: TemplateVersionId,
    /// Set when a snapshot store recorded (or supplied) this render.
    pub snapshot_id: Option<SnapshotId>,
}

/// Outcome of one successful batch item.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchSuccess {
    pub snapshot_id: Option<SnapshotId>,
    pub hash: String,
    pub file_name: String,
    /// Where the file was written, for directory batches.
    pub path: Option<PathBuf>,
}

#[derive(Debug)]
pub struct BatchItemResult {
    /// Position of the job in the submitted batch.
    pub index: usize,
    pub reference: String,
    pub outcome: Result<BatchSuccess, Annex9Error>,
}

impl BatchItemResult {
    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }
}

pub struct GeneratorBuilder {
    provider: Option<Arc<dyn ResourceProvider>>,
    assets: Vec<Arc<dyn ResourceProvider>>,
    config: GeneratorConfig,
    rules: RuleRegistry,
    executor: Option<ExecutorImpl>,
    snapshots: Option<Arc<dyn SnapshotStore>>,
}

impl Default for GeneratorBuilder {
    fn default() -> Self {
        Self {
            provider: None,
            assets: Vec::new(),
            config: GeneratorConfig::default(),
            rules: RuleRegistry::with_builtins(),
            executor: None,
            snapshots: None,
        }
    }
}

impl GeneratorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Source of `<version>.json` template files and the assets they name.
    pub fn with_provider(mut self, provider: Arc<dyn ResourceProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Reads templates and assets from a directory.
    pub fn with_template_dir(self, dir: impl AsRef<Path>) -> Self {
        self.with_provider(Arc::new(FilesystemResourceProvider::new(dir)))
    }

    /// Extra source of fonts and background pages, consulted after the
    /// template source. Later calls add further fallbacks.
    pub fn with_asset_provider(mut self, provider: Arc<dyn ResourceProvider>) -> Self {
        self.assets.push(provider);
        self
    }

    pub fn with_asset_dir(self, dir: impl AsRef<Path>) -> Self {
        self.with_asset_provider(Arc::new(FilesystemResourceProvider::new(dir)))
    }

    pub fn with_config(mut self, config: GeneratorConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces the computed-field rules. Start from
    /// [`RuleRegistry::with_builtins`] to keep the standard ones.
    pub fn with_rules(mut self, rules: RuleRegistry) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_executor(mut self, executor: ExecutorImpl) -> Self {
        self.executor = Some(executor);
        self
    }

    pub fn with_snapshot_store(mut self, store: Arc<dyn SnapshotStore>) -> Self {
        self.snapshots = Some(store);
        self
    }

    pub fn build(self) -> Result<Generator, Annex9Error> {
        self.config.validate()?;
        let provider = self.provider.ok_or_else(|| {
            Annex9Error::Config(
                "no template source configured; use `with_template_dir` or `with_provider`"
                    .to_string(),
            )
        })?;
        let provider = if self.assets.is_empty() {
            provider
        } else {
            let layered = self
                .assets
                .into_iter()
                .fold(LayeredResourceProvider::new().with_layer(provider), |l, p| {
                    l.with_layer(p)
                });
            Arc::new(layered) as Arc<dyn ResourceProvider>
        };
        let loader = TemplateLoader::new(provider)
            .with_rules(Arc::new(self.rules))
            .with_options(self.config.load_options());
        let executor = self
            .executor
            .unwrap_or_else(|| ExecutorImpl::for_workers(self.config.worker_count()));
        log::debug!(
            "Generator ready: executor {} ({} workers), snapshots {}",
            executor.name(),
            executor.parallelism(),
            self.snapshots.as_ref().map_or("disabled", |s| s.name())
        );
        Ok(Generator {
            inner: Arc::new(Inner {
                resolver: TemplateResolver::new(loader),
                compositor: DocumentCompositor::new(self.config.producer.clone()),
                config: self.config,
                executor,
                snapshots: self.snapshots,
            }),
        })
    }
}

/// Renders order forms. Cheap to clone; clones share the template cache.
#[derive(Clone)]
pub struct Generator {
    inner: Arc<Inner>,
}

struct Inner {
    resolver: TemplateResolver,
    compositor: DocumentCompositor,
    config: GeneratorConfig,
    executor: ExecutorImpl,
    snapshots: Option<Arc<dyn SnapshotStore>>,
}

impl Generator {
    pub fn builder() -> GeneratorBuilder {
        GeneratorBuilder::new()
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.inner.config
    }

    pub fn snapshot_store(&self) -> Option<&Arc<dyn SnapshotStore>> {
        self.inner.snapshots.as_ref()
    }

    /// Loads and validates a template version without rendering.
    pub fn template(&self, version: &str) -> Result<Arc<TemplateVersion>, Annex9Error> {
        Ok(self.inner.resolver.load(version)?)
    }

    /// Renders one document and records a snapshot when a store is set.
    pub fn render(
        &self,
        template_version: &str,
        data: &OrderData,
        metadata: &RenderMetadata,
    ) -> Result<RenderedDocument, Annex9Error> {
        let mut doc = self.produce(template_version, data, metadata)?;
        doc.snapshot_id = self.record(&doc, data, metadata)?;
        Ok(doc)
    }

    /// Renders `job` and writes it into `dir` under its conventional name.
    ///
    /// The file appears atomically and only once its snapshot is recorded. A
    /// failed render or snapshot leaves any earlier file of the same name as
    /// it was.
    pub fn render_to_dir(
        &self,
        job: &RenderJob,
        dir: impl AsRef<Path>,
    ) -> Result<(RenderedDocument, PathBuf), Annex9Error> {
        let dir = dir.as_ref();
        let mut doc = self.produce(job.template_version.as_str(), &job.data, &job.metadata)?;
        let path = dir.join(&doc.file_name);

        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(&doc.bytes)?;
        tmp.as_file().sync_all()?;

        doc.snapshot_id = self.record(&doc, &job.data, &job.metadata)?;
        tmp.persist(&path).map_err(|e| {
            log::error!(
                "Snapshot {:?} recorded but '{}' could not be written: {}",
                doc.snapshot_id,
                path.display(),
                e.error
            );
            Annex9Error::Io(e.error)
        })?;
        log::info!("Wrote {}", path.display());
        Ok((doc, path))
    }

    /// Renders the snapshot's inputs again and checks the bytes are unchanged.
    pub fn reproduce(&self, id: SnapshotId) -> Result<RenderedDocument, Annex9Error> {
        let store = self
            .inner
            .snapshots
            .as_ref()
            .ok_or_else(|| Annex9Error::Config("no snapshot store configured".to_string()))?;
        let snapshot = store.get(id)?;
        let record = &snapshot.record;
        let mut doc = self.produce(
            record.template_version.as_str(),
            &record.data,
            &record.metadata,
        )?;
        if doc.hash != record.output_hash {
            return Err(Annex9Error::ReproductionMismatch {
                snapshot: id,
                expected: record.output_hash.clone(),
                actual: doc.hash,
            });
        }
        doc.snapshot_id = Some(id);
        Ok(doc)
    }

    /// Renders every job independently on the worker pool. Results come back
    /// in job order; one failure does not affect the others.
    pub fn render_batch(&self, jobs: Vec<RenderJob>) -> Vec<BatchItemResult> {
        self.batch(jobs, None)
    }

    /// Like [`Generator::render_batch`], writing each document into `dir`.
    pub fn render_batch_to_dir(
        &self,
        jobs: Vec<RenderJob>,
        dir: impl AsRef<Path>,
    ) -> Vec<BatchItemResult> {
        self.batch(jobs, Some(dir.as_ref().to_path_buf()))
    }

    fn batch(&self, jobs: Vec<RenderJob>, dir: Option<PathBuf>) -> Vec<BatchItemResult> {
        let total = jobs.len();
        let executor = &self.inner.executor;
        if executor.is_parallel() {
            log::debug!("Rendering {} orders on {} workers", total, executor.parallelism());
        } else {
            log::debug!("Rendering {} orders sequentially", total);
        }
        let generator = self.clone();
        let items: Vec<(usize, RenderJob)> = jobs.into_iter().enumerate().collect();
        let results = executor.execute_all(items, move |(index, job)| {
            let outcome = match &dir {
                Some(dir) => generator
                    .render_to_dir(&job, dir)
                    .map(|(doc, path)| success(doc, Some(path))),
                None => generator
                    .render(job.template_version.as_str(), &job.data, &job.metadata)
                    .map(|doc| success(doc, None)),
            };
            if let Err(e) = &outcome {
                log::warn!("Batch item {} ('{}') failed: {}", index, job.metadata.reference, e);
            }
            BatchItemResult {
                index,
                reference: job.metadata.reference,
                outcome,
            }
        });
        let failed = results.iter().filter(|r| !r.is_ok()).count();
        log::info!("Batch finished: {} of {} succeeded", total - failed, total);
        results
    }

    /// Load, resolve and compose, under one time budget.
    fn produce(
        &self,
        template_version: &str,
        data: &OrderData,
        metadata: &RenderMetadata,
    ) -> Result<RenderedDocument, Annex9Error> {
        let budget = self.inner.config.render_budget();
        let template = self.inner.resolver.load(template_version)?;
        let fields = self.inner.resolver.resolve(&template, data, metadata)?;
        let bytes = self
            .inner
            .compositor
            .compose(&template, &fields, metadata, &budget)?;
        Ok(RenderedDocument {
            hash: content_hash(&bytes),
            file_name: file_name(metadata),
            template_version: template.id.clone(),
            snapshot_id: None,
            bytes,
        })
    }

    fn record(
        &self,
        doc: &RenderedDocument,
        data: &OrderData,
        metadata: &RenderMetadata,
    ) -> Result<Option<SnapshotId>, Annex9Error> {
        let Some(store) = &self.inner.snapshots else {
            return Ok(None);
        };
        let id = store.save(NewSnapshot {
            template_version: doc.template_version.clone(),
            data: data.clone(),
            metadata: metadata.clone(),
            output_hash: doc.hash.clone(),
            file_name: doc.file_name.clone(),
        })?;
        Ok(Some(id))
    }
}

fn success(doc: RenderedDocument, path: Option<PathBuf>) -> BatchSuccess {
    BatchSuccess {
        snapshot_id: doc.snapshot_id,
        hash: doc.hash,
        file_name: doc.file_name,
        path,
    }
}
