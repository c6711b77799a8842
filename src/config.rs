//! Generator settings, loadable from a JSON file.

use crate::Annex9Error;
use annex9_layout::{LayoutConfig, RenderBudget};
use annex9_render::DEFAULT_PRODUCER;
use annex9_template::LoadOptions;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    pub layout: LayoutConfig,
    /// Wall-clock budget of one render. Zero aborts every render.
    pub render_timeout_ms: u64,
    pub reject_overlapping_fields: bool,
    /// Written to the `/Producer` and `/Creator` entries.
    pub producer: String,
    /// Batch worker threads; 0 uses the shared pool.
    pub workers: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            layout: LayoutConfig::default(),
            render_timeout_ms: 5000,
            reject_overlapping_fields: false,
            producer: DEFAULT_PRODUCER.to_string(),
            workers: 0,
        }
    }
}

impl GeneratorConfig {
    pub fn from_json_str(json: &str) -> Result<Self, Annex9Error> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, Annex9Error> {
        Self::from_json_str(&std::fs::read_to_string(path)?)
    }

    pub fn validate(&self) -> Result<(), Annex9Error> {
        self.layout
            .validate()
            .map_err(|e| Annex9Error::Config(e.to_string()))?;
        self.layout
            .shrink
            .validate()
            .map_err(|e| Annex9Error::Config(e.to_string()))?;
        if self.producer.trim().is_empty() {
            return Err(Annex9Error::Config("producer must not be empty".to_string()));
        }
        Ok(())
    }

    /// A budget whose clock starts now.
    pub fn render_budget(&self) -> RenderBudget {
        RenderBudget::new(Duration::from_millis(self.render_timeout_ms))
    }

    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            layout: self.layout,
            reject_overlapping_fields: self.reject_overlapping_fields,
        }
    }

    pub(crate) fn worker_count(&self) -> Option<usize> {
        (self.workers > 0).then_some(self.workers)
    }
}
