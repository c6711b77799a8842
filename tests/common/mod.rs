#![allow(dead_code)]

pub mod fixtures;

use annex9::{Generator, GeneratorConfig, RenderMetadata, SnapshotStore};
use chrono::{NaiveDate, NaiveDateTime};
use lopdf::Document as LopdfDocument;
use lopdf::content::{Content, Operation};
use std::path::PathBuf;
use std::sync::Arc;

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

pub const TEMPLATE: &str = "Annex9_v2009";

/// Directory of the templates shipped with the crate.
pub fn bundled_templates() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets/templates")
}

/// A sequential generator over the bundled templates.
pub fn generator() -> Generator {
    generator_with(GeneratorConfig::default(), None)
}

pub fn generator_with(config: GeneratorConfig, store: Option<Arc<dyn SnapshotStore>>) -> Generator {
    let mut builder = Generator::builder()
        .with_template_dir(bundled_templates())
        .with_config(config);
    if let Some(store) = store {
        builder = builder.with_snapshot_store(store);
    }
    builder.build().expect("generator builds")
}

pub fn created_at() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 11, 5)
        .and_then(|d| d.and_hms_opt(14, 30, 0))
        .expect("valid timestamp")
}

pub fn metadata(reference: &str) -> RenderMetadata {
    RenderMetadata::new(reference, created_at())
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub size: f32,
    pub x: f32,
    pub y: f32,
}

/// Wrapper around a generated PDF with helper methods
pub struct GeneratedPdf {
    pub bytes: Vec<u8>,
    pub doc: LopdfDocument,
}

impl GeneratedPdf {
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, Box<dyn std::error::Error>> {
        let doc = LopdfDocument::load_mem(&bytes)?;
        Ok(Self { bytes, doc })
    }

    pub fn page_count(&self) -> usize {
        self.doc.get_pages().len()
    }

    /// Decoded operations of the (only) page, background and overlay together.
    pub fn operations(&self) -> Vec<Operation> {
        let page_id = *self.doc.get_pages().values().next().expect("one page");
        let content = self.doc.get_page_content(page_id).expect("page content");
        Content::decode(&content).expect("decodable content").operations
    }

    pub fn count(&self, operator: &str) -> usize {
        self.operations()
            .iter()
            .filter(|op| op.operator == operator)
            .count()
    }

    /// Every string shown with `Tj`, decoded from WinAnsi.
    pub fn shown_text(&self) -> Vec<String> {
        self.text_runs().into_iter().map(|run| run.text).collect()
    }

    /// Every text run as (text, font size, x, y), in drawing order.
    pub fn text_runs(&self) -> Vec<TextRun> {
        let mut runs = Vec::new();
        let (mut size, mut x, mut y) = (0.0, 0.0, 0.0);
        for op in self.operations() {
            let float = |i: usize| op.operands.get(i).and_then(|o| o.as_float().ok());
            match op.operator.as_str() {
                "Tf" => size = float(1).unwrap_or(size),
                "Td" => {
                    x = float(0).unwrap_or(x);
                    y = float(1).unwrap_or(y);
                }
                "Tj" => {
                    if let Some(Ok(bytes)) = op.operands.first().map(|o| o.as_str()) {
                        runs.push(TextRun {
                            text: winansi_to_string(bytes),
                            size,
                            x,
                            y,
                        });
                    }
                }
                _ => {}
            }
        }
        runs
    }

    /// The first run whose text starts with `prefix`.
    pub fn run_starting_with(&self, prefix: &str) -> Option<TextRun> {
        self.text_runs()
            .into_iter()
            .find(|run| run.text.starts_with(prefix))
    }

    /// Rectangles used as clipping paths, as `[x, y, w, h]` in points.
    pub fn clip_rects(&self) -> Vec<[f32; 4]> {
        let ops = self.operations();
        ops.windows(2)
            .filter(|pair| pair[0].operator == "re" && pair[1].operator == "W")
            .filter_map(|pair| {
                let values: Vec<f32> = pair[0]
                    .operands
                    .iter()
                    .filter_map(|o| o.as_float().ok())
                    .collect();
                <[f32; 4]>::try_from(values).ok()
            })
            .collect()
    }

    pub fn info(&self, key: &str) -> Option<Vec<u8>> {
        let info_id = self.doc.trailer.get(b"Info").ok()?.as_reference().ok()?;
        let info = self.doc.get_dictionary(info_id).ok()?;
        info.get(key.as_bytes()).ok()?.as_str().ok().map(<[u8]>::to_vec)
    }

    /// Save PDF to a file for manual debugging
    pub fn save_for_debug(&self, name: &str) -> std::io::Result<()> {
        std::fs::write(format!("test_output_{}.pdf", name), &self.bytes)
    }
}

fn winansi_to_string(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|&b| match b {
            0x80 => '\u{20AC}',
            0x85 => '\u{2026}',
            _ => b as char,
        })
        .collect()
}

pub fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < 0.01
}
