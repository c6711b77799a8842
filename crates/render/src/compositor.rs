//! One deterministic PDF from a template version and its resolved fields.

use crate::decorations::draw_decorations;
use crate::field::{DrawTarget, FieldRenderer};
use crate::fonts::FontResources;
use crate::surface::OverlaySurface;
use crate::RenderError;
use annex9_layout::RenderBudget;
use annex9_pdf_composer::PageAssembly;
use annex9_template::{RenderMetadata, ResolvedField, TemplateVersion};
use lopdf::{Dictionary, Object, StringFormat, dictionary};
use sha2::{Digest, Sha256};

pub const DEFAULT_PRODUCER: &str = "annex9";

/// Merges the background page with the field overlay.
///
/// Output bytes depend only on the template version, the resolved values and
/// the metadata: no clock reads, no random ids, sorted dictionaries.
#[derive(Debug, Clone)]
pub struct DocumentCompositor {
    producer: String,
}

impl Default for DocumentCompositor {
    fn default() -> Self {
        Self::new(DEFAULT_PRODUCER)
    }
}

impl DocumentCompositor {
    pub fn new(producer: impl Into<String>) -> Self {
        Self {
            producer: producer.into(),
        }
    }

    pub fn producer(&self) -> &str {
        &self.producer
    }

    /// Renders `fields` in order; later fields paint over earlier ones.
    pub fn compose(
        &self,
        template: &TemplateVersion,
        fields: &[ResolvedField<'_>],
        metadata: &RenderMetadata,
        budget: &RenderBudget,
    ) -> Result<Vec<u8>, RenderError> {
        budget.check().map_err(|e| RenderError::for_field("", e))?;

        let mut assembly = match &template.background {
            Some(background) => PageAssembly::from_background(background)?,
            None => PageAssembly::blank(
                template.mapper.page_width_pt(),
                template.mapper.page_height_pt(),
            ),
        };
        let mut surface = OverlaySurface::new();
        let mut fonts = FontResources::new();
        let mut target = DrawTarget {
            assembly: &mut assembly,
            surface: &mut surface,
            fonts: &mut fonts,
            budget,
        };

        draw_decorations(template, &mut target)?;
        let renderer = FieldRenderer::new(template);
        for field in fields {
            renderer.render(field, &mut target)?;
        }

        budget.check().map_err(|e| RenderError::for_field("", e))?;
        let content = surface
            .encode()
            .map_err(|e| RenderError::Composer(e.into()))?;
        if !content.is_empty() {
            assembly.overlay_content(&content)?;
        }

        let info = self.info(metadata);
        let file_id = file_id(template, metadata);
        let bytes = assembly.finish(info, &file_id)?;
        log::info!(
            "Rendered '{}' with template '{}' ({} fields, {} fonts, {} bytes)",
            metadata.reference,
            template.id,
            fields.len(),
            fonts.len(),
            bytes.len()
        );
        Ok(bytes)
    }

    fn info(&self, metadata: &RenderMetadata) -> Dictionary {
        let date = metadata.pdf_date();
        dictionary! {
            "Title" => text_string(&metadata.title),
            "Author" => text_string(&metadata.author),
            "Subject" => text_string(&metadata.subject),
            "Keywords" => text_string(&metadata.reference),
            "Creator" => text_string(&self.producer),
            "Producer" => text_string(&self.producer),
            "CreationDate" => text_string(&date),
            "ModDate" => text_string(&date),
        }
    }
}

/// First 16 bytes of SHA-256 over the version id, reference and timestamp.
pub fn file_id(template: &TemplateVersion, metadata: &RenderMetadata) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(template.id.as_str().as_bytes());
    hasher.update([0]);
    hasher.update(metadata.reference.as_bytes());
    hasher.update([0]);
    hasher.update(metadata.pdf_date().as_bytes());
    hasher.finalize()[..16].to_vec()
}

/// PDF text string: plain bytes for ASCII, UTF-16BE with a byte order mark
/// otherwise.
fn text_string(text: &str) -> Object {
    if text.is_ascii() {
        return Object::String(text.as_bytes().to_vec(), StringFormat::Literal);
    }
    let mut bytes = vec![0xFE, 0xFF];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::tests::signature_png;
    use annex9_template::{
        FieldValue, OrderData, TemplateDefinition, TemplateLoader, TemplateResolver,
    };
    use annex9_traits::InMemoryResourceProvider;
    use chrono::NaiveDate;
    use lopdf::content::{Content, Operation};
    use lopdf::Document;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    fn template() -> TemplateVersion {
        let def: TemplateDefinition = serde_json::from_value(json!({
            "version": "Annex9_v2009",
            "fonts": [
                { "name": "Helvetica", "path": null },
                { "name": "Helvetica-Bold", "path": null }
            ],
            "decorations": [
                { "kind": "text", "x_mm": 105, "y_mm": 20, "text": "BON DE COMMANDE",
                  "align": "center", "font": { "name": "Helvetica-Bold", "size": 14 } },
                { "kind": "line", "from_mm": [15, 25], "to_mm": [195, 25] }
            ],
            "fields": [
                { "key": "client_name", "type": "text", "required": true,
                  "box_mm": { "x": 20, "y": 80, "w": 100, "h": 7 },
                  "font": { "name": "Helvetica", "size": 10 } },
                { "key": "is_aller", "type": "checkbox",
                  "box_mm": { "x": 20, "y": 100, "w": 5, "h": 5 } },
                { "key": "client_title", "type": "choice",
                  "options": ["Madame", "Monsieur", "Société"],
                  "box_mm": { "x": 20, "y": 110, "w": 80, "h": 7 } },
                { "key": "signature", "type": "signature_block",
                  "box_mm": { "x": 20, "y": 130, "w": 60, "h": 25 } },
                { "key": "stamp", "type": "stamp_block",
                  "box_mm": { "x": 100, "y": 130, "w": 60, "h": 25 } }
            ]
        }))
        .unwrap();
        TemplateLoader::new(Arc::new(InMemoryResourceProvider::new()))
            .from_definition(def)
            .unwrap()
    }

    fn metadata() -> RenderMetadata {
        let at = NaiveDate::from_ymd_opt(2024, 6, 3)
            .unwrap()
            .and_hms_opt(10, 15, 0)
            .unwrap();
        RenderMetadata::new("TC-2024-000042", at)
    }

    fn render(data: &OrderData, budget: &RenderBudget) -> Result<Vec<u8>, RenderError> {
        let template = template();
        let resolver = TemplateResolver::new(TemplateLoader::new(Arc::new(
            InMemoryResourceProvider::new(),
        )));
        let fields = resolver.resolve(&template, data, &metadata()).unwrap();
        DocumentCompositor::default().compose(&template, &fields, &metadata(), budget)
    }

    fn operations(bytes: &[u8]) -> Vec<Operation> {
        let doc = Document::load_mem(bytes).unwrap();
        let page_id = *doc.get_pages().values().next().unwrap();
        let content = doc.get_page_content(page_id).unwrap();
        Content::decode(&content).unwrap().operations
    }

    fn count(ops: &[Operation], operator: &str) -> usize {
        ops.iter().filter(|op| op.operator == operator).count()
    }

    fn order() -> OrderData {
        OrderData::new().with("client_name", "Jean Dupont")
    }

    #[test]
    fn identical_inputs_give_identical_bytes() {
        let a = render(&order(), &RenderBudget::unlimited()).unwrap();
        let b = render(&order(), &RenderBudget::unlimited()).unwrap();
        assert_eq!(a, b);
        assert!(a.starts_with(b"%PDF-1.7"));
    }

    #[test]
    fn metadata_lands_in_the_info_dictionary() {
        let bytes = render(&order(), &RenderBudget::unlimited()).unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        let info_id = doc.trailer.get(b"Info").unwrap().as_reference().unwrap();
        let info = doc.get_dictionary(info_id).unwrap();
        assert_eq!(
            info.get(b"Title").unwrap().as_str().unwrap(),
            b"Bon de commande - TC-2024-000042"
        );
        assert_eq!(
            info.get(b"CreationDate").unwrap().as_str().unwrap(),
            b"D:20240603101500"
        );
        assert_eq!(doc.get_pages().len(), 1);
    }

    #[test]
    fn long_names_stay_on_one_line() {
        let data = OrderData::new().with("client_name", "Jean-Baptiste Léopold Van Der Meulen");
        let ops = operations(&render(&data, &RenderBudget::unlimited()).unwrap());
        // Title decoration, the name, the choice line.
        assert_eq!(count(&ops, "Tj"), 3);
        let name_size = ops
            .iter()
            .filter(|op| op.operator == "Tf")
            .nth(1)
            .and_then(|op| op.operands[1].as_float().ok())
            .unwrap();
        assert!(name_size <= 10.0);
    }

    #[test]
    fn unchecked_boxes_draw_nothing() {
        let unchecked = operations(&render(&order().with("is_aller", false), &RenderBudget::unlimited()).unwrap());
        let checked = operations(&render(&order().with("is_aller", true), &RenderBudget::unlimited()).unwrap());
        assert_eq!(count(&unchecked, "c"), 0);
        assert_eq!(count(&checked, "c"), 4);
    }

    #[test]
    fn unselected_choices_are_struck_through() {
        let ops = operations(&render(&order().with("client_title", "Monsieur"), &RenderBudget::unlimited()).unwrap());
        // One decoration rule plus two strikes.
        assert_eq!(count(&ops, "l"), 3);

        let none = operations(&render(&order(), &RenderBudget::unlimited()).unwrap());
        assert_eq!(count(&none, "l"), 1);
    }

    #[test]
    fn signatures_are_embedded_with_a_soft_mask() {
        let data = order().with("signature", FieldValue::image(signature_png(40, 20)));
        let bytes = render(&data, &RenderBudget::unlimited()).unwrap();
        let ops = operations(&bytes);
        assert_eq!(count(&ops, "Do"), 1);

        let doc = Document::load_mem(&bytes).unwrap();
        let images: Vec<_> = doc
            .objects
            .values()
            .filter_map(|obj| obj.as_stream().ok())
            .filter(|s| s.dict.get(b"Subtype").and_then(|v| v.as_name()).ok() == Some(b"Image".as_slice()))
            .collect();
        assert_eq!(images.len(), 2);
        assert!(images.iter().any(|s| s.dict.has(b"SMask")));
    }

    #[test]
    fn undecodable_signature_fails_the_render() {
        let data = order().with("signature", FieldValue::image(b"scribble".to_vec()));
        match render(&data, &RenderBudget::unlimited()) {
            Err(RenderError::Field { field, .. }) => assert_eq!(field, "signature"),
            other => panic!("expected a field error, got {other:?}"),
        }
    }

    #[test]
    fn exhausted_budget_times_out() {
        let err = render(&order(), &RenderBudget::new(Duration::ZERO)).unwrap_err();
        assert!(matches!(err, RenderError::Timeout { .. }));
    }

    #[test]
    fn file_id_depends_on_reference() {
        let template = template();
        let a = file_id(&template, &metadata());
        let b = file_id(&template, &RenderMetadata::new("TC-2024-000043", metadata().created_at));
        assert_eq!(a.len(), 16);
        assert_ne!(a, b);
    }
}
