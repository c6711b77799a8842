//! Reading and validating template versions.

use crate::rules::RuleRegistry;
use crate::schema::{Decoration, FieldKind, TemplateDefinition};
use crate::{TemplateError, TemplateVersion};
use annex9_layout::{CoordinateMapper, FontLibrary, LayoutConfig, MAX_FONT_SIZE_PT};
use annex9_pdf_composer::BackgroundPage;
use annex9_traits::{ResourceError, ResourceProvider};
use annex9_types::mm_to_pt;
use std::collections::HashSet;
use std::sync::Arc;

/// Accepted difference between the template page and its background, in points.
const PAGE_SIZE_TOLERANCE_PT: f32 = 1.0;

#[derive(Debug, Clone, Copy, Default)]
pub struct LoadOptions {
    pub layout: LayoutConfig,
    /// Treat overlapping field boxes as an error instead of a warning.
    pub reject_overlapping_fields: bool,
}

/// Loads `<id>.json` definitions and their assets from a resource provider.
#[derive(Debug, Clone)]
pub struct TemplateLoader {
    provider: Arc<dyn ResourceProvider>,
    rules: Arc<RuleRegistry>,
    options: LoadOptions,
}

impl TemplateLoader {
    pub fn new(provider: Arc<dyn ResourceProvider>) -> Self {
        Self {
            provider,
            rules: Arc::new(RuleRegistry::with_builtins()),
            options: LoadOptions::default(),
        }
    }

    pub fn with_rules(mut self, rules: Arc<RuleRegistry>) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_options(mut self, options: LoadOptions) -> Self {
        self.options = options;
        self
    }

    pub fn rules(&self) -> &Arc<RuleRegistry> {
        &self.rules
    }

    pub fn options(&self) -> &LoadOptions {
        &self.options
    }

    pub fn load(&self, id: &str) -> Result<TemplateVersion, TemplateError> {
        if id.is_empty()
            || !id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
            || id.starts_with('.')
        {
            return Err(TemplateError::NotFound(id.to_string()));
        }
        let path = format!("{id}.json");
        let bytes = self.provider.load(&path).map_err(|e| match e {
            ResourceError::NotFound(_) => TemplateError::NotFound(id.to_string()),
            source => TemplateError::Asset {
                version: id.to_string(),
                path: path.clone(),
                source,
            },
        })?;
        let definition: TemplateDefinition =
            serde_json::from_slice(&bytes).map_err(|e| TemplateError::Malformed {
                version: id.to_string(),
                reason: e.to_string(),
            })?;
        if definition.version.as_str() != id {
            return Err(TemplateError::invalid(
                id,
                format!("file declares version '{}'", definition.version),
            ));
        }
        self.from_definition(definition)
    }

    /// Validates a parsed definition and loads the fonts and background it
    /// references.
    pub fn from_definition(
        &self,
        def: TemplateDefinition,
    ) -> Result<TemplateVersion, TemplateError> {
        let version = def.version.to_string();
        let invalid = |reason: String| TemplateError::invalid(version.as_str(), reason);

        self.options
            .layout
            .validate()
            .map_err(|e| invalid(e.to_string()))?;
        let mapper = CoordinateMapper::for_page(&def.page).map_err(|e| invalid(e.to_string()))?;
        let fonts = self.load_fonts(&def)?;

        let check_font = |name: &str, size: f32, owner: &str| {
            if !fonts.contains(name) {
                return Err(invalid(format!("{owner} uses undeclared font '{name}'")));
            }
            if !(size > 0.0 && size <= MAX_FONT_SIZE_PT) {
                return Err(invalid(format!(
                    "{owner} has font size {size}, expected at most {MAX_FONT_SIZE_PT}pt"
                )));
            }
            Ok(())
        };
        check_font(&def.default_font.name, def.default_font.size, "default_font")?;

        let padding = self.options.layout.padding_mm;
        let mut keys = HashSet::new();
        for field in &def.fields {
            let owner = format!("field '{}'", field.key);
            if !keys.insert(field.key.as_str()) {
                return Err(invalid(format!("duplicate field key '{}'", field.key)));
            }
            mapper
                .check(&field.box_mm)
                .map_err(|e| invalid(format!("{owner}: {e}")))?;
            if field.kind.draws_text() {
                let font = field.font_or(&def.default_font);
                check_font(&font.name, font.size, &owner)?;
                if field.box_mm.width <= 2.0 * padding || field.box_mm.height <= 2.0 * padding {
                    return Err(invalid(format!(
                        "{owner}: box {}x{}mm leaves no room inside the {padding}mm padding",
                        field.box_mm.width, field.box_mm.height
                    )));
                }
            }
            if let Some(policy) = field.shrink.resolve(self.options.layout.shrink) {
                policy
                    .validate()
                    .map_err(|e| invalid(format!("{owner}: {e}")))?;
            }
            if let FieldKind::Computed { rule } = &field.kind
                && !self.rules.contains(rule)
            {
                return Err(invalid(format!("{owner} uses unknown rule '{rule}'")));
            }
            if let Some(baseline) = field.baseline_mm
                && !(baseline > 0.0 && baseline <= field.box_mm.height)
            {
                return Err(invalid(format!(
                    "{owner}: baseline_mm {baseline} is outside the box height {}",
                    field.box_mm.height
                )));
            }
        }

        for (i, decoration) in def.decorations.iter().enumerate() {
            let owner = format!("decoration #{i}");
            match decoration {
                Decoration::Text { x_mm, y_mm, font, .. } => {
                    let font = font.as_ref().unwrap_or(&def.default_font);
                    check_font(&font.name, font.size, &owner)?;
                    mapper
                        .map_point(*x_mm, *y_mm)
                        .map_err(|e| invalid(format!("{owner}: {e}")))?;
                }
                Decoration::Line { from_mm, to_mm, width_pt, .. } => {
                    for point in [from_mm, to_mm] {
                        mapper
                            .map_point(point[0], point[1])
                            .map_err(|e| invalid(format!("{owner}: {e}")))?;
                    }
                    if !(*width_pt >= 0.0) {
                        return Err(invalid(format!("{owner}: negative stroke width")));
                    }
                }
                Decoration::Rect { box_mm, width_pt, .. } => {
                    mapper
                        .check(box_mm)
                        .map_err(|e| invalid(format!("{owner}: {e}")))?;
                    if !(*width_pt >= 0.0) {
                        return Err(invalid(format!("{owner}: negative stroke width")));
                    }
                }
            }
        }

        self.check_overlaps(&def)?;
        let background = self.load_background(&def, &mapper)?;

        log::info!(
            "Loaded template '{}' ({} fields, {} fonts, {})",
            version,
            def.fields.len(),
            fonts.len(),
            if background.is_some() { "background PDF" } else { "blank page" }
        );

        Ok(TemplateVersion {
            id: def.version,
            name: def.name,
            description: def.description,
            page: def.page,
            mapper,
            fonts,
            default_font: def.default_font,
            background,
            decorations: def.decorations,
            fields: def.fields,
            layout: self.options.layout,
        })
    }

    fn load_fonts(&self, def: &TemplateDefinition) -> Result<FontLibrary, TemplateError> {
        let version = def.version.as_str();
        let mut fonts = FontLibrary::new();
        for decl in &def.fonts {
            if fonts.contains(&decl.name) {
                return Err(TemplateError::invalid(
                    version,
                    format!("font '{}' is declared twice", decl.name),
                ));
            }
            let loaded = match &decl.path {
                None => fonts.register_standard(&decl.name),
                Some(path) => {
                    let data = self.provider.load(path).map_err(|source| TemplateError::Asset {
                        version: version.to_string(),
                        path: path.clone(),
                        source,
                    })?;
                    fonts.register_truetype(&decl.name, data)
                }
            };
            loaded.map_err(|e| TemplateError::invalid(version, e.to_string()))?;
        }
        Ok(fonts)
    }

    fn check_overlaps(&self, def: &TemplateDefinition) -> Result<(), TemplateError> {
        let boxed: Vec<_> = def
            .fields
            .iter()
            .filter(|f| !matches!(f.kind, FieldKind::StampBlock))
            .collect();
        for (i, a) in boxed.iter().enumerate() {
            for b in &boxed[i + 1..] {
                if !a.box_mm.overlaps(&b.box_mm) {
                    continue;
                }
                if self.options.reject_overlapping_fields {
                    return Err(TemplateError::invalid(
                        def.version.as_str(),
                        format!("fields '{}' and '{}' overlap", a.key, b.key),
                    ));
                }
                log::warn!(
                    "Template '{}': fields '{}' and '{}' overlap; '{}' is drawn on top",
                    def.version,
                    a.key,
                    b.key,
                    b.key
                );
            }
        }
        Ok(())
    }

    fn load_background(
        &self,
        def: &TemplateDefinition,
        mapper: &CoordinateMapper,
    ) -> Result<Option<Arc<BackgroundPage>>, TemplateError> {
        let Some(path) = &def.background else {
            return Ok(None);
        };
        let version = def.version.as_str();
        let bytes = self.provider.load(path).map_err(|source| TemplateError::Asset {
            version: version.to_string(),
            path: path.clone(),
            source,
        })?;
        let page = BackgroundPage::parse(&bytes).map_err(|e| {
            TemplateError::invalid(version, format!("background '{path}': {e}"))
        })?;
        let (width, height) = (mapper.page_width_pt(), mapper.page_height_pt());
        if (page.width_pt() - width).abs() > PAGE_SIZE_TOLERANCE_PT
            || (page.height_pt() - height).abs() > PAGE_SIZE_TOLERANCE_PT
        {
            return Err(TemplateError::invalid(
                version,
                format!(
                    "background '{path}' is {:.1}x{:.1}pt but the page is {:.1}x{:.1}pt ({:.0}x{:.0}mm)",
                    page.width_pt(),
                    page.height_pt(),
                    width,
                    height,
                    width / mm_to_pt(1.0),
                    height / mm_to_pt(1.0),
                ),
            ));
        }
        Ok(Some(Arc::new(page)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use annex9_traits::InMemoryResourceProvider;
    use lopdf::{Document, Object, dictionary};
    use serde_json::{Value, json};

    fn template(fields: Value) -> Value {
        json!({
            "version": "T1",
            "page": { "size": "A4", "orientation": "portrait" },
            "fonts": [{ "name": "Helvetica", "path": null }],
            "fields": fields
        })
    }

    fn text_field(key: &str, x: f32, y: f32) -> Value {
        json!({
            "key": key, "type": "text",
            "box_mm": { "x": x, "y": y, "w": 40, "h": 7 },
            "font": { "name": "Helvetica", "size": 10 }
        })
    }

    fn loader_with(files: &[(&str, Vec<u8>)]) -> TemplateLoader {
        let provider = InMemoryResourceProvider::new();
        for (path, data) in files {
            provider.add(*path, data.clone()).unwrap();
        }
        TemplateLoader::new(Arc::new(provider))
    }

    fn load(def: Value) -> Result<TemplateVersion, TemplateError> {
        loader_with(&[("T1.json", def.to_string().into_bytes())]).load("T1")
    }

    fn one_page_pdf(width: f32, height: f32) -> Vec<u8> {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), Object::Real(width), Object::Real(height)],
        });
        doc.objects.insert(
            pages_id,
            dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
            }
            .into(),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        let mut out = Vec::new();
        doc.save_to(&mut out).unwrap();
        out
    }

    fn reason(err: TemplateError) -> String {
        match err {
            TemplateError::Invalid { reason, .. } | TemplateError::Malformed { reason, .. } => reason,
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn loads_a_valid_template() {
        let version = load(template(json!([
            text_field("client_name", 20.0, 80.0),
            text_field("client_city", 20.0, 90.0),
        ])))
        .unwrap();
        assert_eq!(version.id.as_str(), "T1");
        assert_eq!(version.fields.len(), 2);
        assert_eq!(version.fields[1].key.as_str(), "client_city");
        assert!(version.background.is_none());
        assert!(version.field("client_name").is_some());
    }

    #[test]
    fn unknown_and_unsafe_ids_are_not_found() {
        let loader = loader_with(&[]);
        assert!(matches!(loader.load("Missing"), Err(TemplateError::NotFound(_))));
        assert!(matches!(loader.load("../etc/passwd"), Err(TemplateError::NotFound(_))));
    }

    #[test]
    fn unknown_keys_are_malformed() {
        let mut def = template(json!([text_field("a", 10.0, 10.0)]));
        def["colour"] = json!("red");
        assert!(matches!(load(def), Err(TemplateError::Malformed { .. })));
    }

    #[test]
    fn version_must_match_the_file_name() {
        let mut def = template(json!([]));
        def["version"] = json!("T2");
        assert!(reason(load(def).unwrap_err()).contains("declares version 'T2'"));
    }

    #[test]
    fn duplicate_keys_are_rejected() {
        let def = template(json!([text_field("a", 10.0, 10.0), text_field("a", 10.0, 30.0)]));
        assert!(reason(load(def).unwrap_err()).contains("duplicate field key 'a'"));
    }

    #[test]
    fn boxes_must_lie_inside_the_page() {
        let def = template(json!([text_field("a", 180.0, 10.0)]));
        assert!(reason(load(def).unwrap_err()).contains("field 'a'"));
        let def = template(json!([text_field("b", 10.0, 292.0)]));
        assert!(load(def).is_err());
    }

    #[test]
    fn undeclared_fonts_are_rejected() {
        let mut field = text_field("a", 10.0, 10.0);
        field["font"]["name"] = json!("Times-Roman");
        let err = reason(load(template(json!([field]))).unwrap_err());
        assert!(err.contains("undeclared font 'Times-Roman'"), "{err}");
    }

    #[test]
    fn oversized_fonts_and_fine_shrink_steps_are_rejected() {
        let mut field = text_field("a", 10.0, 10.0);
        field["font"]["size"] = json!(1.0e6);
        let err = reason(load(template(json!([field]))).unwrap_err());
        assert!(err.contains("font size"), "{err}");

        let mut field = text_field("b", 10.0, 10.0);
        field["shrink"] = json!({ "step_pt": 0.001, "min_pt": 0.001 });
        let err = reason(load(template(json!([field]))).unwrap_err());
        assert!(err.contains("field 'b'"), "{err}");
    }

    #[test]
    fn unknown_standard_font_declarations_are_rejected() {
        let mut def = template(json!([]));
        def["fonts"] = json!([{ "name": "Comic Sans", "path": null }]);
        assert!(load(def).is_err());
    }

    #[test]
    fn missing_font_files_are_asset_errors() {
        let mut def = template(json!([]));
        def["fonts"] = json!([{ "name": "Body", "path": "fonts/body.ttf" }]);
        assert!(matches!(load(def), Err(TemplateError::Asset { .. })));
    }

    #[test]
    fn text_boxes_must_exceed_the_padding() {
        let mut field = text_field("tiny", 10.0, 10.0);
        field["box_mm"]["h"] = json!(3.0);
        assert!(reason(load(template(json!([field]))).unwrap_err()).contains("padding"));
    }

    #[test]
    fn computed_fields_need_a_known_rule() {
        let field = json!({
            "key": "ref", "type": "computed", "rule": "lottery_number",
            "box_mm": { "x": 10, "y": 10, "w": 40, "h": 7 }
        });
        assert!(reason(load(template(json!([field]))).unwrap_err()).contains("unknown rule"));
    }

    #[test]
    fn baseline_must_fall_inside_the_box() {
        let mut field = text_field("a", 10.0, 10.0);
        field["baseline_mm"] = json!(9.0);
        assert!(reason(load(template(json!([field]))).unwrap_err()).contains("baseline_mm"));
    }

    #[test]
    fn overlapping_fields_are_rejected_only_on_request() {
        let def = template(json!([
            text_field("a", 10.0, 10.0),
            text_field("b", 20.0, 12.0),
        ]));
        let files = [("T1.json", def.to_string().into_bytes())];
        assert!(loader_with(&files).load("T1").is_ok());

        let strict = loader_with(&files).with_options(LoadOptions {
            reject_overlapping_fields: true,
            ..LoadOptions::default()
        });
        assert!(reason(strict.load("T1").unwrap_err()).contains("overlap"));
    }

    #[test]
    fn stamp_blocks_are_exempt_from_overlap_checks() {
        let stamp = json!({
            "key": "stamp", "type": "stamp_block",
            "box_mm": { "x": 0, "y": 0, "w": 100, "h": 100 }
        });
        let def = template(json!([text_field("a", 10.0, 10.0), stamp]));
        let strict = loader_with(&[("T1.json", def.to_string().into_bytes())]).with_options(
            LoadOptions {
                reject_overlapping_fields: true,
                ..LoadOptions::default()
            },
        );
        assert!(strict.load("T1").is_ok());
    }

    #[test]
    fn background_must_match_the_page_size() {
        let mut def = template(json!([]));
        def["background"] = json!("bg.pdf");

        let a4 = loader_with(&[
            ("T1.json", def.to_string().into_bytes()),
            ("bg.pdf", one_page_pdf(595.28, 841.89)),
        ]);
        assert!(a4.load("T1").unwrap().background.is_some());

        let a5 = loader_with(&[
            ("T1.json", def.to_string().into_bytes()),
            ("bg.pdf", one_page_pdf(419.53, 595.28)),
        ]);
        assert!(reason(a5.load("T1").unwrap_err()).contains("background 'bg.pdf'"));
    }

    #[test]
    fn unreadable_background_is_invalid() {
        let mut def = template(json!([]));
        def["background"] = json!("bg.pdf");
        let loader = loader_with(&[
            ("T1.json", def.to_string().into_bytes()),
            ("bg.pdf", b"not a pdf".to_vec()),
        ]);
        assert!(reason(loader.load("T1").unwrap_err()).contains("unreadable"));
    }
}
