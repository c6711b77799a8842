use crate::schema::{Decoration, FieldSpec, FontRef};
use annex9_layout::{CoordinateMapper, FontFace, FontLibrary, LayoutConfig, LayoutError};
use annex9_pdf_composer::BackgroundPage;
use annex9_types::{PageSpec, TemplateVersionId};
use std::sync::Arc;

/// A validated, immutable template version.
///
/// Every field box lies inside the page, every referenced font is loaded and
/// every computed rule exists. Renders only read from it, so one instance is
/// shared across worker threads behind an `Arc`.
#[derive(Debug)]
pub struct TemplateVersion {
    pub id: TemplateVersionId,
    pub name: Option<String>,
    pub description: Option<String>,
    pub page: PageSpec,
    pub mapper: CoordinateMapper,
    pub fonts: FontLibrary,
    pub default_font: FontRef,
    /// Parsed once at load; `None` renders on a blank page.
    pub background: Option<Arc<BackgroundPage>>,
    pub decorations: Vec<Decoration>,
    /// In declaration order, which is also the drawing order.
    pub fields: Vec<FieldSpec>,
    pub layout: LayoutConfig,
}

impl TemplateVersion {
    pub fn field(&self, key: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.key.as_str() == key)
    }

    /// Face and size a field is drawn with.
    pub fn font_for<'a>(
        &'a self,
        field: &'a FieldSpec,
    ) -> Result<(&'a Arc<FontFace>, f32), LayoutError> {
        let font = field.font_or(&self.default_font);
        Ok((self.fonts.get(&font.name)?, font.size))
    }
}
