//! Drawing one resolved field into its box.

use crate::fonts::FontResources;
use crate::signature::DecodedImage;
use crate::surface::OverlaySurface;
use crate::RenderError;
use annex9_layout::{FitOutcome, FontFace, RenderBudget, TextLayout, TextLayoutEngine, TextRequest};
use annex9_pdf_composer::PageAssembly;
use annex9_template::{ChoiceOption, FieldKind, FieldSpec, ResolvedField, ResolvedValue, TemplateVersion};
use annex9_types::{Align, Color, PtRect, mm_to_pt};

/// Inset between a signature block's border and the image.
const SIGNATURE_PADDING_MM: f32 = 2.0;
const CHOICE_SEPARATOR: &str = " / ";

/// Everything a field draws into during one render.
pub struct DrawTarget<'a> {
    pub assembly: &'a mut PageAssembly,
    pub surface: &'a mut OverlaySurface,
    pub fonts: &'a mut FontResources,
    pub budget: &'a RenderBudget,
}

/// Draws the fields of one template version.
pub struct FieldRenderer<'t> {
    template: &'t TemplateVersion,
    engine: TextLayoutEngine,
}

impl<'t> FieldRenderer<'t> {
    pub fn new(template: &'t TemplateVersion) -> Self {
        Self {
            template,
            engine: TextLayoutEngine::new(template.layout),
        }
    }

    pub fn render(&self, field: &ResolvedField<'_>, target: &mut DrawTarget<'_>) -> Result<(), RenderError> {
        let spec = field.spec;
        let key = spec.key.as_str();
        target
            .budget
            .check()
            .map_err(|e| RenderError::for_field(key, e))?;

        match (&spec.kind, &field.value) {
            (FieldKind::StampBlock, _) => Ok(()),
            (_, ResolvedValue::Blank) => Ok(()),
            (FieldKind::Checkbox { .. }, ResolvedValue::Checked(checked)) => {
                if *checked {
                    self.draw_mark(spec, target)?;
                }
                Ok(())
            }
            (FieldKind::Choice { options }, ResolvedValue::Choice { selected }) => {
                self.draw_choice(spec, options, *selected, target)
            }
            (FieldKind::SignatureBlock, ResolvedValue::Image(bytes)) => {
                self.draw_signature(spec, bytes, target)
            }
            (kind, ResolvedValue::Text(text)) if kind.draws_text() => {
                self.draw_text(spec, text, target).map(|_| ())
            }
            (kind, value) => Err(RenderError::field(
                key,
                format!("{:?} field cannot draw {}", kind.field_type(), describe(value)),
            )),
        }
    }

    fn box_rect(&self, spec: &FieldSpec) -> Result<PtRect, RenderError> {
        self.template
            .mapper
            .map_rect(&spec.box_mm)
            .map_err(|e| RenderError::for_field(spec.key.as_str(), e))
    }

    fn layout(
        &self,
        spec: &FieldSpec,
        face: &FontFace,
        size: f32,
        text: &str,
        budget: &RenderBudget,
    ) -> Result<TextLayout, RenderError> {
        let request = TextRequest {
            text,
            width_mm: spec.box_mm.width,
            height_mm: spec.box_mm.height,
            font: face,
            size,
            wrap: spec.wrap,
            align: spec.align,
            shrink: spec.shrink.resolve(self.template.layout.shrink),
            baseline_mm: spec.baseline_mm,
        };
        let layout = self
            .engine
            .layout(&request, budget)
            .map_err(|e| RenderError::for_field(spec.key.as_str(), e))?;
        if layout.outcome == FitOutcome::Clipped {
            log::debug!("Field '{}' clipped at {}pt", spec.key, layout.size);
        }
        Ok(layout)
    }

    /// Lays out and draws `text`, clipped to the field box.
    fn draw_text(
        &self,
        spec: &FieldSpec,
        text: &str,
        target: &mut DrawTarget<'_>,
    ) -> Result<(PtRect, TextLayout), RenderError> {
        let key = spec.key.as_str();
        let rect = self.box_rect(spec)?;
        let (face, size) = self
            .template
            .font_for(spec)
            .map_err(|e| RenderError::for_field(key, e))?;
        let layout = self.layout(spec, face, size, text, target.budget)?;
        let font = target.fonts.resource_for(target.assembly, face)?;

        target.surface.save();
        target.surface.clip(&rect);
        target.surface.set_fill(Color::gray(0));
        for line in layout.lines.iter().filter(|l| !l.text.is_empty()) {
            target.surface.text(
                &font,
                layout.size,
                rect.x + line.x,
                rect.top() - line.baseline,
                face.metrics.encode(&line.text),
            );
        }
        target.surface.restore();
        Ok((rect, layout))
    }

    fn draw_mark(&self, spec: &FieldSpec, target: &mut DrawTarget<'_>) -> Result<(), RenderError> {
        let rect = self.box_rect(spec)?;
        let radius = rect.width.min(rect.height) / 3.0;
        let cx = match spec.align {
            Align::Left => rect.x + radius,
            Align::Center => rect.x + rect.width / 2.0,
            Align::Right => rect.x + rect.width - radius,
        };
        target.surface.set_fill(Color::gray(0));
        target
            .surface
            .fill_circle(cx, rect.y + rect.height / 2.0, radius);
        Ok(())
    }

    /// Writes every option inline and strikes through those not selected.
    fn draw_choice(
        &self,
        spec: &FieldSpec,
        options: &[ChoiceOption],
        selected: Option<usize>,
        target: &mut DrawTarget<'_>,
    ) -> Result<(), RenderError> {
        let labels: Vec<&str> = options.iter().map(ChoiceOption::label).collect();
        let (rect, layout) = self.draw_text(spec, &labels.join(CHOICE_SEPARATOR), target)?;
        let (Some(selected), Some(line)) = (selected, layout.lines.first()) else {
            return Ok(());
        };

        let (face, _) = self
            .template
            .font_for(spec)
            .map_err(|e| RenderError::for_field(spec.key.as_str(), e))?;
        let metrics = &face.metrics;
        let size = layout.size;
        let y = rect.top() - line.baseline + metrics.cap_height as f32 * size / 2000.0;

        target.surface.save();
        target.surface.clip(&rect);
        target.surface.set_stroke(Color::gray(0), (size / 15.0).max(0.5));
        let mut x = rect.x + line.x;
        for (i, label) in labels.iter().enumerate() {
            let width = metrics.text_width(label, size);
            if i != selected {
                target.surface.line((x, y), (x + width, y));
            }
            x += width + metrics.text_width(CHOICE_SEPARATOR, size);
        }
        target.surface.restore();
        Ok(())
    }

    fn draw_signature(
        &self,
        spec: &FieldSpec,
        bytes: &[u8],
        target: &mut DrawTarget<'_>,
    ) -> Result<(), RenderError> {
        let key = spec.key.as_str();
        let rect = self.box_rect(spec)?;
        let image = DecodedImage::decode(bytes).map_err(|reason| RenderError::field(key, reason))?;
        target
            .budget
            .check()
            .map_err(|e| RenderError::for_field(key, e))?;

        let pad = mm_to_pt(SIGNATURE_PADDING_MM);
        let area = if rect.width > 2.0 * pad && rect.height > 2.0 * pad {
            PtRect {
                x: rect.x + pad,
                y: rect.y + pad,
                width: rect.width - 2.0 * pad,
                height: rect.height - 2.0 * pad,
            }
        } else {
            rect
        };

        let id = image.embed(target.assembly)?;
        let name = target.assembly.unique_resource_name("XObject", "Im");
        target.assembly.add_resource("XObject", &name, id)?;
        target.surface.image(&name, &image.fit(&area));
        log::debug!(
            "Signature '{}' placed as /{} ({}x{}px)",
            key,
            name,
            image.width,
            image.height
        );
        Ok(())
    }
}

fn describe(value: &ResolvedValue) -> &'static str {
    match value {
        ResolvedValue::Blank => "a blank value",
        ResolvedValue::Text(_) => "text",
        ResolvedValue::Checked(_) => "a check mark",
        ResolvedValue::Choice { .. } => "a choice",
        ResolvedValue::Image(_) => "an image",
    }
}
