//! Static artwork of templates drawn without a background page.

use crate::field::DrawTarget;
use crate::RenderError;
use annex9_template::{Decoration, TemplateVersion};
use annex9_types::Align;

pub fn draw_decorations(
    template: &TemplateVersion,
    target: &mut DrawTarget<'_>,
) -> Result<(), RenderError> {
    for (index, decoration) in template.decorations.iter().enumerate() {
        draw(template, decoration, target).map_err(|reason| RenderError::Decoration { index, reason })?;
    }
    Ok(())
}

fn draw(
    template: &TemplateVersion,
    decoration: &Decoration,
    target: &mut DrawTarget<'_>,
) -> Result<(), String> {
    let mapper = &template.mapper;
    match decoration {
        Decoration::Text {
            x_mm,
            y_mm,
            text,
            font,
            align,
            color,
        } => {
            let font = font.as_ref().unwrap_or(&template.default_font);
            let face = template.fonts.get(&font.name).map_err(|e| e.to_string())?;
            let (x, y) = mapper.map_point(*x_mm, *y_mm).map_err(|e| e.to_string())?;
            let width = face.metrics.text_width(text, font.size);
            let x = match align {
                Align::Left => x,
                Align::Center => x - width / 2.0,
                Align::Right => x - width,
            };
            let resource = target
                .fonts
                .resource_for(target.assembly, face)
                .map_err(|e| e.to_string())?;
            target.surface.set_fill(color.unwrap_or_default());
            target
                .surface
                .text(&resource, font.size, x, y, face.metrics.encode(text));
        }
        Decoration::Line {
            from_mm,
            to_mm,
            width_pt,
            color,
        } => {
            let from = mapper.map_point(from_mm[0], from_mm[1]).map_err(|e| e.to_string())?;
            let to = mapper.map_point(to_mm[0], to_mm[1]).map_err(|e| e.to_string())?;
            target.surface.set_stroke(color.unwrap_or_default(), *width_pt);
            target.surface.line(from, to);
        }
        Decoration::Rect {
            box_mm,
            fill,
            stroke,
            width_pt,
        } => {
            let rect = mapper.map_rect(box_mm).map_err(|e| e.to_string())?;
            if let Some(fill) = fill {
                target.surface.set_fill(*fill);
            }
            // A rect with neither fill nor stroke is outlined in black.
            if stroke.is_some() || fill.is_none() {
                target
                    .surface
                    .set_stroke(stroke.unwrap_or_default(), *width_pt);
            }
            match (fill, stroke) {
                (Some(_), Some(_)) => target.surface.fill_stroke_rect(&rect),
                (Some(_), None) => target.surface.fill_rect(&rect),
                (None, _) => target.surface.stroke_rect(&rect),
            }
        }
    }
    Ok(())
}
