//! Metrics extraction for TrueType fonts named in a template.

use super::winansi;
use crate::LayoutError;

pub(crate) struct TrueTypeMetrics {
    pub postscript_name: String,
    pub ascent: i32,
    pub descent: i32,
    pub cap_height: i32,
    pub italic_angle: f32,
    pub fixed_pitch: bool,
    pub bbox: [i32; 4],
    pub widths: [u16; 256],
    pub defined: [bool; 256],
}

/// Reads the metrics needed to measure and embed `data`.
///
/// Values are rescaled from font units to 1/1000 em; widths are read for
/// every WinAnsi code so measured text and the `/Widths` array agree.
pub(crate) fn parse(name: &str, data: &[u8]) -> Result<TrueTypeMetrics, LayoutError> {
    let face = ttf_parser::Face::parse(data, 0).map_err(|e| LayoutError::InvalidFont {
        name: name.to_string(),
        reason: e.to_string(),
    })?;

    let upem = face.units_per_em() as f32;
    if upem <= 0.0 {
        return Err(LayoutError::InvalidFont {
            name: name.to_string(),
            reason: "units per em is zero".to_string(),
        });
    }
    let scale = |v: f32| (v * 1000.0 / upem).round() as i32;

    let notdef_width = face
        .glyph_hor_advance(ttf_parser::GlyphId(0))
        .map(|w| scale(w as f32).max(0) as u16)
        .unwrap_or(0);

    let mut widths = [0u16; 256];
    let mut defined = [false; 256];
    for code in 0x20..=0xFFu8 {
        let Some(c) = winansi::decode(code) else {
            continue;
        };
        match face.glyph_index(c) {
            Some(gid) => {
                let advance = face.glyph_hor_advance(gid).unwrap_or(0);
                widths[code as usize] = scale(advance as f32).max(0) as u16;
                defined[code as usize] = true;
            }
            None => widths[code as usize] = notdef_width,
        }
    }

    let bb = face.global_bounding_box();
    let ascent = scale(face.ascender() as f32);
    let postscript_name = extract_postscript_name(&face).unwrap_or_else(|| sanitize(name));

    Ok(TrueTypeMetrics {
        postscript_name,
        ascent,
        descent: scale(face.descender() as f32),
        cap_height: face
            .capital_height()
            .map(|h| scale(h as f32))
            .unwrap_or(ascent),
        italic_angle: face.italic_angle(),
        fixed_pitch: face.is_monospaced(),
        bbox: [
            scale(bb.x_min as f32),
            scale(bb.y_min as f32),
            scale(bb.x_max as f32),
            scale(bb.y_max as f32),
        ],
        widths,
        defined,
    })
}

fn extract_postscript_name(face: &ttf_parser::Face<'_>) -> Option<String> {
    face.names()
        .into_iter()
        .filter(|n| n.name_id == ttf_parser::name_id::POST_SCRIPT_NAME)
        .find_map(|n| n.to_string())
        .map(|s| sanitize(&s))
        .filter(|s| !s.is_empty())
}

/// PDF names cannot hold spaces or delimiters.
fn sanitize(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+'))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn garbage_is_rejected_with_the_font_name() {
        let err = parse("Body", b"definitely not a font").err().unwrap();
        assert!(matches!(err, LayoutError::InvalidFont { ref name, .. } if name == "Body"));
    }

    #[test]
    fn sanitize_drops_pdf_delimiters() {
        assert_eq!(sanitize("DejaVu Sans (Bold)"), "DejaVuSansBold");
    }
}
