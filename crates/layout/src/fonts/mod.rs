//! Font metrics for the fonts a template declares.
//!
//! Every font is addressed through WinAnsi codes: text is encoded once and
//! the same bytes are both measured here and written into the content stream,
//! so what the layout engine measures is exactly what gets drawn.

mod standard14;
mod truetype;
pub mod winansi;

use crate::LayoutError;
use annex9_traits::SharedResourceData;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Width and vertical metrics in 1/1000 em.
#[derive(Debug, Clone)]
pub struct FontMetrics {
    pub ascent: i32,
    pub descent: i32,
    pub cap_height: i32,
    pub italic_angle: f32,
    pub fixed_pitch: bool,
    pub bbox: [i32; 4],
    widths: [u16; 256],
    defined: [bool; 256],
}

impl FontMetrics {
    /// Byte drawn for `c`. Characters the font cannot show become `?`.
    pub fn code_for(&self, c: char) -> u8 {
        match winansi::encode_char(c) {
            Some(code) if self.defined[code as usize] => code,
            _ => winansi::REPLACEMENT,
        }
    }

    pub fn encode(&self, text: &str) -> Vec<u8> {
        text.chars().map(|c| self.code_for(c)).collect()
    }

    pub fn has_code(&self, code: u8) -> bool {
        self.defined[code as usize]
    }

    pub fn code_width(&self, code: u8) -> u16 {
        self.widths[code as usize]
    }

    pub fn char_units(&self, c: char) -> u32 {
        self.code_width(self.code_for(c)) as u32
    }

    /// Advance of `text` in 1/1000 em.
    pub fn text_units(&self, text: &str) -> u32 {
        text.chars().map(|c| self.char_units(c)).sum()
    }

    pub fn text_width(&self, text: &str, size: f32) -> f32 {
        units_to_pt(self.text_units(text), size)
    }

    /// Height from the lowest descender to the highest ascender at `size`.
    pub fn line_extent(&self, size: f32) -> f32 {
        (self.ascent - self.descent) as f32 * size / 1000.0
    }

    pub fn ascent_pt(&self, size: f32) -> f32 {
        self.ascent as f32 * size / 1000.0
    }

    /// `/Widths` entries for `first..=last`.
    pub fn widths(&self, first: u8, last: u8) -> Vec<u16> {
        (first..=last).map(|c| self.widths[c as usize]).collect()
    }
}

pub fn units_to_pt(units: u32, size: f32) -> f32 {
    units as f32 * size / 1000.0
}

/// Where the glyph outlines of a font come from.
#[derive(Debug, Clone)]
pub enum FontProgram {
    /// One of the standard PDF fonts; referenced by name, not embedded.
    Standard { base_font: &'static str },
    /// A TrueType program embedded as `FontFile2`.
    TrueType {
        postscript_name: String,
        data: SharedResourceData,
    },
}

/// A loaded font under the name the template declared it with.
#[derive(Debug, Clone)]
pub struct FontFace {
    pub name: String,
    pub metrics: FontMetrics,
    pub program: FontProgram,
}

impl FontFace {
    pub fn standard(name: &str) -> Result<Self, LayoutError> {
        let m = standard14::lookup(name).ok_or_else(|| LayoutError::UnknownFont(name.to_string()))?;
        let mut defined = [false; 256];
        for code in 0x20..=0xFFu8 {
            defined[code as usize] = winansi::decode(code).is_some();
        }
        Ok(Self {
            name: name.to_string(),
            metrics: FontMetrics {
                ascent: m.ascent,
                descent: m.descent,
                cap_height: m.cap_height,
                italic_angle: m.italic_angle,
                fixed_pitch: m.fixed_pitch,
                bbox: [0, m.descent, 1000, m.ascent],
                widths: m.widths,
                defined,
            },
            program: FontProgram::Standard {
                base_font: m.base_font,
            },
        })
    }

    pub fn truetype(name: &str, data: SharedResourceData) -> Result<Self, LayoutError> {
        let m = truetype::parse(name, &data)?;
        Ok(Self {
            name: name.to_string(),
            metrics: FontMetrics {
                ascent: m.ascent,
                descent: m.descent,
                cap_height: m.cap_height,
                italic_angle: m.italic_angle,
                fixed_pitch: m.fixed_pitch,
                bbox: m.bbox,
                widths: m.widths,
                defined: m.defined,
            },
            program: FontProgram::TrueType {
                postscript_name: m.postscript_name,
                data,
            },
        })
    }

    pub fn is_standard(&self) -> bool {
        matches!(self.program, FontProgram::Standard { .. })
    }
}

/// The fonts of one template, by declared name.
///
/// Built once when the template loads and shared read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct FontLibrary {
    faces: BTreeMap<String, Arc<FontFace>>,
}

impl FontLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names accepted for fonts declared without a file.
    pub fn standard_names() -> &'static [&'static str] {
        &standard14::NAMES
    }

    pub fn register(&mut self, face: FontFace) -> Arc<FontFace> {
        let face = Arc::new(face);
        log::debug!("Registered font '{}' ({})", face.name, program_label(&face.program));
        self.faces.insert(face.name.clone(), face.clone());
        face
    }

    pub fn register_standard(&mut self, name: &str) -> Result<Arc<FontFace>, LayoutError> {
        Ok(self.register(FontFace::standard(name)?))
    }

    pub fn register_truetype(
        &mut self,
        name: &str,
        data: SharedResourceData,
    ) -> Result<Arc<FontFace>, LayoutError> {
        Ok(self.register(FontFace::truetype(name, data)?))
    }

    pub fn get(&self, name: &str) -> Result<&Arc<FontFace>, LayoutError> {
        self.faces
            .get(name)
            .ok_or_else(|| LayoutError::UnknownFont(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.faces.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.faces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }
}

fn program_label(program: &FontProgram) -> &str {
    match program {
        FontProgram::Standard { base_font } => *base_font,
        FontProgram::TrueType {
            postscript_name, ..
        } => postscript_name.as_str(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn measures_in_thousandths_of_an_em() {
        let face = FontFace::standard("Helvetica").unwrap();
        assert_eq!(face.metrics.text_units("MM"), 1666);
        assert!((face.metrics.text_width("MM", 10.0) - 16.66).abs() < 1e-4);
    }

    #[test]
    fn unmappable_characters_measure_as_question_marks() {
        let m = FontFace::standard("Helvetica").unwrap().metrics;
        assert_eq!(m.encode("a\u{0142}é"), vec![b'a', b'?', 0xE9]);
        assert_eq!(m.text_units("\u{0142}"), m.text_units("?"));
    }

    #[test]
    fn extent_covers_ascender_and_descender() {
        let m = FontFace::standard("Helvetica").unwrap().metrics;
        assert!((m.line_extent(10.0) - 9.25).abs() < 1e-4);
        assert!((m.ascent_pt(10.0) - 7.18).abs() < 1e-4);
    }

    #[test]
    fn library_reports_unknown_fonts() {
        let mut lib = FontLibrary::new();
        lib.register_standard("Helvetica-Bold").unwrap();
        assert!(lib.contains("Helvetica-Bold"));
        assert_eq!(lib.len(), 1);
        assert!(matches!(lib.get("Times-Roman"), Err(LayoutError::UnknownFont(_))));
        assert!(matches!(
            lib.register_standard("Comic Sans"),
            Err(LayoutError::UnknownFont(_))
        ));
    }

    #[test]
    fn widths_cover_the_requested_range() {
        let m = FontFace::standard("Courier").unwrap().metrics;
        let w = m.widths(32, 255);
        assert_eq!(w.len(), 224);
        assert_eq!(w[0], 600);
    }
}
