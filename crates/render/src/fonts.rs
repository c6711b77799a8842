//! Font dictionaries for the fonts a render actually uses.

use crate::RenderError;
use annex9_layout::{FontFace, FontProgram};
use annex9_pdf_composer::PageAssembly;
use lopdf::{Dictionary, Object, dictionary};
use std::collections::BTreeMap;

const FIRST_CHAR: u8 = 32;
const LAST_CHAR: u8 = 255;

// FontDescriptor /Flags bits.
const FLAG_FIXED_PITCH: i64 = 1 << 0;
const FLAG_NONSYMBOLIC: i64 = 1 << 5;
const FLAG_ITALIC: i64 = 1 << 6;

/// Page font resources, created on first use of each face.
///
/// Resource names are picked so they never collide with names already used
/// by the background page.
#[derive(Debug, Default)]
pub struct FontResources {
    names: BTreeMap<String, String>,
}

impl FontResources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resource name of `face`, embedding it on first use.
    pub fn resource_for(
        &mut self,
        assembly: &mut PageAssembly,
        face: &FontFace,
    ) -> Result<String, RenderError> {
        if let Some(name) = self.names.get(&face.name) {
            return Ok(name.clone());
        }
        let font = match &face.program {
            FontProgram::Standard { base_font } => dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => *base_font,
                "Encoding" => "WinAnsiEncoding",
            },
            FontProgram::TrueType { postscript_name, data } => {
                truetype_font(assembly, face, postscript_name, data)?
            }
        };
        let id = assembly.add_object(font);
        let name = assembly.unique_resource_name("Font", "F");
        assembly.add_resource("Font", &name, id)?;
        log::debug!("Font '{}' registered as /{}", face.name, name);
        self.names.insert(face.name.clone(), name.clone());
        Ok(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

fn truetype_font(
    assembly: &mut PageAssembly,
    face: &FontFace,
    postscript_name: &str,
    data: &[u8],
) -> Result<Dictionary, RenderError> {
    let metrics = &face.metrics;
    let file_id = assembly.add_compressed_stream(
        dictionary! { "Length1" => data.len() as i64 },
        data,
    )?;

    let mut flags = FLAG_NONSYMBOLIC;
    if metrics.fixed_pitch {
        flags |= FLAG_FIXED_PITCH;
    }
    if metrics.italic_angle != 0.0 {
        flags |= FLAG_ITALIC;
    }
    let bbox: Vec<Object> = metrics.bbox.iter().map(|v| Object::Integer(*v as i64)).collect();
    let descriptor_id = assembly.add_object(dictionary! {
        "Type" => "FontDescriptor",
        "FontName" => Object::Name(postscript_name.as_bytes().to_vec()),
        "Flags" => flags,
        "FontBBox" => bbox,
        "ItalicAngle" => Object::Real(metrics.italic_angle),
        "Ascent" => metrics.ascent as i64,
        "Descent" => metrics.descent as i64,
        "CapHeight" => metrics.cap_height as i64,
        "StemV" => 80,
        "FontFile2" => file_id,
    });

    let widths: Vec<Object> = metrics
        .widths(FIRST_CHAR, LAST_CHAR)
        .into_iter()
        .map(|w| Object::Integer(w as i64))
        .collect();
    Ok(dictionary! {
        "Type" => "Font",
        "Subtype" => "TrueType",
        "BaseFont" => Object::Name(postscript_name.as_bytes().to_vec()),
        "FirstChar" => FIRST_CHAR as i64,
        "LastChar" => LAST_CHAR as i64,
        "Widths" => widths,
        "FontDescriptor" => descriptor_id,
        "Encoding" => "WinAnsiEncoding",
    })
}
