//! Parsing and checking of one-page background documents.

use crate::ComposerError;
use lopdf::{Document, Object, ObjectId};

/// Nesting limit when walking `/Parent` for inherited page attributes.
const MAX_TREE_DEPTH: usize = 64;

/// A parsed, read-only background page.
///
/// Parsed once per template version; every render imports from the same
/// instance without mutating it.
#[derive(Debug, Clone)]
pub struct BackgroundPage {
    doc: Document,
    page_id: ObjectId,
    media_box: [f32; 4],
}

impl BackgroundPage {
    pub fn parse(bytes: &[u8]) -> Result<Self, ComposerError> {
        let doc = Document::load_mem(bytes)
            .map_err(|e| ComposerError::InvalidBackground(format!("unreadable PDF: {e}")))?;
        if doc.is_encrypted() {
            return Err(ComposerError::InvalidBackground(
                "encrypted documents cannot be used as a background".to_string(),
            ));
        }

        let pages = doc.get_pages();
        if pages.len() != 1 {
            return Err(ComposerError::InvalidBackground(format!(
                "expected exactly one page, found {}",
                pages.len()
            )));
        }
        let Some(&page_id) = pages.values().next() else {
            return Err(ComposerError::InvalidBackground("no page".to_string()));
        };

        let media_box = inherited(&doc, page_id, b"MediaBox")?
            .ok_or_else(|| ComposerError::InvalidBackground("page has no /MediaBox".to_string()))
            .and_then(|obj| read_box(&doc, obj))?;

        if let Some(rotate) = inherited(&doc, page_id, b"Rotate")? {
            let (_, rotate) = doc.dereference(rotate)?;
            if rotate.as_i64().unwrap_or(0) % 360 != 0 {
                return Err(ComposerError::InvalidBackground(
                    "rotated pages are not supported".to_string(),
                ));
            }
        }

        Ok(Self {
            doc,
            page_id,
            media_box,
        })
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn page_id(&self) -> ObjectId {
        self.page_id
    }

    /// `[llx lly urx ury]` in points.
    pub fn media_box(&self) -> [f32; 4] {
        self.media_box
    }

    pub fn width_pt(&self) -> f32 {
        self.media_box[2] - self.media_box[0]
    }

    pub fn height_pt(&self) -> f32 {
        self.media_box[3] - self.media_box[1]
    }
}

/// Looks `key` up on the page, then on its ancestors.
pub(crate) fn inherited<'a>(
    doc: &'a Document,
    page_id: ObjectId,
    key: &[u8],
) -> Result<Option<&'a Object>, ComposerError> {
    let mut node = doc.get_dictionary(page_id)?;
    for _ in 0..MAX_TREE_DEPTH {
        if let Ok(value) = node.get(key) {
            return Ok(Some(value));
        }
        match node.get(b"Parent").and_then(Object::as_reference) {
            Ok(parent) => node = doc.get_dictionary(parent)?,
            Err(_) => return Ok(None),
        }
    }
    Err(ComposerError::InvalidBackground(
        "page tree is too deep or cyclic".to_string(),
    ))
}

fn read_box(doc: &Document, obj: &Object) -> Result<[f32; 4], ComposerError> {
    let (_, obj) = doc.dereference(obj)?;
    let items = obj.as_array()?;
    if items.len() != 4 {
        return Err(ComposerError::InvalidBackground(format!(
            "/MediaBox has {} entries",
            items.len()
        )));
    }
    let mut out = [0.0f32; 4];
    for (slot, item) in out.iter_mut().zip(items) {
        *slot = doc.dereference(item)?.1.as_float()?;
    }
    // Normalise corner order.
    Ok([
        out[0].min(out[2]),
        out[1].min(out[3]),
        out[0].max(out[2]),
        out[1].max(out[3]),
    ])
}
