//! Builds the single output page: background import, overlay streams,
//! resource registration and final serialization.

use crate::background::{BackgroundPage, inherited};
use crate::copier::ObjectCopier;
use crate::writer::{deflate, format_number, write_document};
use crate::ComposerError;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, dictionary};

/// Page keys understood on import. Anything else (annotations, structure
/// tree links, thumbnails) is left behind.
const HANDLED_PAGE_KEYS: [&[u8]; 8] = [
    b"Type",
    b"Parent",
    b"Contents",
    b"Resources",
    b"MediaBox",
    b"CropBox",
    b"Rotate",
    b"Group",
];

pub struct PageAssembly {
    doc: Document,
    pages_id: ObjectId,
    page_id: ObjectId,
    media_box: [f32; 4],
    crop_box: Option<Object>,
    group: Option<Object>,
    resources: Dictionary,
    contents: Vec<ObjectId>,
    isolated: bool,
}

impl PageAssembly {
    /// An empty page of the given size.
    pub fn blank(width_pt: f32, height_pt: f32) -> Self {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();
        let page_id = doc.new_object_id();
        Self {
            doc,
            pages_id,
            page_id,
            media_box: [0.0, 0.0, width_pt, height_pt],
            crop_box: None,
            group: None,
            resources: Dictionary::new(),
            contents: Vec::new(),
            isolated: false,
        }
    }

    /// Starts from a deep copy of `background`. The source is not modified.
    pub fn from_background(background: &BackgroundPage) -> Result<Self, ComposerError> {
        let mut assembly = Self::blank(background.width_pt(), background.height_pt());
        assembly.media_box = background.media_box();

        let source = background.document();
        let page = source.get_dictionary(background.page_id())?;
        let mut copier = ObjectCopier::new(source, &mut assembly.doc);

        for (key, _) in page.iter() {
            if !HANDLED_PAGE_KEYS.contains(&key.as_slice()) {
                log::debug!(
                    "Dropping background page key /{}",
                    String::from_utf8_lossy(key)
                );
            }
        }

        if let Ok(contents) = page.get(b"Contents") {
            match contents {
                Object::Reference(id) => {
                    let (_, target) = source.dereference(contents)?;
                    match target {
                        Object::Array(items) => {
                            for item in items {
                                let id = item.as_reference()?;
                                assembly.contents.push(copier.copy_object(id)?);
                            }
                        }
                        _ => assembly.contents.push(copier.copy_object(*id)?),
                    }
                }
                Object::Array(items) => {
                    for item in items {
                        assembly.contents.push(copier.copy_object(item.as_reference()?)?);
                    }
                }
                _ => {
                    return Err(ComposerError::InvalidBackground(
                        "/Contents is neither a stream nor an array".to_string(),
                    ));
                }
            }
        }

        if let Some(resources) = inherited(source, background.page_id(), b"Resources")? {
            let (_, resources) = source.dereference(resources)?;
            if let Object::Dictionary(dict) = copier.remap(resources.clone())? {
                assembly.resources = dict;
            }
        }
        if let Some(crop) = inherited(source, background.page_id(), b"CropBox")? {
            assembly.crop_box = Some(copier.remap(crop.clone())?);
        }
        if let Ok(group) = page.get(b"Group") {
            assembly.group = Some(copier.remap(group.clone())?);
        }

        log::debug!(
            "Imported background page: {} content stream(s), {} object(s)",
            assembly.contents.len(),
            assembly.doc.objects.len()
        );
        Ok(assembly)
    }

    pub fn media_box(&self) -> [f32; 4] {
        self.media_box
    }

    pub fn add_object(&mut self, object: impl Into<Object>) -> ObjectId {
        self.doc.add_object(object)
    }

    /// Whether `/Resources/<category>/<name>` exists, inline or indirect.
    pub fn has_resource(&self, category: &str, name: &str) -> bool {
        self.category(category)
            .is_some_and(|dict| dict.has(name.as_bytes()))
    }

    /// First `<prefix><n>` not yet used in `category`, counting from 1.
    pub fn unique_resource_name(&self, category: &str, prefix: &str) -> String {
        (1..)
            .map(|n| format!("{prefix}{n}"))
            .find(|name| !self.has_resource(category, name))
            .unwrap_or_else(|| prefix.to_string())
    }

    /// Registers `id` as `/Resources/<category>/<name>`.
    pub fn add_resource(
        &mut self,
        category: &str,
        name: &str,
        id: ObjectId,
    ) -> Result<(), ComposerError> {
        if self.has_resource(category, name) {
            return Err(ComposerError::DuplicateResource {
                category: category.to_string(),
                name: name.to_string(),
            });
        }
        let mut dict = self.category(category).cloned().unwrap_or_default();
        dict.set(name, Object::Reference(id));
        self.resources.set(category, Object::Dictionary(dict));
        Ok(())
    }

    /// Appends a content stream drawn on top of everything before it.
    ///
    /// On first use the existing background content is wrapped in `q`/`Q`
    /// so its graphics state cannot leak into the overlay. Overlay
    /// coordinates are relative to the lower-left corner of the MediaBox.
    pub fn overlay_content(&mut self, content: &[u8]) -> Result<(), ComposerError> {
        if !self.isolated && !self.contents.is_empty() {
            let open = self.add_stream(b"q\n")?;
            let close = self.add_stream(b"Q\n")?;
            self.contents.insert(0, open);
            self.contents.push(close);
        }
        self.isolated = true;
        let id = match self.origin_shift() {
            Some(shift) => {
                let mut shifted = shift.into_bytes();
                shifted.extend_from_slice(content);
                shifted.extend_from_slice(b"\nQ\n");
                self.add_stream(&shifted)?
            }
            None => self.add_stream(content)?,
        };
        self.contents.push(id);
        Ok(())
    }

    /// `q` plus a translation to the MediaBox origin, when it is not (0, 0).
    fn origin_shift(&self) -> Option<String> {
        let [llx, lly, ..] = self.media_box;
        if llx == 0.0 && lly == 0.0 {
            return None;
        }
        Some(format!(
            "q\n1 0 0 1 {} {} cm\n",
            format_number(llx),
            format_number(lly)
        ))
    }

    /// Adds a flate-compressed stream with extra dictionary entries.
    pub fn add_compressed_stream(
        &mut self,
        mut dict: Dictionary,
        data: &[u8],
    ) -> Result<ObjectId, ComposerError> {
        dict.set("Filter", "FlateDecode");
        Ok(self.doc.add_object(Stream::new(dict, deflate(data)?)))
    }

    fn add_stream(&mut self, data: &[u8]) -> Result<ObjectId, ComposerError> {
        self.add_compressed_stream(Dictionary::new(), data)
    }

    fn category(&self, category: &str) -> Option<&Dictionary> {
        let entry = self.resources.get(category.as_bytes()).ok()?;
        match entry {
            Object::Dictionary(dict) => Some(dict),
            Object::Reference(id) => self.doc.get_dictionary(*id).ok(),
            _ => None,
        }
    }

    /// Writes the finished single-page document.
    pub fn finish(mut self, info: Dictionary, file_id: &[u8]) -> Result<Vec<u8>, ComposerError> {
        let media_box: Vec<Object> = self.media_box.iter().map(|v| Object::Real(*v)).collect();
        let contents: Vec<Object> = self.contents.iter().map(|id| Object::Reference(*id)).collect();

        let mut page = dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => media_box,
            "Resources" => Object::Dictionary(self.resources),
            "Contents" => contents,
        };
        if let Some(crop) = self.crop_box {
            page.set("CropBox", crop);
        }
        if let Some(group) = self.group {
            page.set("Group", group);
        }
        self.doc.objects.insert(self.page_id, Object::Dictionary(page));
        self.doc.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![Object::Reference(self.page_id)],
                "Count" => 1,
            }),
        );

        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        let info_id = self.doc.add_object(info);
        self.doc.trailer.set("Root", catalog_id);
        self.doc.trailer.set("Info", info_id);

        write_document(&self.doc, file_id)
    }
}
