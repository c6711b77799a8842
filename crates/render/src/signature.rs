//! Signature images as PDF image XObjects.

use annex9_pdf_composer::{ComposerError, PageAssembly};
use annex9_types::PtRect;
use image::GenericImageView;
use lopdf::{ObjectId, dictionary};

/// A decoded image split into colour samples and an optional alpha mask.
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    rgb: Vec<u8>,
    alpha: Option<Vec<u8>>,
}

impl DecodedImage {
    pub fn decode(bytes: &[u8]) -> Result<Self, String> {
        let img = image::load_from_memory(bytes).map_err(|e| format!("undecodable image: {e}"))?;
        let (width, height) = img.dimensions();
        if width == 0 || height == 0 {
            return Err("image has no pixels".to_string());
        }
        let rgba = img.to_rgba8();
        let mut rgb = Vec::with_capacity((width * height * 3) as usize);
        let mut alpha = Vec::with_capacity((width * height) as usize);
        for pixel in rgba.pixels() {
            rgb.extend_from_slice(&pixel.0[..3]);
            alpha.push(pixel.0[3]);
        }
        let alpha = alpha.iter().any(|&a| a != u8::MAX).then_some(alpha);
        Ok(Self {
            width,
            height,
            rgb,
            alpha,
        })
    }

    pub fn has_alpha(&self) -> bool {
        self.alpha.is_some()
    }

    /// Adds the image (and its soft mask) to `assembly`.
    pub fn embed(&self, assembly: &mut PageAssembly) -> Result<ObjectId, ComposerError> {
        let mut dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => self.width as i64,
            "Height" => self.height as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
        };
        if let Some(alpha) = &self.alpha {
            let mask = assembly.add_compressed_stream(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => self.width as i64,
                    "Height" => self.height as i64,
                    "ColorSpace" => "DeviceGray",
                    "BitsPerComponent" => 8,
                },
                alpha,
            )?;
            dict.set("SMask", mask);
        }
        assembly.add_compressed_stream(dict, &self.rgb)
    }

    /// Largest rectangle with the image's aspect ratio centred in `area`.
    pub fn fit(&self, area: &PtRect) -> PtRect {
        let scale = (area.width / self.width as f32).min(area.height / self.height as f32);
        let width = self.width as f32 * scale;
        let height = self.height as f32 * scale;
        PtRect {
            x: area.x + (area.width - width) / 2.0,
            y: area.y + (area.height - height) / 2.0,
            width,
            height,
        }
    }
}
