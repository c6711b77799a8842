//! Millimetre and point geometry.
//!
//! Template boxes are authored in millimetres with a top-left origin, while PDF
//! content streams use points with a bottom-left origin. Conversion between the
//! two lives in `annex9-layout`'s coordinate mapper; this module only holds the
//! plain value types and the unit constant.

use serde::{Deserialize, Serialize};

/// Fixed conversion factor: 72 points per inch, 25.4 millimetres per inch.
pub const POINTS_PER_MM: f32 = 72.0 / 25.4;

#[inline]
pub fn mm_to_pt(mm: f32) -> f32 {
    mm * POINTS_PER_MM
}

#[inline]
pub fn pt_to_mm(pt: f32) -> f32 {
    pt / POINTS_PER_MM
}

/// A rectangle in millimetres, origin at the top-left corner of the page.
///
/// Serialized with the short keys used by template files: `{"x","y","w","h"}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MmRect {
    pub x: f32,
    pub y: f32,
    #[serde(rename = "w")]
    pub width: f32,
    #[serde(rename = "h")]
    pub height: f32,
}

impl MmRect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// True when the two rectangles share a non-empty area. Touching edges do not count.
    pub fn overlaps(&self, other: &MmRect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// Shrinks the rectangle by `inset` on every side. Dimensions never go negative.
    pub fn inset(&self, inset: f32) -> MmRect {
        MmRect {
            x: self.x + inset,
            y: self.y + inset,
            width: (self.width - 2.0 * inset).max(0.0),
            height: (self.height - 2.0 * inset).max(0.0),
        }
    }
}

/// A rectangle in PDF points, origin at the bottom-left corner of the page.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PtRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl PtRect {
    pub fn top(&self) -> f32 {
        self.y + self.height
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}
