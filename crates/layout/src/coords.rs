//! Millimetre to PDF point conversion.
//!
//! Template boxes are measured from the top-left corner of the page, PDF user
//! space starts bottom-left, so every mapping flips the Y axis.

use crate::LayoutError;
use annex9_types::{MmRect, POINTS_PER_MM, PageSpec, PtRect};

/// Slack for boxes that touch the page edge after float round-off.
const EDGE_TOLERANCE_MM: f32 = 1e-3;

/// Bottom-left corner of a box in page units.
///
/// `y_pt = (page_height_mm - y_mm - box_height_mm) * POINTS_PER_MM`.
pub fn to_page_units(
    x_mm: f32,
    y_mm: f32,
    box_height_mm: f32,
    page_height_mm: f32,
) -> Result<(f32, f32), LayoutError> {
    if !x_mm.is_finite() || !y_mm.is_finite() || !box_height_mm.is_finite() {
        return Err(LayoutError::InvalidCoordinates(format!(
            "non-finite value in ({x_mm}, {y_mm}, h={box_height_mm})"
        )));
    }
    if x_mm < 0.0 || y_mm < 0.0 || box_height_mm < 0.0 {
        return Err(LayoutError::InvalidCoordinates(format!(
            "negative value in ({x_mm}, {y_mm}, h={box_height_mm})"
        )));
    }
    if y_mm + box_height_mm > page_height_mm + EDGE_TOLERANCE_MM {
        return Err(LayoutError::InvalidCoordinates(format!(
            "box bottom at {:.2}mm is below the page height of {page_height_mm}mm",
            y_mm + box_height_mm
        )));
    }
    Ok((
        x_mm * POINTS_PER_MM,
        (page_height_mm - y_mm - box_height_mm) * POINTS_PER_MM,
    ))
}

/// Maps boxes of one fixed page size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateMapper {
    page_width_mm: f32,
    page_height_mm: f32,
}

impl CoordinateMapper {
    pub fn new(page_width_mm: f32, page_height_mm: f32) -> Result<Self, LayoutError> {
        if !(page_width_mm > 0.0) || !(page_height_mm > 0.0) {
            return Err(LayoutError::InvalidCoordinates(format!(
                "page size {page_width_mm}x{page_height_mm}mm is not positive"
            )));
        }
        Ok(Self {
            page_width_mm,
            page_height_mm,
        })
    }

    pub fn for_page(page: &PageSpec) -> Result<Self, LayoutError> {
        let (w, h) = page.dimensions_mm();
        Self::new(w, h)
    }

    pub fn page_width_pt(&self) -> f32 {
        self.page_width_mm * POINTS_PER_MM
    }

    pub fn page_height_pt(&self) -> f32 {
        self.page_height_mm * POINTS_PER_MM
    }

    /// Checks that `rect` is non-negative and lies inside the page.
    pub fn check(&self, rect: &MmRect) -> Result<(), LayoutError> {
        if rect.width < 0.0 || rect.height < 0.0 {
            return Err(LayoutError::InvalidCoordinates(format!(
                "box has a negative size {}x{}mm",
                rect.width, rect.height
            )));
        }
        if rect.right() > self.page_width_mm + EDGE_TOLERANCE_MM {
            return Err(LayoutError::InvalidCoordinates(format!(
                "box right edge at {:.2}mm is past the page width of {}mm",
                rect.right(),
                self.page_width_mm
            )));
        }
        to_page_units(rect.x, rect.y, rect.height, self.page_height_mm).map(|_| ())
    }

    pub fn map_rect(&self, rect: &MmRect) -> Result<PtRect, LayoutError> {
        self.check(rect)?;
        let (x, y) = to_page_units(rect.x, rect.y, rect.height, self.page_height_mm)?;
        Ok(PtRect {
            x,
            y,
            width: rect.width * POINTS_PER_MM,
            height: rect.height * POINTS_PER_MM,
        })
    }

    /// Maps a single top-left point, used for rules and labels.
    pub fn map_point(&self, x_mm: f32, y_mm: f32) -> Result<(f32, f32), LayoutError> {
        if x_mm > self.page_width_mm + EDGE_TOLERANCE_MM {
            return Err(LayoutError::InvalidCoordinates(format!(
                "x={x_mm}mm is past the page width of {}mm",
                self.page_width_mm
            )));
        }
        to_page_units(x_mm, y_mm, 0.0, self.page_height_mm)
    }
}
