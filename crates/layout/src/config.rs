use crate::LayoutError;
use serde::{Deserialize, Serialize};

/// Largest font size a template may ask for, in points.
pub const MAX_FONT_SIZE_PT: f32 = 144.0;

/// Finest shrink step accepted, in points.
pub const MIN_SHRINK_STEP_PT: f32 = 0.05;

/// Font-size reduction applied before a value is clipped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ShrinkPolicy {
    /// Decrement between attempts, in points.
    pub step_pt: f32,
    /// Smallest size tried, in points.
    pub min_pt: f32,
}

impl Default for ShrinkPolicy {
    fn default() -> Self {
        Self {
            step_pt: 0.5,
            min_pt: 6.0,
        }
    }
}

impl ShrinkPolicy {
    pub fn validate(&self) -> Result<(), LayoutError> {
        if !(self.step_pt >= MIN_SHRINK_STEP_PT) || !(self.min_pt > 0.0) {
            return Err(LayoutError::InvalidParameter(format!(
                "shrink step must be at least {MIN_SHRINK_STEP_PT}pt and the floor positive \
                 (step {}, min {})",
                self.step_pt, self.min_pt
            )));
        }
        Ok(())
    }

    /// Sizes to try, largest first, starting at `size` itself.
    pub fn candidates(self, size: f32) -> impl Iterator<Item = f32> {
        std::iter::once(size).chain(self.reductions(size))
    }

    /// Sizes below `size` down to the floor, produced on demand.
    ///
    /// Computed by multiplication so that repeated calls give identical values.
    pub fn reductions(self, size: f32) -> impl Iterator<Item = f32> {
        let floor = self.min_pt - 1e-4;
        (1u32..)
            .map(move |k| size - self.step_pt * k as f32)
            .take_while(move |&next| next >= floor)
    }
}

/// Tunables of the text layout engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LayoutConfig {
    /// Inset applied on every side of a field box before layout, in millimetres.
    pub padding_mm: f32,
    /// Distance between consecutive baselines as a multiple of the font size.
    pub line_height_factor: f32,
    /// Policy used by fields that enable shrink-to-fit without their own values.
    pub shrink: ShrinkPolicy,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            padding_mm: 1.5,
            line_height_factor: 1.2,
            shrink: ShrinkPolicy::default(),
        }
    }
}

impl LayoutConfig {
    pub fn validate(&self) -> Result<(), LayoutError> {
        if !(self.padding_mm >= 0.0) {
            return Err(LayoutError::InvalidParameter(format!(
                "padding_mm must not be negative, got {}",
                self.padding_mm
            )));
        }
        if !(self.line_height_factor >= 1.0) {
            return Err(LayoutError::InvalidParameter(format!(
                "line_height_factor must be at least 1.0, got {}",
                self.line_height_factor
            )));
        }
        self.shrink.validate()
    }
}
