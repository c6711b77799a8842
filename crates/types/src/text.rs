use serde::{Deserialize, Serialize};

/// Horizontal alignment of a line within its (padded) box.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

impl Align {
    /// Offset of a line of `line_width` inside `available` width.
    pub fn offset(self, available: f32, line_width: f32) -> f32 {
        let free = (available - line_width).max(0.0);
        match self {
            Align::Left => 0.0,
            Align::Center => free / 2.0,
            Align::Right => free,
        }
    }
}
