pub mod color;
pub mod geometry;
pub mod ids;
pub mod page;
pub mod text;

pub use color::Color;
pub use geometry::{MmRect, POINTS_PER_MM, PtRect, Size, mm_to_pt, pt_to_mm};
pub use ids::{FieldKey, SnapshotId, TemplateVersionId};
pub use page::{Orientation, PageSize, PageSpec};
pub use text::Align;
