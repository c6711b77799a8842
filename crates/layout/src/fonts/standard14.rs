//! Built-in metrics for the standard PDF fonts the bundled templates use.
//!
//! Widths are in 1/1000 em, indexed by WinAnsi code from 0x20. Unassigned
//! codes carry 0.

/// Vertical metrics shared by a family, in 1/1000 em.
struct Vertical {
    ascent: i32,
    descent: i32,
    cap_height: i32,
}

const HELVETICA_V: Vertical = Vertical {
    ascent: 718,
    descent: -207,
    cap_height: 718,
};

const COURIER_V: Vertical = Vertical {
    ascent: 629,
    descent: -157,
    cap_height: 562,
};

#[rustfmt::skip]
const HELVETICA: [u16; 224] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, 0,
    556, 0, 222, 556, 333, 1000, 556, 556, 333, 1000, 667, 333, 1000, 0, 611, 0,
    0, 222, 222, 333, 333, 350, 556, 1000, 333, 1000, 500, 333, 944, 0, 500, 667,
    278, 333, 556, 556, 556, 556, 260, 556, 333, 737, 370, 556, 584, 333, 737, 333,
    400, 584, 333, 333, 333, 556, 537, 278, 333, 333, 365, 556, 834, 834, 834, 611,
    667, 667, 667, 667, 667, 667, 1000, 722, 667, 667, 667, 667, 278, 278, 278, 278,
    722, 722, 778, 778, 778, 778, 778, 584, 778, 722, 722, 722, 722, 667, 667, 611,
    556, 556, 556, 556, 556, 556, 889, 500, 556, 556, 556, 556, 278, 278, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 584, 611, 556, 556, 556, 556, 500, 556, 500,
];

#[rustfmt::skip]
const HELVETICA_BOLD: [u16; 224] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584, 0,
    556, 0, 278, 556, 500, 1000, 556, 556, 333, 1000, 667, 333, 1000, 0, 611, 0,
    0, 278, 278, 500, 500, 350, 556, 1000, 333, 1000, 556, 333, 944, 0, 500, 667,
    278, 333, 556, 556, 556, 556, 280, 556, 333, 737, 370, 556, 584, 333, 737, 333,
    400, 584, 333, 333, 333, 611, 556, 278, 333, 333, 365, 556, 834, 834, 834, 611,
    722, 722, 722, 722, 722, 722, 1000, 722, 667, 667, 667, 667, 278, 278, 278, 278,
    722, 722, 778, 778, 778, 778, 778, 584, 778, 722, 722, 722, 722, 667, 667, 611,
    556, 556, 556, 556, 556, 556, 889, 556, 556, 556, 556, 556, 278, 278, 278, 278,
    611, 611, 611, 611, 611, 611, 611, 584, 611, 611, 611, 611, 611, 556, 611, 556,
];

pub(crate) struct StandardMetrics {
    pub base_font: &'static str,
    pub ascent: i32,
    pub descent: i32,
    pub cap_height: i32,
    pub italic_angle: f32,
    pub fixed_pitch: bool,
    pub widths: [u16; 256],
}

pub(crate) const NAMES: [&str; 8] = [
    "Helvetica",
    "Helvetica-Bold",
    "Helvetica-Oblique",
    "Helvetica-BoldOblique",
    "Courier",
    "Courier-Bold",
    "Courier-Oblique",
    "Courier-BoldOblique",
];

/// Metrics of a built-in font, matched on the exact PostScript name.
pub(crate) fn lookup(name: &str) -> Option<StandardMetrics> {
    let base_font = *NAMES.iter().find(|n| **n == name)?;
    let italic_angle = if name.ends_with("Oblique") { -12.0 } else { 0.0 };

    let (v, fixed_pitch, widths) = if name.starts_with("Courier") {
        (COURIER_V, true, monospaced(600))
    } else if name.starts_with("Helvetica-Bold") {
        (HELVETICA_V, false, expand(&HELVETICA_BOLD))
    } else {
        (HELVETICA_V, false, expand(&HELVETICA))
    };

    Some(StandardMetrics {
        base_font,
        ascent: v.ascent,
        descent: v.descent,
        cap_height: v.cap_height,
        italic_angle,
        fixed_pitch,
        widths,
    })
}

fn expand(table: &[u16; 224]) -> [u16; 256] {
    let mut widths = [0u16; 256];
    widths[0x20..].copy_from_slice(table);
    widths
}

fn monospaced(width: u16) -> [u16; 256] {
    let mut widths = [0u16; 256];
    for code in 0x20..=0xFFu8 {
        if super::winansi::decode(code).is_some() {
            widths[code as usize] = width;
        }
    }
    widths
}
