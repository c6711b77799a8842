//! Content stream builder for the overlay.

use annex9_types::{Color, PtRect};
use lopdf::content::{Content, Operation};
use lopdf::{Object, StringFormat};

/// Bezier control distance for a quarter circle of radius 1.
const KAPPA: f32 = 0.552_284_8;

/// Operations drawn on top of the background, in drawing order.
///
/// Tracks the fill colour and text font so repeated fields do not emit
/// redundant state changes. The cached state is dropped whenever a graphics
/// state is restored.
pub struct OverlaySurface {
    content: Content,
    state: SurfaceState,
    saved: Vec<SurfaceState>,
}

#[derive(Default, Clone, PartialEq)]
struct SurfaceState {
    fill: Option<Color>,
    stroke: Option<Color>,
    line_width: Option<f32>,
}

impl Default for OverlaySurface {
    fn default() -> Self {
        Self::new()
    }
}

impl OverlaySurface {
    pub fn new() -> Self {
        Self {
            content: Content { operations: vec![] },
            state: SurfaceState::default(),
            saved: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.content.operations.is_empty()
    }

    pub fn operation_count(&self) -> usize {
        self.content.operations.len()
    }

    fn push(&mut self, operator: &str, operands: Vec<Object>) {
        self.content.operations.push(Operation::new(operator, operands));
    }

    pub fn save(&mut self) {
        self.push("q", vec![]);
        self.saved.push(self.state.clone());
    }

    pub fn restore(&mut self) {
        self.push("Q", vec![]);
        self.state = self.saved.pop().unwrap_or_default();
    }

    /// Restricts subsequent drawing to `rect` until the next restore.
    pub fn clip(&mut self, rect: &PtRect) {
        self.push("re", rect_operands(rect));
        self.push("W", vec![]);
        self.push("n", vec![]);
    }

    pub fn set_fill(&mut self, color: Color) {
        if self.state.fill != Some(color) {
            self.push("rg", color_operands(color));
            self.state.fill = Some(color);
        }
    }

    pub fn set_stroke(&mut self, color: Color, width: f32) {
        if self.state.stroke != Some(color) {
            self.push("RG", color_operands(color));
            self.state.stroke = Some(color);
        }
        if self.state.line_width != Some(width) {
            self.push("w", vec![Object::Real(width)]);
            self.state.line_width = Some(width);
        }
    }

    pub fn fill_rect(&mut self, rect: &PtRect) {
        self.push("re", rect_operands(rect));
        self.push("f", vec![]);
    }

    pub fn stroke_rect(&mut self, rect: &PtRect) {
        self.push("re", rect_operands(rect));
        self.push("S", vec![]);
    }

    pub fn fill_stroke_rect(&mut self, rect: &PtRect) {
        self.push("re", rect_operands(rect));
        self.push("B", vec![]);
    }

    pub fn line(&mut self, from: (f32, f32), to: (f32, f32)) {
        self.push("m", vec![Object::Real(from.0), Object::Real(from.1)]);
        self.push("l", vec![Object::Real(to.0), Object::Real(to.1)]);
        self.push("S", vec![]);
    }

    /// A filled disc drawn with four Bezier quarter arcs.
    pub fn fill_circle(&mut self, cx: f32, cy: f32, r: f32) {
        let k = r * KAPPA;
        let real = Object::Real;
        self.push("m", vec![real(cx + r), real(cy)]);
        self.push(
            "c",
            vec![real(cx + r), real(cy + k), real(cx + k), real(cy + r), real(cx), real(cy + r)],
        );
        self.push(
            "c",
            vec![real(cx - k), real(cy + r), real(cx - r), real(cy + k), real(cx - r), real(cy)],
        );
        self.push(
            "c",
            vec![real(cx - r), real(cy - k), real(cx - k), real(cy - r), real(cx), real(cy - r)],
        );
        self.push(
            "c",
            vec![real(cx + k), real(cy - r), real(cx + r), real(cy - k), real(cx + r), real(cy)],
        );
        self.push("f", vec![]);
    }

    /// One text run at an absolute baseline position. `encoded` holds
    /// WinAnsi codes.
    pub fn text(&mut self, font: &str, size: f32, x: f32, y: f32, encoded: Vec<u8>) {
        self.push("BT", vec![]);
        self.push("Tf", vec![Object::Name(font.as_bytes().to_vec()), Object::Real(size)]);
        self.push("Td", vec![Object::Real(x), Object::Real(y)]);
        self.push("Tj", vec![Object::String(encoded, StringFormat::Literal)]);
        self.push("ET", vec![]);
    }

    /// Paints the image XObject `name` into `rect`.
    pub fn image(&mut self, name: &str, rect: &PtRect) {
        self.save();
        self.push(
            "cm",
            vec![
                Object::Real(rect.width),
                Object::Real(0.0),
                Object::Real(0.0),
                Object::Real(rect.height),
                Object::Real(rect.x),
                Object::Real(rect.y),
            ],
        );
        self.push("Do", vec![Object::Name(name.as_bytes().to_vec())]);
        self.restore();
    }

    pub fn encode(&self) -> Result<Vec<u8>, lopdf::Error> {
        self.content.encode()
    }
}

fn rect_operands(rect: &PtRect) -> Vec<Object> {
    vec![
        Object::Real(rect.x),
        Object::Real(rect.y),
        Object::Real(rect.width),
        Object::Real(rect.height),
    ]
}

fn color_operands(color: Color) -> Vec<Object> {
    let (r, g, b) = color.to_unit();
    vec![Object::Real(r), Object::Real(g), Object::Real(b)]
}
