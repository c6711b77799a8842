//! Box fitting: wrap, shrink-to-fit, then clip with an ellipsis.

use super::WIDTH_EPSILON_PT;
use super::wrapper::{BrokenLine, break_lines, unit_limit};
use crate::fonts::{FontFace, FontMetrics, units_to_pt, winansi};
use crate::{LayoutConfig, LayoutError, MAX_FONT_SIZE_PT, RenderBudget, ShrinkPolicy};
use annex9_types::{Align, POINTS_PER_MM};

/// One value to place inside one field box.
#[derive(Debug, Clone)]
pub struct TextRequest<'a> {
    pub text: &'a str,
    pub width_mm: f32,
    pub height_mm: f32,
    pub font: &'a FontFace,
    pub size: f32,
    pub wrap: bool,
    pub align: Align,
    /// `None` disables shrinking.
    pub shrink: Option<ShrinkPolicy>,
    /// Fixed baseline distance from the box top. Bypasses wrapping.
    pub baseline_mm: Option<f32>,
}

/// A positioned line. Offsets are in points from the box's top-left corner.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub text: String,
    pub x: f32,
    pub baseline: f32,
    pub width: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitOutcome {
    /// Placed at the requested size.
    Fits,
    /// Placed at a reduced size.
    Shrunk,
    /// Even the smallest size overflowed; content was cut.
    Clipped,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextLayout {
    pub size: f32,
    pub line_height: f32,
    pub lines: Vec<TextLine>,
    pub outcome: FitOutcome,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TextLayoutEngine {
    config: LayoutConfig,
}

impl TextLayoutEngine {
    pub fn new(config: LayoutConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    pub fn padding_pt(&self) -> f32 {
        self.config.padding_mm * POINTS_PER_MM
    }

    /// Lays out `req`. The result is a pure function of the request and the
    /// configuration.
    pub fn layout(
        &self,
        req: &TextRequest<'_>,
        budget: &RenderBudget,
    ) -> Result<TextLayout, LayoutError> {
        if !(req.size > 0.0 && req.size <= MAX_FONT_SIZE_PT) {
            return Err(LayoutError::InvalidParameter(format!(
                "font size must be in (0, {MAX_FONT_SIZE_PT}], got {}",
                req.size
            )));
        }

        let pad = self.padding_pt();
        let area = Area {
            pad,
            width: req.width_mm * POINTS_PER_MM - 2.0 * pad,
            height: req.height_mm * POINTS_PER_MM - 2.0 * pad,
        };
        if area.width <= 0.0 || area.height <= 0.0 {
            return Err(LayoutError::BoxTooSmall {
                width_pt: req.width_mm * POINTS_PER_MM,
                height_pt: req.height_mm * POINTS_PER_MM,
            });
        }

        let size = req.size;
        let sizes = std::iter::once(size)
            .chain(req.shrink.into_iter().flat_map(move |policy| policy.reductions(size)));

        let single_line = !req.wrap || req.baseline_mm.is_some();
        let text = normalize(req.text, single_line);

        let layout = if single_line {
            self.fit_single_line(req, &text, &area, sizes, budget)?
        } else {
            self.fit_wrapped(req, &text, &area, sizes, budget)?
        };

        if layout.outcome != FitOutcome::Fits {
            log::debug!(
                "{:?} at {}pt (requested {}pt) in {:.1}x{:.1}mm box",
                layout.outcome,
                layout.size,
                req.size,
                req.width_mm,
                req.height_mm
            );
        }
        Ok(layout)
    }

    fn fit_single_line(
        &self,
        req: &TextRequest<'_>,
        text: &str,
        area: &Area,
        sizes: impl Iterator<Item = f32>,
        budget: &RenderBudget,
    ) -> Result<TextLayout, LayoutError> {
        let metrics = &req.font.metrics;
        let units = metrics.text_units(text);

        let mut size = req.size;
        for (i, candidate) in sizes.enumerate() {
            budget.check()?;
            size = candidate;
            let fits_width = units <= unit_limit(area.width, size);
            let fits_height = req.baseline_mm.is_some()
                || metrics.line_extent(size) <= area.height + WIDTH_EPSILON_PT;
            if fits_width && fits_height {
                let outcome = if i == 0 { FitOutcome::Fits } else { FitOutcome::Shrunk };
                let line = BrokenLine {
                    text: text.to_string(),
                    units,
                };
                return Ok(self.place(req, vec![line], size, area, outcome));
            }
        }

        // Nothing fit: settle on the smallest size and cut the line.
        let limit = unit_limit(area.width, size);
        let line = if units <= limit {
            BrokenLine {
                text: text.to_string(),
                units,
            }
        } else {
            ellipsize(text, metrics, limit, budget)?
        };
        Ok(self.place(req, vec![line], size, area, FitOutcome::Clipped))
    }

    fn fit_wrapped(
        &self,
        req: &TextRequest<'_>,
        text: &str,
        area: &Area,
        sizes: impl Iterator<Item = f32>,
        budget: &RenderBudget,
    ) -> Result<TextLayout, LayoutError> {
        let metrics = &req.font.metrics;

        let mut size = req.size;
        for (i, candidate) in sizes.enumerate() {
            budget.check()?;
            size = candidate;
            let lines = break_lines(text, metrics, unit_limit(area.width, size), budget)?;
            if lines.len() <= self.line_capacity(metrics, size, area.height) {
                let outcome = if i == 0 { FitOutcome::Fits } else { FitOutcome::Shrunk };
                return Ok(self.place(req, lines, size, area, outcome));
            }
        }

        let limit = unit_limit(area.width, size);
        let mut lines = break_lines(text, metrics, limit, budget)?;
        let keep = self.line_capacity(metrics, size, area.height).max(1);
        if lines.len() > keep {
            lines.truncate(keep);
            if let Some(last) = lines.pop() {
                lines.push(ellipsize_continuation(&last, metrics, limit, budget)?);
            }
        }
        Ok(self.place(req, lines, size, area, FitOutcome::Clipped))
    }

    /// Number of lines that fit: the first needs the full ascent-to-descent
    /// extent, every following one adds a line height.
    fn line_capacity(&self, metrics: &FontMetrics, size: f32, height: f32) -> usize {
        let extent = metrics.line_extent(size);
        if extent > height + WIDTH_EPSILON_PT {
            return 0;
        }
        let line_height = size * self.config.line_height_factor;
        ((height - extent + WIDTH_EPSILON_PT) / line_height).floor() as usize + 1
    }

    fn place(
        &self,
        req: &TextRequest<'_>,
        lines: Vec<BrokenLine>,
        size: f32,
        area: &Area,
        outcome: FitOutcome,
    ) -> TextLayout {
        let line_height = size * self.config.line_height_factor;
        let first_baseline = match req.baseline_mm {
            Some(baseline) => baseline * POINTS_PER_MM,
            None => area.pad + req.font.metrics.ascent_pt(size),
        };

        let lines = lines
            .into_iter()
            .enumerate()
            .map(|(i, line)| {
                let width = units_to_pt(line.units, size);
                TextLine {
                    x: area.pad + req.align.offset(area.width, width),
                    baseline: first_baseline + i as f32 * line_height,
                    width,
                    text: line.text,
                }
            })
            .collect();

        TextLayout {
            size,
            line_height,
            lines,
            outcome,
        }
    }
}

/// The padded drawing area of a box, in points.
struct Area {
    pad: f32,
    width: f32,
    height: f32,
}

fn normalize(text: &str, single_line: bool) -> String {
    let text = text.replace("\r\n", "\n").replace(['\r', '\t'], " ");
    if single_line {
        text.replace('\n', " ")
    } else {
        text
    }
}

fn ellipsis(metrics: &FontMetrics) -> (&'static str, u32) {
    if metrics.has_code(winansi::ELLIPSIS) {
        ("\u{2026}", metrics.code_width(winansi::ELLIPSIS) as u32)
    } else {
        ("...", metrics.text_units("..."))
    }
}

/// Longest prefix of `text` that still fits with an ellipsis appended.
fn ellipsize(
    text: &str,
    metrics: &FontMetrics,
    limit: u32,
    budget: &RenderBudget,
) -> Result<BrokenLine, LayoutError> {
    let (marker, marker_units) = ellipsis(metrics);
    if marker_units > limit {
        return Ok(BrokenLine {
            text: String::new(),
            units: 0,
        });
    }

    let mut kept = String::new();
    let mut units = 0u32;
    for (i, c) in text.chars().enumerate() {
        if i % 256 == 0 {
            budget.check()?;
        }
        let cu = metrics.char_units(c);
        if units + cu + marker_units > limit {
            break;
        }
        kept.push(c);
        units += cu;
    }

    let trimmed = kept.trim_end();
    let units = metrics.text_units(trimmed) + marker_units;
    Ok(BrokenLine {
        text: format!("{trimmed}{marker}"),
        units,
    })
}

/// Marks the last visible line of a clipped block.
fn ellipsize_continuation(
    line: &BrokenLine,
    metrics: &FontMetrics,
    limit: u32,
    budget: &RenderBudget,
) -> Result<BrokenLine, LayoutError> {
    let (marker, marker_units) = ellipsis(metrics);
    if line.units + marker_units <= limit {
        return Ok(BrokenLine {
            text: format!("{}{marker}", line.text),
            units: line.units + marker_units,
        });
    }
    // The marker has to replace the end of the line.
    ellipsize(&line.text, metrics, limit, budget)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn helvetica() -> FontFace {
        FontFace::standard("Helvetica").unwrap()
    }

    /// Box width in mm whose padded width is exactly `pt`.
    fn box_width_for(pt: f32) -> f32 {
        pt / POINTS_PER_MM + 3.0
    }

    fn request<'a>(font: &'a FontFace, text: &'a str, w: f32, h: f32) -> TextRequest<'a> {
        TextRequest {
            text,
            width_mm: w,
            height_mm: h,
            font,
            size: 10.0,
            wrap: false,
            align: Align::Left,
            shrink: None,
            baseline_mm: None,
        }
    }

    fn engine() -> TextLayoutEngine {
        TextLayoutEngine::default()
    }

    #[test]
    fn exact_width_does_not_wrap_one_point_more_does() {
        let font = helvetica();
        let width = font.metrics.text_width("MM MM", 10.0);

        let mut req = request(&font, "MM MM", box_width_for(width), 30.0);
        req.wrap = true;
        let fit = engine().layout(&req, &RenderBudget::unlimited()).unwrap();
        assert_eq!(fit.lines.len(), 1);
        assert_eq!(fit.outcome, FitOutcome::Fits);

        req.width_mm = box_width_for(width - 1.0);
        let wrapped = engine().layout(&req, &RenderBudget::unlimited()).unwrap();
        assert_eq!(wrapped.lines.len(), 2);
        assert_eq!(wrapped.lines[1].text, "MM");
    }

    #[test]
    fn single_line_shrinks_before_clipping() {
        let font = helvetica();
        let width = font.metrics.text_width("Bruxelles-Capitale", 10.0);
        let mut req = request(&font, "Bruxelles-Capitale", box_width_for(width * 0.9), 7.0);
        req.shrink = Some(ShrinkPolicy::default());

        let fit = engine().layout(&req, &RenderBudget::unlimited()).unwrap();
        assert_eq!(fit.outcome, FitOutcome::Shrunk);
        assert_eq!(fit.size, 9.0);
        assert_eq!(fit.lines[0].text, "Bruxelles-Capitale");
    }

    #[test]
    fn below_the_floor_clips_with_an_ellipsis() {
        let font = helvetica();
        let text = "Jean-Baptiste Léopold Van Der Meulen";
        let mut req = request(&font, text, 30.0, 7.0);
        req.shrink = Some(ShrinkPolicy::default());

        let fit = engine().layout(&req, &RenderBudget::unlimited()).unwrap();
        assert_eq!(fit.outcome, FitOutcome::Clipped);
        assert_eq!(fit.size, 6.0);
        assert_eq!(fit.lines.len(), 1);
        let line = &fit.lines[0];
        assert!(line.text.ends_with('\u{2026}'));
        let padded = 30.0 * POINTS_PER_MM - 2.0 * engine().padding_pt();
        assert!(line.width <= padded + WIDTH_EPSILON_PT);
    }

    #[test]
    fn wrapped_overflow_keeps_what_fits() {
        let font = helvetica();
        let text = "un deux trois quatre cinq six sept huit neuf dix onze douze";
        let mut req = request(&font, text, 30.0, 12.0);
        req.wrap = true;

        let fit = engine().layout(&req, &RenderBudget::unlimited()).unwrap();
        assert_eq!(fit.outcome, FitOutcome::Clipped);
        // 12mm - 3mm padding = 25.5pt: extent 9.25 + one line of 12pt.
        assert_eq!(fit.lines.len(), 2);
        assert!(fit.lines[1].text.ends_with('\u{2026}'));
    }

    #[test]
    fn alignment_moves_the_line_start() {
        let font = helvetica();
        let mut req = request(&font, "42,00", 40.0, 7.0);
        let left = engine().layout(&req, &RenderBudget::unlimited()).unwrap();
        req.align = Align::Right;
        let right = engine().layout(&req, &RenderBudget::unlimited()).unwrap();

        let pad = engine().padding_pt();
        assert!((left.lines[0].x - pad).abs() < 1e-4);
        let padded = 40.0 * POINTS_PER_MM - 2.0 * pad;
        let expected = pad + padded - right.lines[0].width;
        assert!((right.lines[0].x - expected).abs() < 1e-3);
    }

    #[test]
    fn first_baseline_sits_one_ascent_below_the_padding() {
        let font = helvetica();
        let req = request(&font, "Namur", 40.0, 7.0);
        let fit = engine().layout(&req, &RenderBudget::unlimited()).unwrap();
        let expected = engine().padding_pt() + 7.18;
        assert!((fit.lines[0].baseline - expected).abs() < 1e-3);
    }

    #[test]
    fn fixed_baseline_bypasses_wrapping() {
        let font = helvetica();
        let mut req = request(&font, "ligne un\nligne deux", 80.0, 20.0);
        req.wrap = true;
        req.baseline_mm = Some(4.0);
        let fit = engine().layout(&req, &RenderBudget::unlimited()).unwrap();
        assert_eq!(fit.lines.len(), 1);
        assert_eq!(fit.lines[0].text, "ligne un ligne deux");
        assert!((fit.lines[0].baseline - 4.0 * POINTS_PER_MM).abs() < 1e-4);
    }

    #[test]
    fn same_request_same_layout() {
        let font = helvetica();
        let mut req = request(&font, "Rue de la Station 12, 5000 Namur", 35.0, 15.0);
        req.wrap = true;
        req.shrink = Some(ShrinkPolicy::default());
        let a = engine().layout(&req, &RenderBudget::unlimited()).unwrap();
        let b = engine().layout(&req, &RenderBudget::unlimited()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn box_smaller_than_padding_is_an_error() {
        let font = helvetica();
        let req = request(&font, "x", 2.5, 10.0);
        assert!(matches!(
            engine().layout(&req, &RenderBudget::unlimited()),
            Err(LayoutError::BoxTooSmall { .. })
        ));
    }

    #[test]
    fn exhausted_budget_aborts_layout() {
        let font = helvetica();
        let long = "x".repeat(10_000);
        let mut req = request(&font, &long, 50.0, 50.0);
        req.wrap = true;
        let result = engine().layout(&req, &RenderBudget::new(Duration::ZERO));
        assert!(matches!(result, Err(LayoutError::Timeout { .. })));
    }
}
