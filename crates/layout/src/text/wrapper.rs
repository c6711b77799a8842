use super::WIDTH_EPSILON_PT;
use crate::fonts::FontMetrics;
use crate::{LayoutError, RenderBudget};

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct BrokenLine {
    pub text: String,
    pub units: u32,
}

/// Largest advance, in 1/1000 em, that fits `available_pt` at `size`.
pub(crate) fn unit_limit(available_pt: f32, size: f32) -> u32 {
    ((available_pt + WIDTH_EPSILON_PT) * 1000.0 / size).floor().max(0.0) as u32
}

/// Greedy word wrap.
///
/// Lines break at spaces; `\n` starts a new line and an empty paragraph
/// yields an empty line. A word wider than the limit is split between
/// characters. Runs of whitespace collapse to one space.
pub(crate) fn break_lines(
    text: &str,
    metrics: &FontMetrics,
    limit: u32,
    budget: &RenderBudget,
) -> Result<Vec<BrokenLine>, LayoutError> {
    let space = metrics.char_units(' ');
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut current = String::new();
        let mut current_units = 0u32;
        let mut produced = false;

        for word in paragraph.split_whitespace() {
            budget.check()?;
            let word_units = metrics.text_units(word);

            if current.is_empty() {
                if word_units <= limit {
                    current.push_str(word);
                    current_units = word_units;
                    continue;
                }
            } else {
                let joined = current_units + space + word_units;
                if joined <= limit {
                    current.push(' ');
                    current.push_str(word);
                    current_units = joined;
                    continue;
                }
                lines.push(flush(&mut current, &mut current_units));
                produced = true;
                if word_units <= limit {
                    current.push_str(word);
                    current_units = word_units;
                    continue;
                }
            }

            // Over-long word, `current` is empty here.
            for c in word.chars() {
                let cu = metrics.char_units(c);
                if !current.is_empty() && current_units + cu > limit {
                    lines.push(flush(&mut current, &mut current_units));
                    produced = true;
                }
                current.push(c);
                current_units += cu;
            }
        }

        if !current.is_empty() || !produced {
            lines.push(flush(&mut current, &mut current_units));
        }
    }

    Ok(lines)
}

fn flush(current: &mut String, units: &mut u32) -> BrokenLine {
    let line = BrokenLine {
        text: std::mem::take(current),
        units: *units,
    };
    *units = 0;
    line
}
