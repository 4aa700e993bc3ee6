//! Text measurement collaborator.
//!
//! Caret placement, list item sizing, and scroll extents need the pixel
//! size of a string, but the widget system owns no font rasterizer. The
//! host supplies a [`TextMeasurer`]; tests and headless hosts use
//! [`FixedMeasure`], a deterministic fixed-advance metric.

use crate::geometry::Size;
use crate::style::FontId;

pub trait TextMeasurer {
    /// Pixel extent of `text` rendered in `font`, single line.
    fn measure(&self, text: &str, font: FontId) -> Size;
}

/// Fixed-advance metrics: every glyph is `advance` wide, every line is
/// `line_height` tall. Good enough for layout math without a font backend.
#[derive(Debug, Clone, Copy)]
pub struct FixedMeasure {
    pub advance: i32,
    pub line_height: i32,
}

impl Default for FixedMeasure {
    fn default() -> Self {
        Self {
            advance: 8,
            line_height: 16,
        }
    }
}

impl TextMeasurer for FixedMeasure {
    fn measure(&self, text: &str, _font: FontId) -> Size {
        let chars = text.chars().count() as i32;
        Size::new(chars * self.advance, self.line_height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_measure_scales_with_chars() {
        let m = FixedMeasure::default();
        assert_eq!(m.measure("", FontId(0)), Size::new(0, 16));
        assert_eq!(m.measure("abcd", FontId(0)), Size::new(32, 16));
    }
}
