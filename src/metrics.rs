/// Horizontal advance widths for the font a surface is drawing with.
///
/// Implementations must report the metrics of the font actually embedded at
/// render time; per-glyph centering depends on it.
pub trait GlyphMetrics {
    /// Advance width of `ch` in points at `size_pt`, or `None` when the font
    /// has no glyph for it.
    fn advance_width(&self, ch: char, font: &str, size_pt: f32) -> Option<f32>;
}

/// Every glyph is `em_ratio * size` wide. Used by tests and dry runs.
#[derive(Clone, Copy, Debug)]
pub struct FixedMetrics {
    pub em_ratio: f32,
}

impl FixedMetrics {
    pub fn full_width() -> Self {
        Self { em_ratio: 1.0 }
    }
}

impl GlyphMetrics for FixedMetrics {
    fn advance_width(&self, _ch: char, _font: &str, size_pt: f32) -> Option<f32> {
        Some(self.em_ratio * size_pt)
    }
}
