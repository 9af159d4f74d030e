//! Vertical (tategaki) run rendering on a horizontal-only surface.
//!
//! Each character is placed on its own cell down a column centerline.
//! Ideographs and kana are drawn upright; the symbol subset picked out by
//! [`classify`] is turned inside a saved graphics state so the next glyph
//! starts from an untouched frame.

mod classify;

pub use classify::{CharacterClass, GlyphAdjust, GlyphAdjustments, classify};

use crate::geometry::{PageGeometry, mm_to_pt};
use crate::metrics::GlyphMetrics;
use crate::surface::Surface;

/// Fraction of a leading step a compressed space advances.
pub const SPACE_ADVANCE: f32 = 0.6;
/// Pivot lift for rotated glyphs, in font-size units, so the glyph's visual
/// center rather than its baseline sits on the flow line.
pub const ROTATION_PIVOT_LIFT: f32 = 0.35;

/// One vertical line of text. Positions are millimeters from the top-left.
#[derive(Clone, Debug, PartialEq)]
pub struct Column {
    pub anchor_x: f32,
    pub start_y: f32,
    pub leading: f32,
    pub font_size: f32,
    pub text: String,
    pub compress_spaces: bool,
}

impl Column {
    pub fn new(anchor_x: f32, start_y: f32, leading: f32, font_size: f32, text: impl Into<String>) -> Self {
        Self {
            anchor_x,
            start_y,
            leading,
            font_size,
            text: text.into(),
            compress_spaces: false,
        }
    }

    pub fn compress_spaces(mut self, on: bool) -> Self {
        self.compress_spaces = on;
        self
    }
}

/// Draw `column` top to bottom and return the final cursor Y in points.
///
/// The surface must already have `font` selected at `column.font_size`.
pub fn render_column<S: Surface + ?Sized, M: GlyphMetrics + ?Sized>(
    surface: &mut S,
    geometry: &PageGeometry,
    column: &Column,
    adjustments: &GlyphAdjustments,
    metrics: &M,
    font: &str,
) -> f32 {
    let x = geometry.to_render_x(column.anchor_x);
    let leading = mm_to_pt(column.leading);
    let size = column.font_size;
    let mut y = geometry.to_render_y(column.start_y);

    let mut chars = column.text.chars().peekable();
    while let Some(ch) = chars.next() {
        // CRLF is one break
        if ch == '\r' && chars.peek() == Some(&'\n') {
            continue;
        }
        if ch == '\n' || ch == '\r' {
            y -= leading;
            continue;
        }
        if ch == ' ' && column.compress_spaces {
            y -= leading * SPACE_ADVANCE;
            continue;
        }

        let class = classify(ch);
        if class.is_rotated() {
            draw_rotated(surface, x, y, ch, class, adjustments.get(ch), metrics, font, size);
        } else {
            let w = glyph_width(metrics, ch, font, size);
            surface.draw_glyph(x - w / 2.0, y, ch);
        }
        y -= leading;
    }

    y
}

#[allow(clippy::too_many_arguments)]
fn draw_rotated<S: Surface + ?Sized, M: GlyphMetrics + ?Sized>(
    surface: &mut S,
    x: f32,
    y: f32,
    ch: char,
    class: CharacterClass,
    adj: GlyphAdjust,
    metrics: &M,
    font: &str,
    size: f32,
) {
    let glyph_size = size * adj.scale;
    let w = glyph_width(metrics, ch, font, glyph_size);
    let scaled = glyph_size != size;

    surface.save_state();
    surface.translate(x, y + size * ROTATION_PIVOT_LIFT - size * adj.shift);
    surface.rotate(class.rotation_degrees());
    if scaled {
        surface.set_font(font, glyph_size);
    }
    surface.draw_glyph(-w / 2.0 + adj.dx * size, -glyph_size * 0.5 + adj.dy * size, ch);
    if scaled {
        surface.set_font(font, size);
    }
    surface.restore_state();
}

/// Missing metrics read as zero width; only horizontal centering uses them.
fn glyph_width<M: GlyphMetrics + ?Sized>(metrics: &M, ch: char, font: &str, size: f32) -> f32 {
    metrics.advance_width(ch, font, size).unwrap_or_else(|| {
        log::warn!("No glyph metrics for {ch:?} (U+{:04X}) in {font}; centering skipped", ch as u32);
        0.0
    })
}
