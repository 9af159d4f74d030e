//! Page geometry and the millimeter → point boundary.
//!
//! Layout is expressed in millimeters measured from the top-left corner of the
//! label. PDF user space is in points with Y growing upward from the bottom, so
//! every layout quantity crosses into points here and nowhere else.

pub const PT_PER_MM: f32 = 72.0 / 25.4;

pub fn mm_to_pt(mm: f32) -> f32 {
    mm * PT_PER_MM
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageGeometry {
    pub width_mm: f32,
    pub height_mm: f32,
}

impl PageGeometry {
    pub fn new(width_mm: f32, height_mm: f32) -> Self {
        Self { width_mm, height_mm }
    }

    pub fn width_pt(&self) -> f32 {
        mm_to_pt(self.width_mm)
    }

    pub fn height_pt(&self) -> f32 {
        mm_to_pt(self.height_mm)
    }

    pub fn to_render_x(&self, x_mm: f32) -> f32 {
        mm_to_pt(x_mm)
    }

    /// Convert a distance from the top edge (mm) into a bottom-up PDF Y (pt).
    pub fn to_render_y(&self, y_from_top_mm: f32) -> f32 {
        self.height_pt() - mm_to_pt(y_from_top_mm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn top_edge_maps_to_page_height() {
        let g = PageGeometry::new(120.0, 235.0);
        assert!(close(g.to_render_y(0.0), g.height_pt()));
        assert!(close(g.to_render_y(235.0), 0.0));
    }

    #[test]
    fn inch_is_72_points() {
        assert!(close(mm_to_pt(25.4), 72.0));
    }

    #[test]
    fn render_y_decreases_as_layout_y_grows() {
        let g = PageGeometry::new(120.0, 235.0);
        assert!(g.to_render_y(40.0) > g.to_render_y(46.0));
        assert!(close(g.to_render_y(40.0) - g.to_render_y(46.0), mm_to_pt(6.0)));
    }
}
