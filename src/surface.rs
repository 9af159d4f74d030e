use crate::error::Error;

/// An absolute-position drawing target in native PDF coordinates (points,
/// Y up). Glyphs are drawn with the most recently set font and size.
pub trait Surface {
    fn set_font(&mut self, font: &str, size_pt: f32);
    fn draw_glyph(&mut self, x: f32, y: f32, ch: char);
    /// Draw a left-to-right run with its baseline origin at (x, y).
    fn draw_text(&mut self, x: f32, y: f32, text: &str);
    fn save_state(&mut self);
    fn restore_state(&mut self);
    fn translate(&mut self, dx: f32, dy: f32);
    /// Counter-clockwise rotation of the current frame, in degrees.
    fn rotate(&mut self, degrees: f32);
    fn end_page(&mut self);
}

/// Opens and finalizes the artifacts a sequencer draws into.
pub trait Output {
    type Surface: Surface;

    /// `index` is 1-based and increases by one per artifact.
    fn open(&mut self, index: usize) -> Result<Self::Surface, Error>;
    fn finalize(&mut self, index: usize, surface: Self::Surface) -> Result<(), Error>;
}

#[derive(Clone, Debug, PartialEq)]
pub enum DrawOp {
    SetFont { font: String, size: f32 },
    Glyph { x: f32, y: f32, ch: char },
    Text { x: f32, y: f32, text: String },
    Save,
    Restore,
    Translate { dx: f32, dy: f32 },
    Rotate { degrees: f32 },
    EndPage,
}

/// Records every call. Backs `--dry-run` and the test suites.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    pub ops: Vec<DrawOp>,
    depth: usize,
    max_depth: usize,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current save/restore nesting depth.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn page_count(&self) -> usize {
        self.ops.iter().filter(|op| matches!(op, DrawOp::EndPage)).count()
    }

    pub fn glyphs(&self) -> impl Iterator<Item = (f32, f32, char)> + '_ {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Glyph { x, y, ch } => Some((*x, *y, *ch)),
            _ => None,
        })
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> + '_ {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}

impl Surface for RecordingSurface {
    fn set_font(&mut self, font: &str, size_pt: f32) {
        self.ops.push(DrawOp::SetFont {
            font: font.to_string(),
            size: size_pt,
        });
    }

    fn draw_glyph(&mut self, x: f32, y: f32, ch: char) {
        self.ops.push(DrawOp::Glyph { x, y, ch });
    }

    fn draw_text(&mut self, x: f32, y: f32, text: &str) {
        self.ops.push(DrawOp::Text {
            x,
            y,
            text: text.to_string(),
        });
    }

    fn save_state(&mut self) {
        self.depth += 1;
        self.max_depth = self.max_depth.max(self.depth);
        self.ops.push(DrawOp::Save);
    }

    fn restore_state(&mut self) {
        self.depth = self.depth.saturating_sub(1);
        self.ops.push(DrawOp::Restore);
    }

    fn translate(&mut self, dx: f32, dy: f32) {
        self.ops.push(DrawOp::Translate { dx, dy });
    }

    fn rotate(&mut self, degrees: f32) {
        self.ops.push(DrawOp::Rotate { degrees });
    }

    fn end_page(&mut self) {
        self.ops.push(DrawOp::EndPage);
    }
}

/// Keeps finalized recordings in memory instead of writing files.
#[derive(Debug, Default)]
pub struct MemoryOutput {
    pub opened: Vec<usize>,
    pub finalized: Vec<(usize, RecordingSurface)>,
}

impl MemoryOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page_counts(&self) -> Vec<usize> {
        self.finalized.iter().map(|(_, s)| s.page_count()).collect()
    }
}

impl Output for MemoryOutput {
    type Surface = RecordingSurface;

    fn open(&mut self, index: usize) -> Result<RecordingSurface, Error> {
        self.opened.push(index);
        Ok(RecordingSurface::new())
    }

    fn finalize(&mut self, index: usize, surface: RecordingSurface) -> Result<(), Error> {
        self.finalized.push((index, surface));
        Ok(())
    }
}
