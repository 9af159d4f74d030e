use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use pdf_writer::{Content, Filter, Name, Pdf, Rect, Ref, Str, TextStr};
use subsetter::GlyphRemapper;

use crate::error::Error;
use crate::fonts::{FontProgram, embed_font, encode_as_gids};
use crate::geometry::PageGeometry;
use crate::surface::{Output, Surface};

const FONT_RESOURCE: &[u8] = b"F1";

/// cm operands for a counter-clockwise rotation. Quarter turns come out
/// exact so rotated glyphs do not pick up float noise.
fn rotation_matrix(degrees: f32) -> [f32; 6] {
    let snap = |v: f32| {
        if v.abs() < 1e-6 {
            0.0
        } else if (v.abs() - 1.0).abs() < 1e-6 {
            v.signum()
        } else {
            v
        }
    };
    let rad = degrees.to_radians();
    let (sin, cos) = (snap(rad.sin()), snap(rad.cos()));
    [cos, sin, -sin, cos, 0.0, 0.0]
}

/// One PDF document being drawn. Pages are compressed as they are ended;
/// the font subset is built from the glyphs actually shown.
pub struct PdfSurface<'a> {
    font: &'a FontProgram,
    geometry: PageGeometry,
    content: Content,
    page_dirty: bool,
    pages: Vec<Vec<u8>>,
    font_size: f32,
    remapper: GlyphRemapper,
    used: BTreeMap<char, u16>,
}

impl<'a> PdfSurface<'a> {
    pub fn new(font: &'a FontProgram, geometry: PageGeometry) -> Self {
        let mut remapper = GlyphRemapper::new();
        remapper.remap(0);
        Self {
            font,
            geometry,
            content: Content::new(),
            page_dirty: false,
            pages: Vec::new(),
            font_size: 12.0,
            remapper,
            used: BTreeMap::new(),
        }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn show(&mut self, x: f32, y: f32, text: &str) {
        let bytes = encode_as_gids(text, self.font, &mut self.remapper, &mut self.used);
        self.content.begin_text();
        self.content.set_font(Name(FONT_RESOURCE), self.font_size);
        self.content.next_line(x, y);
        self.content.show(Str(&bytes));
        self.content.end_text();
        self.page_dirty = true;
    }

    /// Assemble the document.
    pub fn finish(mut self) -> Result<Vec<u8>, Error> {
        if self.page_dirty {
            log::debug!("Closing unterminated page before finalizing");
            self.end_page();
        }
        if self.pages.is_empty() {
            return Err(Error::Pdf("document has no pages".into()));
        }

        let mut pdf = Pdf::new();
        let mut next_id = 1i32;
        let mut alloc = || {
            let r = Ref::new(next_id);
            next_id += 1;
            r
        };

        let catalog_id = alloc();
        let pages_id = alloc();
        let info_id = alloc();
        let font_ref = alloc();

        embed_font(&mut pdf, font_ref, self.font, &self.remapper, &self.used, &mut alloc)?;

        let n = self.pages.len();
        let page_ids: Vec<Ref> = (0..n).map(|_| alloc()).collect();
        let content_ids: Vec<Ref> = (0..n).map(|_| alloc()).collect();

        for (i, compressed) in self.pages.iter().enumerate() {
            pdf.stream(content_ids[i], compressed).filter(Filter::FlateDecode);
        }

        pdf.catalog(catalog_id).pages(pages_id);
        pdf.pages(pages_id)
            .kids(page_ids.iter().copied())
            .count(n as i32);
        pdf.document_info(info_id)
            .producer(TextStr(concat!("atena-pdf ", env!("CARGO_PKG_VERSION"))));

        let media_box = Rect::new(0.0, 0.0, self.geometry.width_pt(), self.geometry.height_pt());
        for i in 0..n {
            let mut page = pdf.page(page_ids[i]);
            page.media_box(media_box)
                .parent(pages_id)
                .contents(content_ids[i]);
            page.resources().fonts().pair(Name(FONT_RESOURCE), font_ref);
        }

        Ok(pdf.finish())
    }
}

impl Surface for PdfSurface<'_> {
    /// There is one embedded font per document; only the size changes.
    fn set_font(&mut self, font: &str, size_pt: f32) {
        if font != self.font.name() {
            log::debug!("set_font({font}) mapped to embedded {}", self.font.name());
        }
        self.font_size = size_pt;
    }

    fn draw_glyph(&mut self, x: f32, y: f32, ch: char) {
        let mut buf = [0u8; 4];
        self.show(x, y, ch.encode_utf8(&mut buf));
    }

    fn draw_text(&mut self, x: f32, y: f32, text: &str) {
        self.show(x, y, text);
    }

    fn save_state(&mut self) {
        self.content.save_state();
    }

    fn restore_state(&mut self) {
        self.content.restore_state();
    }

    fn translate(&mut self, dx: f32, dy: f32) {
        self.content.transform([1.0, 0.0, 0.0, 1.0, dx, dy]);
    }

    fn rotate(&mut self, degrees: f32) {
        self.content.transform(rotation_matrix(degrees));
    }

    fn end_page(&mut self) {
        let content = std::mem::replace(&mut self.content, Content::new());
        let raw = content.finish();
        self.pages
            .push(miniz_oxide::deflate::compress_to_vec_zlib(raw.as_slice(), 6));
        self.page_dirty = false;
    }
}

/// Writes each artifact as `<stem>.pdf`, or `<stem>_NNN.pdf` when numbered.
pub struct PdfOutput<'a> {
    dir: PathBuf,
    stem: String,
    numbered: bool,
    font: &'a FontProgram,
    geometry: PageGeometry,
    written: Vec<PathBuf>,
}

impl<'a> PdfOutput<'a> {
    pub fn new(
        dir: &Path,
        stem: &str,
        numbered: bool,
        font: &'a FontProgram,
        geometry: PageGeometry,
    ) -> Result<Self, Error> {
        std::fs::create_dir_all(dir).map_err(Error::io_at(dir))?;
        Ok(Self {
            dir: dir.to_path_buf(),
            stem: stem.to_string(),
            numbered,
            font,
            geometry,
            written: Vec::new(),
        })
    }

    pub fn artifact_path(&self, index: usize) -> PathBuf {
        if self.numbered {
            self.dir.join(format!("{}_{:03}.pdf", self.stem, index))
        } else {
            self.dir.join(format!("{}.pdf", self.stem))
        }
    }

    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

impl<'a> Output for PdfOutput<'a> {
    type Surface = PdfSurface<'a>;

    fn open(&mut self, _index: usize) -> Result<PdfSurface<'a>, Error> {
        Ok(PdfSurface::new(self.font, self.geometry))
    }

    fn finalize(&mut self, index: usize, surface: PdfSurface<'a>) -> Result<(), Error> {
        let t0 = std::time::Instant::now();
        let pages = surface.page_count();
        let bytes = surface.finish()?;
        let path = self.artifact_path(index);
        std::fs::write(&path, &bytes).map_err(Error::io_at(&path))?;
        log::info!(
            "Wrote {} ({} pages, {} bytes, {:.1}ms)",
            path.display(),
            pages,
            bytes.len(),
            t0.elapsed().as_secs_f64() * 1000.0,
        );
        self.written.push(path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quarter_turns_are_exact() {
        assert_eq!(rotation_matrix(90.0), [0.0, 1.0, -1.0, 0.0, 0.0, 0.0]);
        assert_eq!(rotation_matrix(270.0), [0.0, -1.0, 1.0, 0.0, 0.0, 0.0]);
        assert_eq!(rotation_matrix(0.0), [1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);
    }
}
