use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use memmap2::Mmap;
use pdf_writer::{Filter, Name, Pdf, Rect, Ref, Str};
use subsetter::GlyphRemapper;
use ttf_parser::{Face, Tag};

use crate::error::Error;
use crate::metrics::GlyphMetrics;

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct GlyphInfo {
    pub(crate) gid: u16,
    pub(crate) width_1000: f32,
}

/// A font file loaded for both measuring and embedding.
pub struct FontProgram {
    name: String,
    data: Vec<u8>,
    face_index: u32,
    units_per_em: f32,
    is_cff: bool,
    glyphs: RefCell<HashMap<char, Option<GlyphInfo>>>,
}

impl std::fmt::Debug for FontProgram {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontProgram")
            .field("name", &self.name)
            .field("face_index", &self.face_index)
            .field("bytes", &self.data.len())
            .field("is_cff", &self.is_cff)
            .finish()
    }
}

impl FontProgram {
    pub fn from_bytes(data: Vec<u8>, face_index: u32) -> Result<Self, Error> {
        let face = Face::parse(&data, face_index)
            .map_err(|e| Error::Font(format!("cannot parse face #{face_index}: {e}")))?;
        let name = postscript_name(&face)
            .or_else(|| family_names(&face).into_iter().next())
            .unwrap_or_else(|| "LabelFont".to_string());
        let units_per_em = face.units_per_em() as f32;
        let is_cff = face.raw_face().table(Tag::from_bytes(b"CFF ")).is_some();
        Ok(Self {
            name,
            data,
            face_index,
            units_per_em,
            is_cff,
            glyphs: RefCell::new(HashMap::new()),
        })
    }

    pub fn load(path: &Path, face_index: u32) -> Result<Self, Error> {
        let data = std::fs::read(path).map_err(Error::io_at(path))?;
        let program = Self::from_bytes(data, face_index)?;
        log::info!("Using font {} from {}", program.name, path.display());
        Ok(program)
    }

    /// Resolve a `;`-separated list of family names, or a path to a font file,
    /// to the first font that can be loaded.
    pub fn discover(spec: &str) -> Result<Self, Error> {
        let as_path = Path::new(spec.trim());
        if is_font_file(as_path) && as_path.is_file() {
            return Self::load(as_path, 0);
        }
        let index = scan_font_dirs();
        for candidate in spec.split(';').map(str::trim).filter(|c| !c.is_empty()) {
            if let Some((path, face_index)) = index.get(&candidate.to_lowercase()) {
                match Self::load(path, *face_index) {
                    Ok(program) => return Ok(program),
                    Err(e) => log::warn!("Skipping font {candidate}: {e}"),
                }
            }
        }
        Err(Error::Font(format!(
            "none of the fonts [{spec}] were found; install a Japanese font, pass --font <PATH>, or add its directory to ATENA_FONTS"
        )))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn face(&self) -> Result<Face<'_>, Error> {
        Face::parse(&self.data, self.face_index).map_err(|e| Error::Font(format!("{}: {e}", self.name)))
    }

    pub(crate) fn glyph(&self, ch: char) -> Option<GlyphInfo> {
        if let Some(info) = self.glyphs.borrow().get(&ch) {
            return *info;
        }
        let info = self.face().ok().and_then(|face| {
            let gid = face.glyph_index(ch)?;
            let advance = face.glyph_hor_advance(gid).unwrap_or(0);
            Some(GlyphInfo {
                gid: gid.0,
                width_1000: advance as f32 / self.units_per_em * 1000.0,
            })
        });
        self.glyphs.borrow_mut().insert(ch, info);
        info
    }
}

impl GlyphMetrics for FontProgram {
    fn advance_width(&self, ch: char, _font: &str, size_pt: f32) -> Option<f32> {
        self.glyph(ch).map(|g| g.width_1000 * size_pt / 1000.0)
    }
}

fn postscript_name(face: &Face) -> Option<String> {
    face.names()
        .into_iter()
        .filter(|name| name.name_id == ttf_parser::name_id::POST_SCRIPT_NAME)
        .find_map(|name| name.to_string())
        .map(|s| s.replace(' ', ""))
}

/// Every family name the face advertises. CJK fonts usually carry both a
/// Latin and a Japanese family name; either should resolve.
fn family_names(face: &Face) -> Vec<String> {
    let mut names = Vec::new();
    for name in face.names() {
        let is_family = name.name_id == ttf_parser::name_id::FAMILY
            || name.name_id == ttf_parser::name_id::TYPOGRAPHIC_FAMILY;
        if is_family
            && name.is_unicode()
            && let Some(s) = name.to_string()
            && !names.contains(&s)
        {
            names.push(s);
        }
    }
    names
}

fn font_directories() -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = Vec::new();

    if let Ok(val) = std::env::var("ATENA_FONTS") {
        let sep = if cfg!(windows) { ';' } else { ':' };
        for part in val.split(sep) {
            let trimmed = part.trim();
            if !trimmed.is_empty() {
                dirs.push(PathBuf::from(trimmed));
            }
        }
    }

    #[cfg(target_os = "macos")]
    {
        dirs.extend([
            "/Library/Fonts".into(),
            "/System/Library/Fonts".into(),
            "/System/Library/Fonts/Supplemental".into(),
            "/System/Library/AssetsV2".into(),
        ]);
        if let Ok(home) = std::env::var("HOME") {
            dirs.push(PathBuf::from(home).join("Library/Fonts"));
        }
    }

    #[cfg(target_os = "linux")]
    {
        dirs.extend(["/usr/share/fonts".into(), "/usr/local/share/fonts".into()]);
        if let Ok(home) = std::env::var("HOME") {
            dirs.push(PathBuf::from(&home).join(".local/share/fonts"));
            dirs.push(PathBuf::from(home).join(".fonts"));
        }
    }

    #[cfg(target_os = "windows")]
    {
        if let Ok(windir) = std::env::var("WINDIR") {
            dirs.push(PathBuf::from(windir).join("Fonts"));
        } else {
            dirs.push("C:\\Windows\\Fonts".into());
        }
        if let Ok(local) = std::env::var("LOCALAPPDATA") {
            dirs.push(PathBuf::from(local).join("Microsoft\\Windows\\Fonts"));
        }
    }

    dirs
}

fn is_font_file(path: &Path) -> bool {
    matches!(
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref(),
        Some("ttf" | "otf" | "ttc" | "otc")
    )
}

fn is_font_collection(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("ttc") || e.eq_ignore_ascii_case("otc"))
}

/// lowercase family name -> (file, face index). First match wins.
fn scan_font_dirs() -> HashMap<String, (PathBuf, u32)> {
    let t0 = std::time::Instant::now();
    let mut index = HashMap::new();
    let mut files_scanned = 0u32;
    let mut visited = std::collections::HashSet::new();

    let mut stack = font_directories();
    stack.reverse();
    while let Some(dir) = stack.pop() {
        if !visited.insert(dir.clone()) {
            continue;
        }
        let Ok(entries) = std::fs::read_dir(&dir) else {
            continue;
        };
        let mut paths: Vec<PathBuf> = entries.flatten().map(|e| e.path()).collect();
        paths.sort();
        for path in paths {
            if path.is_dir() {
                stack.push(path);
                continue;
            }
            if !is_font_file(&path) {
                continue;
            }
            files_scanned += 1;
            let Ok(file) = std::fs::File::open(&path) else {
                continue;
            };
            let Ok(data) = (unsafe { Mmap::map(&file) }) else {
                continue;
            };
            let face_count = if is_font_collection(&path) {
                ttf_parser::fonts_in_collection(&data).unwrap_or(1)
            } else {
                1
            };
            for face_idx in 0..face_count {
                let Ok(face) = Face::parse(&data, face_idx) else {
                    continue;
                };
                if face.is_bold() || face.is_italic() {
                    continue;
                }
                for family in family_names(&face) {
                    index
                        .entry(family.to_lowercase())
                        .or_insert_with(|| (path.clone(), face_idx));
                }
            }
        }
    }

    log::info!(
        "Font scan: {:.1}ms, {} files parsed → {} families",
        t0.elapsed().as_secs_f64() * 1000.0,
        files_scanned,
        index.len(),
    );

    index
}

/// Encode `text` as big-endian 2-byte glyph IDs, remapped for the subset.
/// Characters the font lacks are recorded as .notdef.
pub(crate) fn encode_as_gids(
    text: &str,
    font: &FontProgram,
    remapper: &mut GlyphRemapper,
    used: &mut BTreeMap<char, u16>,
) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len() * 2);
    for ch in text.chars() {
        let gid = match font.glyph(ch) {
            Some(info) => {
                let new_gid = remapper.remap(info.gid);
                used.insert(ch, new_gid);
                new_gid
            }
            None => {
                log::warn!("Font {} has no glyph for {ch:?}", font.name());
                0
            }
        };
        out.extend_from_slice(&gid.to_be_bytes());
    }
    out
}

fn identity_system_info() -> pdf_writer::types::SystemInfo<'static> {
    pdf_writer::types::SystemInfo {
        registry: Str(b"Adobe"),
        ordering: Str(b"Identity"),
        supplement: 0,
    }
}

/// Embed the subset of `font` touched through `remapper` as a Type0 font
/// with Identity-H encoding. TrueType outlines become CIDFontType2 with
/// FontFile2; CFF outlines become CIDFontType0 with an OpenType FontFile3.
pub(crate) fn embed_font(
    pdf: &mut Pdf,
    font_ref: Ref,
    font: &FontProgram,
    remapper: &GlyphRemapper,
    used: &BTreeMap<char, u16>,
    alloc: &mut impl FnMut() -> Ref,
) -> Result<(), Error> {
    let face = font.face()?;
    let units = font.units_per_em;
    let ascent = face.ascender() as f32 / units * 1000.0;
    let descent = face.descender() as f32 / units * 1000.0;
    let cap_height = face
        .capital_height()
        .map(|h| h as f32 / units * 1000.0)
        .unwrap_or(700.0);
    let bb = face.global_bounding_box();
    let bbox = Rect::new(
        bb.x_min as f32 / units * 1000.0,
        bb.y_min as f32 / units * 1000.0,
        bb.x_max as f32 / units * 1000.0,
        bb.y_max as f32 / units * 1000.0,
    );

    // Content streams already reference remapped IDs, so the full font is
    // not an acceptable fallback here.
    let subset = subsetter::subset(&font.data, font.face_index, remapper)
        .map_err(|e| Error::Font(format!("subsetting {} failed: {e}", font.name)))?;
    let compressed = miniz_oxide::deflate::compress_to_vec_zlib(&subset, 6);

    let descriptor_ref = alloc();
    let data_ref = alloc();
    let cid_font_ref = alloc();
    let tounicode_ref = alloc();

    {
        let mut stream = pdf.stream(data_ref, &compressed);
        stream.filter(Filter::FlateDecode);
        if font.is_cff {
            stream.pair(Name(b"Subtype"), Name(b"OpenType"));
        } else {
            let len = i32::try_from(subset.len())
                .map_err(|_| Error::Font(format!("{} subset too large", font.name)))?;
            stream.pair(Name(b"Length1"), len);
        }
    }

    let ps_name = format!("AAAAAA+{}", font.name);

    {
        let mut descriptor = pdf.font_descriptor(descriptor_ref);
        descriptor
            .name(Name(ps_name.as_bytes()))
            .flags(pdf_writer::types::FontFlags::NON_SYMBOLIC)
            .bbox(bbox)
            .italic_angle(0.0)
            .ascent(ascent)
            .descent(descent)
            .cap_height(cap_height)
            .stem_v(80.0);
        if font.is_cff {
            descriptor.font_file3(data_ref);
        } else {
            descriptor.font_file2(data_ref);
        }
    }

    {
        let mut cid = pdf.cid_font(cid_font_ref);
        if font.is_cff {
            cid.subtype(pdf_writer::types::CidFontType::Type0);
        } else {
            cid.subtype(pdf_writer::types::CidFontType::Type2);
            cid.cid_to_gid_map_predefined(Name(b"Identity"));
        }
        cid.base_font(Name(ps_name.as_bytes()));
        cid.system_info(identity_system_info());
        cid.font_descriptor(descriptor_ref);
        cid.default_width(1000.0);

        let mut gid_widths: Vec<(u16, f32)> = used
            .iter()
            .filter_map(|(&ch, &new_gid)| font.glyph(ch).map(|g| (new_gid, g.width_1000)))
            .collect();
        gid_widths.sort_by_key(|&(gid, _)| gid);
        gid_widths.dedup_by_key(|&mut (gid, _)| gid);
        if !gid_widths.is_empty() {
            let mut w = cid.widths();
            for &(gid, width) in &gid_widths {
                w.consecutive(gid, [width]);
            }
        }
    }

    let cmap_name = format!("{}-UTF16", font.name);
    let mut cmap = pdf_writer::types::UnicodeCmap::new(Name(cmap_name.as_bytes()), identity_system_info());
    for (&ch, &new_gid) in used {
        cmap.pair(new_gid, ch);
    }
    let cmap_data = cmap.finish();
    pdf.stream(tounicode_ref, cmap_data.as_slice());

    pdf.type0_font(font_ref)
        .base_font(Name(ps_name.as_bytes()))
        .encoding_predefined(Name(b"Identity-H"))
        .descendant_font(cid_font_ref)
        .to_unicode(tounicode_ref);

    log::debug!(
        "Embedded {} ({} glyphs, {} → {} bytes)",
        font.name,
        used.len(),
        font.data.len(),
        compressed.len(),
    );
    Ok(())
}
