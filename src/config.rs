//! Run-wide layout configuration.
//!
//! All positions are millimeters from the label's top-left corner. A
//! `LayoutConfig` is built once (defaults or a TOML file) and only borrowed
//! afterwards.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::geometry::PageGeometry;

pub const DEFAULT_FONT_CANDIDATES: &str = "Noto Sans CJK JP; Noto Sans JP; Source Han Sans JP; \
     Hiragino Kaku Gothic ProN; Yu Gothic; MS Gothic; IPAexGothic; IPAGothic";

/// Which page edge a field's horizontal position is measured from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Anchoring {
    #[default]
    Left,
    /// Measured from the trailing (right) edge, so the field keeps its
    /// distance from that edge when the page width changes.
    Right,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Offset {
    pub x: f32,
    pub y: f32,
}

/// Base position + field offset + anchoring for one field.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    pub base_x: f32,
    pub base_y: f32,
    pub offset_x: f32,
    pub offset_y: f32,
    pub anchoring: Anchoring,
}

impl Placement {
    pub fn anchor_x(&self, global: Offset, page_width_mm: f32) -> f32 {
        match self.anchoring {
            Anchoring::Left => self.base_x + global.x + self.offset_x,
            Anchoring::Right => page_width_mm - (self.base_x + self.offset_x + global.x),
        }
    }

    pub fn top_y(&self, global: Offset) -> f32 {
        self.base_y + global.y + self.offset_y
    }

    /// Centerlines of a two-column field as (first, second). The first block
    /// is always the right-hand column, which is read first.
    pub fn column_pair(&self, global: Offset, page_width_mm: f32, gap: f32) -> (f32, f32) {
        let anchor = self.anchor_x(global, page_width_mm);
        match self.anchoring {
            Anchoring::Right => (anchor, anchor - gap),
            Anchoring::Left => (anchor + gap, anchor),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostalLayout {
    pub base_x: f32,
    pub base_y: f32,
    pub offset_x: f32,
    pub offset_y: f32,
    pub anchoring: Anchoring,
    pub font_size: f32,
    /// Drawn in front of the code, e.g. the postal mark.
    pub prefix: String,
}

impl Default for PostalLayout {
    fn default() -> Self {
        Self {
            base_x: 12.0,
            base_y: 18.0,
            offset_x: 50.0,
            offset_y: 0.0,
            anchoring: Anchoring::Left,
            font_size: 20.0,
            prefix: "〒".into(),
        }
    }
}

impl PostalLayout {
    pub fn placement(&self) -> Placement {
        Placement {
            base_x: self.base_x,
            base_y: self.base_y,
            offset_x: self.offset_x,
            offset_y: self.offset_y,
            anchoring: self.anchoring,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AddressLayout {
    pub base_x: f32,
    pub base_y: f32,
    pub offset_x: f32,
    pub offset_y: f32,
    pub anchoring: Anchoring,
    pub font_size: f32,
    pub leading: f32,
    pub column_gap: f32,
    /// Split at the first space into two parallel columns.
    pub split_columns: bool,
    /// Replace `-`, `−` and `―` with `ー` before layout.
    pub dash_to_long_vowel: bool,
    /// Render spaces as a 0.6-leading gap instead of a blank cell.
    pub compress_spaces: bool,
}

impl Default for AddressLayout {
    fn default() -> Self {
        Self {
            base_x: 18.0,
            base_y: 40.0,
            offset_x: 70.0,
            offset_y: 0.0,
            anchoring: Anchoring::Left,
            font_size: 14.0,
            leading: 6.0,
            column_gap: 12.0,
            split_columns: true,
            dash_to_long_vowel: true,
            compress_spaces: true,
        }
    }
}

impl AddressLayout {
    pub fn placement(&self) -> Placement {
        Placement {
            base_x: self.base_x,
            base_y: self.base_y,
            offset_x: self.offset_x,
            offset_y: self.offset_y,
            anchoring: self.anchoring,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NameLayout {
    pub base_x: f32,
    pub base_y: f32,
    pub offset_x: f32,
    pub offset_y: f32,
    pub anchoring: Anchoring,
    pub font_size: f32,
    pub leading: f32,
    pub column_gap: f32,
    /// Appended to the given name (or the combined name). Empty disables it.
    pub honorific: String,
    /// Draw the honorific on its own when the given name is empty.
    pub honorific_when_given_missing: bool,
    /// Put surname and given name in one column instead of two.
    pub single_column: bool,
}

impl Default for NameLayout {
    fn default() -> Self {
        Self {
            base_x: 55.0,
            base_y: 40.0,
            offset_x: 0.0,
            offset_y: 0.0,
            anchoring: Anchoring::Left,
            font_size: 20.0,
            leading: 10.0,
            column_gap: 12.0,
            honorific: "様".into(),
            honorific_when_given_missing: true,
            single_column: false,
        }
    }
}

impl NameLayout {
    pub fn placement(&self) -> Placement {
        Placement {
            base_x: self.base_x,
            base_y: self.base_y,
            offset_x: self.offset_x,
            offset_y: self.offset_y,
            anchoring: self.anchoring,
        }
    }
}

/// CSV header names for each field.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldNames {
    pub postal: String,
    pub address: String,
    pub name: String,
    pub surname: String,
    pub given: String,
}

impl Default for FieldNames {
    fn default() -> Self {
        Self {
            postal: "郵便番号".into(),
            address: "住所".into(),
            name: "氏名".into(),
            surname: "氏".into(),
            given: "名".into(),
        }
    }
}

/// Per-glyph correction for rotated characters, in font-size units.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GlyphOverride {
    #[serde(rename = "char")]
    pub ch: char,
    #[serde(default)]
    pub dx: f32,
    #[serde(default)]
    pub dy: f32,
    #[serde(default = "one")]
    pub scale: f32,
    #[serde(default)]
    pub shift: f32,
}

fn one() -> f32 {
    1.0
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub page_width_mm: f32,
    pub page_height_mm: f32,
    /// `;`-separated font family candidates, or a path to a font file.
    pub font: String,
    /// Pages per output file. `None` writes a single file.
    pub page_cap: Option<usize>,
    pub offset: Offset,
    pub postal: PostalLayout,
    pub address: AddressLayout,
    pub name: NameLayout,
    pub fields: FieldNames,
    #[serde(rename = "glyph")]
    pub glyphs: Vec<GlyphOverride>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            page_width_mm: 120.0,
            page_height_mm: 235.0,
            font: DEFAULT_FONT_CANDIDATES.into(),
            page_cap: None,
            offset: Offset::default(),
            postal: PostalLayout::default(),
            address: AddressLayout::default(),
            name: NameLayout::default(),
            fields: FieldNames::default(),
            glyphs: Vec::new(),
        }
    }
}

impl LayoutConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, Error> {
        let config: LayoutConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, Error> {
        let text = std::fs::read_to_string(path).map_err(Error::io_at(path))?;
        let config = Self::from_toml_str(&text)?;
        log::debug!("Loaded layout config from {}", path.display());
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, Error> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }

    pub fn geometry(&self) -> PageGeometry {
        PageGeometry::new(self.page_width_mm, self.page_height_mm)
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.page_width_mm <= 0.0 || self.page_height_mm <= 0.0 {
            return Err(Error::Config(format!(
                "page size must be positive, got {}x{} mm",
                self.page_width_mm, self.page_height_mm
            )));
        }
        if self.page_cap == Some(0) {
            return Err(Error::Config("page_cap must be at least 1".into()));
        }
        let sizes = [
            ("postal.font_size", self.postal.font_size),
            ("address.font_size", self.address.font_size),
            ("address.leading", self.address.leading),
            ("name.font_size", self.name.font_size),
            ("name.leading", self.name.leading),
        ];
        for (key, value) in sizes {
            if value <= 0.0 {
                return Err(Error::Config(format!("{key} must be positive, got {value}")));
            }
        }
        for glyph in &self.glyphs {
            if glyph.scale <= 0.0 {
                return Err(Error::Config(format!(
                    "glyph '{}' scale must be positive, got {}",
                    glyph.ch, glyph.scale
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn left_anchor_adds_offsets() {
        let config = LayoutConfig::default();
        let p = config.address.placement();
        assert_eq!(p.anchor_x(config.offset, config.page_width_mm), 88.0);
        assert_eq!(p.top_y(config.offset), 40.0);
    }

    #[test]
    fn right_anchor_measures_from_trailing_edge() {
        let p = Placement {
            base_x: 20.0,
            base_y: 0.0,
            offset_x: 5.0,
            offset_y: 0.0,
            anchoring: Anchoring::Right,
        };
        let global = Offset { x: 2.0, y: 0.0 };
        assert_eq!(p.anchor_x(global, 120.0), 93.0);
        assert_eq!(p.anchor_x(global, 150.0), 123.0);
    }

    #[test]
    fn first_column_is_rightmost_in_both_modes() {
        let mut p = Placement {
            base_x: 55.0,
            base_y: 40.0,
            offset_x: 0.0,
            offset_y: 0.0,
            anchoring: Anchoring::Left,
        };
        let (first, second) = p.column_pair(Offset::default(), 120.0, 12.0);
        assert_eq!((first, second), (67.0, 55.0));

        p.anchoring = Anchoring::Right;
        let (first, second) = p.column_pair(Offset::default(), 120.0, 12.0);
        assert_eq!((first, second), (65.0, 53.0));
    }

    #[test]
    fn partial_table_keeps_field_defaults() {
        let config = LayoutConfig::from_toml_str(
            r#"
            page_cap = 20

            [offset]
            x = 1.5

            [address]
            offset_x = 60
            anchoring = "right"

            [[glyph]]
            char = "〜"
            dy = 0.1
            "#,
        )
        .unwrap();
        assert_eq!(config.page_cap, Some(20));
        assert_eq!(config.offset, Offset { x: 1.5, y: 0.0 });
        assert_eq!(config.address.offset_x, 60.0);
        assert_eq!(config.address.anchoring, Anchoring::Right);
        assert_eq!(config.address.leading, 6.0);
        assert_eq!(config.address.column_gap, 12.0);
        assert_eq!(config.name.honorific, "様");
        assert_eq!(config.glyphs.len(), 1);
        assert_eq!(config.glyphs[0].scale, 1.0);
        assert_eq!(config.glyphs[0].dy, 0.1);
    }

    #[test]
    fn defaults_survive_toml_round_trip() {
        let config = LayoutConfig::default();
        let text = config.to_toml_string().unwrap();
        assert_eq!(LayoutConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn rejects_zero_page_cap_and_bad_leading() {
        assert!(matches!(
            LayoutConfig::from_toml_str("page_cap = 0"),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            LayoutConfig::from_toml_str("[name]\nleading = 0"),
            Err(Error::Config(_))
        ));
    }
}
