use std::collections::HashMap;

use crate::config::GlyphOverride;

/// How a single character is drawn in a vertical column.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CharacterClass {
    /// Drawn upright, centered on the column.
    Default,
    /// Punctuation, dashes and tildes that only read correctly turned 90°.
    RotatedSymbol,
    /// Brackets: turned a further 180° so openers still open downward.
    RotatedAndFlipped,
    /// `ー`, whose rotated glyph needs a size and position correction.
    LongVowelMark,
}

impl CharacterClass {
    pub fn is_rotated(self) -> bool {
        !matches!(self, CharacterClass::Default)
    }

    /// Rotation applied to the local frame, counter-clockwise.
    pub fn rotation_degrees(self) -> f32 {
        match self {
            CharacterClass::Default => 0.0,
            CharacterClass::RotatedSymbol | CharacterClass::LongVowelMark => 90.0,
            CharacterClass::RotatedAndFlipped => 270.0,
        }
    }
}

pub fn classify(ch: char) -> CharacterClass {
    match ch {
        'ー' => CharacterClass::LongVowelMark,
        '（' | '）' | '(' | ')' | '「' | '」' | '『' | '』' | '【' | '】' | '〔' | '〕' | '［'
        | '］' | '[' | ']' | '｛' | '｝' | '{' | '}' | '〈' | '〉' | '《' | '》' | '<' | '>'
        | '＜' | '＞' => CharacterClass::RotatedAndFlipped,
        // comma / period variants
        '、' | '。' | '，' | '．' | ',' | '.'
        // long dashes and hyphens
        | '―' | '—' | '−' | '－' | '‐' | '-'
        // wave dash and tildes
        | '〜' | '～' | '~'
        | '…' | '‥' | '：' | ':' => CharacterClass::RotatedSymbol,
        _ => CharacterClass::Default,
    }
}

/// Fine positioning for one glyph, in font-size units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GlyphAdjust {
    pub dx: f32,
    pub dy: f32,
    /// Multiplier on the font size used for the glyph itself.
    pub scale: f32,
    /// Extra downward shift of the rotation pivot.
    pub shift: f32,
}

impl GlyphAdjust {
    pub const NONE: GlyphAdjust = GlyphAdjust {
        dx: 0.0,
        dy: 0.0,
        scale: 1.0,
        shift: 0.0,
    };
}

impl Default for GlyphAdjust {
    fn default() -> Self {
        Self::NONE
    }
}

impl From<&GlyphOverride> for GlyphAdjust {
    fn from(o: &GlyphOverride) -> Self {
        GlyphAdjust {
            dx: o.dx,
            dy: o.dy,
            scale: o.scale,
            shift: o.shift,
        }
    }
}

/// Per-character corrections for rotated glyphs. Characters without an
/// entry get `GlyphAdjust::NONE`.
#[derive(Clone, Debug, PartialEq)]
pub struct GlyphAdjustments {
    table: HashMap<char, GlyphAdjust>,
}

impl Default for GlyphAdjustments {
    fn default() -> Self {
        let table = HashMap::from([
            (
                'ー',
                GlyphAdjust {
                    scale: 0.75,
                    shift: 0.12,
                    ..GlyphAdjust::NONE
                },
            ),
            (
                '、',
                GlyphAdjust {
                    dx: 0.3,
                    dy: -0.3,
                    ..GlyphAdjust::NONE
                },
            ),
            (
                '。',
                GlyphAdjust {
                    dx: 0.3,
                    dy: -0.3,
                    ..GlyphAdjust::NONE
                },
            ),
        ]);
        Self { table }
    }
}

impl GlyphAdjustments {
    pub fn empty() -> Self {
        Self {
            table: HashMap::new(),
        }
    }

    /// Built-in table with config entries layered on top.
    pub fn with_overrides(overrides: &[GlyphOverride]) -> Self {
        let mut adjustments = Self::default();
        for o in overrides {
            adjustments.insert(o.ch, GlyphAdjust::from(o));
        }
        adjustments
    }

    pub fn insert(&mut self, ch: char, adjust: GlyphAdjust) {
        self.table.insert(ch, adjust);
    }

    pub fn get(&self, ch: char) -> GlyphAdjust {
        self.table.get(&ch).copied().unwrap_or_default()
    }
}
