//! Data model for parsed SignWriting notation and composed canvases.
//!
//! These structures carry a sign from the parser, through glyph resolution
//! and composition, to the SVG serializer.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::numeral::format_number;

/// Lowest ISWA symbol id (`S100`).
pub const FIRST_SYMBOL_ID: u16 = 0x100;
/// Highest assigned ISWA symbol id (`S38b`).
pub const LAST_SYMBOL_ID: u16 = 0x38b;

// ─── Notation ────────────────────────────────────────────────────────

/// The box marker that opens a sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoxStyle {
    /// `B` — horizontal sign box
    Horizontal,
    /// `L` — left lane
    Left,
    /// `M` — middle lane
    Middle,
    /// `R` — right lane
    Right,
}

impl BoxStyle {
    pub fn from_marker(c: u8) -> Option<BoxStyle> {
        match c {
            b'B' => Some(BoxStyle::Horizontal),
            b'L' => Some(BoxStyle::Left),
            b'M' => Some(BoxStyle::Middle),
            b'R' => Some(BoxStyle::Right),
            _ => None,
        }
    }

    pub fn marker(self) -> char {
        match self {
            BoxStyle::Horizontal => 'B',
            BoxStyle::Left => 'L',
            BoxStyle::Middle => 'M',
            BoxStyle::Right => 'R',
        }
    }

    /// Canvas-wide transform implied by the box style.
    ///
    /// Left-lane signs are drawn mirrored for a left-dominant signer.
    pub fn transform(self) -> BoxTransform {
        match self {
            BoxStyle::Left => BoxTransform::MirrorX,
            _ => BoxTransform::Identity,
        }
    }
}

/// Transform applied to the whole assembled canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoxTransform {
    Identity,
    MirrorX,
}

/// Canvas declaration from the notation header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanvasSpec {
    pub style: BoxStyle,
    pub max_x: i32,
    pub max_y: i32,
}

/// Identity of a base glyph: everything the font store needs to find it.
///
/// The rotation digit is not part of the key; rotation is applied as a
/// transform when the glyph is placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GlyphKey {
    /// Leading hex digit of the symbol id (1..=3)
    pub group: u8,
    /// Remaining two hex digits of the symbol id
    pub base: u8,
    /// Fill digit (0..=5)
    pub variation: u8,
}

impl GlyphKey {
    /// Full ISWA symbol id, e.g. `0x2e7`.
    pub fn symbol_id(&self) -> u16 {
        (u16::from(self.group) << 8) | u16::from(self.base)
    }

    /// Canonical text form with a given rotation digit, e.g. `S2e734`.
    pub fn with_rotation(&self, rotation: u8) -> String {
        format!("S{:03x}{:x}{:x}", self.symbol_id(), self.variation, rotation)
    }

    pub fn category(&self) -> Option<SymbolCategory> {
        SymbolCategory::of(self.symbol_id())
    }
}

impl fmt::Display for GlyphKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S{:03x}{:x}", self.symbol_id(), self.variation)
    }
}

/// Orientation decoded from a symbol's rotation digit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Orientation {
    /// Counter-clockwise 45° steps (0..=7)
    pub turns: u8,
    /// Mirrored horizontally before rotation
    pub mirrored: bool,
}

impl Orientation {
    pub fn from_digit(digit: u8) -> Orientation {
        Orientation {
            turns: digit & 0x7,
            mirrored: digit >= 8,
        }
    }

    pub fn digit(self) -> u8 {
        self.turns | if self.mirrored { 8 } else { 0 }
    }

    /// Rotation in SVG degrees (positive is clockwise on screen).
    ///
    /// Mirrored glyphs turn clockwise, plain ones counter-clockwise.
    pub fn svg_degrees(self) -> f64 {
        let deg = 45.0 * f64::from(self.turns);
        if self.mirrored {
            deg
        } else {
            -deg
        }
    }

    pub fn is_identity(self) -> bool {
        self.turns == 0 && !self.mirrored
    }
}

/// Broad symbol classes of the ISWA, by id range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SymbolCategory {
    Hand,
    Movement,
    Dynamics,
    Head,
    Trunk,
    Limb,
    Location,
    Punctuation,
}

impl SymbolCategory {
    pub const ALL: [SymbolCategory; 8] = [
        SymbolCategory::Hand,
        SymbolCategory::Movement,
        SymbolCategory::Dynamics,
        SymbolCategory::Head,
        SymbolCategory::Trunk,
        SymbolCategory::Limb,
        SymbolCategory::Location,
        SymbolCategory::Punctuation,
    ];

    /// Inclusive id range covered by this category.
    pub fn range(self) -> (u16, u16) {
        match self {
            SymbolCategory::Hand => (0x100, 0x204),
            SymbolCategory::Movement => (0x205, 0x2f6),
            SymbolCategory::Dynamics => (0x2f7, 0x2fe),
            SymbolCategory::Head => (0x2ff, 0x36c),
            SymbolCategory::Trunk => (0x36d, 0x375),
            SymbolCategory::Limb => (0x376, 0x37e),
            SymbolCategory::Location => (0x37f, 0x386),
            SymbolCategory::Punctuation => (0x387, 0x38b),
        }
    }

    pub fn of(symbol_id: u16) -> Option<SymbolCategory> {
        Self::ALL.into_iter().find(|c| {
            let (lo, hi) = c.range();
            (lo..=hi).contains(&symbol_id)
        })
    }

    /// Position in the colour palette.
    pub fn palette_index(self) -> usize {
        self as usize
    }
}

// ─── Colours ─────────────────────────────────────────────────────────

/// Stroke ("line") and fill colours for one glyph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorPair {
    pub line: String,
    pub fill: String,
}

/// How a symbol is coloured at composition time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColorVariant {
    /// Use the render's default line and fill colours
    Inherit,
    /// Substitute the line colour from the category palette
    Palette(SymbolCategory),
    /// Explicit colours for this symbol
    Override(ColorPair),
}

// ─── Parsed sign ─────────────────────────────────────────────────────

/// One decoded symbol of a sign.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolToken {
    pub key: GlyphKey,
    pub orientation: Orientation,
    pub color: ColorVariant,
    pub x: i32,
    pub y: i32,
    /// Byte offset of the token in the source notation
    pub offset: usize,
}

impl SymbolToken {
    /// Full symbol text including rotation, e.g. `S14c20`.
    pub fn symbol(&self) -> String {
        self.key.with_rotation(self.orientation.digit())
    }
}

/// A fully parsed notation string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sign {
    /// Symbols of the `A` sorting prefix, in order, e.g. `S1870a`
    pub prefix: Vec<String>,
    pub canvas: CanvasSpec,
    /// Placed symbols in z-order
    pub symbols: Vec<SymbolToken>,
}

impl Sign {
    /// Symbol strings of every placed symbol, e.g. `["S10000", "S1035f"]`.
    pub fn all_symbols(&self) -> Vec<String> {
        self.symbols.iter().map(SymbolToken::symbol).collect()
    }

    pub fn prefix_symbols(&self) -> &[String] {
        &self.prefix
    }

    /// Canonical notation text: lowercase keys, explicit extents.
    pub fn to_notation(&self) -> String {
        let mut out = String::new();
        if !self.prefix.is_empty() {
            out.push('A');
            for symbol in &self.prefix {
                out.push_str(symbol);
            }
        }
        out.push(self.canvas.style.marker());
        out.push_str(&format_number(self.canvas.max_x));
        out.push('x');
        out.push_str(&format_number(self.canvas.max_y));
        for token in &self.symbols {
            out.push_str(&token.symbol());
            out.push_str(&format_number(token.x));
            out.push('x');
            out.push_str(&format_number(token.y));
        }
        out
    }

    /// Largest symbol coordinates, or `None` for an empty sign.
    pub fn max_coordinates(&self) -> Option<(i32, i32)> {
        let x = self.symbols.iter().map(|s| s.x).max()?;
        let y = self.symbols.iter().map(|s| s.y).max()?;
        Some((x, y))
    }

    /// Smallest symbol coordinates, or `None` for an empty sign.
    pub fn min_coordinates(&self) -> Option<(i32, i32)> {
        let x = self.symbols.iter().map(|s| s.x).min()?;
        let y = self.symbols.iter().map(|s| s.y).min()?;
        Some((x, y))
    }
}

// ─── Glyphs ──────────────────────────────────────────────────────────

/// Which colour a glyph shape takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShapeRole {
    Line,
    Fill,
}

/// One colourable piece of a glyph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlyphShape {
    /// SVG path data
    pub d: String,
    pub role: ShapeRole,
    /// Transform inherited from the glyph's own source document
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<String>,
}

/// Axis-aligned rectangle in glyph or canvas units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn corners(&self) -> [(f64, f64); 4] {
        [
            (self.x, self.y),
            (self.right(), self.y),
            (self.right(), self.bottom()),
            (self.x, self.bottom()),
        ]
    }

    /// Smallest rectangle containing all `points`.
    pub fn enclosing(points: &[(f64, f64)]) -> Rect {
        let min_x = points.iter().map(|p| p.0).fold(f64::INFINITY, f64::min);
        let min_y = points.iter().map(|p| p.1).fold(f64::INFINITY, f64::min);
        let max_x = points.iter().map(|p| p.0).fold(f64::NEG_INFINITY, f64::max);
        let max_y = points.iter().map(|p| p.1).fold(f64::NEG_INFINITY, f64::max);
        Rect::new(min_x, min_y, max_x - min_x, max_y - min_y)
    }
}

/// A glyph as stored in a font store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlyphRecord {
    pub shapes: Vec<GlyphShape>,
    /// Point that lands on the symbol's position
    pub anchor: (f64, f64),
    /// Intrinsic bounding box in glyph units
    pub bounds: Rect,
}

impl GlyphRecord {
    /// A glyph anchored at its top-left corner, the ISWA convention.
    pub fn top_left(shapes: Vec<GlyphShape>, width: f64, height: f64) -> Self {
        Self {
            shapes,
            anchor: (0.0, 0.0),
            bounds: Rect::new(0.0, 0.0, width, height),
        }
    }
}

// ─── Canvas ──────────────────────────────────────────────────────────

/// Sign-box outline drawn beneath all glyphs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuideBox {
    pub rect: Rect,
    pub stroke: String,
}

/// A resolved glyph placed on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedGlyph {
    /// Symbol text including rotation, e.g. `S14c20`
    pub symbol: String,
    /// Offset applied so the anchor lands on the symbol position
    pub translate: (f64, f64),
    pub orientation: Orientation,
    /// Centre of rotation/mirroring in glyph units
    pub pivot: (f64, f64),
    pub colors: ColorPair,
    pub shapes: Vec<GlyphShape>,
    /// Transformed bounding box in canvas units
    pub extent: Rect,
}

/// The assembled drawing, ready for serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Canvas {
    pub width: f64,
    pub height: f64,
    pub transform: BoxTransform,
    pub guide: Option<GuideBox>,
    /// Glyphs in z-order
    pub glyphs: Vec<PlacedGlyph>,
    /// Metadata lines written into the document, if any
    pub metadata: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glyph_key_text() {
        let key = GlyphKey { group: 2, base: 0xe7, variation: 3 };
        assert_eq!(key.symbol_id(), 0x2e7);
        assert_eq!(key.to_string(), "S2e73");
        assert_eq!(key.with_rotation(4), "S2e734");
    }

    #[test]
    fn categories_by_range() {
        assert_eq!(SymbolCategory::of(0x100), Some(SymbolCategory::Hand));
        assert_eq!(SymbolCategory::of(0x32a), Some(SymbolCategory::Head));
        assert_eq!(SymbolCategory::of(0x37e), Some(SymbolCategory::Limb));
        assert_eq!(SymbolCategory::of(0x38b), Some(SymbolCategory::Punctuation));
        assert_eq!(SymbolCategory::of(0x38c), None);
        assert_eq!(SymbolCategory::of(0x0ff), None);
    }

    #[test]
    fn orientation_digits() {
        let o = Orientation::from_digit(0xa);
        assert_eq!(o, Orientation { turns: 2, mirrored: true });
        assert_eq!(o.digit(), 0xa);
        assert_eq!(o.svg_degrees(), 90.0);
        assert_eq!(Orientation::from_digit(2).svg_degrees(), -90.0);
        assert!(Orientation::from_digit(0).is_identity());
    }

    #[test]
    fn canonical_notation() {
        let sign = Sign {
            prefix: vec!["S2e734".to_string()],
            canvas: CanvasSpec { style: BoxStyle::Left, max_x: 18, max_y: 33 },
            symbols: vec![SymbolToken {
                key: GlyphKey { group: 2, base: 0xe7, variation: 3 },
                orientation: Orientation::from_digit(4),
                color: ColorVariant::Inherit,
                x: 0,
                y: -32,
                offset: 14,
            }],
        };
        assert_eq!(sign.to_notation(), "AS2e734L18x33S2e7340xn32");
    }

    #[test]
    fn rect_enclosing() {
        let r = Rect::enclosing(&[(1.0, 5.0), (-2.0, 3.0), (4.0, -1.0)]);
        assert_eq!(r, Rect::new(-2.0, -1.0, 6.0, 6.0));
        assert_eq!(r.center(), (1.0, 2.0));
    }
}
