//! KSW parser — converts a Kartesian SignWriting string into a `Sign`.
//!
//! Parsing runs in two stages. `tokenize` splits the string into the sorting
//! prefix, the box header and raw symbol tokens without interpreting them;
//! `decode_symbol` turns each raw token into a `SymbolToken`.

use log::trace;

use crate::error::{RenderError, Result};
use crate::model::*;
use crate::numeral::{self, NumeralError, COORD_SEPARATOR};
use crate::options::ColorScheme;

/// Introduces every symbol, in the prefix and in the body.
pub const SYMBOL_INTRODUCER: u8 = b'S';
/// Introduces the sorting prefix.
pub const PREFIX_MARKER: u8 = b'A';
/// `S` plus five key characters.
pub const SYMBOL_KEY_LEN: usize = 6;
/// Shortest possible coordinate suffix, `0x0`.
const MIN_COORD_LEN: usize = 3;
/// Opens a panel string.
const PANEL_MARKER: u8 = b'D';
/// Separates the signs of a panel.
const PANEL_SEPARATOR: u8 = b'_';

/// A slice of the notation string with its byte offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawToken<'a> {
    pub offset: usize,
    pub text: &'a str,
}

/// Box marker and optional extents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub style: BoxStyle,
    pub extents: Option<(i32, i32)>,
}

/// Output of the tokenizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tokens<'a> {
    /// Prefix symbols (`S` + key, no coordinates)
    pub prefix: Vec<RawToken<'a>>,
    /// `None` for a stand-alone punctuation symbol
    pub header: Option<Header>,
    pub symbols: Vec<RawToken<'a>>,
}

fn malformed(notation: &str, offset: usize, reason: &'static str) -> RenderError {
    let end = notation.len().min(offset + SYMBOL_KEY_LEN + 8);
    let fragment = notation.get(offset..end).unwrap_or(notation).to_string();
    RenderError::MalformedNotation {
        offset,
        fragment,
        reason,
    }
}

// ─── Tokenizer ───────────────────────────────────────────────────────

/// Split a notation string into prefix, header and raw symbol tokens.
pub fn tokenize(notation: &str) -> Result<Tokens<'_>> {
    if notation.is_empty() {
        return Err(malformed(notation, 0, "empty notation"));
    }
    if let Some(pos) = notation.bytes().position(|c| !c.is_ascii() || c.is_ascii_whitespace()) {
        return Err(malformed(notation, pos, "unexpected character"));
    }
    let bytes = notation.as_bytes();
    let mut pos = 0;

    let mut prefix = Vec::new();
    if bytes[0] == PREFIX_MARKER {
        pos = 1;
        while bytes.get(pos) == Some(&SYMBOL_INTRODUCER) {
            if pos + SYMBOL_KEY_LEN > bytes.len() {
                return Err(malformed(notation, pos, "truncated prefix symbol"));
            }
            prefix.push(RawToken {
                offset: pos,
                text: &notation[pos..pos + SYMBOL_KEY_LEN],
            });
            pos += SYMBOL_KEY_LEN;
        }
        if prefix.is_empty() {
            return Err(malformed(notation, pos, "empty sorting prefix"));
        }
    }

    let header = if let Some(style) = bytes.get(pos).copied().and_then(BoxStyle::from_marker) {
        pos += 1;
        let end = next_symbol(bytes, pos);
        let extents = if end > pos {
            let (x, y) = numeral::parse_pair(&notation[pos..end])
                .map_err(|_| malformed(notation, pos, "non-numeric extents"))?;
            if x < 0 || y < 0 {
                return Err(malformed(notation, pos, "negative extents"));
            }
            pos = end;
            Some((x, y))
        } else {
            None
        };
        Some(Header { style, extents })
    } else if bytes.get(pos) == Some(&SYMBOL_INTRODUCER) && prefix.is_empty() {
        // stand-alone punctuation
        None
    } else if pos < bytes.len() {
        return Err(malformed(notation, pos, "unrecognized box marker"));
    } else {
        return Err(malformed(notation, pos, "missing box marker"));
    };

    let mut symbols = Vec::new();
    while pos < bytes.len() {
        if bytes[pos] != SYMBOL_INTRODUCER {
            return Err(malformed(notation, pos, "expected symbol"));
        }
        if pos + SYMBOL_KEY_LEN > bytes.len() {
            return Err(malformed(notation, pos, "incomplete symbol token"));
        }
        let end = next_symbol(bytes, pos + SYMBOL_KEY_LEN);
        let coords = &bytes[pos + SYMBOL_KEY_LEN..end];
        if coords.len() < MIN_COORD_LEN || !coords.contains(&COORD_SEPARATOR) {
            return Err(malformed(notation, pos, "incomplete symbol token"));
        }
        symbols.push(RawToken {
            offset: pos,
            text: &notation[pos..end],
        });
        pos = end;
    }

    trace!(
        "tokenized {} prefix and {} body symbols",
        prefix.len(),
        symbols.len()
    );
    Ok(Tokens {
        prefix,
        header,
        symbols,
    })
}

/// Index of the next symbol introducer at or after `from`, or the end.
fn next_symbol(bytes: &[u8], from: usize) -> usize {
    bytes[from..]
        .iter()
        .position(|&c| c == SYMBOL_INTRODUCER)
        .map_or(bytes.len(), |i| from + i)
}

// ─── Decoder ─────────────────────────────────────────────────────────

fn hex_value(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

/// Decode the fixed-width key field (`S` + 5 characters) of a symbol.
///
/// Field to error mapping:
/// - non-hex character, group outside `1..=3`, id outside the ISWA range:
///   `InvalidGlyphKey`
/// - fill digit `6`..`f`: `UnknownVariant` (fill selects the stored glyph)
/// - rotation digit: any hex value is accepted and becomes an `Orientation`
pub fn decode_key(text: &str, offset: usize) -> Result<(GlyphKey, Orientation)> {
    let invalid = || RenderError::InvalidGlyphKey {
        offset,
        key: text.to_string(),
    };
    let bytes = text.as_bytes();
    if bytes.len() != SYMBOL_KEY_LEN || bytes[0] != SYMBOL_INTRODUCER {
        return Err(invalid());
    }
    let mut digits = [0u8; 5];
    for (slot, &c) in digits.iter_mut().zip(&bytes[1..]) {
        *slot = hex_value(c).ok_or_else(invalid)?;
    }
    let [group, hi, lo, fill, rotation] = digits;

    if !(1..=3).contains(&group) {
        return Err(invalid());
    }
    let key = GlyphKey {
        group,
        base: (hi << 4) | lo,
        variation: fill,
    };
    if !(FIRST_SYMBOL_ID..=LAST_SYMBOL_ID).contains(&key.symbol_id()) {
        return Err(invalid());
    }
    if fill > 5 {
        return Err(RenderError::UnknownVariant {
            offset,
            key: text.to_string(),
            code: char::from(bytes[4]),
        });
    }
    Ok((key, Orientation::from_digit(rotation)))
}

/// Decode one raw symbol token; `index` is its position in the sign.
pub fn decode_symbol(raw: RawToken<'_>, index: usize, colors: &ColorScheme) -> Result<SymbolToken> {
    let key_text = raw.text.get(..SYMBOL_KEY_LEN).ok_or_else(|| RenderError::InvalidGlyphKey {
        offset: raw.offset,
        key: raw.text.to_string(),
    })?;
    let (key, orientation) = decode_key(key_text, raw.offset)?;

    let coords = &raw.text[SYMBOL_KEY_LEN..];
    let coords_offset = raw.offset + SYMBOL_KEY_LEN;
    let (x_text, y_text) = coords
        .split_once(char::from(COORD_SEPARATOR))
        .ok_or_else(|| RenderError::InvalidCoordinate {
            offset: coords_offset,
            field: coords.to_string(),
        })?;
    let x = decode_coordinate(x_text, coords_offset)?;
    let y = decode_coordinate(y_text, coords_offset + x_text.len() + 1)?;

    Ok(SymbolToken {
        color: colors.variant_for(index, &key),
        key,
        orientation,
        x,
        y,
        offset: raw.offset,
    })
}

fn decode_coordinate(field: &str, offset: usize) -> Result<i32> {
    numeral::parse_number(field).map_err(|e| {
        let offset = match e {
            NumeralError::BadDigit(i) => offset + i,
            NumeralError::Empty | NumeralError::Overflow => offset,
        };
        RenderError::InvalidCoordinate {
            offset,
            field: field.to_string(),
        }
    })
}

// ─── Whole notation ──────────────────────────────────────────────────

/// Parse a notation string with default (uncoloured) symbol variants.
pub fn parse_notation(notation: &str) -> Result<Sign> {
    parse_notation_with(notation, &ColorScheme::default())
}

/// Parse a notation string, assigning colour variants from `colors`.
pub fn parse_notation_with(notation: &str, colors: &ColorScheme) -> Result<Sign> {
    let tokens = tokenize(notation)?;

    let prefix = tokens
        .prefix
        .iter()
        .map(|raw| {
            let (key, orientation) = decode_key(raw.text, raw.offset)?;
            Ok(key.with_rotation(orientation.digit()))
        })
        .collect::<Result<Vec<_>>>()?;

    let symbols = tokens
        .symbols
        .iter()
        .enumerate()
        .map(|(i, raw)| decode_symbol(*raw, i, colors))
        .collect::<Result<Vec<_>>>()?;

    let canvas = match tokens.header {
        Some(Header { style, extents: Some((max_x, max_y)) }) => CanvasSpec { style, max_x, max_y },
        Some(Header { style, extents: None }) => {
            // Extents default to the largest symbol coordinates.
            let max_x = symbols.iter().map(|s| s.x).max().unwrap_or(0).max(0);
            let max_y = symbols.iter().map(|s| s.y).max().unwrap_or(0).max(0);
            CanvasSpec { style, max_x, max_y }
        }
        None => punctuation_canvas(notation, &symbols)?,
    };

    Ok(Sign {
        prefix,
        canvas,
        symbols,
    })
}

/// Canvas of a stand-alone punctuation symbol: its coordinates are negative
/// offsets from the box corner.
fn punctuation_canvas(notation: &str, symbols: &[SymbolToken]) -> Result<CanvasSpec> {
    let symbol = match symbols {
        [only] if only.key.category() == Some(SymbolCategory::Punctuation) => only,
        _ => return Err(malformed(notation, 0, "unrecognized box marker")),
    };
    let (max_x, max_y) = match (symbol.x.checked_neg(), symbol.y.checked_neg()) {
        (Some(x), Some(y)) if x >= 0 && y >= 0 => (x, y),
        _ => return Err(malformed(notation, symbol.offset, "punctuation outside its box")),
    };
    Ok(CanvasSpec {
        style: BoxStyle::Horizontal,
        max_x,
        max_y,
    })
}

/// Whether `notation` parses as a sign.
pub fn is_valid(notation: &str) -> bool {
    parse_notation(notation).is_ok()
}

// ─── Notation forms ──────────────────────────────────────────────────

/// Byte cursor over one whitespace-free notation token.
struct Scanner<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }

    fn done(&self) -> bool {
        self.pos == self.text.len()
    }

    fn peek(&self) -> Option<u8> {
        self.text.as_bytes().get(self.pos).copied()
    }

    fn eat(&mut self, c: u8) -> bool {
        let hit = self.peek() == Some(c);
        if hit {
            self.pos += 1;
        }
        hit
    }

    fn box_marker(&mut self) -> bool {
        let hit = self.peek().and_then(BoxStyle::from_marker).is_some();
        if hit {
            self.pos += 1;
        }
        hit
    }

    fn symbol(&mut self) -> Option<GlyphKey> {
        let text = self.text.get(self.pos..self.pos + SYMBOL_KEY_LEN)?;
        let (key, _) = decode_key(text, self.pos).ok()?;
        self.pos += SYMBOL_KEY_LEN;
        Some(key)
    }

    /// One number; sizes and extents (`signed == false`) take no `n`.
    fn number(&mut self, signed: bool) -> bool {
        let rest = &self.text.as_bytes()[self.pos..];
        let len = rest
            .iter()
            .position(|&c| !numeral::is_numeral_char(c))
            .unwrap_or(rest.len());
        let field = &self.text[self.pos..self.pos + len];
        if !signed && field.starts_with(char::from(numeral::NEGATIVE_MARKER)) {
            return false;
        }
        let ok = numeral::parse_number(field).is_ok();
        if ok {
            self.pos += len;
        }
        ok
    }

    fn pair(&mut self, signed: bool) -> bool {
        self.number(signed) && self.eat(COORD_SEPARATOR) && self.number(signed)
    }

    /// Optional `A` prefix; false only when a prefix is present but broken.
    fn sorting_prefix(&mut self) -> bool {
        if !self.eat(PREFIX_MARKER) {
            return true;
        }
        let mut count = 0;
        while self.peek() == Some(SYMBOL_INTRODUCER) {
            if self.symbol().is_none() {
                return false;
            }
            count += 1;
        }
        count > 0
    }
}

fn every_token(text: &str, matches: fn(&str) -> bool) -> bool {
    let mut tokens = text.split_ascii_whitespace().peekable();
    tokens.peek().is_some() && tokens.all(matches)
}

/// A sign whose symbols carry their sizes: `S` key, `WxH`, then `xXxY`,
/// e.g. `MS1000010x10xn10xn10`. Stand-alone punctuation carries only its
/// size. Whitespace separates signs.
pub fn is_expanded(text: &str) -> bool {
    every_token(text, |token| {
        let mut punct = Scanner::new(token);
        if let Some(key) = punct.symbol() {
            if key.category() == Some(SymbolCategory::Punctuation)
                && punct.pair(false)
                && punct.done()
            {
                return true;
            }
        }

        let mut s = Scanner::new(token);
        if !(s.sorting_prefix() && s.box_marker()) {
            return false;
        }
        while !s.done() {
            let sized = s.symbol().is_some()
                && s.pair(false)
                && s.eat(COORD_SEPARATOR)
                && s.pair(true);
            if !sized {
                return false;
            }
        }
        true
    })
}

/// A panel string: `D` + panel size, then `_`-separated signs, each with a
/// box marker, mandatory extents and placed symbols, e.g.
/// `D200x100_M18x33S1870an11x15`. Whitespace separates panels.
pub fn is_panel(text: &str) -> bool {
    every_token(text, |token| {
        let mut s = Scanner::new(token);
        if !(s.eat(PANEL_MARKER) && s.pair(false)) {
            return false;
        }
        while !s.done() {
            if !(s.eat(PANEL_SEPARATOR) && s.box_marker() && s.pair(false)) {
                return false;
            }
            while !s.done() && s.peek() != Some(PANEL_SEPARATOR) {
                if !(s.symbol().is_some() && s.pair(true)) {
                    return false;
                }
            }
        }
        true
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    const SAMPLE: &str = "M40x69S35000n18xn18S30c00n18xn18S14c2017x15S22e0420x51";

    fn kind(notation: &str) -> ErrorKind {
        parse_notation(notation).unwrap_err().kind()
    }

    #[test]
    fn tokenize_sample() {
        let tokens = tokenize(SAMPLE).unwrap();
        assert!(tokens.prefix.is_empty());
        assert_eq!(
            tokens.header,
            Some(Header { style: BoxStyle::Middle, extents: Some((40, 69)) })
        );
        let texts: Vec<&str> = tokens.symbols.iter().map(|t| t.text).collect();
        assert_eq!(texts, ["S35000n18xn18", "S30c00n18xn18", "S14c2017x15", "S22e0420x51"]);
        assert_eq!(tokens.symbols[1].offset, 19);
    }

    #[test]
    fn decode_sample() {
        let sign = parse_notation(SAMPLE).unwrap();
        assert_eq!(sign.canvas, CanvasSpec { style: BoxStyle::Middle, max_x: 40, max_y: 69 });
        assert_eq!(sign.symbols.len(), 4);
        let hand = &sign.symbols[2];
        assert_eq!(hand.key, GlyphKey { group: 1, base: 0x4c, variation: 2 });
        assert_eq!(hand.orientation, Orientation { turns: 0, mirrored: false });
        assert_eq!((hand.x, hand.y), (17, 15));
        assert_eq!(hand.color, ColorVariant::Inherit);
        assert_eq!(sign.all_symbols(), ["S35000", "S30c00", "S14c20", "S22e04"]);
    }

    #[test]
    fn single_symbol_scenario() {
        let sign = parse_notation("M40x69S35000n18xn18").unwrap();
        assert_eq!(sign.symbols.len(), 1);
        assert_eq!((sign.symbols[0].x, sign.symbols[0].y), (-18, -18));
    }

    #[test]
    fn extents_derived_when_missing() {
        let sign = parse_notation("MS1870an11x15S18701n18xn10S205008xn4S2e7340xn32").unwrap();
        assert_eq!((sign.canvas.max_x, sign.canvas.max_y), (8, 15));
        assert_eq!(sign.symbols[0].orientation, Orientation { turns: 2, mirrored: true });

        let empty = parse_notation("B").unwrap();
        assert_eq!((empty.canvas.max_x, empty.canvas.max_y), (0, 0));
        assert!(empty.symbols.is_empty());
    }

    #[test]
    fn sorting_prefix() {
        let sign = parse_notation(
            "AS1870aS18701S2e734M18x33S1870an11x15S18701n18xn10S205008xn4S2e7340xn32",
        )
        .unwrap();
        assert_eq!(sign.prefix, ["S1870a", "S18701", "S2e734"]);
        assert_eq!(sign.symbols.len(), 4);
        assert_eq!(kind("AM18x33"), ErrorKind::MalformedNotation);
        assert_eq!(kind("AS1zz00M18x33"), ErrorKind::InvalidGlyphKey);
    }

    #[test]
    fn standalone_punctuation() {
        let sign = parse_notation("S38800n36xn4").unwrap();
        assert_eq!(sign.canvas, CanvasSpec { style: BoxStyle::Horizontal, max_x: 36, max_y: 4 });
        assert_eq!(kind("S10000n36xn4"), ErrorKind::MalformedNotation);
        assert_eq!(kind("S3880036x4"), ErrorKind::MalformedNotation);
    }

    #[test]
    fn malformed_strings() {
        assert_eq!(kind(""), ErrorKind::MalformedNotation);
        assert_eq!(kind("Q40x69S35000n18xn18"), ErrorKind::MalformedNotation);
        assert_eq!(kind("M4ax69S35000n18xn18"), ErrorKind::MalformedNotation);
        assert_eq!(kind("Mn4x69"), ErrorKind::MalformedNotation);
        assert_eq!(kind("M40x69S35000n18xn18S300"), ErrorKind::MalformedNotation);
        assert_eq!(kind("M40x69S3500012"), ErrorKind::MalformedNotation);
        assert_eq!(kind("M40x69 S35000n18xn18"), ErrorKind::MalformedNotation);
    }

    #[test]
    fn malformed_error_reports_position() {
        match parse_notation("M40x69S35000n18xn18S300").unwrap_err() {
            RenderError::MalformedNotation { offset, fragment, .. } => {
                assert_eq!(offset, 19);
                assert_eq!(fragment, "S300");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn glyph_key_alphabet() {
        assert_eq!(kind("M40x69S3g000n18xn18"), ErrorKind::InvalidGlyphKey);
        assert_eq!(kind("M40x69S45000n18xn18"), ErrorKind::InvalidGlyphKey);
        assert_eq!(kind("M40x69S39000n18xn18"), ErrorKind::InvalidGlyphKey);
        assert_eq!(kind("M40x69S0ff00n18xn18"), ErrorKind::InvalidGlyphKey);
        // uppercase hex is accepted and normalized
        let sign = parse_notation("M40x69S2E734n18xn18").unwrap();
        assert_eq!(sign.all_symbols(), ["S2e734"]);
    }

    #[test]
    fn fill_outside_range_is_unknown_variant() {
        match parse_notation("M40x69S35060n18xn18").unwrap_err() {
            RenderError::UnknownVariant { offset, key, code } => {
                assert_eq!(offset, 6);
                assert_eq!(key, "S35060");
                assert_eq!(code, '6');
            }
            other => panic!("unexpected error: {other:?}"),
        }
        // every rotation digit is valid; it only orients the glyph
        let sign = parse_notation("M40x69S3500fn18xn18").unwrap();
        assert_eq!(sign.symbols[0].orientation, Orientation { turns: 7, mirrored: true });
    }

    #[test]
    fn coordinate_errors() {
        match parse_notation("M40x69S35000n18xq18").unwrap_err() {
            RenderError::InvalidCoordinate { offset, field } => {
                assert_eq!(offset, 16);
                assert_eq!(field, "q18");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(kind("M40x69S3500010x10x10"), ErrorKind::InvalidCoordinate);
        assert_eq!(kind("M40x69S35000x10"), ErrorKind::InvalidCoordinate);
        assert_eq!(kind("M40x69S3500099999999999x1"), ErrorKind::InvalidCoordinate);
    }

    #[test]
    fn maximum_coordinate_decodes() {
        let sign = parse_notation("M40x69S350002147483647xn2147483648").unwrap();
        assert_eq!((sign.symbols[0].x, sign.symbols[0].y), (i32::MAX, i32::MIN));
    }

    #[test]
    fn expanded_strings() {
        for marker in ["B", "L", "M", "R"] {
            assert!(is_expanded(marker));
            assert!(is_expanded(&format!("{marker}S1000010x10xn10xn10")));
            assert!(is_expanded(&format!("AS10000{marker}S1000010x10xn10xn10")));
            assert!(!is_expanded(&format!("{marker}S10000n10xn10")));
        }
        assert!(is_expanded("S3870036x4"));
        assert!(is_expanded("MS1000010x10xn10xn10 BS3870036x4xn18xn2"));
        assert!(!is_expanded("S38700n36xn4"));
        assert!(!is_expanded("MS10000n10x10xn10xn10"));
        assert!(!is_expanded("AMS1000010x10xn10xn10"));
        assert!(!is_expanded(""));
        // plain signs are not expanded
        assert!(!is_expanded(SAMPLE));
    }

    #[test]
    fn panel_strings() {
        assert!(is_panel("D200x100"));
        assert!(is_panel("D200x100_M18x33S1870an11x15S18701n18xn10"));
        assert!(is_panel("D200x100_B10x10_L3x4S10000n10xn10 D5x5"));
        assert!(!is_panel("M18x33S1870an11x15"));
        assert!(!is_panel("D200x100_"));
        assert!(!is_panel("D200x100_MS1870an11x15"));
        assert!(!is_panel("Dn2x100"));
        assert!(!is_panel("D200x100_M18x33S1870a"));
        assert!(!is_panel(""));
    }

    #[test]
    fn colour_variants_assigned_by_scheme() {
        let scheme = ColorScheme {
            colorize: true,
            ..ColorScheme::default()
        };
        let sign = parse_notation_with(SAMPLE, &scheme).unwrap();
        assert_eq!(sign.symbols[0].color, ColorVariant::Palette(SymbolCategory::Head));
        assert_eq!(sign.symbols[2].color, ColorVariant::Palette(SymbolCategory::Hand));
        assert_eq!(sign.symbols[3].color, ColorVariant::Palette(SymbolCategory::Movement));
    }
}
