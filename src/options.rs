//! Render options.
//!
//! Options deserialize from JSON with every field optional, so a config file
//! only needs to name what it changes.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::model::{ColorPair, ColorVariant, GlyphKey};

pub const DEFAULT_LINE_COLOR: &str = "#000000";
pub const DEFAULT_FILL_COLOR: &str = "#ffffff";
pub const DEFAULT_FONT_NAME: &str = "font_svg1";

/// How the canvas is sized and where the origin sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Framing {
    /// Canvas is exactly the header extents; symbol positions are used as-is.
    #[default]
    Header,
    /// Canvas spans from the smallest symbol coordinate to the header extents,
    /// padded on every side.
    Fit,
}

/// What to do with a glyph that leaves the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundsPolicy {
    /// Render it anyway; overflow is the author's concern.
    #[default]
    Overflow,
    /// Fail with `OutOfBounds`.
    Strict,
    /// Move the symbol position inside the canvas.
    Clamp,
}

/// Colours applied to glyph shapes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorScheme {
    pub line: String,
    pub fill: String,
    /// Colour each symbol's lines by its category
    pub colorize: bool,
    /// Explicit colours by symbol index (0-based, in notation order)
    pub overrides: BTreeMap<usize, ColorPair>,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            line: DEFAULT_LINE_COLOR.to_string(),
            fill: DEFAULT_FILL_COLOR.to_string(),
            colorize: false,
            overrides: BTreeMap::new(),
        }
    }
}

impl ColorScheme {
    /// Colour variant for the `index`th symbol of a sign.
    pub fn variant_for(&self, index: usize, key: &GlyphKey) -> ColorVariant {
        if let Some(pair) = self.overrides.get(&index) {
            return ColorVariant::Override(pair.clone());
        }
        match key.category() {
            Some(category) if self.colorize => ColorVariant::Palette(category),
            _ => ColorVariant::Inherit,
        }
    }

    pub fn defaults(&self) -> ColorPair {
        ColorPair {
            line: self.line.clone(),
            fill: self.fill.clone(),
        }
    }
}

/// Everything that can be tuned about a render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    pub framing: Framing,
    /// Padding on every side, in notation units (`Fit` framing only)
    pub pad: i32,
    /// Centre the sign horizontally around x = 0 (`Fit` framing only)
    pub center: bool,
    pub bounds: BoundsPolicy,
    pub colors: ColorScheme,
    /// Stroke colour of the sign-box outline; `None` draws no outline
    pub guide: Option<String>,
    /// Write a `<metadata>` block naming the font and source notation
    pub metadata: bool,
    /// Font name recorded in the metadata
    pub font_name: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            framing: Framing::Header,
            pad: 1,
            center: false,
            bounds: BoundsPolicy::Overflow,
            colors: ColorScheme::default(),
            guide: None,
            metadata: true,
            font_name: DEFAULT_FONT_NAME.to_string(),
        }
    }
}

impl RenderOptions {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SymbolCategory;

    #[test]
    fn partial_json_keeps_defaults() {
        let opts = RenderOptions::from_json(r#"{"framing": "fit", "colors": {"colorize": true}}"#)
            .unwrap();
        assert_eq!(opts.framing, Framing::Fit);
        assert!(opts.colors.colorize);
        assert_eq!(opts.colors.line, DEFAULT_LINE_COLOR);
        assert_eq!(opts.pad, 1);
        assert_eq!(opts.bounds, BoundsPolicy::Overflow);
    }

    #[test]
    fn unknown_policy_is_rejected() {
        assert!(RenderOptions::from_json(r#"{"bounds": "wrap"}"#).is_err());
    }

    #[test]
    fn variant_selection() {
        let hand = GlyphKey { group: 1, base: 0x4c, variation: 2 };
        let mut scheme = ColorScheme::default();
        assert_eq!(scheme.variant_for(0, &hand), ColorVariant::Inherit);

        scheme.colorize = true;
        assert_eq!(
            scheme.variant_for(0, &hand),
            ColorVariant::Palette(SymbolCategory::Hand)
        );

        let pair = ColorPair { line: "red".into(), fill: "white".into() };
        scheme.overrides.insert(1, pair.clone());
        assert_eq!(scheme.variant_for(1, &hand), ColorVariant::Override(pair));
        assert_eq!(
            scheme.variant_for(0, &hand),
            ColorVariant::Palette(SymbolCategory::Hand)
        );
    }
}
