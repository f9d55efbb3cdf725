//! Glyph resolution — maps glyph keys to vector glyph records.
//!
//! The compositor only ever sees the `GlyphResolver` trait. Concrete stores
//! are loaded up front and are read-only afterwards, so one store can be
//! shared by any number of renders.

pub mod archive;

use std::collections::BTreeMap;
use std::path::Path;

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::error::{FontError, RenderError, Result};
use crate::model::{GlyphKey, GlyphRecord, Orientation};
use crate::parser;

pub use archive::{load_archive, load_archive_file, parse_glyph_svg};

/// Exact-match lookup of a base glyph.
///
/// Implementations must not depend on anything but the key; the pipeline
/// performs no caching and never retries a miss.
pub trait GlyphResolver {
    fn resolve(&self, key: &GlyphKey) -> Result<GlyphRecord>;
}

impl<F> GlyphResolver for F
where
    F: Fn(&GlyphKey) -> Result<GlyphRecord>,
{
    fn resolve(&self, key: &GlyphKey) -> Result<GlyphRecord> {
        self(key)
    }
}

/// Parse a store key such as `S1000` (group, base, fill) or a full symbol
/// such as `S10000` (with rotation).
pub fn parse_store_key(text: &str) -> Option<(GlyphKey, Orientation)> {
    match text.len() {
        5 => parser::decode_key(&format!("{text}0"), 0).ok(),
        6 => parser::decode_key(text, 0).ok(),
        _ => None,
    }
}

// ═══════════════════════════════════════════════════════════════════════
// MemoryFontStore
// ═══════════════════════════════════════════════════════════════════════

/// On-disk JSON layout of a glyph store.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    glyphs: BTreeMap<String, GlyphRecord>,
}

/// A glyph store held entirely in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryFontStore {
    name: Option<String>,
    glyphs: BTreeMap<GlyphKey, GlyphRecord>,
}

impl MemoryFontStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            glyphs: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
    }

    pub fn insert(&mut self, key: GlyphKey, record: GlyphRecord) -> Option<GlyphRecord> {
        self.glyphs.insert(key, record)
    }

    pub fn get(&self, key: &GlyphKey) -> Option<&GlyphRecord> {
        self.glyphs.get(key)
    }

    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &GlyphKey> {
        self.glyphs.keys()
    }

    /// Load a store from its JSON form:
    /// `{"name": "...", "glyphs": {"S1000": {shapes, anchor, bounds}}}`.
    pub fn from_json(json: &str) -> Result<Self, FontError> {
        let file: StoreFile = serde_json::from_str(json)?;
        let mut store = MemoryFontStore {
            name: file.name,
            glyphs: BTreeMap::new(),
        };
        for (text, record) in file.glyphs {
            let (key, _) = parse_store_key(&text).ok_or_else(|| FontError::InvalidGlyph {
                name: text.clone(),
                reason: "not a glyph key".to_string(),
            })?;
            store.glyphs.insert(key, record);
        }
        debug!("loaded {} glyphs from JSON store", store.len());
        Ok(store)
    }

    pub fn to_json(&self) -> Result<String, FontError> {
        let file = StoreFile {
            name: self.name.clone(),
            glyphs: self
                .glyphs
                .iter()
                .map(|(key, record)| (key.to_string(), record.clone()))
                .collect(),
        };
        Ok(serde_json::to_string_pretty(&file)?)
    }
}

impl GlyphResolver for MemoryFontStore {
    fn resolve(&self, key: &GlyphKey) -> Result<GlyphRecord> {
        trace!("resolving {key}");
        self.glyphs
            .get(key)
            .cloned()
            .ok_or(RenderError::GlyphNotFound { key: *key })
    }
}

/// Open a glyph store from a file path.
/// Format is chosen by extension:
/// - `.json` → JSON glyph store
/// - `.zip` → archive of per-symbol SVG files
pub fn open_font_store<P: AsRef<Path>>(path: P) -> Result<MemoryFontStore, FontError> {
    let path = path.as_ref();
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => {
            let json = std::fs::read_to_string(path).map_err(|source| FontError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            MemoryFontStore::from_json(&json)
        }
        Some("zip") => load_archive_file(path),
        _ => Err(FontError::UnsupportedFormat {
            path: path.to_path_buf(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{GlyphShape, ShapeRole};

    fn square() -> GlyphRecord {
        GlyphRecord::top_left(
            vec![GlyphShape {
                d: "M0,0h10v10h-10Z".to_string(),
                role: ShapeRole::Line,
                transform: None,
            }],
            10.0,
            10.0,
        )
    }

    #[test]
    fn store_keys() {
        let (key, orientation) = parse_store_key("S1000").unwrap();
        assert_eq!(key, GlyphKey { group: 1, base: 0, variation: 0 });
        assert!(orientation.is_identity());
        let (key, orientation) = parse_store_key("S2e734").unwrap();
        assert_eq!(key.to_string(), "S2e73");
        assert_eq!(orientation.turns, 4);
        assert!(parse_store_key("S10").is_none());
        assert!(parse_store_key("Szzzz").is_none());
    }

    #[test]
    fn memory_store_hit_and_miss() {
        let key = GlyphKey { group: 1, base: 0, variation: 0 };
        let mut store = MemoryFontStore::new();
        store.insert(key, square());
        assert_eq!(store.resolve(&key).unwrap(), square());

        let missing = GlyphKey { group: 2, base: 5, variation: 0 };
        match store.resolve(&missing).unwrap_err() {
            RenderError::GlyphNotFound { key } => assert_eq!(key, missing),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn json_round_trip_keeps_keys() {
        let mut store = MemoryFontStore::with_name("test");
        store.insert(GlyphKey { group: 1, base: 0x4c, variation: 2 }, square());
        let json = store.to_json().unwrap();
        assert!(json.contains("\"S14c2\""));

        let loaded = MemoryFontStore::from_json(&json).unwrap();
        assert_eq!(loaded.name(), Some("test"));
        assert_eq!(loaded.len(), 1);
        assert!(loaded.get(&GlyphKey { group: 1, base: 0x4c, variation: 2 }).is_some());
    }

    #[test]
    fn json_rejects_bad_keys() {
        let json = r#"{"glyphs": {"bogus": {"shapes": [], "anchor": [0, 0],
            "bounds": {"x": 0, "y": 0, "width": 1, "height": 1}}}}"#;
        assert!(matches!(
            MemoryFontStore::from_json(json),
            Err(FontError::InvalidGlyph { .. })
        ));
    }

    #[test]
    fn closures_resolve() {
        let resolver = |_: &GlyphKey| -> Result<GlyphRecord> { Ok(square()) };
        let key = GlyphKey { group: 3, base: 0x50, variation: 0 };
        assert_eq!(resolver.resolve(&key).unwrap(), square());
    }

    #[test]
    fn unknown_extension_is_rejected() {
        assert!(matches!(
            open_font_store("glyphs.sql3"),
            Err(FontError::UnsupportedFormat { .. })
        ));
    }
}
