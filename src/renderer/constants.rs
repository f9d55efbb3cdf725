//! Shared constants for the sign renderer.

use crate::model::SymbolCategory;

// ── Document ────────────────────────────────────────────────────────
pub(super) const XML_PROLOG: &str = r#"<?xml version="1.0" standalone="no"?>"#;
pub(super) const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";
pub(super) const GENERATOR: &str = "swrender";

// ── Geometry ────────────────────────────────────────────────────────
/// Tolerance for strict bounds checks on rotated glyph boxes
pub(super) const BOUNDS_EPSILON: f64 = 1e-6;
/// Decimal places kept when writing coordinates
pub(super) const COORD_PRECISION: i32 = 3;
pub(super) const GUIDE_STROKE_WIDTH: f64 = 0.5;

// ── Colours ─────────────────────────────────────────────────────────
/// Line colour per symbol category, indexed by `SymbolCategory::palette_index`.
pub(super) const CATEGORY_PALETTE: [&str; 8] = [
    "#0000ff", // hand
    "#ff0000", // movement
    "#ff00ff", // dynamics
    "#00ff00", // head
    "#000000", // trunk
    "#000000", // limb
    "#ddaa00", // location
    "#ff5500", // punctuation
];

pub(super) fn palette_color(category: SymbolCategory) -> &'static str {
    CATEGORY_PALETTE[category.palette_index()]
}
