//! Sign renderer — composes resolved glyphs into a canvas and serializes it.
//!
//! Composition is a single deterministic pass over the sign's symbols in
//! notation order. Each glyph is resolved, oriented, coloured and placed so
//! that its anchor lands on the symbol position. The first failure aborts
//! the pass and no partial canvas escapes.

mod constants;
mod svg_builder;

use log::{debug, trace};

use crate::error::{RenderError, Result};
use crate::font::GlyphResolver;
use crate::model::*;
use crate::options::{BoundsPolicy, ColorScheme, Framing, RenderOptions};
use constants::*;

pub use svg_builder::serialize;

// ═══════════════════════════════════════════════════════════════════════
// Public API
// ═══════════════════════════════════════════════════════════════════════

/// Compose a parsed sign into a canvas, resolving every glyph through
/// `resolver`.
pub fn compose<R>(sign: &Sign, resolver: &R, options: &RenderOptions) -> Result<Canvas>
where
    R: GlyphResolver + ?Sized,
{
    let frame = Frame::new(sign, options);
    debug!(
        "composing {} symbols on a {}x{} canvas",
        sign.symbols.len(),
        frame.width,
        frame.height
    );

    let guide = options.guide.as_ref().map(|stroke| GuideBox {
        rect: frame.sign_box,
        stroke: stroke.clone(),
    });

    let mut glyphs = Vec::with_capacity(sign.symbols.len());
    for token in &sign.symbols {
        let record = resolver.resolve(&token.key)?;
        let glyph = place(token, record, &frame, options)?;
        trace!("placed {} at {:?}", glyph.symbol, glyph.translate);
        glyphs.push(glyph);
    }

    let metadata = if options.metadata {
        vec![
            format!(
                "Generated with {GENERATOR} using ISWA symbols ({})",
                options.font_name
            ),
            sign.to_notation(),
        ]
    } else {
        Vec::new()
    };

    Ok(Canvas {
        width: frame.width,
        height: frame.height,
        transform: sign.canvas.style.transform(),
        guide,
        glyphs,
        metadata,
    })
}

/// Format a coordinate for output: fixed precision, no trailing zeros.
pub(crate) fn fmt_num(value: f64) -> String {
    let scale = 10f64.powi(COORD_PRECISION);
    let rounded = (value * scale).round() / scale;
    if rounded == 0.0 {
        return "0".to_string();
    }
    let text = format!("{:.*}", COORD_PRECISION as usize, rounded);
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

// ═══════════════════════════════════════════════════════════════════════
// Framing
// ═══════════════════════════════════════════════════════════════════════

/// Canvas size and the offset from notation to canvas coordinates.
struct Frame {
    width: f64,
    height: f64,
    offset: (f64, f64),
    /// The sign box itself, without padding
    sign_box: Rect,
}

impl Frame {
    fn new(sign: &Sign, options: &RenderOptions) -> Frame {
        let max_x = f64::from(sign.canvas.max_x);
        let max_y = f64::from(sign.canvas.max_y);
        match options.framing {
            Framing::Header => Frame {
                width: max_x,
                height: max_y,
                offset: (0.0, 0.0),
                sign_box: Rect::new(0.0, 0.0, max_x, max_y),
            },
            Framing::Fit => {
                let (min_x, min_y) = sign.min_coordinates().unwrap_or((0, 0));
                let (mut min_x, min_y) = (f64::from(min_x), f64::from(min_y));
                // reach at least the furthest symbol, whatever the header says
                let (top_x, top_y) = sign.max_coordinates().unwrap_or((0, 0));
                let mut max_x = max_x.max(f64::from(top_x));
                let max_y = max_y.max(f64::from(top_y));
                if options.center {
                    if -min_x > max_x {
                        max_x = -min_x;
                    } else {
                        min_x = -max_x;
                    }
                }
                let pad = f64::from(options.pad.max(0));
                Frame {
                    width: max_x - min_x + 2.0 * pad,
                    height: max_y - min_y + 2.0 * pad,
                    offset: (pad - min_x, pad - min_y),
                    sign_box: Rect::new(pad, pad, max_x - min_x, max_y - min_y),
                }
            }
        }
    }

    fn contains(&self, r: &Rect) -> bool {
        r.x >= -BOUNDS_EPSILON
            && r.y >= -BOUNDS_EPSILON
            && r.right() <= self.width + BOUNDS_EPSILON
            && r.bottom() <= self.height + BOUNDS_EPSILON
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Placement
// ═══════════════════════════════════════════════════════════════════════

fn place(
    token: &SymbolToken,
    record: GlyphRecord,
    frame: &Frame,
    options: &RenderOptions,
) -> Result<PlacedGlyph> {
    let mut x = f64::from(token.x) + frame.offset.0;
    let mut y = f64::from(token.y) + frame.offset.1;
    if options.bounds == BoundsPolicy::Clamp {
        x = x.clamp(0.0, frame.width);
        y = y.clamp(0.0, frame.height);
    }

    let translate = (x - record.anchor.0, y - record.anchor.1);
    let pivot = record.bounds.center();
    let extent = oriented_extent(&record.bounds, pivot, token.orientation, translate);

    if options.bounds == BoundsPolicy::Strict && !frame.contains(&extent) {
        return Err(RenderError::OutOfBounds {
            offset: token.offset,
            symbol: token.symbol(),
            width: frame.width,
            height: frame.height,
        });
    }

    Ok(PlacedGlyph {
        symbol: token.symbol(),
        translate,
        orientation: token.orientation,
        pivot,
        colors: resolve_colors(&token.color, &options.colors),
        shapes: record.shapes,
        extent,
    })
}

/// Canvas-space bounding box of a glyph after mirroring, rotation and
/// translation.
fn oriented_extent(
    bounds: &Rect,
    pivot: (f64, f64),
    orientation: Orientation,
    translate: (f64, f64),
) -> Rect {
    let (px, py) = pivot;
    let (sin, cos) = orientation.svg_degrees().to_radians().sin_cos();
    let corners = bounds.corners().map(|(x, y)| {
        let x = if orientation.mirrored { 2.0 * px - x } else { x };
        let (dx, dy) = (x - px, y - py);
        (
            px + dx * cos - dy * sin + translate.0,
            py + dx * sin + dy * cos + translate.1,
        )
    });
    Rect::enclosing(&corners)
}

fn resolve_colors(variant: &ColorVariant, scheme: &ColorScheme) -> ColorPair {
    match variant {
        ColorVariant::Inherit => scheme.defaults(),
        ColorVariant::Palette(category) => ColorPair {
            line: palette_color(*category).to_string(),
            fill: scheme.fill.clone(),
        },
        ColorVariant::Override(pair) => pair.clone(),
    }
}
