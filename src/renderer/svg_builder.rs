//! SVG builder — accumulates SVG elements and produces the final string.
//!
//! Glyph path data is written verbatim. The font store is trusted: nothing
//! here escapes or sanitizes glyph content beyond what is needed to produce
//! well-formed markup from trusted input.

use super::constants::*;
use super::fmt_num;
use crate::model::{BoxTransform, Canvas, GlyphShape, GuideBox, PlacedGlyph, ShapeRole};

// ═══════════════════════════════════════════════════════════════════════
// SvgBuilder
// ═══════════════════════════════════════════════════════════════════════

pub(super) struct SvgBuilder {
    elements: Vec<String>,
    depth: usize,
    width: f64,
    height: f64,
}

impl SvgBuilder {
    pub(super) fn new(width: f64, height: f64) -> Self {
        Self {
            elements: Vec::new(),
            depth: 1,
            width,
            height,
        }
    }

    pub(super) fn build(self) -> String {
        let (w, h) = (fmt_num(self.width), fmt_num(self.height));
        let mut svg = String::from(XML_PROLOG);
        svg.push('\n');
        svg.push_str(&format!(
            r#"<svg version="1.1" xmlns="{SVG_NAMESPACE}" viewBox="0 0 {w} {h}" width="{w}" height="{h}">"#
        ));
        svg.push('\n');
        for el in &self.elements {
            svg.push_str(el);
            svg.push('\n');
        }
        svg.push_str("</svg>\n");
        svg
    }

    fn push(&mut self, element: String) {
        self.elements.push(format!("{}{}", "  ".repeat(self.depth), element));
    }

    pub(super) fn metadata(&mut self, lines: &[String]) {
        self.push("<metadata>".to_string());
        self.depth += 1;
        for line in lines {
            self.push(escape_text(line));
        }
        self.depth -= 1;
        self.push("</metadata>".to_string());
    }

    pub(super) fn open_group(&mut self, attrs: &str) {
        if attrs.is_empty() {
            self.push("<g>".to_string());
        } else {
            self.push(format!("<g {attrs}>"));
        }
        self.depth += 1;
    }

    pub(super) fn close_group(&mut self) {
        self.depth -= 1;
        self.push("</g>".to_string());
    }

    pub(super) fn guide(&mut self, guide: &GuideBox) {
        let r = &guide.rect;
        self.push(format!(
            r#"<rect class="sign-box" x="{}" y="{}" width="{}" height="{}" fill="none" stroke="{}" stroke-width="{}"/>"#,
            fmt_num(r.x),
            fmt_num(r.y),
            fmt_num(r.width),
            fmt_num(r.height),
            guide.stroke,
            fmt_num(GUIDE_STROKE_WIDTH)
        ));
    }

    pub(super) fn path(&mut self, shape: &GlyphShape, fill: &str) {
        match &shape.transform {
            Some(t) => self.push(format!(
                r#"<path d="{}" fill="{}" transform="{}"/>"#,
                shape.d, fill, t
            )),
            None => self.push(format!(r#"<path d="{}" fill="{}"/>"#, shape.d, fill)),
        }
    }

    pub(super) fn glyph(&mut self, glyph: &PlacedGlyph) {
        self.open_group(&format!(
            r#"class="symbol" data-symbol="{}" transform="{}""#,
            glyph.symbol,
            glyph_transform(glyph)
        ));
        for shape in &glyph.shapes {
            let fill = match shape.role {
                ShapeRole::Line => &glyph.colors.line,
                ShapeRole::Fill => &glyph.colors.fill,
            };
            self.path(shape, fill);
        }
        self.close_group();
    }
}

/// Transform list placing a glyph: translate, then rotate, then mirror.
///
/// SVG applies the rightmost entry first, so the glyph is mirrored about its
/// pivot, rotated about the pivot, and finally moved into place.
pub(super) fn glyph_transform(glyph: &PlacedGlyph) -> String {
    let (tx, ty) = glyph.translate;
    let (px, py) = glyph.pivot;
    let mut t = format!("translate({},{})", fmt_num(tx), fmt_num(ty));
    if glyph.orientation.turns != 0 {
        t.push_str(&format!(
            " rotate({},{},{})",
            fmt_num(glyph.orientation.svg_degrees()),
            fmt_num(px),
            fmt_num(py)
        ));
    }
    if glyph.orientation.mirrored {
        t.push_str(&format!(" matrix(-1,0,0,1,{},0)", fmt_num(2.0 * px)));
    }
    t
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

// ═══════════════════════════════════════════════════════════════════════
// Canvas → document
// ═══════════════════════════════════════════════════════════════════════

/// Serialize a composed canvas into an SVG document.
pub fn serialize(canvas: &Canvas) -> String {
    let mut svg = SvgBuilder::new(canvas.width, canvas.height);

    if !canvas.metadata.is_empty() {
        svg.metadata(&canvas.metadata);
    }

    let mirrored = canvas.transform == BoxTransform::MirrorX;
    if mirrored {
        svg.open_group(&format!(
            r#"transform="translate({},0) scale(-1,1)""#,
            fmt_num(canvas.width)
        ));
    }

    if let Some(guide) = &canvas.guide {
        svg.guide(guide);
    }
    for glyph in &canvas.glyphs {
        svg.glyph(glyph);
    }

    if mirrored {
        svg.close_group();
    }
    svg.build()
}
