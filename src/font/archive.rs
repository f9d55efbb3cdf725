//! Glyph archive handler — reads SVG glyph stores packed as ZIP archives.
//!
//! A glyph archive is a ZIP file containing one SVG document per symbol:
//!   - <dir>/S10000.svg   — base glyph for symbol S100, fill 0
//!   - <dir>/S10001.svg   — rotated variant (skipped; rotation is a transform)
//!   - (optional) other files — licences, previews, etc. (ignored)

use std::io::{Cursor, Read};
use std::path::Path;

use log::{debug, trace, warn};
use roxmltree::{Document, Node};
use zip::ZipArchive;

use super::{parse_store_key, MemoryFontStore};
use crate::error::FontError;
use crate::model::{GlyphRecord, GlyphShape, ShapeRole};
use crate::renderer::fmt_num;

/// Read a glyph archive from a file path.
pub fn load_archive_file<P: AsRef<Path>>(path: P) -> Result<MemoryFontStore, FontError> {
    let path = path.as_ref();
    let data = std::fs::read(path).map_err(|source| FontError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut store = load_archive(&data)?;
    if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
        store.set_name(stem);
    }
    Ok(store)
}

/// Read a glyph archive from raw bytes.
pub fn load_archive(data: &[u8]) -> Result<MemoryFontStore, FontError> {
    let cursor = Cursor::new(data);
    let mut archive = ZipArchive::new(cursor)?;
    let mut store = MemoryFontStore::new();

    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        if file.is_dir() {
            continue;
        }
        let name = file.name().to_string();
        let Some(stem) = glyph_stem(&name) else {
            trace!("skipping non-glyph entry '{name}'");
            continue;
        };
        let Some((key, orientation)) = parse_store_key(stem) else {
            warn!("skipping '{name}': file name is not a symbol key");
            continue;
        };
        if !orientation.is_identity() {
            trace!("skipping rotated glyph '{name}'");
            continue;
        }

        let mut svg = String::new();
        file.read_to_string(&mut svg)
            .map_err(|source| FontError::Entry {
                name: name.clone(),
                source,
            })?;
        let record = parse_glyph_svg(&name, &svg)?;
        store.insert(key, record);
    }

    debug!("loaded {} glyphs from archive", store.len());
    Ok(store)
}

/// File stem of an `.svg` entry, ignoring any directories.
fn glyph_stem(name: &str) -> Option<&str> {
    let file = name.rsplit('/').next()?;
    file.strip_suffix(".svg")
}

// ═══════════════════════════════════════════════════════════════════════
// SVG glyph documents
// ═══════════════════════════════════════════════════════════════════════

/// Parse one standalone SVG glyph document into a `GlyphRecord`.
///
/// The root `width`/`height` (or `viewBox`) give the glyph bounds and the
/// top-left corner is the anchor. Shapes painted white become fill shapes;
/// everything else is line work.
pub fn parse_glyph_svg(name: &str, svg: &str) -> Result<GlyphRecord, FontError> {
    // Glyph files often carry the SVG 1.0 DOCTYPE, so we must allow DTDs
    let options = roxmltree::ParsingOptions {
        allow_dtd: true,
        ..Default::default()
    };
    let doc = Document::parse_with_options(svg, options).map_err(|source| FontError::Xml {
        name: name.to_string(),
        source,
    })?;
    let root = doc.root_element();

    let invalid = |reason: &str| FontError::InvalidGlyph {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    if root.tag_name().name() != "svg" {
        return Err(invalid("root element is not <svg>"));
    }
    let (width, height) = glyph_size(&root).ok_or_else(|| invalid("missing width/height"))?;

    let mut shapes = Vec::new();
    collect_shapes(&root, None, &mut shapes);
    if shapes.is_empty() {
        return Err(invalid("no drawable shapes"));
    }

    Ok(GlyphRecord::top_left(shapes, width, height))
}

fn parse_length(value: &str) -> Option<f64> {
    value.trim().trim_end_matches("px").parse().ok()
}

fn glyph_size(root: &Node) -> Option<(f64, f64)> {
    let width = root.attribute("width").and_then(parse_length);
    let height = root.attribute("height").and_then(parse_length);
    if let (Some(w), Some(h)) = (width, height) {
        return Some((w, h));
    }
    // Fall back to the viewBox extents
    let view_box: Vec<f64> = root
        .attribute("viewBox")?
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse().ok())
        .collect();
    match view_box[..] {
        [_, _, w, h] => Some((w, h)),
        _ => None,
    }
}

fn collect_shapes(node: &Node, inherited: Option<&str>, out: &mut Vec<GlyphShape>) {
    for child in node.children().filter(|n| n.is_element()) {
        let transform = match (inherited, child.attribute("transform")) {
            (Some(outer), Some(own)) => Some(format!("{outer} {own}")),
            (Some(outer), None) => Some(outer.to_string()),
            (None, Some(own)) => Some(own.to_string()),
            (None, None) => None,
        };

        let d = match child.tag_name().name() {
            "g" | "a" | "switch" => {
                collect_shapes(&child, transform.as_deref(), out);
                continue;
            }
            "path" => child.attribute("d").map(str::to_string),
            "rect" => rect_path(&child),
            "circle" => {
                let r = num_attr(&child, "r");
                ellipse_path(num_attr(&child, "cx"), num_attr(&child, "cy"), r, r)
            }
            "ellipse" => ellipse_path(
                num_attr(&child, "cx"),
                num_attr(&child, "cy"),
                num_attr(&child, "rx"),
                num_attr(&child, "ry"),
            ),
            "polygon" => child.attribute("points").and_then(polygon_path),
            "metadata" | "title" | "desc" | "defs" | "style" => continue,
            other => {
                warn!("ignoring unsupported <{other}> in glyph");
                continue;
            }
        };

        if let Some(d) = d {
            out.push(GlyphShape {
                d,
                role: shape_role(&child),
                transform,
            });
        }
    }
}

fn num_attr(node: &Node, name: &str) -> f64 {
    node.attribute(name).and_then(parse_length).unwrap_or(0.0)
}

fn rect_path(node: &Node) -> Option<String> {
    let (x, y) = (num_attr(node, "x"), num_attr(node, "y"));
    let (w, h) = (num_attr(node, "width"), num_attr(node, "height"));
    if w <= 0.0 || h <= 0.0 {
        return None;
    }
    Some(format!(
        "M{},{}h{}v{}h{}Z",
        fmt_num(x),
        fmt_num(y),
        fmt_num(w),
        fmt_num(h),
        fmt_num(-w)
    ))
}

fn ellipse_path(cx: f64, cy: f64, rx: f64, ry: f64) -> Option<String> {
    if rx <= 0.0 || ry <= 0.0 {
        return None;
    }
    Some(format!(
        "M{},{}a{},{} 0 1,0 {},0a{},{} 0 1,0 {},0Z",
        fmt_num(cx - rx),
        fmt_num(cy),
        fmt_num(rx),
        fmt_num(ry),
        fmt_num(2.0 * rx),
        fmt_num(rx),
        fmt_num(ry),
        fmt_num(-2.0 * rx)
    ))
}

fn polygon_path(points: &str) -> Option<String> {
    let coords: Vec<&str> = points
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .collect();
    if coords.len() < 4 || coords.len() % 2 != 0 {
        return None;
    }
    let mut d = String::new();
    for (i, pair) in coords.chunks(2).enumerate() {
        d.push(if i == 0 { 'M' } else { 'L' });
        d.push_str(pair[0]);
        d.push(',');
        d.push_str(pair[1]);
    }
    d.push('Z');
    Some(d)
}

/// White shapes take the fill colour; everything else is line work.
fn shape_role(node: &Node) -> ShapeRole {
    if node
        .attribute("class")
        .is_some_and(|c| c.split_whitespace().any(|c| c == "sym-fill"))
    {
        return ShapeRole::Fill;
    }
    let fill = node.attribute("fill").or_else(|| {
        node.attribute("style")?
            .split(';')
            .filter_map(|decl| decl.split_once(':'))
            .find(|(prop, _)| prop.trim() == "fill")
            .map(|(_, value)| value.trim())
    });
    match fill.map(|f| f.trim().to_ascii_lowercase()) {
        Some(f) if f == "#ffffff" || f == "#fff" || f == "white" => ShapeRole::Fill,
        _ => ShapeRole::Line,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    const HAND: &str = r##"<?xml version="1.0" standalone="no"?>
<!DOCTYPE svg PUBLIC "-//W3C//DTD SVG 20010904//EN" "http://www.w3.org/TR/2001/REC-SVG-20010904/DTD/svg10.dtd">
<svg version="1.0" xmlns="http://www.w3.org/2000/svg" width="30" height="21">
<metadata>S1000f</metadata>
<g transform="scale(0.938 0.913) translate(10.667 -9) rotate(315) scale(-1,1)">
    <rect id="index" x="13" y="0" width="2" height="15" fill="#000000" />
    <rect id="base" x="0" y="15" width="15" height="15" fill="#000000" />
    <rect id="fill" x="2" y="17" width="11" height="11" fill="#ffffff" />
</g>
</svg>"##;

    #[test]
    fn parses_iswa_glyph() {
        let record = parse_glyph_svg("S10000.svg", HAND).unwrap();
        assert_eq!(record.bounds.width, 30.0);
        assert_eq!(record.bounds.height, 21.0);
        assert_eq!(record.anchor, (0.0, 0.0));
        assert_eq!(record.shapes.len(), 3);
        assert_eq!(record.shapes[0].d, "M13,0h2v15h-2Z");
        assert_eq!(record.shapes[0].role, ShapeRole::Line);
        assert_eq!(record.shapes[2].role, ShapeRole::Fill);
        assert_eq!(
            record.shapes[1].transform.as_deref(),
            Some("scale(0.938 0.913) translate(10.667 -9) rotate(315) scale(-1,1)")
        );
    }

    #[test]
    fn view_box_and_circles() {
        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 20 10">
            <circle cx="5" cy="5" r="5" style="fill: white"/>
            <polygon points="0,0 10,0 10,10"/>
        </svg>"#;
        let record = parse_glyph_svg("S2ff00.svg", svg).unwrap();
        assert_eq!((record.bounds.width, record.bounds.height), (20.0, 10.0));
        assert_eq!(record.shapes[0].d, "M0,5a5,5 0 1,0 10,0a5,5 0 1,0 -10,0Z");
        assert_eq!(record.shapes[0].role, ShapeRole::Fill);
        assert_eq!(record.shapes[1].d, "M0,0L10,0L10,10Z");
    }

    #[test]
    fn rejects_non_glyphs() {
        assert!(matches!(
            parse_glyph_svg("x.svg", "<html/>"),
            Err(FontError::InvalidGlyph { .. })
        ));
        assert!(matches!(
            parse_glyph_svg("x.svg", "<svg width='1' height='1'/>"),
            Err(FontError::InvalidGlyph { .. })
        ));
        assert!(matches!(
            parse_glyph_svg("x.svg", "<svg"),
            Err(FontError::Xml { .. })
        ));
    }

    #[test]
    fn loads_archive_entries() {
        let mut buf = Cursor::new(Vec::new());
        {
            let mut zip = ZipWriter::new(&mut buf);
            let options = SimpleFileOptions::default();
            for name in ["iswa/S10000.svg", "iswa/S10001.svg", "iswa/README.txt"] {
                zip.start_file(name, options).unwrap();
                zip.write_all(HAND.as_bytes()).unwrap();
            }
            zip.finish().unwrap();
        }

        let store = load_archive(buf.get_ref()).unwrap();
        assert_eq!(store.len(), 1);
        let key = store.keys().next().unwrap();
        assert_eq!(key.to_string(), "S1000");
    }

    #[test]
    fn rejects_non_zip() {
        assert!(matches!(
            load_archive(b"not a zip"),
            Err(FontError::Archive(_))
        ));
    }
}
