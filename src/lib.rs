//! swrender — Kartesian SignWriting parser and SVG sign renderer.
//!
//! A notation string such as `M40x69S35000n18xn18S14c2017x15` is parsed into
//! a [`Sign`], every symbol is resolved to a vector glyph through a
//! [`GlyphResolver`], and the placed glyphs are serialized as one SVG
//! document.
//!
//! # Example
//! ```no_run
//! use swrender::{open_font_store, render, RenderOptions};
//!
//! let store = open_font_store("glyphs.zip").unwrap();
//! let svg = render("M40x69S35000n18xn18", &store, &RenderOptions::default()).unwrap();
//! println!("{svg}");
//! ```

pub mod error;
pub mod font;
pub mod model;
pub mod numeral;
pub mod options;
pub mod parser;
pub mod renderer;

#[cfg(target_os = "android")]
pub mod android;

use std::path::Path;

pub use error::{ConfigError, ErrorKind, FontError, RenderError, Result};
pub use font::{open_font_store, GlyphResolver, MemoryFontStore};
pub use model::*;
pub use options::{BoundsPolicy, ColorScheme, Framing, RenderOptions};
pub use parser::{is_expanded, is_panel, is_valid, parse_notation, parse_notation_with};
pub use renderer::{compose, serialize};

/// Parse a notation string and render it to an SVG document.
pub fn render<R>(notation: &str, resolver: &R, options: &RenderOptions) -> Result<String>
where
    R: GlyphResolver + ?Sized,
{
    let sign = parse_notation_with(notation, &options.colors)?;
    let canvas = compose(&sign, resolver, options)?;
    Ok(serialize(&canvas))
}

/// Render many notation strings against one glyph store.
///
/// Each string is rendered independently; one failure does not affect the
/// others.
pub fn render_batch<R, S>(notations: &[S], resolver: &R, options: &RenderOptions) -> Vec<Result<String>>
where
    R: GlyphResolver + ?Sized,
    S: AsRef<str>,
{
    notations
        .iter()
        .map(|n| render(n.as_ref(), resolver, options))
        .collect()
}

/// Open the glyph store at `font_path` and render one notation string.
pub fn render_file<P: AsRef<Path>>(
    notation: &str,
    font_path: P,
    options: &RenderOptions,
) -> Result<String> {
    let store = open_font_store(font_path)?;
    render(notation, &store, options)
}

/// Convert a parsed sign to a JSON string.
/// Useful for passing data across FFI boundaries.
pub fn sign_to_json(sign: &Sign) -> std::result::Result<String, serde_json::Error> {
    serde_json::to_string_pretty(sign)
}

// ═══════════════════════════════════════════════════════════════════════
// C FFI — for iOS (static library) and Android (JNI)
// ═══════════════════════════════════════════════════════════════════════

use std::ffi::{CStr, CString};
use std::os::raw::c_char;

/// Render a notation string with the glyph store at `font_path` and return
/// the SVG document as a C string, or null on any failure.
/// The caller must free the returned string with `swrender_free_string`.
///
/// # Safety
/// `notation` and `font_path` must be valid null-terminated UTF-8 C strings.
#[no_mangle]
pub unsafe extern "C" fn swrender_render(
    notation: *const c_char,
    font_path: *const c_char,
) -> *mut c_char {
    if notation.is_null() || font_path.is_null() {
        return std::ptr::null_mut();
    }
    let notation = match unsafe { CStr::from_ptr(notation) }.to_str() {
        Ok(s) => s,
        Err(_) => return std::ptr::null_mut(),
    };
    let font_path = match unsafe { CStr::from_ptr(font_path) }.to_str() {
        Ok(s) => s,
        Err(_) => return std::ptr::null_mut(),
    };

    match render_file(notation, font_path, &RenderOptions::default()) {
        Ok(svg) => CString::new(svg).unwrap_or_default().into_raw(),
        Err(e) => {
            log::debug!("render failed: {e}");
            std::ptr::null_mut()
        }
    }
}

/// Free a string previously returned by swrender functions.
///
/// # Safety
/// `ptr` must be a string previously returned by a swrender function, or null.
#[no_mangle]
pub unsafe extern "C" fn swrender_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        unsafe {
            let _ = CString::from_raw(ptr);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blocks(_: &GlyphKey) -> Result<GlyphRecord> {
        Ok(GlyphRecord::top_left(Vec::new(), 4.0, 4.0))
    }

    #[test]
    fn batch_renders_independently() {
        let results = render_batch(
            &["M10x10S1000010x10", "M10x10S9zz00", "B5x5"],
            &blocks,
            &RenderOptions::default(),
        );
        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert_eq!(results[1].as_ref().unwrap_err().kind(), ErrorKind::MalformedNotation);
        assert!(results[2].is_ok());
    }

    #[test]
    fn sign_json_has_symbols() {
        let sign = parse_notation("M18x33S1870an11x15").unwrap();
        let json = sign_to_json(&sign).unwrap();
        assert!(json.contains("\"symbols\""));
        assert!(json.contains("\"Middle\""));
    }

    #[test]
    fn ffi_rejects_null_and_missing_store() {
        let notation = CString::new("M18x33S1870an11x15").unwrap();
        let missing = CString::new("/nonexistent/glyphs.json").unwrap();
        unsafe {
            assert!(swrender_render(std::ptr::null(), missing.as_ptr()).is_null());
            assert!(swrender_render(notation.as_ptr(), missing.as_ptr()).is_null());
            swrender_free_string(std::ptr::null_mut());
        }
    }
}
