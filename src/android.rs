//! JNI bindings for Android.
//!
//! These functions are called from Kotlin via the JNI bridge.

use jni::objects::{JClass, JString};
use jni::sys::jstring;
use jni::JNIEnv;

use crate::{render_file, RenderOptions};

/// Render a notation string with the glyph store at `font_path` to SVG.
///
/// Called from Kotlin as:
///   external fun renderNotation(notation: String, fontPath: String): String?
#[no_mangle]
pub extern "system" fn Java_org_signwriting_swrender_SignWriting_renderNotation(
    mut env: JNIEnv,
    _class: JClass,
    notation: JString,
    font_path: JString,
) -> jstring {
    let notation: String = match env.get_string(&notation) {
        Ok(s) => s.into(),
        Err(_) => return std::ptr::null_mut(),
    };
    let font_path: String = match env.get_string(&font_path) {
        Ok(s) => s.into(),
        Err(_) => return std::ptr::null_mut(),
    };

    match render_file(&notation, &font_path, &RenderOptions::default()) {
        Ok(svg) => match env.new_string(&svg) {
            Ok(js) => js.into_raw(),
            Err(_) => std::ptr::null_mut(),
        },
        Err(e) => {
            log::debug!("render failed: {e}");
            std::ptr::null_mut()
        }
    }
}
