//! JNI bindings for Android.
//!
//! These functions are called from Kotlin via the JNI bridge.

use jni::objects::{JClass, JString};
use jni::sys::jstring;
use jni::JNIEnv;

use crate::build_cursor_system_json;

/// Build the cursor timeline from a JSON layout.
///
/// Called from Kotlin as:
///   external fun buildCursorSystem(layoutJson: String, optionsJson: String?): String?
#[no_mangle]
pub extern "system" fn Java_com_scorecursor_CursorLib_buildCursorSystem(
    mut env: JNIEnv,
    _class: JClass,
    layout_json: JString,
    options_json: JString,
) -> jstring {
    let layout: String = match env.get_string(&layout_json) {
        Ok(s) => s.into(),
        Err(_) => return std::ptr::null_mut(),
    };

    let options: Option<String> = if options_json.is_null() {
        None
    } else {
        match env.get_string(&options_json) {
            Ok(s) => Some(s.into()),
            Err(_) => return std::ptr::null_mut(),
        }
    };

    match build_cursor_system_json(&layout, options.as_deref()) {
        Ok(json) => match env.new_string(&json) {
            Ok(js) => js.into_raw(),
            Err(_) => std::ptr::null_mut(),
        },
        Err(e) => {
            tracing::warn!(error = %e, "failed to build cursor system");
            std::ptr::null_mut()
        }
    }
}
