//! scorecursor — playback cursor timeline for paginated, multi-stave scores.
//!
//! Turns the engraving engine's per-stave measures into one time-ordered,
//! page-aware list of cursor stops, and answers "where is the cursor at
//! time T" and "which stop did the user click" during playback.
//!
//! # Example
//! ```no_run
//! use scorecursor::{CursorNavigator, CursorOptions, ScoreLayout, TimelineMerger, ViewGeometry};
//! # use scorecursor::{CursorRect, DisplaySurface};
//! # struct Surface;
//! # impl DisplaySurface for Surface {
//! #     fn jump_to_page(&mut self, _: usize) -> bool { true }
//! #     fn place_cursor(&mut self, _: CursorRect) {}
//! #     fn hide_cursor(&mut self) {}
//! #     fn show_page_preview(&mut self, _: usize, _: usize) -> bool { true }
//! #     fn hide_page_preview(&mut self) {}
//! # }
//!
//! let layout = ScoreLayout::from_json(&std::fs::read_to_string("layout.json").unwrap()).unwrap();
//! let options = CursorOptions::default();
//! let data = TimelineMerger::new(options.timeline.clone()).calculate(&layout).unwrap();
//!
//! let mut navigator = CursorNavigator::new(Surface, options.navigator);
//! navigator.set_system_data(data, ViewGeometry::side_by_side(2, 800.0, 1100.0, 1.0).unwrap());
//! navigator.set_play_mode(true);
//! navigator.set_time(1250.0).unwrap();
//! ```

pub mod error;
pub mod geometry;
pub mod layout;
pub mod merger;
pub mod model;
pub mod navigator;
pub mod options;
pub mod stave_timeline;

#[cfg(target_os = "android")]
pub mod android;

pub use error::{CursorError, Result};
pub use geometry::{CursorRect, PageGeometry, Point, ViewGeometry};
pub use layout::*;
pub use merger::{merge_timelines, TimelineMerger};
pub use model::*;
pub use navigator::{CursorNavigator, CursorState, DisplaySurface};
pub use options::{CursorOptions, NavigatorOptions, TimelineOptions};
pub use stave_timeline::StaveTimeline;

/// Build the cursor timeline for a layout with the given options.
pub fn build_cursor_system(layout: &ScoreLayout, options: &CursorOptions) -> Result<CursorSystemData> {
    TimelineMerger::new(options.timeline.clone()).calculate(layout)
}

/// Build the cursor timeline from a JSON layout and return it as JSON.
/// Useful for passing data across FFI boundaries.
///
/// `options_json` may be `None` to use the defaults.
pub fn build_cursor_system_json(layout_json: &str, options_json: Option<&str>) -> Result<String> {
    let layout = ScoreLayout::from_json(layout_json)?;
    let options = match options_json {
        Some(json) => CursorOptions::from_json(json)?,
        None => CursorOptions::default(),
    };
    build_cursor_system(&layout, &options)?.to_json()
}

// ═══════════════════════════════════════════════════════════════════════
// C FFI — for iOS (static library) and Android (JNI)
// ═══════════════════════════════════════════════════════════════════════

use std::ffi::{CStr, CString};
use std::os::raw::c_char;

/// Build the cursor timeline from a JSON layout and return it as a JSON
/// C string, or null on failure.
/// The caller must free the returned string with `scorecursor_free_string`.
///
/// # Safety
/// `layout_json` must be a valid null-terminated UTF-8 C string.
/// `options_json` may be null.
#[no_mangle]
pub unsafe extern "C" fn scorecursor_build_cursor_system(
    layout_json: *const c_char,
    options_json: *const c_char,
) -> *mut c_char {
    if layout_json.is_null() {
        return std::ptr::null_mut();
    }
    let layout = match unsafe { CStr::from_ptr(layout_json) }.to_str() {
        Ok(s) => s,
        Err(_) => return std::ptr::null_mut(),
    };
    let options = if options_json.is_null() {
        None
    } else {
        match unsafe { CStr::from_ptr(options_json) }.to_str() {
            Ok(s) => Some(s),
            Err(_) => return std::ptr::null_mut(),
        }
    };

    match build_cursor_system_json(layout, options) {
        Ok(json) => CString::new(json).unwrap_or_default().into_raw(),
        Err(e) => {
            tracing::warn!(error = %e, "failed to build cursor system");
            std::ptr::null_mut()
        }
    }
}

/// Free a string previously returned by scorecursor functions.
///
/// # Safety
/// `ptr` must be a string previously returned by a scorecursor function, or null.
#[no_mangle]
pub unsafe extern "C" fn scorecursor_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        unsafe {
            let _ = CString::from_raw(ptr);
        }
    }
}
