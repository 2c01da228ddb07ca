//! Tunables for timeline construction and cursor navigation.
//!
//! Every field has a default, so hosts only need to send the values they
//! want to override, e.g. `{"timeline": {"beat_duration_ms": 375}}`.

use serde::{Deserialize, Serialize};

use crate::error::{CursorError, Result};

/// Absolute tolerance (ms) under which stops on different staves are
/// considered simultaneous during the merge.
pub const COALESCE_EPSILON_MS: f64 = 0.001;

/// Beat length used when no options are given (120 BPM).
pub const DEFAULT_BEAT_DURATION_MS: f64 = 500.0;

/// Options for the whole engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CursorOptions {
    pub timeline: TimelineOptions,
    pub navigator: NavigatorOptions,
}

/// Options controlling how staff entries are mapped to milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineOptions {
    /// Fixed duration of one beat in milliseconds. Times are derived from
    /// this, not measured from audio.
    pub beat_duration_ms: f64,
}

impl Default for TimelineOptions {
    fn default() -> Self {
        Self {
            beat_duration_ms: DEFAULT_BEAT_DURATION_MS,
        }
    }
}

/// Options controlling cursor placement and page preview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigatorOptions {
    /// Added to a page's horizontal midline before testing whether the
    /// cursor has crossed it (screen pixels).
    pub preview_x_correction: f64,
    /// Vertical offset applied to the cursor rectangle (screen pixels).
    pub cursor_y_offset: f64,
}

impl Default for NavigatorOptions {
    fn default() -> Self {
        Self {
            preview_x_correction: 0.0,
            cursor_y_offset: -5.0,
        }
    }
}

impl CursorOptions {
    /// Parse options from JSON and validate them.
    pub fn from_json(json: &str) -> Result<Self> {
        let options: CursorOptions = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<()> {
        self.timeline.validate()
    }
}

impl TimelineOptions {
    pub fn validate(&self) -> Result<()> {
        let beat = self.beat_duration_ms;
        if !beat.is_finite() || beat <= 0.0 {
            return Err(CursorError::InvalidOptions(format!(
                "beat_duration_ms must be a positive number, got {beat}"
            )));
        }
        Ok(())
    }
}
