//! Data model for the cursor timeline.
//!
//! These are plain value types derived from the current layout. They are
//! rebuilt wholesale on every render and never patched in place.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A time signature in effect from `bar_index` (inclusive) until the next
/// entry's `bar_index`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeSignature {
    pub bar_index: usize,
    /// Numerator (e.g., 3 in 3/4)
    pub beats_per_measure: u32,
    /// Denominator (e.g., 4 in 3/4)
    pub note_duration: u32,
    /// Length of one full measure as a fraction of a whole note (3/4 → 0.75)
    pub real_value: f64,
}

impl TimeSignature {
    /// 4/4, used when nothing is declared before the first bar.
    pub const COMMON_TIME: TimeSignature = TimeSignature {
        bar_index: 0,
        beats_per_measure: 4,
        note_duration: 4,
        real_value: 1.0,
    };
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self::COMMON_TIME
    }
}

/// A single sounding (or resting) note as seen by the cursor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NoteEvent {
    pub stave_index: usize,
    pub bar_index: usize,
    pub beat_index: usize,
    /// Onset in milliseconds from the start of the score
    pub time: f64,
    /// Half-tone number, `None` for a rest
    pub pitch: Option<i32>,
    /// Duration in milliseconds
    pub duration: f64,
}

impl NoteEvent {
    pub fn is_rest(&self) -> bool {
        self.pitch.is_none()
    }
}

/// Box of a cursor stop in page-local score units.
///
/// Unresolved edges are infinite: `start_x`/`width`/`start_y` start at
/// `+inf` and `end_y` at `-inf`, so min/max unions work without special
/// cases. Such values serialize as `null`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    pub start_x: f64,
    pub width: f64,
    pub start_y: f64,
    pub end_y: f64,
}

impl BoundingBox {
    pub const UNRESOLVED: BoundingBox = BoundingBox {
        start_x: f64::INFINITY,
        width: f64::INFINITY,
        start_y: f64::INFINITY,
        end_y: f64::NEG_INFINITY,
    };

    pub fn has_horizontal(&self) -> bool {
        self.start_x.is_finite() && self.width.is_finite()
    }

    pub fn has_vertical(&self) -> bool {
        self.start_y.is_finite() && self.end_y.is_finite()
    }

    pub fn is_resolved(&self) -> bool {
        self.has_horizontal() && self.has_vertical()
    }

    pub fn height(&self) -> f64 {
        self.end_y - self.start_y
    }

    /// Take the left-most horizontal extent of the two.
    pub(crate) fn merge_horizontal(&mut self, start_x: f64, width: f64) {
        if self.start_x > start_x {
            self.start_x = start_x;
            self.width = width;
        }
    }

    /// Grow the vertical span to cover `other`.
    pub(crate) fn merge_vertical(&mut self, other: &BoundingBox) {
        self.start_y = self.start_y.min(other.start_y);
        self.end_y = self.end_y.max(other.end_y);
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::UNRESOLVED
    }
}

/// A discrete point in time the playback cursor can occupy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CursorStop {
    /// Position in the owning sequence (dense, 0-based)
    pub index: usize,
    /// Milliseconds from the start of the score
    pub time: f64,
    pub measure_index: usize,
    /// `None` when the stop exists in time but is not rendered
    pub page_index: Option<usize>,
    /// System index within its page, `None` when not rendered
    pub system_index: Option<usize>,
    pub notes: Vec<NoteEvent>,
    pub bounding_box: BoundingBox,
}

impl CursorStop {
    pub(crate) fn new(index: usize, time: f64, measure_index: usize) -> Self {
        Self {
            index,
            time,
            measure_index,
            page_index: None,
            system_index: None,
            notes: Vec::new(),
            bounding_box: BoundingBox::UNRESOLVED,
        }
    }

    /// Whether the stop has a graphical placement and may become the
    /// displayed cursor state.
    pub fn is_placed(&self) -> bool {
        self.page_index.is_some()
    }
}

/// Per-stave playback metadata, constant for the life of one
/// `CursorSystemData`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instrument {
    /// MIDI program number
    pub midi_id: u8,
    /// Volume in 0.0..=1.0
    pub volume: f32,
    pub tempo_in_bpm: f64,
}

impl Default for Instrument {
    fn default() -> Self {
        Self {
            midi_id: 0,
            volume: 1.0,
            tempo_in_bpm: 120.0,
        }
    }
}

/// The merged, time-ordered cursor timeline for one rendered score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CursorSystemData {
    pub beat_duration_in_millis: f64,
    pub bars_count: usize,
    /// Time signature history, one series per stave
    pub metronome: Vec<Vec<TimeSignature>>,
    /// Merged stops, ordered by time
    pub positions: Vec<CursorStop>,
    /// Total duration in milliseconds (longest stave)
    pub duration: f64,
    pub instrument_per_stave: Vec<Instrument>,
    pub number_of_systems_per_page: Vec<usize>,
}

impl CursorSystemData {
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn position(&self, index: usize) -> Option<&CursorStop> {
        self.positions.get(index)
    }

    /// The last stop starting at or before `time`.
    pub fn find_position(&self, time: f64) -> Option<&CursorStop> {
        find_position(&self.positions, time).map(|i| &self.positions[i])
    }

    pub fn systems_on_page(&self, page_index: usize) -> usize {
        self.number_of_systems_per_page
            .get(page_index)
            .copied()
            .unwrap_or(0)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Predecessor search: index of the greatest stop with `time <= t`.
///
/// Returns `None` if `t` precedes the first stop (or `positions` is empty).
/// On exact ties with several equal times the last of them is returned.
pub fn find_position(positions: &[CursorStop], time: f64) -> Option<usize> {
    let after = positions.partition_point(|stop| stop.time <= time);
    after.checked_sub(1)
}
