//! Per-stave timeline: turns one stave's measures into time-stamped
//! cursor stops.  This answers "when does each staff entry sound?" in
//! milliseconds, using a fixed beat duration and the time signature in
//! effect at each bar.

use tracing::{debug, warn};

use crate::error::{CursorError, Result};
use crate::layout::{MeasureLayout, StaffEntryLayout, SystemPlacement};
use crate::model::{CursorStop, NoteEvent, TimeSignature};

/// The ordered cursor stops of a single stave.
///
/// Built once per render pass and replaced wholesale afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct StaveTimeline {
    stave_index: usize,
    total_bars_count: usize,
    total_duration: f64,
    time_signatures: Vec<TimeSignature>,
    positions: Vec<CursorStop>,
}

/// Timing of one bar, derived from the active signature.
#[derive(Debug, Clone, Copy)]
struct BarTiming {
    start_ms: f64,
    duration_ms: f64,
    beats: f64,
    /// Measure length in whole-note fractions
    length: f64,
}

impl StaveTimeline {
    /// A stave with no bars.
    pub fn empty(stave_index: usize) -> Self {
        Self {
            stave_index,
            total_bars_count: 0,
            total_duration: 0.0,
            time_signatures: Vec::new(),
            positions: Vec::new(),
        }
    }

    /// Build the timeline of one stave.
    ///
    /// `systems` is the rendering backend's system table, indexed by the
    /// system id a measure refers to.  Fails on a measure whose duration,
    /// signature, or entries cannot be mapped to time.
    pub fn build(
        stave_index: usize,
        measures: &[MeasureLayout],
        systems: &[SystemPlacement],
        beat_duration_ms: f64,
    ) -> Result<Self> {
        let mut time_signatures: Vec<TimeSignature> = Vec::new();
        let mut positions: Vec<CursorStop> = Vec::new();
        let mut total_duration = 0.0;

        for (bar_index, measure) in measures.iter().enumerate() {
            validate_measure(stave_index, bar_index, measure)?;

            // Signatures only change at bar boundaries.
            if let Some(rhythm) = measure.rhythm {
                time_signatures.push(TimeSignature {
                    bar_index,
                    beats_per_measure: rhythm.numerator,
                    note_duration: rhythm.denominator,
                    real_value: rhythm.real_value(),
                });
            }
            let signature = match time_signatures.last() {
                Some(ts) => *ts,
                None => {
                    time_signatures.push(TimeSignature::COMMON_TIME);
                    TimeSignature::COMMON_TIME
                }
            };

            // Proportional to the signature's note value, so pickup bars
            // get a proportionally shorter duration.
            let beats = signature.beats_per_measure as f64 * (measure.duration / signature.real_value);
            let bar = BarTiming {
                start_ms: total_duration,
                duration_ms: beat_duration_ms * beats,
                beats,
                length: measure.duration,
            };
            total_duration += bar.duration_ms;

            let placement = resolve_system(stave_index, bar_index, measure, systems);

            let mut entries: Vec<&StaffEntryLayout> = measure.staff_entries.iter().collect();
            entries.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));

            for entry in entries {
                let stop = build_stop(
                    positions.len(),
                    stave_index,
                    bar_index,
                    &bar,
                    entry,
                    placement,
                );
                if let Some(stop) = stop {
                    positions.push(stop);
                }
            }
        }

        debug!(
            stave = stave_index,
            bars = measures.len(),
            stops = positions.len(),
            duration_ms = total_duration,
            "built stave timeline"
        );

        Ok(Self {
            stave_index,
            total_bars_count: measures.len(),
            total_duration,
            time_signatures,
            positions,
        })
    }

    #[cfg(test)]
    pub(crate) fn from_stops(stave_index: usize, positions: Vec<CursorStop>) -> Self {
        Self {
            stave_index,
            total_bars_count: 0,
            total_duration: positions.last().map_or(0.0, |s| s.time),
            time_signatures: Vec::new(),
            positions,
        }
    }

    pub fn stave_index(&self) -> usize {
        self.stave_index
    }

    pub fn total_bars_count(&self) -> usize {
        self.total_bars_count
    }

    /// Sum of all bar durations in milliseconds.
    pub fn total_duration(&self) -> f64 {
        self.total_duration
    }

    pub fn time_signatures(&self) -> &[TimeSignature] {
        &self.time_signatures
    }

    pub fn last_time_signature(&self) -> Option<&TimeSignature> {
        self.time_signatures.last()
    }

    /// The signature governing `bar_index`.  Falls back to 4/4 for an
    /// empty stave.
    pub fn time_signature_at(&self, bar_index: usize) -> TimeSignature {
        let after = self
            .time_signatures
            .partition_point(|ts| ts.bar_index <= bar_index);
        match after.checked_sub(1) {
            Some(i) => self.time_signatures[i],
            None => TimeSignature::COMMON_TIME,
        }
    }

    pub fn positions(&self) -> &[CursorStop] {
        &self.positions
    }

    pub fn last_position(&self) -> Option<&CursorStop> {
        self.positions.last()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

fn validate_measure(stave: usize, bar: usize, measure: &MeasureLayout) -> Result<()> {
    let invalid = |reason: String| CursorError::InvalidMeasure { stave, bar, reason };

    if !measure.duration.is_finite() || measure.duration <= 0.0 {
        return Err(invalid(format!("duration must be positive, got {}", measure.duration)));
    }
    if let Some(rhythm) = measure.rhythm {
        if rhythm.numerator == 0 || rhythm.denominator == 0 {
            return Err(invalid(format!(
                "time signature {}/{} is degenerate",
                rhythm.numerator, rhythm.denominator
            )));
        }
    }
    for entry in &measure.staff_entries {
        if !entry.timestamp.is_finite() || entry.timestamp < 0.0 || entry.timestamp > measure.duration {
            return Err(invalid(format!("staff entry timestamp {} is out of range", entry.timestamp)));
        }
        if let Some(note) = entry.notes.iter().find(|n| !n.length.is_finite() || n.length < 0.0) {
            return Err(invalid(format!("note length {} is out of range", note.length)));
        }
    }
    Ok(())
}

fn resolve_system<'a>(
    stave: usize,
    bar: usize,
    measure: &MeasureLayout,
    systems: &'a [SystemPlacement],
) -> Option<&'a SystemPlacement> {
    let id = measure.system?;
    let placement = systems.get(id);
    if placement.is_none() {
        warn!(stave, bar, system = id, "measure refers to an unknown system; treating it as unrendered");
    }
    placement
}

/// Build the stop for one staff entry, or `None` if none of its notes is
/// print-visible.
fn build_stop(
    index: usize,
    stave_index: usize,
    bar_index: usize,
    bar: &BarTiming,
    entry: &StaffEntryLayout,
    placement: Option<&SystemPlacement>,
) -> Option<CursorStop> {
    let relative = entry.timestamp / bar.length;
    let time = bar.start_ms + relative * bar.duration_ms;
    let beat_index = if entry.timestamp != 0.0 {
        (bar.beats * entry.timestamp / bar.length).floor().max(0.0) as usize
    } else {
        0
    };

    let mut stop = CursorStop::new(index, time, bar_index);
    if let Some(system) = placement {
        stop.page_index = Some(system.page_index);
        stop.system_index = Some(system.index);
        stop.bounding_box.start_y = system.start_y;
        stop.bounding_box.end_y = system.end_y;
    }

    for note in entry.notes.iter().filter(|n| n.visible) {
        stop.notes.push(NoteEvent {
            stave_index,
            bar_index,
            beat_index,
            time,
            pitch: note.pitch,
            duration: note.length / bar.length * bar.duration_ms,
        });
        // Glyph geometry only means something on a rendered system.
        if placement.is_some() {
            for glyph in &note.glyphs {
                stop.bounding_box.merge_horizontal(glyph.x, glyph.width);
            }
        }
    }

    if stop.notes.is_empty() {
        None
    } else {
        Some(stop)
    }
}
