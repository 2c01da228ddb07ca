//! Merge the per-stave timelines into one score-wide cursor timeline.
//!
//! Stops from different staves that start at (almost) the same time become
//! a single cursor stop whose box covers all of them.  Equality is checked
//! with `COALESCE_EPSILON_MS` because staves under different signatures
//! accumulate slightly different rounding.

use tracing::{debug, warn};

use crate::error::Result;
use crate::layout::ScoreLayout;
use crate::model::{CursorStop, CursorSystemData, Instrument};
use crate::options::{TimelineOptions, COALESCE_EPSILON_MS};
use crate::stave_timeline::StaveTimeline;

/// Builds `CursorSystemData` from a rendered layout.
#[derive(Debug, Clone, Default)]
pub struct TimelineMerger {
    options: TimelineOptions,
}

/// Read cursor into one stave's stops.
#[derive(Debug, Clone, Copy, Default)]
struct StaveCursor {
    next: usize,
    /// Index of the stop most recently consumed from this stave
    last: Option<usize>,
}

impl TimelineMerger {
    pub fn new(options: TimelineOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &TimelineOptions {
        &self.options
    }

    /// Build every stave's timeline and merge them.
    ///
    /// A stave that fails to build is logged and contributes an empty
    /// timeline; the remaining staves are merged as usual.  Only invalid
    /// options are an error.
    pub fn calculate(&self, layout: &ScoreLayout) -> Result<CursorSystemData> {
        self.options.validate()?;
        let beat_ms = self.options.beat_duration_ms;

        let timelines: Vec<StaveTimeline> = layout
            .staves
            .iter()
            .enumerate()
            .map(|(i, stave)| {
                StaveTimeline::build(i, &stave.measures, &layout.systems, beat_ms)
                    .unwrap_or_else(|e| {
                        warn!(stave = i, error = %e, "stave timeline failed to build; using an empty one");
                        StaveTimeline::empty(i)
                    })
            })
            .collect();

        // Read once per stave, independent of how many notes it holds.
        let instruments: Vec<Instrument> = layout
            .staves
            .iter()
            .map(|stave| stave.instrument.clone())
            .collect();

        Ok(merge_timelines(
            &timelines,
            instruments,
            layout.systems_per_page(),
            beat_ms,
        ))
    }
}

/// K-way merge of prebuilt stave timelines.
///
/// Repeatedly takes the earliest unconsumed time across all staves (the
/// wavefront), folds every stave whose next stop lies within the tolerance
/// of it into one output stop, and advances exactly those staves.
pub fn merge_timelines(
    timelines: &[StaveTimeline],
    instrument_per_stave: Vec<Instrument>,
    number_of_systems_per_page: Vec<usize>,
    beat_duration_in_millis: f64,
) -> CursorSystemData {
    let mut cursors = vec![StaveCursor::default(); timelines.len()];
    let mut positions: Vec<CursorStop> = Vec::new();

    while let Some(wavefront) = wavefront_time(timelines, &cursors) {
        let contributors: Vec<usize> = timelines
            .iter()
            .zip(&cursors)
            .enumerate()
            .filter(|(_, (timeline, cursor))| {
                timeline
                    .positions()
                    .get(cursor.next)
                    .is_some_and(|stop| (stop.time - wavefront).abs() < COALESCE_EPSILON_MS)
            })
            .map(|(i, _)| i)
            .collect();

        let mut merged: Option<CursorStop> = None;
        for &stave in &contributors {
            let stop = &timelines[stave].positions()[cursors[stave].next];
            match merged.as_mut() {
                None => {
                    let mut first = stop.clone();
                    first.index = positions.len();
                    first.time = wavefront;
                    merged = Some(first);
                }
                Some(target) => absorb(target, stop),
            }
            cursors[stave].last = Some(cursors[stave].next);
            cursors[stave].next += 1;
        }

        let Some(mut merged) = merged else {
            break;
        };

        // A stave silent at this instant still bounds the cursor's
        // vertical reach with its previous stop.
        for (stave, cursor) in cursors.iter().enumerate() {
            if contributors.contains(&stave) {
                continue;
            }
            if let Some(last) = cursor.last {
                let previous = &timelines[stave].positions()[last];
                merged.bounding_box.merge_vertical(&previous.bounding_box);
            }
        }

        positions.push(merged);
    }

    let data = CursorSystemData {
        beat_duration_in_millis,
        bars_count: timelines
            .iter()
            .map(StaveTimeline::total_bars_count)
            .max()
            .unwrap_or(0),
        metronome: timelines
            .iter()
            .map(|t| t.time_signatures().to_vec())
            .collect(),
        positions,
        duration: timelines
            .iter()
            .map(StaveTimeline::total_duration)
            .fold(0.0, f64::max),
        instrument_per_stave,
        number_of_systems_per_page,
    };

    debug!(
        staves = timelines.len(),
        stops = data.positions.len(),
        duration_ms = data.duration,
        "merged cursor timeline"
    );

    data
}

/// Earliest time among the staves' next stops, `None` once all are
/// exhausted.
fn wavefront_time(timelines: &[StaveTimeline], cursors: &[StaveCursor]) -> Option<f64> {
    timelines
        .iter()
        .zip(cursors)
        .filter_map(|(timeline, cursor)| timeline.positions().get(cursor.next))
        .map(|stop| stop.time)
        .reduce(f64::min)
}

/// Fold a later contributor into the stop being built.  The measure stays
/// that of the first contributor; placement comes from the first
/// contributor that has one.
fn absorb(target: &mut CursorStop, stop: &CursorStop) {
    if target.page_index.is_none() && stop.page_index.is_some() {
        target.page_index = stop.page_index;
        target.system_index = stop.system_index;
    }
    target.notes.extend(stop.notes.iter().cloned());
    target.bounding_box.merge_vertical(&stop.bounding_box);
    target
        .bounding_box
        .merge_horizontal(stop.bounding_box.start_x, stop.bounding_box.width);
}
