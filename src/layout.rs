//! Input handed over by the engraving engine and the rendering backend.
//!
//! The core never engraves anything itself. It receives, per stave, the
//! ordered measures with their staff entries and notes, plus the vertical
//! bounds of every rendered system and the glyph boxes of every note.
//! All durations are fractions of a whole note (a 3/4 measure is `0.75`).

use serde::{Deserialize, Serialize};

use crate::model::Instrument;

/// A complete rendered score, as seen by the cursor engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoreLayout {
    pub staves: Vec<StaveLayout>,
    /// Vertical bounds of every rendered system, indexed by system id
    #[serde(default)]
    pub systems: Vec<SystemPlacement>,
    /// Number of systems on each page. Derived from `systems` when empty.
    #[serde(default)]
    pub number_of_systems_per_page: Vec<usize>,
}

/// Placement of one rendered system (line of music).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SystemPlacement {
    /// Index of the system within its page
    pub index: usize,
    pub page_index: usize,
    pub start_y: f64,
    pub end_y: f64,
}

/// One instrumental or vocal line.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaveLayout {
    #[serde(default)]
    pub instrument: Instrument,
    pub measures: Vec<MeasureLayout>,
}

/// One measure of one stave.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeasureLayout {
    /// Actual length of the measure (shorter than the signature for pickups)
    pub duration: f64,
    /// Time signature declared by the measure's first instructions
    #[serde(default)]
    pub rhythm: Option<Rhythm>,
    /// Rendering system id; absent when the measure is not rendered
    #[serde(default)]
    pub system: Option<usize>,
    #[serde(default)]
    pub staff_entries: Vec<StaffEntryLayout>,
}

/// A time signature instruction, e.g. 6/8.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rhythm {
    pub numerator: u32,
    pub denominator: u32,
}

impl Rhythm {
    pub fn real_value(&self) -> f64 {
        self.numerator as f64 / self.denominator as f64
    }
}

/// A group of notes starting at the same time within a measure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffEntryLayout {
    /// Onset relative to the measure start
    pub timestamp: f64,
    pub notes: Vec<NoteLayout>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoteLayout {
    pub length: f64,
    /// Half-tone number; absent for rests
    #[serde(default)]
    pub pitch: Option<i32>,
    /// Print-visibility. Invisible notes never produce events.
    #[serde(default = "visible_by_default")]
    pub visible: bool,
    /// Notehead boxes reported by the renderer
    #[serde(default)]
    pub glyphs: Vec<GlyphBox>,
}

fn visible_by_default() -> bool {
    true
}

/// Horizontal extent of one rendered notehead, in page-local score units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GlyphBox {
    pub x: f64,
    pub width: f64,
}

impl MeasureLayout {
    pub fn new(duration: f64) -> Self {
        Self {
            duration,
            rhythm: None,
            system: None,
            staff_entries: Vec::new(),
        }
    }

    pub fn with_rhythm(mut self, numerator: u32, denominator: u32) -> Self {
        self.rhythm = Some(Rhythm {
            numerator,
            denominator,
        });
        self
    }

    pub fn on_system(mut self, system: usize) -> Self {
        self.system = Some(system);
        self
    }

    pub fn with_entry(mut self, timestamp: f64, notes: Vec<NoteLayout>) -> Self {
        self.staff_entries.push(StaffEntryLayout { timestamp, notes });
        self
    }
}

impl NoteLayout {
    pub fn pitched(length: f64, pitch: i32) -> Self {
        Self {
            length,
            pitch: Some(pitch),
            visible: true,
            glyphs: Vec::new(),
        }
    }

    pub fn rest(length: f64) -> Self {
        Self {
            length,
            pitch: None,
            visible: true,
            glyphs: Vec::new(),
        }
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn with_glyph(mut self, x: f64, width: f64) -> Self {
        self.glyphs.push(GlyphBox { x, width });
        self
    }
}

impl ScoreLayout {
    /// Systems per page, either as supplied or counted from `systems`.
    pub fn systems_per_page(&self) -> Vec<usize> {
        if !self.number_of_systems_per_page.is_empty() {
            return self.number_of_systems_per_page.clone();
        }
        let mut counts: Vec<usize> = Vec::new();
        for system in &self.systems {
            if counts.len() <= system.page_index {
                counts.resize(system.page_index + 1, 0);
            }
            counts[system.page_index] += 1;
        }
        counts
    }

    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
