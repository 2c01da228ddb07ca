//! Error type shared by the timeline builders, the navigator and the host
//! bindings.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CursorError {
    /// A navigator query ran before any `CursorSystemData` was loaded.
    /// This is a caller ordering bug, not a data problem.
    #[error("cursor timeline has not been built yet")]
    TimelineNotBuilt,

    #[error("invalid measure {bar} on stave {stave}: {reason}")]
    InvalidMeasure {
        stave: usize,
        bar: usize,
        reason: String,
    },

    #[error("invalid view geometry: {0}")]
    InvalidGeometry(String),

    #[error("invalid options: {0}")]
    InvalidOptions(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CursorError>;
