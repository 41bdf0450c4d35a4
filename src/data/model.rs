use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::error::{EdrError, Result};
use super::header::Header;
use super::segment::extract_segments;

/// Name of the synthesized first column.
pub const TIME_COLUMN: &str = "time";

// ---------------------------------------------------------------------------
// ExcludedInterval – an experimenter-flagged time range
// ---------------------------------------------------------------------------

/// A time range (seconds, same axis as the time column) to leave out.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExcludedInterval {
    pub start_time: f64,
    pub end_time: f64,
}

impl ExcludedInterval {
    pub fn new(start_time: f64, end_time: f64) -> Result<Self> {
        let interval = ExcludedInterval { start_time, end_time };
        interval.validate()?;
        Ok(interval)
    }

    /// Reject intervals that end before they start.
    pub fn validate(&self) -> Result<()> {
        if self.start_time > self.end_time {
            return Err(EdrError::invalid(format!(
                "excluded interval starts at {} after it ends at {}",
                self.start_time, self.end_time
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Segment – a half-open row range of a recording
// ---------------------------------------------------------------------------

/// Rows `start..end` of a [`Recording`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Segment {
    pub start: usize,
    pub end: usize,
}

impl Segment {
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ---------------------------------------------------------------------------
// Recording – the decoded matrix
// ---------------------------------------------------------------------------

/// A decoded recording stored channel-major: `columns[c][row]`.
///
/// Column 0 is time in seconds; the rest are calibrated channels in the
/// order given by `column_names`.
#[derive(Debug, Clone, PartialEq)]
pub struct Recording {
    pub column_names: Vec<String>,
    pub columns: Vec<Vec<f64>>,
}

impl Recording {
    pub fn new(column_names: Vec<String>, columns: Vec<Vec<f64>>) -> Self {
        debug_assert_eq!(column_names.len(), columns.len());
        debug_assert!(columns.windows(2).all(|w| w[0].len() == w[1].len()));
        Recording {
            column_names,
            columns,
        }
    }

    pub fn n_rows(&self) -> usize {
        self.columns.first().map_or(0, Vec::len)
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.n_rows() == 0
    }

    /// The time column (empty for a recording without columns).
    pub fn time(&self) -> &[f64] {
        self.columns.first().map_or(&[], Vec::as_slice)
    }

    /// Position of a named column.
    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.column_names
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| {
                EdrError::invalid(format!(
                    "no channel named '{name}' (available: {})",
                    self.column_names.join(", ")
                ))
            })
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        let idx = self.column_names.iter().position(|n| n == name)?;
        Some(&self.columns[idx])
    }

    /// One row across all columns.
    pub fn row(&self, index: usize) -> Option<Vec<f64>> {
        if index >= self.n_rows() {
            return None;
        }
        Some(self.columns.iter().map(|c| c[index]).collect())
    }

    /// Copy the rows of `segment` into an independent recording.
    pub fn slice(&self, segment: &Segment) -> Recording {
        let end = segment.end.min(self.n_rows());
        let start = segment.start.min(end);
        Recording {
            column_names: self.column_names.clone(),
            columns: self.columns.iter().map(|c| c[start..end].to_vec()).collect(),
        }
    }

    /// Kept row ranges after removing `excluded`, see [`extract_segments`].
    pub fn segments(&self, excluded: &[ExcludedInterval], min_length: usize) -> Vec<Segment> {
        extract_segments(self.time(), excluded, min_length)
    }

    /// Materialize the kept segments as separate recordings.
    pub fn split(&self, excluded: &[ExcludedInterval], min_length: usize) -> Vec<Recording> {
        self.segments(excluded, min_length)
            .iter()
            .map(|s| self.slice(s))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// DecodedEdr – everything a decode call produces
// ---------------------------------------------------------------------------

/// Result of decoding one EDR file.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedEdr {
    pub recording: Recording,
    /// Parsed `CTIME`.
    pub file_start: NaiveDateTime,
    pub header: Header,
}

impl DecodedEdr {
    pub fn column_names(&self) -> &[String] {
        &self.recording.column_names
    }

    /// Rows at the native sampling interval, before any decimation.
    pub fn n_timepoints(&self) -> usize {
        self.header.n_timepoints()
    }

    /// Length of the recording in seconds.
    pub fn recording_duration(&self) -> f64 {
        self.n_timepoints() as f64 * self.header.dt
    }
}
