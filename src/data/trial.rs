use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use chrono::NaiveDateTime;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::error::{EdrError, Result};
use super::header::Header;
use super::loader::{load_file, read_header, EDR_EXTENSION};
use super::model::{ExcludedInterval, Recording};
use super::options::DecodeOptions;
use super::transform::{unwrap, FULL_TURN};

/// Environment variable holding the root of the arena data tree.
pub const DATA_DIRECTORY_ENV: &str = "ARENA_DATA_DIRECTORY";

// ---------------------------------------------------------------------------
// Trial records supplied by the metadata store
// ---------------------------------------------------------------------------

/// The slice of a trial record the decoder needs: where the file lives and
/// which time ranges to leave out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trial {
    pub file_name: String,
    /// Experiment directory, relative to the data root.
    pub directory_path: PathBuf,
    #[serde(default)]
    pub excluded_intervals: Vec<ExcludedInterval>,
}

impl Trial {
    /// Parse a trial record and check its excluded intervals.
    pub fn from_json(text: &str) -> Result<Self> {
        let trial: Trial = serde_json::from_str(text)?;
        for interval in &trial.excluded_intervals {
            interval.validate()?;
        }
        Ok(trial)
    }

    pub fn file_path(&self, data_root: &Path) -> PathBuf {
        data_root.join(&self.directory_path).join(&self.file_name)
    }
}

/// A trial's recording split into kept segments.
#[derive(Debug, Clone)]
pub struct TrialSegments {
    pub segments: Vec<Recording>,
    pub file_start: NaiveDateTime,
    pub column_names: Vec<String>,
    pub header: Header,
}

/// Decode a trial's file and split it around its excluded intervals.
///
/// Bar position unwrapping, when requested, runs on each kept segment on its
/// own so no correction leaks across an excluded gap.
pub fn load_trial(
    trial: &Trial,
    data_root: &Path,
    options: &DecodeOptions,
    min_length: usize,
) -> Result<TrialSegments> {
    for interval in &trial.excluded_intervals {
        interval.validate()?;
    }

    let decode_options = DecodeOptions {
        apply_barpos_unwrap: false,
        ..options.clone()
    };
    let path = trial.file_path(data_root);
    let decoded = load_file(&path, &decode_options)?;

    let mut segments = decoded
        .recording
        .split(&trial.excluded_intervals, min_length);

    if options.apply_barpos_unwrap {
        let idx = decoded.recording.column_index(&options.roles.bar_position)?;
        for segment in &mut segments {
            segment.columns[idx] = unwrap(&segment.columns[idx], FULL_TURN);
        }
    }

    log::info!(
        "Trial {}: {} segments kept from {} exclusions",
        trial.file_name,
        segments.len(),
        trial.excluded_intervals.len()
    );

    Ok(TrialSegments {
        segments,
        file_start: decoded.file_start,
        column_names: decoded.recording.column_names,
        header: decoded.header,
    })
}

// ---------------------------------------------------------------------------
// Excluded interval files
// ---------------------------------------------------------------------------

/// Load excluded intervals from a file.  Dispatch by extension.
///
/// * `.json` – `[{ "start_time": 10.0, "end_time": 20.0 }, ...]`
/// * `.csv`  – header row `start_time,end_time`
pub fn load_exclusions(path: &Path) -> Result<Vec<ExcludedInterval>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let intervals: Vec<ExcludedInterval> = match ext.as_str() {
        "json" => {
            let text = std::fs::read_to_string(path)?;
            serde_json::from_str(&text)?
        }
        "csv" => {
            let mut reader = csv::Reader::from_path(path)?;
            reader
                .deserialize()
                .collect::<std::result::Result<Vec<_>, csv::Error>>()?
        }
        other => {
            return Err(EdrError::invalid(format!(
                "unsupported exclusion file extension: .{other}"
            )))
        }
    };

    for interval in &intervals {
        interval.validate()?;
    }
    Ok(intervals)
}

/// Parse `start:end` (seconds) as given on the command line.
pub fn parse_interval(text: &str) -> Result<ExcludedInterval> {
    let (start, end) = text
        .split_once(':')
        .ok_or_else(|| EdrError::invalid(format!("expected START:END, got '{text}'")))?;
    let parse = |s: &str| {
        s.trim()
            .parse::<f64>()
            .map_err(|_| EdrError::invalid(format!("'{s}' is not a time in seconds")))
    };
    ExcludedInterval::new(parse(start)?, parse(end)?)
}

// ---------------------------------------------------------------------------
// Directory scan
// ---------------------------------------------------------------------------

/// What a header tells us about a recording, for cataloguing trials.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrialSummary {
    pub file_name: String,
    pub recording_start: NaiveDateTime,
    pub n_timepoints: usize,
    /// Seconds.
    pub recording_duration: f64,
    pub insect_id: Option<String>,
}

static INSECT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"insect(\d*)_").expect("insect number pattern is valid"));

/// `{YYYYMMDD}_{n}` from an `..._insect04_...` file name and its start date.
pub fn insect_id(file_name: &str, recording_start: &NaiveDateTime) -> Option<String> {
    let number = INSECT_PATTERN.captures(file_name)?.get(1)?.as_str();
    Some(format!("{}_{number}", recording_start.format("%Y%m%d")))
}

fn summarize(path: &Path) -> Result<TrialSummary> {
    let header = read_header(path)?;
    let recording_start = header.file_start()?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let n_timepoints = header.n_timepoints();

    Ok(TrialSummary {
        insect_id: insect_id(&file_name, &recording_start),
        file_name,
        recording_start,
        n_timepoints,
        recording_duration: n_timepoints as f64 * header.dt,
    })
}

/// Summarize every `.edr` file in `dir`, sorted by file name.
///
/// Files whose header cannot be read are logged and skipped.
pub fn scan_directory(dir: &Path) -> Result<Vec<TrialSummary>> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| {
            p.is_file()
                && p.extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| e.eq_ignore_ascii_case(EDR_EXTENSION))
        })
        .collect();
    paths.sort();

    let mut summaries = Vec::with_capacity(paths.len());
    for path in &paths {
        match summarize(path) {
            Ok(summary) => summaries.push(summary),
            Err(e) => log::warn!("Skipping {}: {e}", path.display()),
        }
    }
    log::info!(
        "Scanned {}: {} of {} recordings readable",
        dir.display(),
        summaries.len(),
        paths.len()
    );
    Ok(summaries)
}
