use super::error::{EdrError, Result};
use super::model::{Recording, TIME_COLUMN};

// ---------------------------------------------------------------------------
// Time column
// ---------------------------------------------------------------------------

/// Prepend a `time` column (`row * dt`) to calibrated channel columns.
pub fn with_time_column(columns: Vec<Vec<f64>>, names: Vec<String>, dt: f64) -> Recording {
    let n_rows = columns.first().map_or(0, Vec::len);
    let time: Vec<f64> = (0..n_rows).map(|i| i as f64 * dt).collect();

    let mut all_columns = Vec::with_capacity(columns.len() + 1);
    all_columns.push(time);
    all_columns.extend(columns);

    let mut all_names = Vec::with_capacity(names.len() + 1);
    all_names.push(TIME_COLUMN.to_string());
    all_names.extend(names);

    Recording::new(all_names, all_columns)
}

// ---------------------------------------------------------------------------
// Decimation
// ---------------------------------------------------------------------------

/// Row indices kept when decimating `n_rows` rows by `factor` (> 1).
///
/// Positions `k * factor` below `n_rows` are rounded half-to-even; a last
/// index that rounds up to `n_rows` is dropped. A factor that is not a
/// finite number above 1 keeps every row.
pub fn resample_indices(n_rows: usize, factor: f64) -> Vec<usize> {
    if !factor.is_finite() || factor <= 1.0 {
        return (0..n_rows).collect();
    }
    let mut indices = Vec::with_capacity((n_rows as f64 / factor).ceil() as usize + 1);
    let mut k = 0usize;
    loop {
        let position = k as f64 * factor;
        if position >= n_rows as f64 {
            break;
        }
        indices.push(position.round_ties_even() as usize);
        k += 1;
    }
    if indices.last() == Some(&n_rows) {
        indices.pop();
    }
    indices
}

/// Decimate `recording` from `native_dt` to roughly `target_dt`.
///
/// No filtering is applied; rows are picked by index. Targets at or below
/// the native interval return the recording unchanged.
pub fn resample(recording: Recording, native_dt: f64, target_dt: f64) -> Result<Recording> {
    if !target_dt.is_finite() || target_dt < 0.0 {
        return Err(EdrError::invalid(format!(
            "requested sampling interval must be finite and non-negative, got {target_dt}"
        )));
    }
    if !native_dt.is_finite() || native_dt <= 0.0 {
        return Err(EdrError::format(format!(
            "native sampling interval must be positive, got {native_dt}"
        )));
    }
    if target_dt <= native_dt {
        return Ok(recording);
    }

    let factor = target_dt / native_dt;
    let indices = resample_indices(recording.n_rows(), factor);
    log::debug!(
        "Decimating {} rows by {factor:.3} to {} rows",
        recording.n_rows(),
        indices.len()
    );

    let columns = recording
        .columns
        .iter()
        .map(|column| indices.iter().map(|&i| column[i]).collect())
        .collect();
    Ok(Recording::new(recording.column_names, columns))
}
