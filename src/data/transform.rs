use super::error::Result;
use super::model::Recording;
use super::options::ChannelRoles;

/// Bar position volts → degrees.
pub const BARPOS_DEGREES_PER_VOLT: f64 = 360.0 / 5.0;

/// Period used when unwrapping the bar position.
pub const FULL_TURN: f64 = 360.0;

// ---------------------------------------------------------------------------
// Series helpers
// ---------------------------------------------------------------------------

/// `(x - mean) / std` with the population standard deviation.
///
/// A constant series has zero spread and yields NaN, as does an empty one.
pub fn zscore(values: &[f64]) -> Vec<f64> {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let std = variance.sqrt();
    values.iter().map(|v| (v - mean) / std).collect()
}

/// Convert volts to degrees and wrap anything above 180 down by a full turn.
pub fn to_wrapped_degrees(values: &[f64]) -> Vec<f64> {
    values
        .iter()
        .map(|v| {
            let degrees = v * BARPOS_DEGREES_PER_VOLT;
            if degrees > 180.0 {
                degrees - FULL_TURN
            } else {
                degrees
            }
        })
        .collect()
}

/// Remove jumps larger than half a `period` by adding whole periods.
///
/// Each step's delta is reduced into `[-period/2, period/2)` (a delta of
/// exactly `+period/2` stays positive); deltas already smaller than half a
/// period are left alone. Corrections accumulate along the series.
pub fn unwrap(values: &[f64], period: f64) -> Vec<f64> {
    let half = period / 2.0;
    let mut out = Vec::with_capacity(values.len());
    let Some(&first) = values.first() else {
        return out;
    };
    out.push(first);

    let mut correction = 0.0;
    for pair in values.windows(2) {
        let delta = pair[1] - pair[0];
        if delta.abs() >= half {
            let mut reduced = (delta + half).rem_euclid(period) - half;
            if reduced == -half && delta > 0.0 {
                reduced = half;
            }
            correction += reduced - delta;
        }
        out.push(pair[1] + correction);
    }
    out
}

// ---------------------------------------------------------------------------
// Recording-level transforms
// ---------------------------------------------------------------------------

fn replace_column(mut recording: Recording, index: usize, values: Vec<f64>) -> Recording {
    recording.columns[index] = values;
    recording
}

/// Replace the difference channel with `zscore(left) - zscore(right)`.
pub fn lmr_zscore(recording: Recording, roles: &ChannelRoles) -> Result<Recording> {
    let left = recording.column_index(&roles.left)?;
    let right = recording.column_index(&roles.right)?;
    let target = recording.column_index(&roles.difference)?;

    let left_z = zscore(&recording.columns[left]);
    let right_z = zscore(&recording.columns[right]);
    let difference = left_z.iter().zip(&right_z).map(|(l, r)| l - r).collect();

    Ok(replace_column(recording, target, difference))
}

/// Express the bar position channel in degrees within `(-180, 180]`.
pub fn barpos_degrees(recording: Recording, roles: &ChannelRoles) -> Result<Recording> {
    let idx = recording.column_index(&roles.bar_position)?;
    let degrees = to_wrapped_degrees(&recording.columns[idx]);
    Ok(replace_column(recording, idx, degrees))
}

/// Unwrap the bar position channel so it can be differentiated.
pub fn barpos_unwrap(recording: Recording, roles: &ChannelRoles) -> Result<Recording> {
    let idx = recording.column_index(&roles.bar_position)?;
    let unwrapped = unwrap(&recording.columns[idx], FULL_TURN);
    Ok(replace_column(recording, idx, unwrapped))
}
