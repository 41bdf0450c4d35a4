use super::model::{ExcludedInterval, Segment};

/// Segments shorter than this many rows are dropped by default.
pub const DEFAULT_MIN_SEGMENT_LENGTH: usize = 10;

// ---------------------------------------------------------------------------
// Kept segments: complement of the excluded intervals
// ---------------------------------------------------------------------------

/// Row index of a boundary time: the number of samples strictly before it,
/// clamped to the last row.
fn boundary_row(time: &[f64], boundary: f64) -> usize {
    let idx = time.partition_point(|&t| t < boundary);
    idx.min(time.len().saturating_sub(1))
}

/// Return the row ranges of `time` left after removing `excluded`.
///
/// Intervals may arrive in any order and may overlap; they are sorted by
/// start time first. A kept range runs from the end row of one exclusion to
/// the start row of the next (the first from row 0, the last to the end of
/// the recording). Ranges holding fewer than `min_length` rows are dropped.
pub fn extract_segments(
    time: &[f64],
    excluded: &[ExcludedInterval],
    min_length: usize,
) -> Vec<Segment> {
    let n_rows = time.len();
    if n_rows == 0 {
        return Vec::new();
    }

    let mut sorted = excluded.to_vec();
    sorted.sort_by(|a, b| a.start_time.total_cmp(&b.start_time));

    let bounds: Vec<(usize, usize)> = sorted
        .iter()
        .map(|iv| (boundary_row(time, iv.start_time), boundary_row(time, iv.end_time)))
        .collect();

    let mut kept = Vec::with_capacity(bounds.len() + 1);
    let mut start = 0;
    for &(excl_start, excl_end) in &bounds {
        kept.push(Segment {
            start,
            end: excl_start,
        });
        start = excl_end;
    }
    kept.push(Segment { start, end: n_rows });

    let total = kept.len();
    let segments: Vec<Segment> = kept
        .into_iter()
        .filter(|s| s.end > s.start && s.len() >= min_length)
        .collect();

    log::debug!(
        "{} exclusions -> {} kept segments ({} dropped as shorter than {min_length} rows)",
        excluded.len(),
        segments.len(),
        total - segments.len()
    );
    segments
}
