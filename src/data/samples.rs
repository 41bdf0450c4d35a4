use byteorder::{ByteOrder, LittleEndian};

use super::error::{EdrError, Result};
use super::header::Header;

/// Channel positions (0-based, time column excluded) exchanged during
/// decoding. Names move with their values, so this reorders columns only.
pub const SWAPPED_CHANNELS: (usize, usize) = (3, 4);

// ---------------------------------------------------------------------------
// Sample region
// ---------------------------------------------------------------------------

/// Read the interleaved i16 sample region into one column per channel.
///
/// The region always starts at `block_size`, independent of how many header
/// lines were actually present.
pub fn decode_samples(bytes: &[u8], block_size: usize, header: &Header) -> Result<Vec<Vec<f64>>> {
    let n_channels = header.n_channels;
    if n_channels == 0 {
        return Err(EdrError::format("header declares zero channels (NC=0)"));
    }
    if header.n_points % n_channels != 0 {
        return Err(EdrError::format(format!(
            "NP={} is not divisible by NC={n_channels}",
            header.n_points
        )));
    }
    if bytes.len() < block_size {
        return Err(EdrError::format(format!(
            "file is {} bytes, shorter than the {block_size}-byte header block",
            bytes.len()
        )));
    }

    let region = &bytes[block_size..];
    let frame_bytes = 2 * n_channels;
    if region.len() % frame_bytes != 0 {
        return Err(EdrError::format(format!(
            "sample region of {} bytes is not a whole number of {n_channels}-channel frames",
            region.len()
        )));
    }

    let mut flat = vec![0i16; region.len() / 2];
    LittleEndian::read_i16_into(region, &mut flat);
    if flat.len() != header.n_points {
        return Err(EdrError::format(format!(
            "header declares NP={} samples but the file holds {}",
            header.n_points,
            flat.len()
        )));
    }

    let n_rows = flat.len() / n_channels;
    let mut columns = vec![Vec::with_capacity(n_rows); n_channels];
    for frame in flat.chunks_exact(n_channels) {
        for (column, &sample) in columns.iter_mut().zip(frame) {
            column.push(f64::from(sample));
        }
    }

    log::debug!("Decoded {n_rows} rows x {n_channels} channels");
    Ok(columns)
}

// ---------------------------------------------------------------------------
// Calibration
// ---------------------------------------------------------------------------

/// Scale raw ADC codes to physical units: `AD / ((ADCMAX + 1) * YCF_c)`.
pub fn calibrate(columns: Vec<Vec<f64>>, header: &Header) -> Result<Vec<Vec<f64>>> {
    let full_scale = header.adc_max as f64 + 1.0;
    columns
        .into_iter()
        .zip(&header.calibration_factors)
        .enumerate()
        .map(|(ch, (column, &ycf))| {
            if ycf == 0.0 {
                return Err(EdrError::format(format!(
                    "calibration factor YCF{ch} is zero"
                )));
            }
            let scale = header.ad / (full_scale * ycf);
            Ok(column.into_iter().map(|v| v * scale).collect())
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Column fix-up
// ---------------------------------------------------------------------------

/// Exchange the columns at [`SWAPPED_CHANNELS`], values and names together.
///
/// Recordings with too few channels to contain the pair pass through.
pub fn fix_swapped_channels(
    mut columns: Vec<Vec<f64>>,
    mut names: Vec<String>,
) -> (Vec<Vec<f64>>, Vec<String>) {
    let (a, b) = SWAPPED_CHANNELS;
    if columns.len() > b && names.len() > b {
        columns.swap(a, b);
        names.swap(a, b);
    } else {
        log::debug!(
            "Only {} channels, leaving channel order untouched",
            columns.len()
        );
    }
    (columns, names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::header::HeaderValue;

    fn header(nc: usize, np: usize, ycf: &[f64]) -> Header {
        let mut entries = vec![
            ("NC".to_string(), HeaderValue::Integer(nc as i64)),
            ("NP".to_string(), HeaderValue::Integer(np as i64)),
            ("DT".to_string(), HeaderValue::Float(0.01)),
            ("AD".to_string(), HeaderValue::Float(10.0)),
            ("ADCMAX".to_string(), HeaderValue::Integer(2047)),
            ("CTIME".to_string(), HeaderValue::Text("06-12-2015 11:36:59 AM".into())),
        ];
        for ch in 0..nc {
            entries.push((format!("YN{ch}"), HeaderValue::Text(format!("ch{ch}"))));
            entries.push((format!("YCF{ch}"), HeaderValue::Float(ycf[ch])));
        }
        Header::from_entries(entries).unwrap()
    }

    fn region(samples: &[i16]) -> Vec<u8> {
        let mut bytes = vec![0u8; 4];
        bytes.extend(samples.iter().flat_map(|s| s.to_le_bytes()));
        bytes
    }

    #[test]
    fn deinterleaves_channels() {
        let h = header(2, 6, &[1.0, 1.0]);
        let cols = decode_samples(&region(&[1, -1, 2, -2, 3, -3]), 4, &h).unwrap();
        assert_eq!(cols, vec![vec![1.0, 2.0, 3.0], vec![-1.0, -2.0, -3.0]]);
    }

    #[test]
    fn reads_from_block_offset_not_header_end() {
        let h = header(1, 2, &[1.0]);
        let mut bytes = b"X=1\n".to_vec();
        bytes.resize(16, b'#');
        bytes.extend_from_slice(&7i16.to_le_bytes());
        bytes.extend_from_slice(&i16::MIN.to_le_bytes());
        let cols = decode_samples(&bytes, 16, &h).unwrap();
        assert_eq!(cols, vec![vec![7.0, -32768.0]]);
    }

    #[test]
    fn rejects_partial_frames_and_count_mismatch() {
        let h = header(2, 6, &[1.0, 1.0]);
        assert!(matches!(
            decode_samples(&region(&[1, 2, 3, 4, 5]), 4, &h),
            Err(EdrError::Format(_))
        ));
        assert!(matches!(
            decode_samples(&region(&[1, 2, 3, 4]), 4, &h),
            Err(EdrError::Format(_))
        ));
        let odd = header(2, 5, &[1.0, 1.0]);
        assert!(matches!(
            decode_samples(&region(&[1, 2, 3, 4]), 4, &odd),
            Err(EdrError::Format(_))
        ));
    }

    #[test]
    fn calibration_matches_formula() {
        let h = header(2, 4, &[0.5, 2.0]);
        let cols = calibrate(vec![vec![100.0, -2048.0], vec![1000.0, 0.0]], &h).unwrap();
        let expected = |s: f64, ycf: f64| s * 10.0 / (2048.0 * ycf);
        assert!((cols[0][0] - expected(100.0, 0.5)).abs() < 1e-12);
        assert!((cols[0][1] - expected(-2048.0, 0.5)).abs() < 1e-12);
        assert!((cols[1][0] - expected(1000.0, 2.0)).abs() < 1e-12);
        assert_eq!(cols[1][1], 0.0);
    }

    #[test]
    fn extreme_adc_max_does_not_overflow() {
        let mut h = header(1, 1, &[1.0]);
        h.adc_max = i64::MAX;
        let cols = calibrate(vec![vec![1000.0]], &h).unwrap();
        assert!(cols[0][0].is_finite());
        assert!(cols[0][0] > 0.0);
    }

    #[test]
    fn zero_calibration_factor_is_format_error() {
        let h = header(2, 4, &[1.0, 0.0]);
        let err = calibrate(vec![vec![1.0, 2.0], vec![3.0, 4.0]], &h).unwrap_err();
        assert!(matches!(err, EdrError::Format(ref m) if m.contains("YCF1")));
    }

    #[test]
    fn swaps_fourth_and_fifth_channel() {
        let cols: Vec<Vec<f64>> = (0..6).map(|c| vec![c as f64]).collect();
        let names: Vec<String> = (0..6).map(|c| format!("c{c}")).collect();
        let (cols, names) = fix_swapped_channels(cols, names);
        assert_eq!(names, vec!["c0", "c1", "c2", "c4", "c3", "c5"]);
        assert_eq!(cols[3], vec![4.0]);
        assert_eq!(cols[4], vec![3.0]);
    }

    #[test]
    fn narrow_recordings_are_left_alone() {
        let cols: Vec<Vec<f64>> = (0..3).map(|c| vec![c as f64]).collect();
        let names: Vec<String> = (0..3).map(|c| format!("c{c}")).collect();
        let (out_cols, out_names) = fix_swapped_channels(cols.clone(), names.clone());
        assert_eq!(out_cols, cols);
        assert_eq!(out_names, names);
    }
}
