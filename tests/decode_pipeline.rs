use std::path::{Path, PathBuf};

use arena_edr::data::trial::{load_exclusions, load_trial, scan_directory, Trial};
use arena_edr::data::writer::EdrWriter;
use arena_edr::{load_file, DecodeOptions, EdrError, ExcludedInterval, DEFAULT_MIN_SEGMENT_LENGTH};

const CTIME: &str = "06-12-2015 11:36:59 AM";

fn write(dir: &Path, name: &str, writer: &EdrWriter) -> PathBuf {
    let path = dir.join(name);
    writer.write_to(&path).unwrap();
    path
}

/// Six channels in rig order, `n` frames with distinct per-channel ramps.
fn arena_writer(n: usize, dt: f64) -> EdrWriter {
    let mut writer = EdrWriter::new(dt, CTIME)
        .channel("Lamp", 1.0)
        .channel("Ramp", 1.0)
        .channel("Sum", 1.0)
        .channel("Freq", 1.0)
        .channel("LmR", 1.0)
        .channel("Barpos", 1.0);
    for i in 0..n {
        let i = (i % 1000) as i16;
        writer
            .push_frame(&[i, 1000 - i, 1000, 400, 5, (i % 100) * 10])
            .unwrap();
    }
    writer
}

fn iv(a: f64, b: f64) -> ExcludedInterval {
    ExcludedInterval::new(a, b).unwrap()
}

// =============================================================================
// DECODE
// =============================================================================

#[test]
fn three_channel_file_has_100_rows_and_time_axis() {
    let dir = tempfile::tempdir().unwrap();
    let mut writer = EdrWriter::new(0.02, CTIME)
        .channel("A", 1.0)
        .channel("B", 1.0)
        .channel("C", 1.0);
    for i in 0..100i16 {
        writer.push_frame(&[i, i, i]).unwrap();
    }
    let path = write(dir.path(), "three.edr", &writer);

    let decoded = load_file(&path, &DecodeOptions::default()).unwrap();
    assert_eq!(decoded.header.n_points, 300);
    assert_eq!(decoded.recording.n_rows(), 100);
    assert_eq!(decoded.column_names(), &["time", "A", "B", "C"]);
    let time = decoded.recording.time();
    assert_eq!(time[0], 0.0);
    assert!((time[1] - 0.02).abs() < 1e-12);
    assert!((time[99] - 1.98).abs() < 1e-12);
}

#[test]
fn calibrated_values_follow_formula() {
    let dir = tempfile::tempdir().unwrap();
    let mut writer = EdrWriter::new(0.01, CTIME)
        .ad(5.0)
        .adc_max(4095)
        .channel("A", 0.5)
        .channel("B", 2.0)
        .channel("C", 4.0);
    let raw: [i16; 3] = [1234, -321, i16::MAX];
    writer.push_frame(&raw).unwrap();
    let path = write(dir.path(), "cal.EDR", &writer);

    let decoded = load_file(&path, &DecodeOptions::default()).unwrap();
    for (ch, (&s, ycf)) in raw.iter().zip([0.5, 2.0, 4.0]).enumerate() {
        let expected = s as f64 * 5.0 / (4096.0 * ycf);
        let got = decoded.recording.columns[ch + 1][0];
        assert!((got - expected).abs() < 1e-12, "channel {ch}: {got} != {expected}");
    }
}

#[test]
fn fourth_and_fifth_channels_are_swapped() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "arena.edr", &arena_writer(20, 0.01));
    let decoded = load_file(&path, &DecodeOptions::default()).unwrap();

    assert_eq!(
        decoded.column_names(),
        &["time", "Lamp", "Ramp", "Sum", "LmR", "Freq", "Barpos"]
    );
    // values travel with their names: Freq was written as 400 codes
    let freq = decoded.recording.column("Freq").unwrap();
    assert!((freq[0] - 400.0 * 10.0 / 2048.0).abs() < 1e-12);
}

#[test]
fn resampling_to_double_dt_halves_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "arena.edr", &arena_writer(1000, 0.01));
    let options = DecodeOptions {
        target_dt: Some(0.02),
        ..DecodeOptions::default()
    };
    let decoded = load_file(&path, &options).unwrap();
    let rows = decoded.recording.n_rows() as i64;
    assert!((rows - 500).abs() <= 1, "{rows} rows");
    assert_eq!(decoded.recording.time()[0], 0.0);
    // header facts describe the native recording
    assert_eq!(decoded.n_timepoints(), 1000);
    assert!((decoded.recording_duration() - 10.0).abs() < 1e-9);
}

#[test]
fn negative_target_dt_is_invalid_argument() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "arena.edr", &arena_writer(10, 0.01));
    let options = DecodeOptions {
        target_dt: Some(-0.01),
        ..DecodeOptions::default()
    };
    assert!(matches!(load_file(&path, &options), Err(EdrError::InvalidArgument(_))));
}

#[test]
fn barpos_185_degrees_wraps_to_minus_175() {
    let dir = tempfile::tempdir().unwrap();
    // 1850 codes * 10 / (2048 * 3.515625) = 185/72 V = 185 degrees
    let mut writer = EdrWriter::new(0.01, CTIME).channel("Barpos", 3.515625);
    writer.push_frame(&[1850]).unwrap();
    writer.push_frame(&[0]).unwrap();
    let path = write(dir.path(), "bar.edr", &writer);

    let options = DecodeOptions {
        apply_barpos_degrees: true,
        ..DecodeOptions::default()
    };
    let decoded = load_file(&path, &options).unwrap();
    let barpos = decoded.recording.column("Barpos").unwrap();
    assert!((barpos[0] + 175.0).abs() < 1e-9, "{}", barpos[0]);
    assert_eq!(barpos[1], 0.0);
}

#[test]
fn lmr_zscore_overwrites_difference_channel() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "arena.edr", &arena_writer(200, 0.01));
    let options = DecodeOptions {
        apply_lmr_zscore: true,
        ..DecodeOptions::default()
    };
    let decoded = load_file(&path, &options).unwrap();
    let lmr = decoded.recording.column("LmR").unwrap();
    // Lamp and Ramp are mirror images, so the difference is 2 * zscore(Lamp)
    let mean: f64 = lmr.iter().sum::<f64>() / lmr.len() as f64;
    let var: f64 = lmr.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / lmr.len() as f64;
    assert!(mean.abs() < 1e-9);
    assert!((var - 4.0).abs() < 1e-9);
}

#[test]
fn decoding_twice_is_bit_identical() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "arena.edr", &arena_writer(500, 0.001));
    let options = DecodeOptions {
        target_dt: Some(0.003),
        apply_lmr_zscore: true,
        apply_barpos_degrees: true,
        apply_barpos_unwrap: true,
        ..DecodeOptions::default()
    };
    let a = load_file(&path, &options).unwrap();
    let b = load_file(&path, &options).unwrap();
    assert_eq!(a.recording.column_names, b.recording.column_names);
    for (ca, cb) in a.recording.columns.iter().zip(&b.recording.columns) {
        let bits_a: Vec<u64> = ca.iter().map(|v| v.to_bits()).collect();
        let bits_b: Vec<u64> = cb.iter().map(|v| v.to_bits()).collect();
        assert_eq!(bits_a, bits_b);
    }
}

#[test]
fn nan_target_dt_is_invalid_argument() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "arena.edr", &arena_writer(10, 0.01));
    let options = DecodeOptions {
        target_dt: Some(f64::NAN),
        ..DecodeOptions::default()
    };
    assert!(matches!(load_file(&path, &options), Err(EdrError::InvalidArgument(_))));
}

#[test]
fn negative_header_dt_is_format_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut writer = EdrWriter::new(-0.01, CTIME).channel("A", 1.0);
    writer.push_frame(&[1]).unwrap();
    let path = write(dir.path(), "neg.edr", &writer);
    let options = DecodeOptions {
        target_dt: Some(0.02),
        ..DecodeOptions::default()
    };
    assert!(matches!(load_file(&path, &options), Err(EdrError::Format(_))));
}

#[test]
fn largest_adc_max_decodes_without_overflow() {
    let dir = tempfile::tempdir().unwrap();
    let mut writer = EdrWriter::new(0.01, CTIME).adc_max(i64::MAX).channel("A", 1.0);
    writer.push_frame(&[i16::MAX]).unwrap();
    let path = write(dir.path(), "wide.edr", &writer);
    let decoded = load_file(&path, &DecodeOptions::default()).unwrap();
    assert!(decoded.recording.columns[1][0].is_finite());
}

#[test]
fn wrong_extension_is_format_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "arena.dat", &arena_writer(10, 0.01));
    assert!(matches!(
        load_file(&path, &DecodeOptions::default()),
        Err(EdrError::Format(_))
    ));
}

#[test]
fn missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        load_file(&dir.path().join("absent.edr"), &DecodeOptions::default()),
        Err(EdrError::Io(_))
    ));
}

// =============================================================================
// SEGMENTS
// =============================================================================

fn long_trial_dir() -> (tempfile::TempDir, Trial) {
    let dir = tempfile::tempdir().unwrap();
    let experiment = dir.path().join("experiments/stripes");
    std::fs::create_dir_all(&experiment).unwrap();
    // 300 s at 10 ms
    write(&experiment, "150612_113659_stripes_insect04_tr1.EDR", &arena_writer(30_000, 0.01));
    let trial = Trial {
        file_name: "150612_113659_stripes_insect04_tr1.EDR".into(),
        directory_path: "experiments/stripes".into(),
        excluded_intervals: vec![iv(10.0, 20.0), iv(100.0, 200.0)],
    };
    (dir, trial)
}

#[test]
fn trial_with_two_exclusions_yields_three_segments() {
    let (root, trial) = long_trial_dir();
    let loaded = load_trial(&trial, root.path(), &DecodeOptions::default(), DEFAULT_MIN_SEGMENT_LENGTH)
        .unwrap();

    assert_eq!(loaded.segments.len(), 3);
    let bounds: Vec<(f64, f64)> = loaded
        .segments
        .iter()
        .map(|s| (s.time()[0], *s.time().last().unwrap()))
        .collect();
    assert!((bounds[0].0 - 0.0).abs() < 1e-5);
    assert!((bounds[0].1 - 9.99).abs() < 0.03);
    assert!((bounds[1].0 - 20.0).abs() < 0.03);
    assert!((bounds[1].1 - 99.99).abs() < 0.03);
    assert!((bounds[2].0 - 200.0).abs() < 0.03);
    assert!((bounds[2].1 - 299.99).abs() < 0.03);
    assert_eq!(loaded.column_names[0], "time");
}

#[test]
fn segments_survive_finer_and_coarser_sampling() {
    let (root, trial) = long_trial_dir();
    for dt in [0.005, 0.02] {
        let options = DecodeOptions {
            target_dt: Some(dt),
            ..DecodeOptions::default()
        };
        let loaded = load_trial(&trial, root.path(), &options, DEFAULT_MIN_SEGMENT_LENGTH).unwrap();
        assert_eq!(loaded.segments.len(), 3, "dt={dt}");
        assert!((loaded.segments[1].time()[0] - 20.0).abs() < 0.03);
    }
}

#[test]
fn leading_exclusion_drops_short_first_segment() {
    let (root, mut trial) = long_trial_dir();
    for (start, expected) in [(0.0, 2), (0.05, 2), (0.11, 3)] {
        trial.excluded_intervals = vec![iv(start, 20.0), iv(100.0, 200.0)];
        let loaded =
            load_trial(&trial, root.path(), &DecodeOptions::default(), DEFAULT_MIN_SEGMENT_LENGTH)
                .unwrap();
        assert_eq!(loaded.segments.len(), expected, "start={start}");
    }
}

#[test]
fn unwrap_runs_per_segment() {
    let dir = tempfile::tempdir().unwrap();
    // bar position volts as codes: 175 deg, 185 deg (wraps), then a gap jump
    let mut writer = EdrWriter::new(1.0, CTIME).channel("Barpos", 3.515625);
    let codes_per_degree = 10.0;
    let degrees = [170.0, 175.0, 185.0, 190.0, 0.0, 10.0, 20.0, 30.0];
    for d in degrees {
        writer.push_frame(&[(d * codes_per_degree) as i16]).unwrap();
    }
    let experiment = dir.path().join("exp");
    std::fs::create_dir_all(&experiment).unwrap();
    write(&experiment, "bar.edr", &writer);

    let trial = Trial {
        file_name: "bar.edr".into(),
        directory_path: "exp".into(),
        excluded_intervals: vec![iv(3.5, 4.0)],
    };
    let options = DecodeOptions {
        apply_barpos_degrees: true,
        apply_barpos_unwrap: true,
        ..DecodeOptions::default()
    };
    let loaded = load_trial(&trial, dir.path(), &options, 1).unwrap();
    assert_eq!(loaded.segments.len(), 2);

    let first = loaded.segments[0].column("Barpos").unwrap();
    let expected_first = [170.0, 175.0, 185.0, 190.0];
    for (got, want) in first.iter().zip(expected_first) {
        assert!((got - want).abs() < 1e-6, "{first:?}");
    }
    // second segment starts fresh, not offset by the first one's turn
    let second = loaded.segments[1].column("Barpos").unwrap();
    assert!((second[0] - 0.0).abs() < 1e-6, "{second:?}");
}

// =============================================================================
// EXCLUSION FILES AND DIRECTORY SCAN
// =============================================================================

#[test]
fn exclusions_load_from_json_and_csv() {
    let dir = tempfile::tempdir().unwrap();
    let json = dir.path().join("ex.json");
    std::fs::write(&json, r#"[{"start_time": 100, "end_time": 200}, {"start_time": 10, "end_time": 20.5}]"#)
        .unwrap();
    let csv = dir.path().join("ex.csv");
    std::fs::write(&csv, "start_time,end_time\n100,200\n10,20.5\n").unwrap();

    let from_json = load_exclusions(&json).unwrap();
    let from_csv = load_exclusions(&csv).unwrap();
    assert_eq!(from_json, vec![iv(100.0, 200.0), iv(10.0, 20.5)]);
    assert_eq!(from_json, from_csv);

    let bad = dir.path().join("bad.json");
    std::fs::write(&bad, r#"[{"start_time": 5, "end_time": 1}]"#).unwrap();
    assert!(matches!(load_exclusions(&bad), Err(EdrError::InvalidArgument(_))));
}

#[test]
fn scan_lists_readable_recordings() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "150612_113659_stripes_insect04_tr1.EDR", &arena_writer(100, 0.01));
    write(dir.path(), "150612_120000_stripes_insect07_tr2.edr", &arena_writer(50, 0.02));
    std::fs::write(dir.path().join("notes.txt"), "not a recording").unwrap();
    std::fs::write(dir.path().join("broken.edr"), "NC=oops\n").unwrap();

    // header claiming an absurd channel count
    let mut bogus = b"NC=4000000000000000000\r\nNP=2\r\nDT=0.01\r\nAD=10\r\nADCMAX=2047\r\nCTIME=06-12-2015 11:36:59 AM\r\n".to_vec();
    bogus.resize(2048, 0);
    std::fs::write(dir.path().join("bogus.edr"), bogus).unwrap();

    let summaries = scan_directory(dir.path()).unwrap();
    assert_eq!(summaries.len(), 2);
    assert_eq!(summaries[0].file_name, "150612_113659_stripes_insect04_tr1.EDR");
    assert_eq!(summaries[0].insect_id.as_deref(), Some("20150612_04"));
    assert_eq!(summaries[0].n_timepoints, 100);
    assert!((summaries[0].recording_duration - 1.0).abs() < 1e-9);
    assert_eq!(summaries[1].insect_id.as_deref(), Some("20150612_07"));
}
