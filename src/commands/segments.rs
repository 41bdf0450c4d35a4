use std::path::Path;

use anyhow::{Context, Result};
use arena_edr::data::export::write_recording;
use arena_edr::data::trial::load_exclusions;
use arena_edr::{load_file, Recording};
use serde::Serialize;

use crate::cli::{SegmentFlags, SegmentsArgs};
use crate::exit_codes;
use crate::output;

#[derive(Serialize)]
pub struct SegmentSummary {
    pub index: usize,
    pub n_rows: usize,
    pub start_time: f64,
    pub end_time: f64,
    pub file: Option<String>,
}

pub fn execute(args: SegmentsArgs) -> i32 {
    match run(&args) {
        Ok(()) => exit_codes::SUCCESS,
        Err(e) => output::report(e),
    }
}

fn run(args: &SegmentsArgs) -> Result<()> {
    let options = args.decode.to_options()?;

    let mut excluded = args.exclude.clone();
    if let Some(path) = &args.exclusions {
        excluded.extend(
            load_exclusions(path)
                .with_context(|| format!("reading exclusions from {}", path.display()))?,
        );
    }

    let decoded = load_file(&args.file, &options)?;
    let segments = decoded.recording.split(&excluded, args.segments.min_length);

    let stem = args
        .file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "recording".to_string());
    emit(&segments, &stem, &args.segments)
}

/// Write segments (if asked) and print one line or JSON entry per segment.
pub fn emit(segments: &[Recording], stem: &str, flags: &SegmentFlags) -> Result<()> {
    if let Some(dir) = &flags.output_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating output directory {}", dir.display()))?;
    }

    let mut summaries = Vec::with_capacity(segments.len());
    for (index, segment) in segments.iter().enumerate() {
        let file = match &flags.output_dir {
            Some(dir) => {
                let path = segment_path(dir, stem, index, flags.format.extension());
                write_recording(segment, &path, flags.format)?;
                Some(path.display().to_string())
            }
            None => None,
        };
        let time = segment.time();
        summaries.push(SegmentSummary {
            index,
            n_rows: segment.n_rows(),
            start_time: time.first().copied().unwrap_or(0.0),
            end_time: time.last().copied().unwrap_or(0.0),
            file,
        });
    }

    if flags.json {
        let json = output::to_json(&summaries, false)?;
        output::write_output(&json, None)?;
    } else {
        println!("{} segments", summaries.len());
        for s in &summaries {
            println!(
                "  #{}: {} rows, {:.4}s .. {:.4}s{}",
                s.index,
                s.n_rows,
                s.start_time,
                s.end_time,
                s.file
                    .as_deref()
                    .map(|f| format!(" -> {f}"))
                    .unwrap_or_default()
            );
        }
    }
    Ok(())
}

fn segment_path(dir: &Path, stem: &str, index: usize, ext: &str) -> std::path::PathBuf {
    dir.join(format!("{stem}_segment{index:02}.{ext}"))
}
