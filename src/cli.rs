use std::path::PathBuf;

use anyhow::Context;
use arena_edr::data::export::ExportFormat;
use arena_edr::data::trial::{parse_interval, DATA_DIRECTORY_ENV};
use arena_edr::{DecodeOptions, ExcludedInterval, DEFAULT_MIN_SEGMENT_LENGTH};
use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(
    name = "arena-edr",
    version,
    about = "Decode and segment arena EDR recordings",
    long_about = "Decode EDR telemetry recordings into calibrated, time-stamped channels\n\
                  and split them around experimenter-flagged excluded intervals."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show the header, start time and duration of a recording
    Info(InfoArgs),
    /// Decode a recording and export it
    Decode(DecodeArgs),
    /// Split a recording around excluded intervals
    Segments(SegmentsArgs),
    /// Load a trial record and split its recording
    Trial(TrialArgs),
    /// Catalogue the recordings in a directory
    Scan(ScanArgs),
}

/// Decode options shared by every command that decodes samples.
#[derive(Args)]
pub struct DecodeFlags {
    /// JSON file with decode options; flags below override it
    #[arg(long)]
    pub options: Option<PathBuf>,

    /// Decimate to this sampling interval in seconds
    #[arg(long)]
    pub dt: Option<f64>,

    /// Replace the difference channel with zscore(left) - zscore(right)
    #[arg(long, default_value_t = false)]
    pub lmr_zscore: bool,

    /// Convert the bar position channel to degrees in (-180, 180]
    #[arg(long, default_value_t = false)]
    pub barpos_degrees: bool,

    /// Unwrap the bar position channel
    #[arg(long, default_value_t = false)]
    pub unwrap_barpos: bool,

    /// Left amplitude channel name
    #[arg(long)]
    pub left: Option<String>,

    /// Right amplitude channel name
    #[arg(long)]
    pub right: Option<String>,

    /// Channel receiving the z-scored difference
    #[arg(long)]
    pub difference: Option<String>,

    /// Bar position channel name
    #[arg(long)]
    pub barpos: Option<String>,
}

impl DecodeFlags {
    /// Options file (if any) with command-line overrides applied.
    pub fn to_options(&self) -> anyhow::Result<DecodeOptions> {
        let mut options = match &self.options {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("reading options file {}", path.display()))?;
                DecodeOptions::from_json(&text)
                    .with_context(|| format!("parsing options file {}", path.display()))?
            }
            None => DecodeOptions::default(),
        };

        if self.dt.is_some() {
            options.target_dt = self.dt;
        }
        options.apply_lmr_zscore |= self.lmr_zscore;
        options.apply_barpos_degrees |= self.barpos_degrees;
        options.apply_barpos_unwrap |= self.unwrap_barpos;

        let roles = &mut options.roles;
        for (flag, slot) in [
            (&self.left, &mut roles.left),
            (&self.right, &mut roles.right),
            (&self.difference, &mut roles.difference),
            (&self.barpos, &mut roles.bar_position),
        ] {
            if let Some(name) = flag {
                *slot = name.clone();
            }
        }

        options.validate()?;
        Ok(options)
    }
}

#[derive(Args)]
pub struct InfoArgs {
    /// Recording (.edr)
    pub file: PathBuf,

    /// Output as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args)]
pub struct DecodeArgs {
    /// Recording (.edr)
    pub file: PathBuf,

    #[command(flatten)]
    pub decode: DecodeFlags,

    /// Output file
    #[arg(short, long)]
    pub output: PathBuf,

    /// Output format (default: from the output extension)
    #[arg(long, value_enum)]
    pub format: Option<ExportFormat>,
}

/// Where excluded intervals come from and how short a kept segment may be.
#[derive(Args)]
pub struct SegmentFlags {
    /// Minimum rows in a kept segment
    #[arg(long, default_value_t = DEFAULT_MIN_SEGMENT_LENGTH)]
    pub min_length: usize,

    /// Directory to write each kept segment into
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Format of the written segments
    #[arg(long, value_enum, default_value_t = ExportFormat::Csv)]
    pub format: ExportFormat,

    /// Print the segment list as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args)]
pub struct SegmentsArgs {
    /// Recording (.edr)
    pub file: PathBuf,

    /// Excluded interval as START:END in seconds (repeatable)
    #[arg(long = "exclude", value_parser = parse_exclusion)]
    pub exclude: Vec<ExcludedInterval>,

    /// JSON or CSV file of excluded intervals
    #[arg(long)]
    pub exclusions: Option<PathBuf>,

    #[command(flatten)]
    pub decode: DecodeFlags,

    #[command(flatten)]
    pub segments: SegmentFlags,
}

#[derive(Args)]
pub struct TrialArgs {
    /// Trial record (JSON with file_name, directory_path, excluded_intervals)
    pub trial: PathBuf,

    /// Root of the arena data tree
    #[arg(long, env = DATA_DIRECTORY_ENV)]
    pub data_dir: PathBuf,

    #[command(flatten)]
    pub decode: DecodeFlags,

    #[command(flatten)]
    pub segments: SegmentFlags,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CatalogFormat {
    Json,
    Csv,
}

#[derive(Args)]
pub struct ScanArgs {
    /// Directory containing .edr files
    pub dir: PathBuf,

    /// Catalogue format
    #[arg(long, value_enum, default_value_t = CatalogFormat::Json)]
    pub format: CatalogFormat,

    /// Output file (default: stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

fn parse_exclusion(text: &str) -> Result<ExcludedInterval, String> {
    parse_interval(text).map_err(|e| e.to_string())
}
