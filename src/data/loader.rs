use std::fs::File;
use std::io::Read;
use std::path::Path;

use super::error::{EdrError, Result};
use super::header::{parse_header, Header};
use super::model::{DecodedEdr, Recording};
use super::options::DecodeOptions;
use super::samples::{calibrate, decode_samples, fix_swapped_channels};
use super::timebase::{resample, with_time_column};
use super::transform::{barpos_degrees, barpos_unwrap, lmr_zscore};

/// Size of the ASCII header block; samples always start here.
pub const HEADER_BLOCK_SIZE: usize = 2048;

/// File extension of recordings, compared case-insensitively.
pub const EDR_EXTENSION: &str = "edr";

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Read and decode an `.edr` file.
///
/// The whole file is read in one go; the handle is closed before decoding
/// starts.
pub fn load_file(path: &Path, options: &DecodeOptions) -> Result<DecodedEdr> {
    check_extension(path)?;
    let bytes = std::fs::read(path)?;
    log::debug!("Read {} bytes from {}", bytes.len(), path.display());
    decode(&bytes, options)
}

/// Read just the header block of an `.edr` file.
pub fn read_header(path: &Path) -> Result<Header> {
    check_extension(path)?;
    let file = File::open(path)?;
    // One byte past the block so a line running over the boundary is seen
    // as crossing it.
    let mut bytes = Vec::with_capacity(HEADER_BLOCK_SIZE + 1);
    file.take(HEADER_BLOCK_SIZE as u64 + 1).read_to_end(&mut bytes)?;
    parse_header(&bytes, HEADER_BLOCK_SIZE)
}

/// Decode an in-memory EDR image with the standard header block size.
pub fn decode(bytes: &[u8], options: &DecodeOptions) -> Result<DecodedEdr> {
    decode_with_block_size(bytes, HEADER_BLOCK_SIZE, options)
}

/// Full pipeline: header → samples → calibration → channel fix-up → time
/// column → optional decimation → optional post-processing.
pub fn decode_with_block_size(
    bytes: &[u8],
    block_size: usize,
    options: &DecodeOptions,
) -> Result<DecodedEdr> {
    options.validate()?;

    let header = parse_header(bytes, block_size)?;
    let file_start = header.file_start()?;

    let raw = decode_samples(bytes, block_size, &header)?;
    let calibrated = calibrate(raw, &header)?;
    let (columns, names) = fix_swapped_channels(calibrated, header.channel_names.clone());
    let mut recording = with_time_column(columns, names, header.dt);

    if let Some(target_dt) = options.target_dt {
        recording = resample(recording, header.dt, target_dt)?;
    }
    let recording = post_process(recording, options)?;

    log::info!(
        "Decoded {} rows x {} columns (native dt {}s, started {})",
        recording.n_rows(),
        recording.n_columns(),
        header.dt,
        file_start
    );

    Ok(DecodedEdr {
        recording,
        file_start,
        header,
    })
}

/// Apply the derived-signal transforms enabled in `options`, in order:
/// z-score difference, degrees, unwrap.
pub fn post_process(mut recording: Recording, options: &DecodeOptions) -> Result<Recording> {
    if options.apply_lmr_zscore {
        recording = lmr_zscore(recording, &options.roles)?;
    }
    if options.apply_barpos_degrees {
        recording = barpos_degrees(recording, &options.roles)?;
    }
    if options.apply_barpos_unwrap {
        recording = barpos_unwrap(recording, &options.roles)?;
    }
    Ok(recording)
}

fn check_extension(path: &Path) -> Result<()> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    if ext == EDR_EXTENSION {
        Ok(())
    } else {
        Err(EdrError::format(format!(
            "'{}' is not an .edr file",
            path.display()
        )))
    }
}
