use anyhow::Result;
use arena_edr::data::export::{write_recording, ExportFormat};
use arena_edr::load_file;

use crate::cli::DecodeArgs;
use crate::exit_codes;
use crate::output;

pub fn execute(args: DecodeArgs) -> i32 {
    match run(&args) {
        Ok(()) => exit_codes::SUCCESS,
        Err(e) => output::report(e),
    }
}

fn run(args: &DecodeArgs) -> Result<()> {
    let options = args.decode.to_options()?;
    let format = match args.format {
        Some(format) => format,
        None => ExportFormat::from_path(&args.output)?,
    };

    let decoded = load_file(&args.file, &options)?;
    write_recording(&decoded.recording, &args.output, format)?;

    eprintln!(
        "Decoded {} rows x {} columns from {} into {}",
        decoded.recording.n_rows(),
        decoded.recording.n_columns(),
        args.file.display(),
        args.output.display()
    );
    Ok(())
}
