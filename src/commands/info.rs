use anyhow::Result;
use arena_edr::data::header::Header;
use arena_edr::data::loader::read_header;
use serde::Serialize;

use crate::cli::InfoArgs;
use crate::exit_codes;
use crate::output;

#[derive(Serialize)]
struct InfoOutput<'a> {
    file: String,
    recording_start: String,
    n_channels: usize,
    n_timepoints: usize,
    dt: f64,
    recording_duration: f64,
    channels: &'a [String],
    header: &'a Header,
}

pub fn execute(args: InfoArgs) -> i32 {
    match run(&args) {
        Ok(()) => exit_codes::SUCCESS,
        Err(e) => output::report(e),
    }
}

fn run(args: &InfoArgs) -> Result<()> {
    let header = read_header(&args.file)?;
    let start = header.file_start()?;
    let n_timepoints = header.n_timepoints();

    let info = InfoOutput {
        file: args.file.display().to_string(),
        recording_start: start.to_string(),
        n_channels: header.n_channels,
        n_timepoints,
        dt: header.dt,
        recording_duration: n_timepoints as f64 * header.dt,
        channels: &header.channel_names,
        header: &header,
    };

    if args.json {
        let json = output::to_json(&info, false)?;
        output::write_output(&json, None)?;
    } else {
        println!("File: {}", info.file);
        println!("Recording start: {}", info.recording_start);
        println!(
            "{} channels, {} timepoints at {}s ({:.3}s)",
            info.n_channels, info.n_timepoints, info.dt, info.recording_duration
        );
        println!("Channels: {}", info.channels.join(", "));
        println!();
        for (key, value) in header.entries() {
            println!("{key}={value}");
        }
    }
    Ok(())
}
