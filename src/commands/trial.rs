use anyhow::{Context, Result};
use arena_edr::data::trial::{load_trial, Trial};

use crate::cli::TrialArgs;
use crate::commands::segments::emit;
use crate::exit_codes;
use crate::output;

pub fn execute(args: TrialArgs) -> i32 {
    match run(&args) {
        Ok(()) => exit_codes::SUCCESS,
        Err(e) => output::report(e),
    }
}

fn run(args: &TrialArgs) -> Result<()> {
    let options = args.decode.to_options()?;
    let text = std::fs::read_to_string(&args.trial)
        .with_context(|| format!("reading trial record {}", args.trial.display()))?;
    let trial = Trial::from_json(&text)
        .with_context(|| format!("parsing trial record {}", args.trial.display()))?;

    let loaded = load_trial(&trial, &args.data_dir, &options, args.segments.min_length)?;
    log::info!("Trial recording started {}", loaded.file_start);

    let stem = std::path::Path::new(&trial.file_name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "trial".to_string());
    emit(&loaded.segments, &stem, &args.segments)
}
