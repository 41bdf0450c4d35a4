use anyhow::{Context, Result};
use arena_edr::data::trial::scan_directory;

use crate::cli::{CatalogFormat, ScanArgs};
use crate::exit_codes;
use crate::output;

pub fn execute(args: ScanArgs) -> i32 {
    match run(&args) {
        Ok(()) => exit_codes::SUCCESS,
        Err(e) => output::report(e),
    }
}

fn run(args: &ScanArgs) -> Result<()> {
    let summaries = scan_directory(&args.dir)
        .with_context(|| format!("scanning {}", args.dir.display()))?;

    let text = match args.format {
        CatalogFormat::Json => output::to_json(&summaries, false)?,
        CatalogFormat::Csv => {
            let mut writer = csv::Writer::from_writer(Vec::new());
            for summary in &summaries {
                writer.serialize(summary).context("serializing catalogue row")?;
            }
            let bytes = writer
                .into_inner()
                .map_err(|e| anyhow::anyhow!("flushing catalogue: {}", e.error()))?;
            String::from_utf8(bytes).context("catalogue is not UTF-8")?
        }
    };
    output::write_output(text.trim_end(), args.output.as_deref())
}
