use clap::Parser;

mod cli;
mod commands;
mod exit_codes;
mod output;

use cli::Cli;

fn main() {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(log_level)
        .parse_default_env()
        .format_timestamp(None)
        .init();

    let exit_code = match cli.command {
        cli::Command::Info(args) => commands::info::execute(args),
        cli::Command::Decode(args) => commands::decode::execute(args),
        cli::Command::Segments(args) => commands::segments::execute(args),
        cli::Command::Trial(args) => commands::trial::execute(args),
        cli::Command::Scan(args) => commands::scan::execute(args),
    };

    std::process::exit(exit_code);
}
