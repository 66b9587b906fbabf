use std::error::Error;

use clap::Parser;
use commands::sweep::{self, SweepArgs};

mod commands;

#[derive(Parser, Debug)]
#[command(
    name = "gsweep",
    version,
    about = "Sweep gradient estimators over program parameters and stream results to CSV files"
)]
struct Cli {
    /// Log verbosity level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: tracing::Level,

    #[command(flatten)]
    sweep: SweepArgs,
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_max_level(cli.log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
    sweep::run(&cli.sweep)
}
