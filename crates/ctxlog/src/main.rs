//! Command-line entry point for the context log.

use clap::Parser;
use ctxlog::cli::{self, Cli};
use std::process::ExitCode;

fn main() -> anyhow::Result<ExitCode> {
    ctxlog::init_logging();
    let cli = Cli::parse();
    let output = cli::run(cli)?;
    println!("{output}");
    if cli::is_error(&output) {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}
