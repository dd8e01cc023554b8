//! Binary entry point for dejavu.
//!
//! This binary provides the CLI interface for the repost detection engine.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print_stderr in main binary for CLI output
#![allow(clippy::print_stderr)]
#![allow(clippy::print_stdout)]

use clap::Parser;
use dejavu::cli::{self, Cli};
use dejavu::observability;
use std::process::ExitCode;

fn main() -> ExitCode {
    // Load .env if present; ignore absence.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    observability::init(cli.verbose);

    match cli::run(&cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
