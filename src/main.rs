//! # vtsync CLI
//!
//! Binary entry point for the `vtsync` command-line tool.
//!
//! Its responsibilities are limited to parsing arguments with `clap`,
//! dispatching to a command, and turning the outcome into a process exit
//! status (see [`vtsync::exit_codes`]). All synchronization logic lives in
//! the library crate.

mod cli;
mod commands;

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<ExitCode> {
    let cli = cli::Cli::parse();
    cli.execute()
}
