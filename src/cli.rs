//! CLI argument parsing and command dispatch

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

use vtsync::output::OutputConfig;

use crate::commands;

/// vtsync - Synchronize declared viztool repositories into a build tree
#[derive(Parser, Debug)]
#[command(name = "vtsync")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Colorize output (always, never, auto)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: String,

    /// Set log level (error, warn, info, debug, trace); RUST_LOG takes precedence
    #[arg(long, global = true, value_name = "LEVEL", default_value = "info")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Synchronize, validate and materialize every declared repository
    Sync(commands::sync::SyncArgs),

    /// Validate the declaration file without touching the network or disk
    Check(commands::check::CheckArgs),

    /// Show the versions recorded by the last synchronization
    Status(commands::status::StatusArgs),

    /// Generate shell completion scripts
    Completions(commands::completions::CompletionsArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<ExitCode> {
        init_logging(&self.log_level);
        let output = OutputConfig::from_env_and_flag(&self.color);

        match self.command {
            Commands::Sync(args) => commands::sync::execute(args, &output),
            Commands::Check(args) => commands::check::execute(args),
            Commands::Status(args) => commands::status::execute(args),
            Commands::Completions(args) => {
                commands::completions::execute(args)?;
                Ok(ExitCode::SUCCESS)
            }
        }
    }
}

/// Route `log` records to stderr, filtered by `RUST_LOG` or else `level`.
fn init_logging(level: &str) {
    let env = env_logger::Env::default().default_filter_or(level);
    // A logger may already be installed when running under a test harness
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .format_target(false)
        .try_init();
}
