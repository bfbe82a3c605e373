//! # Check Command Implementation
//!
//! Parses and validates the repository declaration file (schema, derived
//! names, duplicates) and lists what a `sync` would process. This command
//! is read-only: it contacts no remote and touches neither the fetch cache
//! nor the build tree.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;

use vtsync::config::{self, Declaration};
use vtsync::defaults::DECLARATION_FILE;
use vtsync::exit_codes;

/// Validate the declaration file
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Path to the repository declaration file.
    #[arg(short, long, value_name = "FILE", env = "VTSYNC_CONFIG", default_value = DECLARATION_FILE)]
    pub config: PathBuf,
}

/// Execute the `check` command.
pub fn execute(args: CheckArgs) -> Result<ExitCode> {
    let declarations = config::from_file(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    println!(
        "Configuration loaded successfully: {} {}",
        declarations.len(),
        if declarations.len() == 1 {
            "repository"
        } else {
            "repositories"
        }
    );
    for line in describe(&declarations) {
        println!("  {}", line);
    }

    Ok(ExitCode::from(exit_codes::SUCCESS))
}

fn describe(declarations: &[Declaration]) -> Vec<String> {
    declarations
        .iter()
        .map(|declaration| {
            let kind = if declaration.is_local() { " (local)" } else { "" };
            format!(
                "{} -> {}@{}{}",
                declaration.name(),
                declaration.url,
                declaration.reference,
                kind
            )
        })
        .collect()
}
