//! # Status Command Implementation
//!
//! Prints the versions recorded in `<build_root>/versions.yml` by the last
//! `sync`, one line per materialized repository.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::Args;

use vtsync::defaults;
use vtsync::exit_codes;
use vtsync::manifest;

/// Show the versions recorded by the last synchronization
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Directory holding the materialized repositories and `versions.yml`.
    #[arg(long, value_name = "DIR", env = "VTSYNC_BUILD_ROOT")]
    pub build_root: Option<PathBuf>,
}

/// Execute the `status` command.
pub fn execute(args: StatusArgs) -> Result<ExitCode> {
    let build_root = args
        .build_root
        .unwrap_or_else(defaults::default_build_root);
    let path = manifest::manifest_path(&build_root);

    if !path.exists() {
        bail!(
            "No manifest found at {}; run `vtsync sync` first",
            path.display()
        );
    }

    let entries = manifest::read(&path)
        .with_context(|| format!("Failed to read manifest {}", path.display()))?;

    if entries.is_empty() {
        println!("No repositories materialized.");
    } else {
        for line in manifest::summary(&entries) {
            println!("{}", line);
        }
    }

    Ok(ExitCode::from(exit_codes::SUCCESS))
}
