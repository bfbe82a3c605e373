//! # Sync Command Implementation
//!
//! Runs the full pipeline for every repository in the declaration file:
//! synchronize the fetch cache, validate it, materialize it into the build
//! tree, write `versions.yml`, and prune anything no longer declared.
//!
//! ## Exit status
//!
//! - `0` when every repository succeeded
//! - `3` when the run completed but some repositories failed
//! - `1` when the declaration file is invalid or the run could not proceed

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;

use vtsync::config;
use vtsync::defaults::{self, DECLARATION_FILE, DEFAULT_GIT_TIMEOUT_SECS, DEFAULT_JOBS};
use vtsync::exit_codes;
use vtsync::manifest;
use vtsync::orchestrator::{Orchestrator, RunReport, SyncConfig};
use vtsync::output::{emoji, status_label, OutputConfig};

/// Synchronize, validate and materialize every declared repository
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Path to the repository declaration file.
    #[arg(short, long, value_name = "FILE", env = "VTSYNC_CONFIG", default_value = DECLARATION_FILE)]
    pub config: PathBuf,

    /// Directory holding the `vt-<name>` git working copies.
    #[arg(long, value_name = "DIR", env = "VTSYNC_FETCH_ROOT")]
    pub fetch_root: Option<PathBuf>,

    /// Directory receiving the materialized repositories and `versions.yml`.
    #[arg(long, value_name = "DIR", env = "VTSYNC_BUILD_ROOT")]
    pub build_root: Option<PathBuf>,

    /// Number of repositories synchronized concurrently.
    #[arg(short, long, value_name = "N", env = "VTSYNC_JOBS", default_value_t = DEFAULT_JOBS, value_parser = parse_jobs)]
    pub jobs: usize,

    /// Seconds before a single git command is abandoned.
    #[arg(long, value_name = "SECS", default_value_t = DEFAULT_GIT_TIMEOUT_SECS)]
    pub timeout: u64,

    /// Only report failures.
    #[arg(short, long)]
    pub quiet: bool,
}

fn parse_jobs(value: &str) -> std::result::Result<usize, String> {
    match value.parse::<usize>() {
        Ok(0) => Err("must be at least 1".to_string()),
        Ok(jobs) => Ok(jobs),
        Err(e) => Err(e.to_string()),
    }
}

impl SyncArgs {
    fn sync_config(&self) -> SyncConfig {
        SyncConfig {
            fetch_root: self
                .fetch_root
                .clone()
                .unwrap_or_else(defaults::default_fetch_root),
            build_root: self
                .build_root
                .clone()
                .unwrap_or_else(defaults::default_build_root),
            jobs: self.jobs,
            git_timeout: Duration::from_secs(self.timeout),
        }
    }
}

/// Execute the `sync` command.
pub fn execute(args: SyncArgs, output: &OutputConfig) -> Result<ExitCode> {
    let declarations = config::from_file(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    let orchestrator = Orchestrator::with_system_git(args.sync_config());
    let report = orchestrator.run(&declarations)?;

    for line in render_report(&report, output, args.quiet) {
        println!("{}", line);
    }

    if report.is_success() {
        Ok(ExitCode::from(exit_codes::SUCCESS))
    } else {
        eprintln!(
            "{} of {} repositories failed",
            report.failed.len(),
            report.failed.len() + report.succeeded.len()
        );
        Ok(ExitCode::from(exit_codes::SYNC_FAILURES))
    }
}

/// Lines printed to stdout after a run.
fn render_report(report: &RunReport, output: &OutputConfig, quiet: bool) -> Vec<String> {
    let mut lines = Vec::new();

    if !quiet {
        for success in &report.succeeded {
            lines.push(format!(
                "{} {} {} ({})",
                emoji(output, "✓", "[OK]"),
                success.entry.name(),
                status_label(output, success.status),
                success.entry.commit
            ));
            for warning in &success.warnings {
                lines.push(format!("    {} {}", emoji(output, "⚠", "[WARN]"), warning));
            }
        }
    }

    for failure in &report.failed {
        lines.push(format!(
            "{} {} {} during {}: {}",
            emoji(output, "✗", "[FAIL]"),
            failure.name,
            status_label(output, vtsync::sync::SyncStatus::Failed),
            failure.stage,
            failure.error
        ));
    }

    if quiet {
        return lines;
    }

    for name in &report.removed {
        lines.push(format!("{} {} removed", emoji(output, "🗑", "[DEL]"), name));
    }

    lines.push(format!("Manifest written to {}", report.manifest_path.display()));
    let entries = report.manifest_entries();
    lines.extend(manifest::summary(&entries).into_iter().map(|l| format!("  {}", l)));
    lines
}
