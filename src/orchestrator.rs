//! # Orchestrator
//!
//! Runs the whole synchronization for one declaration list:
//!
//! 1.  **Fan out**: every declaration becomes one independent unit of work
//!     (synchronize -> validate -> materialize), executed on a fixed-size
//!     `rayon` thread pool. Units touch only their own `vt-<name>` cache
//!     entry and `<name>` output entry.
//! 2.  **Barrier**: the parallel phase completes before anything global
//!     happens. Each unit yields a [`UnitOutcome`]; successes and failures
//!     are partitioned, preserving declaration order.
//! 3.  **Manifest**: `versions.yml` is rewritten with exactly the successes.
//! 4.  **Reconciliation**: every directory in the fetch or build root whose
//!     derived name did not succeed this run is removed from both roots.
//!
//! All state for a run lives in the [`Orchestrator`] value: no globals.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info, warn};
use rayon::prelude::*;

use crate::config::{self, Declaration};
use crate::defaults::{self, CACHE_PREFIX};
use crate::error::{Error, Result};
use crate::filesystem;
use crate::manifest::{self, ManifestEntry};
use crate::materialize::materialize;
use crate::repository::{DefaultGitOperations, GitOperations};
use crate::sync::{self, cache_entry_path, SyncStatus};
use crate::validate::{self, MissingArtifact};

/// Directories and parallelism for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Root holding `vt-<name>` git working copies.
    pub fetch_root: PathBuf,
    /// Root holding materialized `<name>` directories and the manifest.
    pub build_root: PathBuf,
    /// Number of repositories processed concurrently.
    pub jobs: usize,
    /// Deadline applied to every `git` subprocess.
    pub git_timeout: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            fetch_root: defaults::default_fetch_root(),
            build_root: defaults::default_build_root(),
            jobs: defaults::DEFAULT_JOBS,
            git_timeout: defaults::default_git_timeout(),
        }
    }
}

/// Pipeline stage at which a unit failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Sync,
    Validate,
    Materialize,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Stage::Sync => "synchronization",
            Stage::Validate => "validation",
            Stage::Materialize => "materialization",
        };
        f.write_str(label)
    }
}

/// A repository that went through the whole pipeline.
#[derive(Debug)]
pub struct UnitSuccess {
    pub entry: ManifestEntry,
    pub status: SyncStatus,
    pub warnings: Vec<MissingArtifact>,
}

/// A repository whose pipeline stopped early.
#[derive(Debug)]
pub struct UnitFailure {
    pub name: String,
    pub url: String,
    pub stage: Stage,
    pub error: Error,
}

/// Result of one unit of work.
#[derive(Debug)]
pub enum UnitOutcome {
    Success(UnitSuccess),
    Failure(UnitFailure),
}

/// Everything a run did.
#[derive(Debug)]
pub struct RunReport {
    pub succeeded: Vec<UnitSuccess>,
    pub failed: Vec<UnitFailure>,
    /// Names pruned by reconciliation.
    pub removed: Vec<String>,
    pub manifest_path: PathBuf,
}

impl RunReport {
    /// Whether every declared repository was materialized.
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn manifest_entries(&self) -> Vec<ManifestEntry> {
        self.succeeded.iter().map(|s| s.entry.clone()).collect()
    }
}

/// Coordinates one synchronization run.
pub struct Orchestrator {
    config: SyncConfig,
    git: Arc<dyn GitOperations>,
}

impl Orchestrator {
    pub fn new(config: SyncConfig, git: Arc<dyn GitOperations>) -> Self {
        Self { config, git }
    }

    /// An orchestrator driving the system `git` with the configured timeout.
    pub fn with_system_git(config: SyncConfig) -> Self {
        let git = Arc::new(DefaultGitOperations::new(config.git_timeout));
        Self::new(config, git)
    }

    /// Load declarations from `path` and run them.
    pub fn run_file(&self, path: &Path) -> Result<RunReport> {
        let declarations = config::from_file(path)?;
        self.run(&declarations)
    }

    /// Synchronize `declarations`, write the manifest, and prune the tree.
    ///
    /// Only configuration problems and failures to prepare the roots or
    /// write the manifest are returned as errors; per-repository failures
    /// are reported in [`RunReport::failed`].
    pub fn run(&self, declarations: &[Declaration]) -> Result<RunReport> {
        config::validate(declarations)?;

        fs::create_dir_all(&self.config.fetch_root)?;
        fs::create_dir_all(&self.config.build_root)?;

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.jobs.max(1))
            .thread_name(|index| format!("vtsync-worker-{}", index))
            .build()
            .map_err(|e| Error::ThreadPool {
                message: e.to_string(),
            })?;

        let outcomes: Vec<UnitOutcome> = pool.install(|| {
            declarations
                .par_iter()
                .map(|declaration| self.run_unit(declaration))
                .collect()
        });

        let mut succeeded = Vec::new();
        let mut failed = Vec::new();
        for outcome in outcomes {
            match outcome {
                UnitOutcome::Success(success) => succeeded.push(success),
                UnitOutcome::Failure(failure) => {
                    error!(
                        "[{}] {} failed: {}",
                        failure.name, failure.stage, failure.error
                    );
                    failed.push(failure);
                }
            }
        }

        let entries: Vec<ManifestEntry> = succeeded.iter().map(|s| s.entry.clone()).collect();
        let manifest_path = manifest::manifest_path(&self.config.build_root);
        manifest::write(&manifest_path, &entries)?;

        let keep: HashSet<String> = entries.iter().map(ManifestEntry::name).collect();
        let removed = self.reconcile(&keep);

        for line in manifest::render(&entries)?.lines() {
            debug!("{}", line);
        }

        Ok(RunReport {
            succeeded,
            failed,
            removed,
            manifest_path,
        })
    }

    /// Run synchronize -> validate -> materialize for one declaration.
    pub fn run_unit(&self, declaration: &Declaration) -> UnitOutcome {
        let name = declaration.name();
        let failure = |stage: Stage, error: Error| {
            UnitOutcome::Failure(UnitFailure {
                name: name.clone(),
                url: declaration.url.clone(),
                stage,
                error,
            })
        };

        let outcome = sync::sync(
            self.git.as_ref(),
            &name,
            &declaration.url,
            &declaration.reference,
            &self.config.fetch_root,
        );
        let (status, commit) = match outcome.into_result() {
            (status, Ok(commit)) => (status, commit),
            (_, Err(e)) => return failure(Stage::Sync, e),
        };

        let cache_entry = cache_entry_path(&self.config.fetch_root, &name);
        let warnings = match validate::validate(&name, &cache_entry) {
            Ok(warnings) => warnings,
            Err(e) => return failure(Stage::Validate, e),
        };

        if let Err(e) = materialize(&name, &cache_entry, &self.config.build_root) {
            return failure(Stage::Materialize, e);
        }

        info!("[{}] {} ({})", name, status, commit);
        UnitOutcome::Success(UnitSuccess {
            entry: ManifestEntry::new(declaration.clone(), commit),
            status,
            warnings,
        })
    }

    /// Remove cache and output directories for every name not in `keep`.
    ///
    /// Best-effort: removal failures are logged and skipped. Returns the
    /// pruned names in sorted order.
    pub fn reconcile(&self, keep: &HashSet<String>) -> Vec<String> {
        let mut stale: BTreeMap<String, BTreeSet<PathBuf>> = BTreeMap::new();

        for (dir_name, path) in list_directories(&self.config.fetch_root) {
            let name = dir_name
                .strip_prefix(CACHE_PREFIX)
                .unwrap_or(&dir_name)
                .to_string();
            if !keep.contains(&name) {
                let paths = stale.entry(name.clone()).or_default();
                paths.insert(path);
                paths.insert(self.config.build_root.join(&name));
            }
        }

        for (name, path) in list_directories(&self.config.build_root) {
            if !keep.contains(&name) {
                let paths = stale.entry(name.clone()).or_default();
                paths.insert(path);
                paths.insert(cache_entry_path(&self.config.fetch_root, &name));
            }
        }

        let mut removed = Vec::new();
        for (name, paths) in stale {
            let mut ok = true;
            for path in paths {
                if let Err(e) = filesystem::remove_if_exists(&path) {
                    warn!("[{}] Can't remove {}: {}", name, path.display(), e);
                    ok = false;
                }
            }
            if ok {
                info!("[{}] removed (unused for this run)", name);
            }
            removed.push(name);
        }
        removed
    }
}

/// Subdirectories of `root` as `(file name, path)` pairs.
fn list_directories(root: &Path) -> Vec<(String, PathBuf)> {
    let listing = match fs::read_dir(root) {
        Ok(listing) => listing,
        Err(e) => {
            warn!("Can't list {}: {}", root.display(), e);
            return Vec::new();
        }
    };

    listing
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .map(|entry| {
            (
                entry.file_name().to_string_lossy().into_owned(),
                entry.path(),
            )
        })
        .collect()
}
