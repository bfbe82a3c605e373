//! Default values for vtsync configuration.
//!
//! This module provides centralized default values used across commands,
//! ensuring consistency and avoiding duplication.

use std::path::PathBuf;
use std::time::Duration;

/// Repository declaration file read by `sync` and `check`.
pub const DECLARATION_FILE: &str = "repo-list.yml";

/// Root directory holding one git working copy per viztool.
pub const FETCH_ROOT: &str = "fetch-vt";

/// Root directory holding the filtered, materialized viztools.
pub const BUILD_ROOT: &str = "vt";

/// Prefix of every fetch cache entry (`vt-<name>`).
pub const CACHE_PREFIX: &str = "vt-";

/// Version manifest written under the build root.
pub const MANIFEST_FILE: &str = "versions.yml";

/// Reference used when a declaration has no `ref`.
pub const DEFAULT_REF: &str = "master";

/// Number of repositories synchronized concurrently.
pub const DEFAULT_JOBS: usize = 4;

/// Deadline for a single git subprocess.
pub const DEFAULT_GIT_TIMEOUT_SECS: u64 = 300;

/// Returns the default fetch cache root, relative to the working directory.
///
/// This can be overridden by the `--fetch-root` CLI flag or the
/// `VTSYNC_FETCH_ROOT` environment variable.
pub fn default_fetch_root() -> PathBuf {
    PathBuf::from(FETCH_ROOT)
}

/// Returns the default build output root, relative to the working directory.
///
/// This can be overridden by the `--build-root` CLI flag or the
/// `VTSYNC_BUILD_ROOT` environment variable.
pub fn default_build_root() -> PathBuf {
    PathBuf::from(BUILD_ROOT)
}

/// Returns the default per-command git deadline.
pub fn default_git_timeout() -> Duration {
    Duration::from_secs(DEFAULT_GIT_TIMEOUT_SECS)
}
