//! # Version-Control Capability
//!
//! The synchronizer never calls `git` directly. It talks to a
//! [`GitOperations`] implementation, which keeps the decision logic
//! (clone vs. fast-skip vs. update) testable without network access or real
//! repositories.
//!
//! - **`DefaultGitOperations`** wraps the system `git` command via
//!   [`crate::git`], applying a per-command timeout.
//! - Tests substitute mock implementations that record calls and simulate
//!   remote state.

use std::path::Path;
use std::time::Duration;

use crate::defaults;
use crate::error::Result;

/// What the synchronizer needs from a VCS client.
pub trait GitOperations: Send + Sync {
    /// Resolve `reference` on the remote at `url` to a commit id without
    /// cloning. Must not modify any local directory.
    fn resolve(&self, url: &str, reference: &str) -> Result<String>;

    /// Clone `url` at `reference` into `target_dir`.
    fn clone_at(&self, url: &str, reference: &str, target_dir: &Path) -> Result<()>;

    /// Commit currently checked out in the clone at `repo_dir`.
    fn head_commit(&self, repo_dir: &Path) -> Result<String>;

    /// Fetch updates from the clone's origin.
    fn fetch(&self, url: &str, repo_dir: &Path) -> Result<()>;

    /// Resolve `rev` inside the clone, or `None` if the object is unknown there.
    fn find_commit(&self, repo_dir: &Path, rev: &str) -> Result<Option<String>>;

    /// Move the clone's checkout to `commit`.
    fn checkout(&self, repo_dir: &Path, commit: &str) -> Result<()>;
}

/// The default implementation of `GitOperations`, which uses the system's
/// `git` command to perform real Git operations.
#[derive(Debug, Clone)]
pub struct DefaultGitOperations {
    timeout: Duration,
}

impl DefaultGitOperations {
    /// Create git operations whose subprocesses are killed after `timeout`.
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for DefaultGitOperations {
    fn default() -> Self {
        Self::new(defaults::default_git_timeout())
    }
}

impl GitOperations for DefaultGitOperations {
    fn resolve(&self, url: &str, reference: &str) -> Result<String> {
        crate::git::resolve_remote_ref(url, reference, self.timeout)
    }

    fn clone_at(&self, url: &str, reference: &str, target_dir: &Path) -> Result<()> {
        crate::git::clone_at_ref(url, reference, target_dir, self.timeout)
    }

    fn head_commit(&self, repo_dir: &Path) -> Result<String> {
        crate::git::head_commit(repo_dir, self.timeout)
    }

    fn fetch(&self, url: &str, repo_dir: &Path) -> Result<()> {
        crate::git::fetch(url, repo_dir, self.timeout)
    }

    fn find_commit(&self, repo_dir: &Path, rev: &str) -> Result<Option<String>> {
        crate::git::find_commit(repo_dir, rev, self.timeout)
    }

    fn checkout(&self, repo_dir: &Path, commit: &str) -> Result<()> {
        crate::git::checkout_detached(repo_dir, commit, self.timeout)
    }
}
