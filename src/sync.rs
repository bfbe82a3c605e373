//! # Repository Synchronizer
//!
//! Brings one fetch cache entry (`<fetch_root>/vt-<name>`) in line with its
//! declaration, doing as little work as possible:
//!
//! 1.  **Local path** sources are copied wholesale every run, replacing the
//!     previous entry. They have no addressable version, so the commit is
//!     recorded as `local_changes`.
//! 2.  **Existing clone**: the remote reference is resolved with `ls-remote`.
//!     If the checkout already sits on that commit nothing happens
//!     (`unchanged`); otherwise the clone is fetched and moved to it
//!     (`updated`). Both record `no_info` since no new identifier was
//!     computed for the manifest.
//! 3.  **No clone yet**: the repository is cloned at the reference
//!     (`cloned`) and the resulting HEAD is recorded.
//!
//! Every failure is returned as [`SyncOutcome::Failed`]; nothing escapes
//! this module as a panic or an early return past the unit boundary. A failed
//! clone or local copy never leaves a partial cache entry behind, and a
//! failed update leaves the existing checkout untouched.

use std::fmt;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::config;
use crate::defaults::CACHE_PREFIX;
use crate::error::Error;
use crate::filesystem;
use crate::repository::GitOperations;

const LOCAL_CHANGES: &str = "local_changes";
const NO_INFO: &str = "no_info";

/// Version recorded in the manifest for a synchronized repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Commit {
    /// A real commit id obtained from a fresh clone.
    Id(String),
    /// The source is a local directory with no addressable version.
    LocalChanges,
    /// The cache was already current or was updated in place.
    NoInfo,
}

impl Commit {
    pub fn as_str(&self) -> &str {
        match self {
            Commit::Id(id) => id,
            Commit::LocalChanges => LOCAL_CHANGES,
            Commit::NoInfo => NO_INFO,
        }
    }
}

impl From<String> for Commit {
    fn from(value: String) -> Self {
        match value.as_str() {
            LOCAL_CHANGES => Commit::LocalChanges,
            NO_INFO => Commit::NoInfo,
            _ => Commit::Id(value),
        }
    }
}

impl From<Commit> for String {
    fn from(commit: Commit) -> Self {
        commit.as_str().to_string()
    }
}

impl fmt::Display for Commit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the synchronizer did to a cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    Unchanged,
    Updated,
    Cloned,
    Copied,
    Failed,
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SyncStatus::Unchanged => "unchanged",
            SyncStatus::Updated => "updated",
            SyncStatus::Cloned => "cloned",
            SyncStatus::Copied => "copied",
            SyncStatus::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// Structured result of synchronizing one repository.
#[derive(Debug)]
pub enum SyncOutcome {
    Unchanged,
    Updated,
    Cloned { commit: String },
    Copied,
    Failed(Error),
}

impl SyncOutcome {
    pub fn status(&self) -> SyncStatus {
        match self {
            SyncOutcome::Unchanged => SyncStatus::Unchanged,
            SyncOutcome::Updated => SyncStatus::Updated,
            SyncOutcome::Cloned { .. } => SyncStatus::Cloned,
            SyncOutcome::Copied => SyncStatus::Copied,
            SyncOutcome::Failed(_) => SyncStatus::Failed,
        }
    }

    /// The manifest commit for a successful outcome.
    pub fn commit(&self) -> Option<Commit> {
        match self {
            SyncOutcome::Unchanged | SyncOutcome::Updated => Some(Commit::NoInfo),
            SyncOutcome::Cloned { commit } => Some(Commit::Id(commit.clone())),
            SyncOutcome::Copied => Some(Commit::LocalChanges),
            SyncOutcome::Failed(_) => None,
        }
    }

    /// Split into the status and either the manifest commit or the error.
    pub fn into_result(self) -> (SyncStatus, Result<Commit, Error>) {
        let status = self.status();
        match self {
            SyncOutcome::Failed(error) => (status, Err(error)),
            other => {
                let commit = other.commit().unwrap_or(Commit::NoInfo);
                (status, Ok(commit))
            }
        }
    }
}

/// Location of the fetch cache entry for `name`.
pub fn cache_entry_path(fetch_root: &Path, name: &str) -> PathBuf {
    fetch_root.join(format!("{}{}", CACHE_PREFIX, name))
}

/// Synchronize the fetch cache entry for one declared repository.
pub fn sync(
    git: &dyn GitOperations,
    name: &str,
    url: &str,
    reference: &str,
    fetch_root: &Path,
) -> SyncOutcome {
    let entry = cache_entry_path(fetch_root, name);
    debug!("[{}] Processing ...", name);

    if config::is_local_path(url) {
        return copy_local(name, Path::new(url), &entry);
    }

    if entry.exists() {
        if entry.join(".git").exists() {
            return update(git, name, url, reference, &entry);
        }
        warn!(
            "[{}] {} is not a git checkout, cloning again",
            name,
            entry.display()
        );
        if let Err(e) = filesystem::remove_if_exists(&entry) {
            return SyncOutcome::Failed(Error::Cache {
                message: format!("cannot remove {}: {}", entry.display(), e),
            });
        }
    }

    clone(git, name, url, reference, &entry)
}

fn copy_local(name: &str, source: &Path, entry: &Path) -> SyncOutcome {
    if let Err(e) = filesystem::remove_if_exists(entry) {
        warn!("[{}] Can't remove {}: {}", name, entry.display(), e);
    }

    match filesystem::copy_tree(source, entry, |_| true) {
        Ok(files) => {
            info!("[{}] Copied {} files from {}", name, files, source.display());
            SyncOutcome::Copied
        }
        Err(e) => {
            warn!("[{}] Can't copy from path {}: {}", name, source.display(), e);
            let _ = filesystem::remove_if_exists(entry);
            SyncOutcome::Failed(Error::LocalCopy {
                path: source.to_path_buf(),
                message: e.to_string(),
            })
        }
    }
}

fn update(
    git: &dyn GitOperations,
    name: &str,
    url: &str,
    reference: &str,
    entry: &Path,
) -> SyncOutcome {
    let remote = match git.resolve(url, reference) {
        Ok(commit) => commit,
        Err(e) => {
            warn!("[{}] Cannot resolve {}: {}", name, reference, e);
            return SyncOutcome::Failed(e);
        }
    };

    let current = match git.head_commit(entry) {
        Ok(commit) => commit,
        Err(e) => return SyncOutcome::Failed(e),
    };

    if current == remote {
        info!("[{}] No changes detected", name);
        return SyncOutcome::Unchanged;
    }

    info!("[{}] Change detected ({} -> {})", name, current, remote);
    if let Err(e) = git.fetch(url, entry) {
        return SyncOutcome::Failed(e);
    }

    let target = match git.find_commit(entry, &remote) {
        Ok(Some(commit)) => commit,
        Ok(None) => {
            warn!(
                "[{}] Reference {} is not valid. Keeping current reference.",
                name, reference
            );
            return SyncOutcome::Failed(Error::ReferenceNotFound {
                url: url.to_string(),
                reference: reference.to_string(),
            });
        }
        Err(e) => return SyncOutcome::Failed(e),
    };

    match git.checkout(entry, &target) {
        Ok(()) => SyncOutcome::Updated,
        Err(e) => SyncOutcome::Failed(e),
    }
}

fn clone(
    git: &dyn GitOperations,
    name: &str,
    url: &str,
    reference: &str,
    entry: &Path,
) -> SyncOutcome {
    info!("[{}] New viztool detected", name);

    let result = git
        .clone_at(url, reference, entry)
        .and_then(|()| git.head_commit(entry));

    match result {
        Ok(commit) => SyncOutcome::Cloned { commit },
        Err(e) => {
            warn!("[{}] Impossible to clone {}: {}", name, url, e);
            if let Err(cleanup) = filesystem::remove_if_exists(entry) {
                warn!(
                    "[{}] Can't remove partial clone {}: {}",
                    name,
                    entry.display(),
                    cleanup
                );
            }
            SyncOutcome::Failed(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::TempDir;

    const OLD: &str = "1111111111111111111111111111111111111111";
    const NEW: &str = "2222222222222222222222222222222222222222";

    /// Simulates a remote whose reference points at `remote`, and clones whose
    /// checkout is tracked in memory.
    struct MockGitOperations {
        remote: Result<String>,
        head: Mutex<String>,
        fetched_has_commit: bool,
        clone_fails: bool,
        calls: Mutex<Vec<String>>,
    }

    impl MockGitOperations {
        fn new(remote: &str, head: &str) -> Self {
            Self {
                remote: Ok(remote.to_string()),
                head: Mutex::new(head.to_string()),
                fetched_has_commit: true,
                clone_fails: false,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: &str) {
            self.calls.lock().unwrap().push(call.to_string());
        }
    }

    impl GitOperations for MockGitOperations {
        fn resolve(&self, url: &str, reference: &str) -> Result<String> {
            self.record("resolve");
            match &self.remote {
                Ok(commit) => Ok(commit.clone()),
                Err(_) => Err(Error::ReferenceUnavailable {
                    url: url.to_string(),
                    reference: reference.to_string(),
                    message: "unreachable".to_string(),
                }),
            }
        }

        fn clone_at(&self, url: &str, reference: &str, target_dir: &Path) -> Result<()> {
            self.record("clone");
            fs::create_dir_all(target_dir.join(".git"))?;
            fs::write(target_dir.join("README.md"), "cloned")?;
            if self.clone_fails {
                return Err(Error::GitClone {
                    url: url.to_string(),
                    reference: reference.to_string(),
                    message: "Remote branch not found".to_string(),
                    hint: None,
                });
            }
            *self.head.lock().unwrap() = self.remote.as_ref().unwrap().clone();
            Ok(())
        }

        fn head_commit(&self, _repo_dir: &Path) -> Result<String> {
            self.record("head");
            Ok(self.head.lock().unwrap().clone())
        }

        fn fetch(&self, _url: &str, _repo_dir: &Path) -> Result<()> {
            self.record("fetch");
            Ok(())
        }

        fn find_commit(&self, _repo_dir: &Path, rev: &str) -> Result<Option<String>> {
            self.record("find");
            Ok(self.fetched_has_commit.then(|| rev.to_string()))
        }

        fn checkout(&self, _repo_dir: &Path, commit: &str) -> Result<()> {
            self.record("checkout");
            *self.head.lock().unwrap() = commit.to_string();
            Ok(())
        }
    }

    fn existing_clone(root: &Path, name: &str) -> PathBuf {
        let entry = cache_entry_path(root, name);
        fs::create_dir_all(entry.join(".git")).unwrap();
        entry
    }

    #[test]
    fn test_cache_entry_path() {
        assert_eq!(
            cache_entry_path(Path::new("fetch-vt"), "foo"),
            PathBuf::from("fetch-vt/vt-foo")
        );
    }

    #[test]
    fn test_commit_string_round_trip() {
        assert_eq!(Commit::from("local_changes".to_string()), Commit::LocalChanges);
        assert_eq!(Commit::from("no_info".to_string()), Commit::NoInfo);
        assert_eq!(Commit::from(OLD.to_string()), Commit::Id(OLD.to_string()));
        assert_eq!(String::from(Commit::NoInfo), "no_info");
    }

    #[test]
    fn test_clone_when_cache_missing() {
        let temp_dir = TempDir::new().unwrap();
        let git = MockGitOperations::new(NEW, "");

        let outcome = sync(&git, "foo", "https://example/vt-foo.git", "main", temp_dir.path());

        assert_eq!(outcome.status(), SyncStatus::Cloned);
        assert_eq!(outcome.commit(), Some(Commit::Id(NEW.to_string())));
        assert!(temp_dir.path().join("vt-foo/README.md").exists());
        assert_eq!(git.calls(), vec!["clone", "head"]);
    }

    #[test]
    fn test_unchanged_when_head_matches_remote() {
        let temp_dir = TempDir::new().unwrap();
        existing_clone(temp_dir.path(), "foo");
        let git = MockGitOperations::new(OLD, OLD);

        let outcome = sync(&git, "foo", "https://example/vt-foo.git", "main", temp_dir.path());

        assert_eq!(outcome.status(), SyncStatus::Unchanged);
        assert_eq!(outcome.commit(), Some(Commit::NoInfo));
        assert_eq!(git.calls(), vec!["resolve", "head"]);
    }

    #[test]
    fn test_update_when_remote_moved() {
        let temp_dir = TempDir::new().unwrap();
        existing_clone(temp_dir.path(), "foo");
        let git = MockGitOperations::new(NEW, OLD);

        let outcome = sync(&git, "foo", "https://example/vt-foo.git", "main", temp_dir.path());

        assert_eq!(outcome.status(), SyncStatus::Updated);
        assert_eq!(outcome.commit(), Some(Commit::NoInfo));
        assert_eq!(*git.head.lock().unwrap(), NEW);
        assert_eq!(
            git.calls(),
            vec!["resolve", "head", "fetch", "find", "checkout"]
        );
    }

    #[test]
    fn test_update_missing_object_leaves_checkout() {
        let temp_dir = TempDir::new().unwrap();
        existing_clone(temp_dir.path(), "foo");
        let mut git = MockGitOperations::new(NEW, OLD);
        git.fetched_has_commit = false;

        let outcome = sync(&git, "foo", "https://example/vt-foo.git", "main", temp_dir.path());

        assert!(matches!(
            outcome,
            SyncOutcome::Failed(Error::ReferenceNotFound { .. })
        ));
        assert_eq!(*git.head.lock().unwrap(), OLD);
        assert!(!git.calls().contains(&"checkout".to_string()));
        assert!(cache_entry_path(temp_dir.path(), "foo").exists());
    }

    #[test]
    fn test_unreachable_remote_leaves_cache() {
        let temp_dir = TempDir::new().unwrap();
        let entry = existing_clone(temp_dir.path(), "foo");
        let mut git = MockGitOperations::new(OLD, OLD);
        git.remote = Err(Error::Cache {
            message: String::new(),
        });

        let outcome = sync(&git, "foo", "https://example/vt-foo.git", "main", temp_dir.path());

        assert_eq!(outcome.status(), SyncStatus::Failed);
        assert!(entry.join(".git").exists());
        assert_eq!(git.calls(), vec!["resolve"]);
    }

    #[test]
    fn test_failed_clone_leaves_no_directory() {
        let temp_dir = TempDir::new().unwrap();
        let mut git = MockGitOperations::new(NEW, "");
        git.clone_fails = true;

        let outcome = sync(&git, "foo", "https://example/vt-foo.git", "nope", temp_dir.path());

        let (status, result) = outcome.into_result();
        assert_eq!(status, SyncStatus::Failed);
        assert!(matches!(result, Err(Error::GitClone { .. })));
        assert!(!cache_entry_path(temp_dir.path(), "foo").exists());
    }

    #[test]
    fn test_non_checkout_entry_is_recloned() {
        let temp_dir = TempDir::new().unwrap();
        let entry = cache_entry_path(temp_dir.path(), "foo");
        fs::create_dir_all(&entry).unwrap();
        fs::write(entry.join("stale.txt"), "from a local copy").unwrap();
        let git = MockGitOperations::new(NEW, "");

        let outcome = sync(&git, "foo", "https://example/vt-foo.git", "main", temp_dir.path());

        assert_eq!(outcome.status(), SyncStatus::Cloned);
        assert!(!entry.join("stale.txt").exists());
    }

    #[test]
    fn test_local_path_is_copied_and_replaced() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("source/vt-local");
        fs::create_dir_all(&source).unwrap();
        fs::write(source.join("index.js"), "v1").unwrap();

        let fetch_root = temp_dir.path().join("fetch");
        let entry = cache_entry_path(&fetch_root, "local");
        fs::create_dir_all(&entry).unwrap();
        fs::write(entry.join("leftover.js"), "old").unwrap();

        let git = MockGitOperations::new(NEW, "");
        let outcome = sync(&git, "local", &source.to_string_lossy(), "master", &fetch_root);

        assert_eq!(outcome.status(), SyncStatus::Copied);
        assert_eq!(outcome.commit(), Some(Commit::LocalChanges));
        assert_eq!(fs::read_to_string(entry.join("index.js")).unwrap(), "v1");
        assert!(!entry.join("leftover.js").exists());
        assert!(git.calls().is_empty());
    }

    #[test]
    fn test_local_path_missing_fails() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("missing/vt-gone");
        let git = MockGitOperations::new(NEW, "");

        let outcome = sync(&git, "gone", &source.to_string_lossy(), "master", temp_dir.path());

        assert!(matches!(outcome, SyncOutcome::Failed(Error::LocalCopy { .. })));
        assert!(!cache_entry_path(temp_dir.path(), "gone").exists());
    }
}
