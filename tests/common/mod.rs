//! Shared test utilities for integration and E2E tests.
//!
//! ## Usage
//!
//! Add `mod common;` to your test file, then use the helpers:
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let fixture = TestFixture::new();
//!     let upstream = fixture.upstream("vt-foo", viztool_files());
//!     fixture.declare(&format!("- url: {}\n  ref: main\n", file_url(&upstream)));
//!     fixture.command().arg("sync").assert().success();
//! }
//! ```

use assert_fs::prelude::*;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    pub use assert_cmd::cargo::cargo_bin_cmd;
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::{
        commit_file, file_url, git, head_commit, init_git_repo, should_skip_git_tests,
        tree_snapshot, viztool_files, TestFixture,
    };
}

/// Check if tests needing the `git` binary should be skipped.
///
/// Returns `true` if `SKIP_GIT_TESTS` is set or `git` cannot be run.
#[allow(dead_code)]
pub fn should_skip_git_tests() -> bool {
    if std::env::var("SKIP_GIT_TESTS").is_ok() {
        return true;
    }
    Command::new("git")
        .arg("--version")
        .output()
        .map(|output| !output.status.success())
        .unwrap_or(true)
}

/// Run `git` in `dir`, panicking with its stderr on failure.
#[allow(dead_code)]
pub fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("Failed to run git");
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// The files a well-formed viztool repository carries.
#[allow(dead_code)]
pub fn viztool_files() -> Vec<(&'static str, &'static str)> {
    vec![
        ("viztool_def.json", r#"{"name": "tool"}"#),
        ("manifest.json", r#"{"files": ["index.js"]}"#),
        ("index.js", "export default function render() {}\n"),
        ("lib/helpers.js", "export const id = (x) => x;\n"),
        ("LICENSE", "Apache-2.0\n"),
        ("README.md", "# tool\n"),
        ("changelog.md", "## 1.0.0\n"),
    ]
}

/// Initialize a git repository on branch `main` with one commit of `files`.
///
/// Returns the commit id of `HEAD`.
#[allow(dead_code)]
pub fn init_git_repo(dir: &Path, files: &[(&str, &str)]) -> String {
    std::fs::create_dir_all(dir).expect("Failed to create repository directory");
    git(dir, &["init", "-b", "main"]);
    git(dir, &["config", "user.email", "test@example.com"]);
    git(dir, &["config", "user.name", "Test User"]);
    // Disable commit signing for tests
    git(dir, &["config", "commit.gpgsign", "false"]);
    git(dir, &["config", "tag.gpgsign", "false"]);

    for (path, content) in files {
        write_file(dir, path, content);
    }

    git(dir, &["add", "."]);
    git(dir, &["commit", "-m", "Initial commit"]);
    head_commit(dir)
}

/// Write `path` with `content` and commit it. Returns the new `HEAD`.
#[allow(dead_code)]
pub fn commit_file(dir: &Path, path: &str, content: &str) -> String {
    write_file(dir, path, content);
    git(dir, &["add", "."]);
    git(dir, &["commit", "-m", &format!("Update {}", path)]);
    head_commit(dir)
}

/// The commit id checked out in `dir`.
#[allow(dead_code)]
pub fn head_commit(dir: &Path) -> String {
    git(dir, &["rev-parse", "HEAD"])
}

/// A `file://` URL for a local repository, so it is treated as a git remote
/// rather than a local-path source.
#[allow(dead_code)]
pub fn file_url(dir: &Path) -> String {
    format!("file://{}", dir.display())
}

/// Every path below `dir` in name order, with file contents (`None` for
/// directories), for comparing whole trees.
#[allow(dead_code)]
pub fn tree_snapshot(dir: &Path) -> Vec<(PathBuf, Option<Vec<u8>>)> {
    walkdir::WalkDir::new(dir)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .map(|entry| {
            let entry = entry.expect("Failed to walk tree");
            let relative = entry.path().strip_prefix(dir).unwrap().to_path_buf();
            let content = entry
                .file_type()
                .is_file()
                .then(|| std::fs::read(entry.path()).expect("Failed to read file"));
            (relative, content)
        })
        .collect()
}

fn write_file(dir: &Path, path: &str, content: &str) {
    let target = dir.join(path);
    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent).expect("Failed to create parent directory");
    }
    std::fs::write(target, content).expect("Failed to write file");
}

/// A temporary working directory holding upstream repositories, the
/// declaration file, and the fetch and build roots.
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

#[allow(dead_code)]
impl TestFixture {
    /// Create a new test fixture with an empty temporary directory.
    pub fn new() -> Self {
        Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Write `repo-list.yml` with the given content.
    pub fn declare(&self, content: &str) -> &Self {
        self.temp_dir
            .child("repo-list.yml")
            .write_str(content)
            .expect("Failed to write declaration file");
        self
    }

    /// Create an upstream git repository named `dir_name` under `upstream/`.
    pub fn upstream(&self, dir_name: &str, files: Vec<(&str, &str)>) -> PathBuf {
        let dir = self.path().join("upstream").join(dir_name);
        init_git_repo(&dir, &files);
        dir
    }

    /// Create a plain directory source named `dir_name` under `sources/`.
    pub fn local_source(&self, dir_name: &str, files: Vec<(&str, &str)>) -> PathBuf {
        let dir = self.path().join("sources").join(dir_name);
        for (path, content) in files {
            write_file(&dir, path, content);
        }
        dir
    }

    /// Get the path to the temporary directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Create a child path in the temp directory.
    pub fn child(&self, path: &str) -> assert_fs::fixture::ChildPath {
        self.temp_dir.child(path)
    }

    pub fn config_path(&self) -> PathBuf {
        self.path().join("repo-list.yml")
    }

    pub fn fetch_root(&self) -> PathBuf {
        self.path().join("fetch-vt")
    }

    pub fn build_root(&self) -> PathBuf {
        self.path().join("vt")
    }

    pub fn manifest(&self) -> String {
        std::fs::read_to_string(self.build_root().join("versions.yml"))
            .expect("Failed to read versions.yml")
    }

    /// A `vtsync` command running in this fixture's directory, with logging
    /// kept to warnings so stdout assertions stay readable.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("vtsync");
        cmd.current_dir(self.path())
            .env_remove("RUST_LOG")
            .env_remove("VTSYNC_CONFIG")
            .env_remove("VTSYNC_FETCH_ROOT")
            .env_remove("VTSYNC_BUILD_ROOT")
            .env_remove("VTSYNC_JOBS")
            .env("NO_COLOR", "1");
        cmd
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_creates_temp_dir() {
        let fixture = TestFixture::new();
        assert!(fixture.path().exists());
    }

    #[test]
    fn test_fixture_declare() {
        let fixture = TestFixture::new();
        fixture.declare("[]\n");
        assert!(fixture.config_path().exists());
    }

    #[test]
    fn test_fixture_local_source() {
        let fixture = TestFixture::new();
        let dir = fixture.local_source("vt-x", vec![("a/b.txt", "hello")]);
        assert!(dir.join("a/b.txt").exists());
    }
}
