//! Thin wrappers around the system `git` executable.
//!
//! Using the system git means authentication works the way the user already
//! configured it (SSH keys, credential helpers, personal access tokens).
//! Interactive prompts are disabled with `GIT_TERMINAL_PROMPT=0` so a worker
//! can never block on a password prompt, and every command runs under a
//! deadline after which the child process is killed.

use std::fs;
use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, Output, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use log::debug;

use crate::error::{Error, Result};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Build a `git` command with prompts disabled and stdin closed.
fn git(args: &[&str]) -> Command {
    let mut command = Command::new("git");
    command
        .args(args)
        .env("GIT_TERMINAL_PROMPT", "0")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    command
}

/// Drain a child pipe on a separate thread so a chatty command cannot fill
/// the pipe buffer and stall while we poll for exit.
fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> thread::JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buffer = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buffer);
        }
        buffer
    })
}

fn describe(args: &[&str]) -> String {
    format!("git {}", args.join(" "))
}

/// Run a git command to completion, killing it once `timeout` elapses.
///
/// Returns the raw output; callers decide what a non-zero status means.
fn run(args: &[&str], dir: Option<&Path>, timeout: Duration) -> Result<Output> {
    let mut command = git(args);
    if let Some(dir) = dir {
        command.current_dir(dir);
    }
    debug!("running {}", describe(args));

    let mut child: Child = command.spawn().map_err(|e| Error::GitCommand {
        command: describe(args),
        stderr: e.to_string(),
    })?;
    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());

    let start = Instant::now();
    let status = loop {
        match child.try_wait()? {
            Some(status) => break status,
            None if start.elapsed() > timeout => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(Error::Timeout {
                    command: describe(args),
                    seconds: timeout.as_secs(),
                });
            }
            None => thread::sleep(POLL_INTERVAL),
        }
    };

    Ok(Output {
        status,
        stdout: stdout.join().unwrap_or_default(),
        stderr: stderr.join().unwrap_or_default(),
    })
}

fn stderr_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).trim().to_string()
}

/// Whether `reference` is a full hexadecimal commit id.
pub fn is_commit_id(reference: &str) -> bool {
    matches!(reference.len(), 40 | 64) && reference.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Pick the commit a reference points to from `git ls-remote` output.
///
/// Preference order: branch, peeled tag, tag, exact full ref name, then
/// whatever git listed first.
pub fn parse_ls_remote(listing: &str, reference: &str) -> Option<String> {
    let refs: Vec<(&str, &str)> = listing
        .lines()
        .filter_map(|line| line.split_once('\t'))
        .map(|(hash, name)| (hash.trim(), name.trim()))
        .collect();

    let candidates = [
        format!("refs/heads/{}", reference),
        format!("refs/tags/{}^{{}}", reference),
        format!("refs/tags/{}", reference),
        reference.to_string(),
    ];

    candidates
        .iter()
        .find_map(|wanted| {
            refs.iter()
                .find(|(_, name)| name == wanted)
                .map(|(hash, _)| hash.to_string())
        })
        .or_else(|| refs.first().map(|(hash, _)| hash.to_string()))
}

/// Resolve `reference` on the remote at `url` without cloning it.
///
/// Equivalent to `git ls-remote <url> <reference>`, reduced to a single
/// commit id. Never touches a local directory.
pub fn resolve_remote_ref(url: &str, reference: &str, timeout: Duration) -> Result<String> {
    let output = run(&["ls-remote", url, reference], None, timeout).map_err(|e| {
        Error::ReferenceUnavailable {
            url: url.to_string(),
            reference: reference.to_string(),
            message: e.to_string(),
        }
    })?;

    if !output.status.success() {
        return Err(Error::ReferenceUnavailable {
            url: url.to_string(),
            reference: reference.to_string(),
            message: stderr_of(&output),
        });
    }

    let listing = String::from_utf8_lossy(&output.stdout);
    match parse_ls_remote(&listing, reference) {
        Some(commit) => Ok(commit),
        None if is_commit_id(reference) => Ok(reference.to_lowercase()),
        None => Err(Error::ReferenceNotFound {
            url: url.to_string(),
            reference: reference.to_string(),
        }),
    }
}

fn clone_error(url: &str, reference: &str, stderr: String) -> Error {
    // Provide helpful hint for common auth failures
    let hint = if stderr.contains("Authentication failed")
        || stderr.contains("Permission denied")
        || stderr.contains("Could not read from remote repository")
        || stderr.contains("terminal prompts disabled")
    {
        Some(
            "make sure you have access to the repository (SSH key in ssh-agent, \
             git credentials, or a personal access token)"
                .to_string(),
        )
    } else if stderr.contains("not found in upstream") {
        Some(format!("check that '{}' exists on the remote", reference))
    } else {
        None
    };

    Error::GitClone {
        url: url.to_string(),
        reference: reference.to_string(),
        message: stderr,
        hint,
    }
}

/// Clone `url` at `reference` into `target_dir`.
///
/// Branches and tags are cloned directly with `--branch`; a full commit id
/// is cloned without checkout and then checked out detached. The caller is
/// responsible for removing `target_dir` if this fails.
pub fn clone_at_ref(url: &str, reference: &str, target_dir: &Path, timeout: Duration) -> Result<()> {
    // git won't clone into an existing non-empty directory
    if target_dir.exists() {
        fs::remove_dir_all(target_dir)?;
    }
    if let Some(parent) = target_dir.parent() {
        fs::create_dir_all(parent)?;
    }

    let target = target_dir.to_string_lossy().into_owned();
    let args: Vec<&str> = if is_commit_id(reference) {
        vec!["clone", "--quiet", "--no-checkout", "--", url, target.as_str()]
    } else {
        vec!["clone", "--quiet", "--branch", reference, "--", url, target.as_str()]
    };

    let output = run(&args, None, timeout).map_err(|e| clone_error(url, reference, e.to_string()))?;
    if !output.status.success() {
        return Err(clone_error(url, reference, stderr_of(&output)));
    }

    if is_commit_id(reference) {
        checkout_detached(target_dir, reference, timeout)
            .map_err(|e| clone_error(url, reference, e.to_string()))?;
    }

    Ok(())
}

/// Commit currently checked out in `repo_dir`.
pub fn head_commit(repo_dir: &Path, timeout: Duration) -> Result<String> {
    let args = ["rev-parse", "HEAD"];
    let output = run(&args, Some(repo_dir), timeout)?;
    if !output.status.success() {
        return Err(Error::GitCommand {
            command: describe(&args),
            stderr: stderr_of(&output),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Point `origin` at `url`, then fetch its branches and tags into `repo_dir`.
///
/// The declared URL may differ from the one the cache was cloned from (a
/// moved host or a mirror), so the remote is rewritten before every fetch.
pub fn fetch(url: &str, repo_dir: &Path, timeout: Duration) -> Result<()> {
    let fetch_error = |message: String| Error::GitFetch {
        url: url.to_string(),
        message,
    };

    for args in [
        &["remote", "set-url", "origin", url][..],
        &["fetch", "--quiet", "--tags", "--force", "origin"][..],
    ] {
        let output = run(args, Some(repo_dir), timeout).map_err(|e| fetch_error(e.to_string()))?;
        if !output.status.success() {
            return Err(fetch_error(stderr_of(&output)));
        }
    }
    Ok(())
}

/// Resolve `rev` to a commit inside `repo_dir`, or `None` if the object is
/// not present locally.
pub fn find_commit(repo_dir: &Path, rev: &str, timeout: Duration) -> Result<Option<String>> {
    let spec = format!("{}^{{commit}}", rev);
    let output = run(
        &["rev-parse", "--verify", "--quiet", &spec],
        Some(repo_dir),
        timeout,
    )?;
    if !output.status.success() {
        return Ok(None);
    }
    let commit = String::from_utf8_lossy(&output.stdout).trim().to_string();
    Ok((!commit.is_empty()).then_some(commit))
}

/// Move the checkout of `repo_dir` to `commit`, detaching HEAD.
pub fn checkout_detached(repo_dir: &Path, commit: &str, timeout: Duration) -> Result<()> {
    let args = ["checkout", "--quiet", "--force", "--detach", commit];
    let output = run(&args, Some(repo_dir), timeout)?;
    if !output.status.success() {
        return Err(Error::GitCommand {
            command: describe(&args),
            stderr: stderr_of(&output),
        });
    }
    Ok(())
}
