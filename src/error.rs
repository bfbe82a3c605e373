//! # Error Handling
//!
//! This module defines the centralized error type for `vtsync`. It uses
//! `thiserror` to build a single `Error` enum covering every failure mode of
//! the synchronization pipeline, each variant carrying enough context (URL,
//! reference, derived repository name) for a useful log line.
//!
//! Errors fall into two groups:
//!
//! - **Configuration errors** (`ConfigParse`, `DuplicateName`, `Yaml`) are
//!   fatal: the run aborts before touching the fetch cache or build tree.
//! - **Per-repository errors** (`ReferenceUnavailable`, `ReferenceNotFound`,
//!   `LocalCopy`, `GitClone`, `GitFetch`, `Materialization`, ...) are
//!   contained at the unit boundary by the orchestrator. They fail a single
//!   repository and never the whole run.
//!
//! The `Result` alias is used throughout the library.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for vtsync operations
#[derive(Error, Debug)]
pub enum Error {
    /// The repository declaration file could not be parsed or failed validation.
    #[error("Configuration error: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    ConfigParse {
        message: String,
        /// Optional hint for how to fix the declaration file
        hint: Option<String>,
    },

    /// Two declarations derive the same repository name and would share a
    /// cache directory.
    #[error("Configuration error: repository name '{name}' is derived from both {first} and {second}")]
    DuplicateName {
        name: String,
        first: String,
        second: String,
    },

    /// The remote could not be queried for its references.
    #[error("Reference {reference} unavailable for {url}: {message}")]
    ReferenceUnavailable {
        url: String,
        reference: String,
        message: String,
    },

    /// The remote (or the local cache) has no object for the reference.
    #[error("Reference {reference} not found for {url}")]
    ReferenceNotFound { url: String, reference: String },

    /// A local-path source could not be copied into the fetch cache.
    #[error("Cannot copy local source {}: {message}", path.display())]
    LocalCopy { path: PathBuf, message: String },

    /// An error occurred while cloning a Git repository.
    #[error("Git clone error for {url}@{reference}: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    GitClone {
        url: String,
        reference: String,
        message: String,
        /// Optional hint for how to resolve the clone issue
        hint: Option<String>,
    },

    /// Fetching into an existing cache entry failed.
    #[error("Git fetch error for {url}: {message}")]
    GitFetch { url: String, message: String },

    /// A local git command failed.
    #[error("Git command failed: {command} - {stderr}")]
    GitCommand { command: String, stderr: String },

    /// A git command exceeded its deadline and was killed.
    #[error("Git command timed out after {seconds}s: {command}")]
    Timeout { command: String, seconds: u64 },

    /// The fetch cache entry could not be inspected.
    #[error("Cache error: {message}")]
    Cache { message: String },

    /// Copying a fetch cache entry into the build tree failed.
    #[error("Materialization of '{name}' failed: {message}")]
    Materialization { name: String, message: String },

    /// The version manifest could not be written or read.
    #[error("Manifest error: {message}")]
    Manifest { message: String },

    /// The worker pool could not be created.
    #[error("Thread pool error: {message}")]
    ThreadPool { message: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A YAML parsing error, wrapped from `serde_yaml::Error`.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A glob pattern error, wrapped from `glob::PatternError`.
    #[error("Glob pattern error: {0}")]
    Glob(#[from] glob::PatternError),
}

impl Error {
    /// Whether this error aborts the whole run rather than a single repository.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::ConfigParse { .. } | Error::DuplicateName { .. } | Error::Yaml(_)
        )
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
