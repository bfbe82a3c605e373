//! # vtsync
//!
//! Synchronizes a declared set of viztool repositories into a local build
//! tree. Each declared repository is kept as a git working copy in a fetch
//! cache, checked for the files a viztool must ship, and copied (filtered)
//! into a build output directory. A manifest records which version of each
//! repository was materialized, and anything no longer declared is pruned.
//!
//! ## Quick Example
//!
//! ```
//! use vtsync::config;
//!
//! let declarations = config::parse(
//!     r#"
//! - url: https://github.com/example/vt-curve.git
//!   ref: main
//! - url: /home/me/work/vt-table
//! "#,
//! )
//! .unwrap();
//!
//! assert_eq!(declarations[0].name(), "curve");
//! assert_eq!(declarations[1].reference, "master");
//! assert!(declarations[1].is_local());
//! ```
//!
//! ## Core Concepts
//!
//! - **Declarations (`config`)**: the `repo-list.yml` schema.
//! - **Git access (`git`, `repository`)**: the system `git` binary, behind the
//!   mockable [`repository::GitOperations`] trait.
//! - **Synchronizer (`sync`)**: brings one fetch cache entry to its declared
//!   reference with the least work (skip, update, clone or local copy).
//! - **Validator (`validate`)**: warns about missing viztool files.
//! - **Materializer (`materialize`)**: filtered copy into the build tree.
//! - **Manifest (`manifest`)**: the `versions.yml` record.
//! - **Orchestrator (`orchestrator`)**: runs all of the above for every
//!   declaration on a bounded worker pool, then reconciles the tree.
//!
//! ## Execution Flow
//!
//! 1.  **Load**: parse and validate the declaration file.
//! 2.  **Synchronize, validate, materialize**: one independent unit per
//!     repository, in parallel.
//! 3.  **Manifest**: record the successes.
//! 4.  **Reconcile**: remove cache and output entries for everything else.

pub mod config;
pub mod defaults;
pub mod error;
pub mod exit_codes;
pub mod filesystem;
pub mod git;
pub mod manifest;
pub mod materialize;
pub mod orchestrator;
pub mod output;
pub mod repository;
pub mod sync;
pub mod validate;

#[cfg(test)]
mod name_proptest;
