//! # CLI Command Implementations
//!
//! One module per `vtsync` subcommand. Each defines an `Args` struct derived
//! with `clap` and an `execute` function that calls into the `vtsync`
//! library and returns the process exit status.

pub mod check;
pub mod completions;
pub mod status;
pub mod sync;
