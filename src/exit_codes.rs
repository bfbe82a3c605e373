//! Process exit codes used by the `vtsync` binary.
//!
//! - `0`: every declared repository was synchronized and materialized
//! - `1`: fatal error (unreadable or invalid declaration file, I/O failure)
//! - `2`: invalid command-line usage (reported by clap)
//! - `3`: the run completed but at least one repository failed

/// Everything succeeded.
pub const SUCCESS: u8 = 0;

/// Fatal error; the run was aborted.
pub const ERROR: u8 = 1;

/// Invalid command-line usage.
pub const USAGE: u8 = 2;

/// The run completed with one or more failed repositories.
pub const SYNC_FAILURES: u8 = 3;
