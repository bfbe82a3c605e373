//! # Output Configuration
//!
//! Controls how the `vtsync` binary renders its run summary: colored status
//! labels and symbols when the terminal supports them, plain bracketed text
//! otherwise.
//!
//! ## Respecting User Preferences
//!
//! - `--color=never|always|auto` - CLI flag for color control
//! - `NO_COLOR` - Disables colors when set (per https://no-color.org/)
//! - `CLICOLOR=0` - Disables colors
//! - `CLICOLOR_FORCE=1` - Forces colors even in non-TTY
//! - `TERM=dumb` - Disables colors for dumb terminals
//!
//! ## Usage
//!
//! ```rust,ignore
//! use vtsync::output::{OutputConfig, emoji, status_label};
//! use vtsync::sync::SyncStatus;
//!
//! let config = OutputConfig::from_env_and_flag("auto");
//! println!("{} {}", emoji(&config, "✓", "[OK]"), status_label(&config, SyncStatus::Cloned));
//! ```

use std::env;

use console::style;

use crate::sync::SyncStatus;

/// Output configuration for controlling colors and symbols.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    /// Whether colors and symbols should be used in output.
    pub use_color: bool,
}

impl OutputConfig {
    /// Create an output configuration from environment and CLI flag.
    ///
    /// `color_flag` is the value of `--color`: "always", "never", or "auto".
    /// In auto mode colors are disabled by `NO_COLOR`, `CLICOLOR=0`,
    /// `TERM=dumb`, or a non-TTY stdout (unless `CLICOLOR_FORCE=1`).
    pub fn from_env_and_flag(color_flag: &str) -> Self {
        let use_color = match color_flag.to_lowercase().as_str() {
            "always" => true,
            "never" => false,
            _ => Self::detect_color_support(),
        };

        Self { use_color }
    }

    fn detect_color_support() -> bool {
        // The presence of the variable (even if empty) disables colors
        if env::var_os("NO_COLOR").is_some() {
            return false;
        }

        if env::var("CLICOLOR").is_ok_and(|v| v == "0") {
            return false;
        }

        if env::var("CLICOLOR_FORCE").is_ok_and(|v| v != "0" && !v.is_empty()) {
            return true;
        }

        if env::var("TERM").is_ok_and(|v| v == "dumb") {
            return false;
        }

        console::Term::stdout().features().colors_supported()
    }

    #[cfg(test)]
    pub fn with_color() -> Self {
        Self { use_color: true }
    }

    #[cfg(test)]
    pub fn without_color() -> Self {
        Self { use_color: false }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::from_env_and_flag("auto")
    }
}

/// Returns `emoji_str` when colors are enabled, `plain` otherwise.
pub fn emoji<'a>(config: &OutputConfig, emoji_str: &'a str, plain: &'a str) -> &'a str {
    if config.use_color {
        emoji_str
    } else {
        plain
    }
}

/// Render a synchronization status, colored by outcome when enabled.
pub fn status_label(config: &OutputConfig, status: SyncStatus) -> String {
    let label = status.to_string();
    if !config.use_color {
        return label;
    }

    let styled = match status {
        SyncStatus::Unchanged => style(label).dim(),
        SyncStatus::Updated | SyncStatus::Copied => style(label).cyan(),
        SyncStatus::Cloned => style(label).green(),
        SyncStatus::Failed => style(label).red().bold(),
    };
    styled.force_styling(true).to_string()
}
