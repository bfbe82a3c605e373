//! # Materializer
//!
//! Produces the build output entry `<build_root>/<name>` from a fetch cache
//! entry. The output is always regenerated from scratch: the previous entry
//! is deleted, then the cache is copied with version-control internals and
//! repository bookkeeping files filtered out at every depth.
//!
//! Excluded names:
//!
//! - `.git`
//! - `changelog.md`
//! - `manifest.md`
//! - `viztool_def*.json`
//!
//! After the copy, `LICENSE` and `README.md` are carried over from the top
//! level of the cache entry when they exist.

use std::fs;
use std::path::{Path, PathBuf};

use glob::Pattern;
use log::{debug, warn};

use crate::error::{Error, Result};
use crate::filesystem;

/// File-name patterns never copied into the build output.
pub const EXCLUDED_PATTERNS: &[&str] = &[".git", "changelog.md", "manifest.md", "viztool_def*.json"];

/// Top-level files copied into the build output when present.
pub const CARRIED_FILES: &[&str] = &["LICENSE", "README.md"];

fn exclusion_patterns() -> Result<Vec<Pattern>> {
    EXCLUDED_PATTERNS
        .iter()
        .map(|pattern| Pattern::new(pattern).map_err(Error::from))
        .collect()
}

/// Whether a file or directory name is filtered out of the build output.
pub fn is_excluded(patterns: &[Pattern], file_name: &str) -> bool {
    patterns.iter().any(|pattern| pattern.matches(file_name))
}

/// Regenerate the build output entry for `name` from `cache_entry`.
///
/// Returns the path of the new output entry. On failure any half-written
/// output is removed, so the build root never holds a partial copy.
pub fn materialize(name: &str, cache_entry: &Path, build_root: &Path) -> Result<PathBuf> {
    let output = build_root.join(name);
    let failed = |message: String| Error::Materialization {
        name: name.to_string(),
        message,
    };

    filesystem::remove_if_exists(&output)
        .map_err(|e| failed(format!("cannot remove {}: {}", output.display(), e)))?;

    let patterns = exclusion_patterns()?;

    if let Err(e) = copy_filtered(cache_entry, &output, &patterns) {
        if let Err(cleanup) = filesystem::remove_if_exists(&output) {
            warn!(
                "[{}] Can't remove partial output {}: {}",
                name,
                output.display(),
                cleanup
            );
        }
        return Err(failed(e.to_string()));
    }

    debug!("[{}] Materialized into {}", name, output.display());
    Ok(output)
}

fn copy_filtered(cache_entry: &Path, output: &Path, patterns: &[Pattern]) -> std::io::Result<()> {
    let files = filesystem::copy_tree(cache_entry, output, |entry| {
        !is_excluded(patterns, &entry.file_name().to_string_lossy())
    })?;
    debug!("copied {} files from {}", files, cache_entry.display());

    let root = fs::canonicalize(cache_entry)?;
    for carried in CARRIED_FILES {
        let source = cache_entry.join(carried);
        if source.is_file() && filesystem::resolves_within(&root, &source) {
            fs::copy(&source, output.join(carried))?;
        }
    }
    Ok(())
}
