//! # Version Manifest
//!
//! `versions.yml`, written under the build root after every run, records
//! which version of each repository was materialized. Each entry is the
//! declaration as written (including any extra metadata) plus a `commit`
//! field:
//!
//! ```yaml
//! - url: https://github.com/example/vt-curve.git
//!   ref: main
//!   commit: 4b825dc642cb6eb9a060e54bf8d69288fbee4904
//! - url: /home/me/work/vt-table
//!   ref: master
//!   commit: local_changes
//! ```
//!
//! The file is replaced wholesale each run and never merged with a previous
//! manifest.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::Declaration;
use crate::defaults::MANIFEST_FILE;
use crate::error::{Error, Result};
use crate::sync::Commit;

/// One successfully materialized repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    #[serde(flatten)]
    pub declaration: Declaration,
    pub commit: Commit,
}

impl ManifestEntry {
    pub fn new(declaration: Declaration, commit: Commit) -> Self {
        Self {
            declaration,
            commit,
        }
    }

    pub fn name(&self) -> String {
        self.declaration.name()
    }
}

/// Location of the manifest under `build_root`.
pub fn manifest_path(build_root: &Path) -> PathBuf {
    build_root.join(MANIFEST_FILE)
}

/// Serialize entries to the manifest's YAML form.
pub fn render(entries: &[ManifestEntry]) -> Result<String> {
    Ok(serde_yaml::to_string(entries)?)
}

/// Replace the manifest at `path` with `entries`.
///
/// The document is written to a sibling temporary file and renamed into
/// place, so readers never observe a truncated manifest.
pub fn write(path: &Path, entries: &[ManifestEntry]) -> Result<()> {
    let content = render(entries)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let staging = path.with_extension("yml.tmp");
    fs::write(&staging, content).map_err(|e| Error::Manifest {
        message: format!("cannot write {}: {}", staging.display(), e),
    })?;
    fs::rename(&staging, path).map_err(|e| Error::Manifest {
        message: format!("cannot replace {}: {}", path.display(), e),
    })?;
    Ok(())
}

/// Read a previously written manifest.
pub fn read(path: &Path) -> Result<Vec<ManifestEntry>> {
    let content = fs::read_to_string(path).map_err(|e| Error::Manifest {
        message: format!("cannot read {}: {}", path.display(), e),
    })?;
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }
    Ok(serde_yaml::from_str(&content)?)
}

/// One human-readable line per entry: `name  url@ref  commit`.
pub fn summary(entries: &[ManifestEntry]) -> Vec<String> {
    let width = entries
        .iter()
        .map(|entry| entry.name().len())
        .max()
        .unwrap_or(0);

    entries
        .iter()
        .map(|entry| {
            format!(
                "{:<width$}  {}@{}  {}",
                entry.name(),
                entry.declaration.url,
                entry.declaration.reference,
                entry.commit,
                width = width
            )
        })
        .collect()
}
