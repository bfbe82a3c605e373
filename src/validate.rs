//! Structural checks on a synchronized fetch cache entry.
//!
//! A viztool repository is expected to carry a `viztool_def.json` definition
//! and a `manifest.json` at its top level. Missing files are reported as
//! warnings only; the repository is still materialized.

use std::fmt;
use std::fs;
use std::path::Path;

use log::warn;

use crate::error::{Error, Result};

/// Viztool definition file.
pub const DEFINITION_FILE: &str = "viztool_def.json";

/// Viztool manifest file.
pub const MANIFEST_FILE: &str = "manifest.json";

const REQUIRED_FILES: [&str; 2] = [DEFINITION_FILE, MANIFEST_FILE];

/// A required top-level file absent from a cache entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingArtifact {
    pub name: String,
    pub file: &'static str,
}

impl fmt::Display for MissingArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} is missing", self.name, self.file)
    }
}

/// Check the top level of `cache_entry` for the required viztool files.
///
/// Returns one [`MissingArtifact`] per absent file (each also logged as a
/// warning). An entry that cannot be listed at all is an error, and the
/// caller must not materialize it.
pub fn validate(name: &str, cache_entry: &Path) -> Result<Vec<MissingArtifact>> {
    let listing = fs::read_dir(cache_entry).map_err(|e| Error::Cache {
        message: format!("cannot list {}: {}", cache_entry.display(), e),
    })?;

    let mut present = [false; REQUIRED_FILES.len()];
    for entry in listing {
        let entry = entry?;
        let file_name = entry.file_name();
        for (index, required) in REQUIRED_FILES.iter().enumerate() {
            if file_name == *required {
                present[index] = true;
            }
        }
    }

    let missing: Vec<MissingArtifact> = REQUIRED_FILES
        .iter()
        .zip(present)
        .filter(|(_, found)| !found)
        .map(|(file, _)| MissingArtifact {
            name: name.to_string(),
            file: *file,
        })
        .collect();

    for artifact in &missing {
        warn!("{}", artifact);
    }

    Ok(missing)
}
