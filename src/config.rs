//! # Repository Declarations
//!
//! This module defines the schema of the repository declaration file
//! (`repo-list.yml`) and the logic for parsing and validating it.
//!
//! The file is a YAML sequence. Each entry declares one viztool:
//!
//! ```yaml
//! - url: https://github.com/example/vt-curve.git
//!   ref: v1.2.0
//! - url: /home/me/work/vt-table      # local path, copied as-is
//! - url: git@github.com:example/vt-scatter.git
//!   maintainer: data-team            # extra keys are carried through
//! ```
//!
//! Every entry is identified by a short name derived from its URL (see
//! [`derive_name`]). Validation rejects entries whose derived names collide,
//! since they would share a fetch cache directory.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_yaml::Value;

use crate::defaults::DEFAULT_REF;
use crate::error::{Error, Result};

/// Keys that may not appear as extra metadata because the manifest writes them.
const RESERVED_KEYS: &[&str] = &["commit"];

/// One declared viztool repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Declaration {
    /// Remote URL, or a local filesystem path when it starts with a path separator.
    pub url: String,
    /// Branch, tag, or commit to synchronize.
    #[serde(rename = "ref", default = "default_ref")]
    pub reference: String,
    /// Any other keys, carried through to the manifest untouched.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

fn default_ref() -> String {
    DEFAULT_REF.to_string()
}

impl Declaration {
    pub fn new(url: impl Into<String>, reference: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            reference: reference.into(),
            extra: BTreeMap::new(),
        }
    }

    /// The canonical short name of this repository.
    pub fn name(&self) -> String {
        derive_name(&self.url)
    }

    /// Whether the source is a local directory rather than a git remote.
    pub fn is_local(&self) -> bool {
        is_local_path(&self.url)
    }
}

/// Derive the canonical repository name from a URL or path.
///
/// Takes the last path segment (ignoring trailing separators; both `/` and
/// the scp-style `:` delimit segments), then strips a `.git` suffix and a
/// `vt-` prefix.
///
/// ```
/// use vtsync::config::derive_name;
///
/// assert_eq!(derive_name("https://github.com/org/vt-curve.git"), "curve");
/// assert_eq!(derive_name("git@github.com:org/vt-table.git"), "table");
/// assert_eq!(derive_name("/srv/viztools/scatter/"), "scatter");
/// ```
pub fn derive_name(url: &str) -> String {
    let trimmed = url.trim_end_matches(['/', '\\']);
    let segment = trimmed.rsplit(['/', '\\', ':']).next().unwrap_or(trimmed);
    let segment = segment.strip_suffix(".git").unwrap_or(segment);
    segment.strip_prefix("vt-").unwrap_or(segment).to_string()
}

/// Whether `url` denotes a local filesystem path (leading path separator).
pub fn is_local_path(url: &str) -> bool {
    url.starts_with(std::path::is_separator)
}

/// Parse a declaration file's contents.
///
/// The whole document must be a YAML sequence of mappings. An empty
/// document is rejected so that an accidentally truncated file cannot prune
/// the entire build tree; an explicit `[]` is accepted.
pub fn parse(yaml_content: &str) -> Result<Vec<Declaration>> {
    let document: Value = serde_yaml::from_str(yaml_content)?;

    let entries = match document {
        Value::Sequence(entries) => entries,
        Value::Null => {
            return Err(Error::ConfigParse {
                message: "declaration file is empty".to_string(),
                hint: Some("use `[]` to declare no repositories".to_string()),
            })
        }
        _ => {
            return Err(Error::ConfigParse {
                message: "expected a list of repository declarations".to_string(),
                hint: Some("each entry looks like `- url: https://host/vt-name.git`".to_string()),
            })
        }
    };

    let declarations = entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            if !entry.is_mapping() {
                return Err(Error::ConfigParse {
                    message: format!("entry {} is not a mapping", index + 1),
                    hint: None,
                });
            }
            serde_yaml::from_value::<Declaration>(entry).map_err(|e| Error::ConfigParse {
                message: format!("entry {}: {}", index + 1, e),
                hint: None,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    validate(&declarations)?;
    Ok(declarations)
}

/// Check declarations for empty fields, unusable names, and name collisions.
pub fn validate(declarations: &[Declaration]) -> Result<()> {
    let mut seen: HashMap<String, &str> = HashMap::new();

    for (index, declaration) in declarations.iter().enumerate() {
        let entry = index + 1;

        if declaration.url.trim().is_empty() {
            return Err(Error::ConfigParse {
                message: format!("entry {}: 'url' is empty", entry),
                hint: None,
            });
        }
        if declaration.url.starts_with('-') || declaration.reference.starts_with('-') {
            return Err(Error::ConfigParse {
                message: format!("entry {}: 'url' and 'ref' may not start with '-'", entry),
                hint: None,
            });
        }
        if declaration.reference.trim().is_empty() {
            return Err(Error::ConfigParse {
                message: format!("entry {}: 'ref' is empty", entry),
                hint: Some(format!("omit 'ref' to use '{}'", DEFAULT_REF)),
            });
        }
        if let Some(key) = RESERVED_KEYS
            .iter()
            .find(|key| declaration.extra.contains_key(**key))
        {
            return Err(Error::ConfigParse {
                message: format!("entry {}: '{}' is a reserved key", entry, key),
                hint: None,
            });
        }

        let name = declaration.name();
        if name.is_empty() || name == "." || name == ".." {
            return Err(Error::ConfigParse {
                message: format!(
                    "entry {}: cannot derive a repository name from '{}'",
                    entry, declaration.url
                ),
                hint: None,
            });
        }

        if let Some(first) = seen.insert(name.clone(), &declaration.url) {
            return Err(Error::DuplicateName {
                name,
                first: first.to_string(),
                second: declaration.url.clone(),
            });
        }
    }

    Ok(())
}

/// Read and parse a declaration file.
pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Vec<Declaration>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| Error::ConfigParse {
        message: format!("cannot read {}: {}", path.display(), e),
        hint: None,
    })?;
    parse(&content)
}
