//! On-disk directory helpers shared by the synchronizer and materializer.

use std::fs;
use std::io::{self, ErrorKind};
use std::path::Path;

use log::warn;
use walkdir::{DirEntry, WalkDir};

/// Recursively copy the directory `src` into `dst`, creating `dst` if needed.
///
/// `keep` is consulted for every entry below `src`; returning `false` for a
/// directory skips its whole subtree. Symlinks are followed, so the copy
/// contains file contents rather than links, but only when the link
/// resolves to somewhere inside `src`. Links leading out of `src`, and
/// dangling links, are skipped with a warning. Returns the number of files
/// copied.
pub fn copy_tree<F>(src: &Path, dst: &Path, keep: F) -> io::Result<u64>
where
    F: Fn(&DirEntry) -> bool,
{
    if !fs::metadata(src)?.is_dir() {
        return Err(io::Error::new(
            ErrorKind::InvalidInput,
            format!("{} is not a directory", src.display()),
        ));
    }
    let root = fs::canonicalize(src)?;
    fs::create_dir_all(dst)?;

    let mut copied = 0;
    let walker = WalkDir::new(src)
        .follow_links(true)
        .min_depth(1)
        .into_iter()
        // The root is filtered too, even though min_depth hides it
        .filter_entry(|e| e.depth() == 0 || (keep(e) && stays_within(&root, e)));

    for entry in walker {
        let entry = entry?;
        let relative = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| io::Error::new(ErrorKind::Other, e))?;
        let target = dst.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            fs::copy(entry.path(), &target)?;
            copied += 1;
        }
    }

    Ok(copied)
}

/// Whether `entry` is a plain entry, or a symlink resolving below `root`.
fn stays_within(root: &Path, entry: &DirEntry) -> bool {
    !entry.path_is_symlink() || resolves_within(root, entry.path())
}

/// Whether `path` resolves, through any symlinks, to a location below the
/// canonical directory `root`. Logs a warning when it does not.
pub fn resolves_within(root: &Path, path: &Path) -> bool {
    match fs::canonicalize(path) {
        Ok(target) if target.starts_with(root) => true,
        Ok(target) => {
            warn!(
                "Skipping {}: link points outside {} (to {})",
                path.display(),
                root.display(),
                target.display()
            );
            false
        }
        Err(e) => {
            warn!("Skipping {}: unresolvable link: {}", path.display(), e);
            false
        }
    }
}

/// Remove `path` (directory tree or single file). Returns `false` when there
/// was nothing to remove.
pub fn remove_if_exists(path: &Path) -> io::Result<bool> {
    let metadata = match fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e),
    };

    if metadata.is_dir() {
        fs::remove_dir_all(path)?;
    } else {
        fs::remove_file(path)?;
    }
    Ok(true)
}
