//! Directory walking for bundle assembly.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use bundle_lock::METADATA_DIR;
use tracing::{debug, trace};
use walkdir::{DirEntry, WalkDir};

use crate::error::{BundleError, BundleResult};

/// How symbolic links inside a bundle are treated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SymlinkPolicy {
    /// Ignore symlinks entirely.
    #[default]
    Skip,
    /// Include symlinks that resolve to regular files, hashing the target's
    /// content under the link's path. Dangling links and links to
    /// directories are skipped.
    Follow,
}

/// One entry yielded by [`scan_directory`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScanEntry {
    /// Absolute (root-joined) path of the entry.
    pub path: PathBuf,
    /// Path relative to the root, forward slashes.
    pub relative: String,
    pub is_dir: bool,
    /// Size in bytes; zero for directories.
    pub size: u64,
}

/// Walk `root` in file-name order, skipping the `.bundle/` subtree.
///
/// Directories are yielded as well as files so callers can report progress;
/// the root itself is not included.
pub fn scan_directory(root: &Path, policy: SymlinkPolicy) -> BundleResult<Vec<ScanEntry>> {
    let mut entries = Vec::new();
    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_metadata_dir(e));

    for entry in walker {
        let entry = entry.map_err(|e| walk_error(root, e))?;
        if entry.depth() == 0 {
            continue;
        }
        let file_type = entry.file_type();
        let (is_dir, size) = if file_type.is_dir() {
            (true, 0)
        } else if file_type.is_file() {
            let meta = entry.metadata().map_err(|e| walk_error(root, e))?;
            (false, meta.len())
        } else if file_type.is_symlink() {
            match resolve_link(entry.path(), policy) {
                Some(size) => (false, size),
                None => continue,
            }
        } else {
            trace!(path = %entry.path().display(), "skipping special file");
            continue;
        };

        entries.push(ScanEntry {
            relative: relative_path(root, entry.path())?,
            path: entry.into_path(),
            is_dir,
            size,
        });
    }
    Ok(entries)
}

fn is_metadata_dir(entry: &DirEntry) -> bool {
    entry.depth() > 0 && entry.file_type().is_dir() && entry.file_name() == METADATA_DIR
}

/// Size of the link target if it should be included under `policy`.
fn resolve_link(path: &Path, policy: SymlinkPolicy) -> Option<u64> {
    if policy == SymlinkPolicy::Skip {
        trace!(path = %path.display(), "skipping symlink");
        return None;
    }
    match fs::metadata(path) {
        Ok(meta) if meta.is_file() => Some(meta.len()),
        Ok(_) => {
            debug!(path = %path.display(), "skipping symlink to non-file");
            None
        }
        Err(e) => {
            debug!(path = %path.display(), error = %e, "skipping dangling symlink");
            None
        }
    }
}

fn relative_path(root: &Path, path: &Path) -> BundleResult<String> {
    let rel = path
        .strip_prefix(root)
        .map_err(|_| BundleError::NonUtf8Path(path.to_path_buf()))?;
    let mut parts = Vec::new();
    for component in rel.components() {
        if let Component::Normal(part) = component {
            let part = part
                .to_str()
                .ok_or_else(|| BundleError::NonUtf8Path(path.to_path_buf()))?;
            parts.push(part);
        }
    }
    Ok(parts.join("/"))
}

fn walk_error(root: &Path, err: walkdir::Error) -> BundleError {
    let path = err
        .path()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| root.to_path_buf());
    let message = err.to_string();
    let source = err
        .into_io_error()
        .unwrap_or_else(|| io::Error::other(message));
    BundleError::io("walk", path, source)
}
