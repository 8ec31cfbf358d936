//! Recursive tree copy used by pool import.

use std::fs;
use std::path::Path;

use bundle_lock::{LOCK_FILE, METADATA_DIR};
use tracing::trace;
use walkdir::WalkDir;

use crate::error::{PoolError, PoolResult};

/// Copy `src` into `dst` (which must not exist), preserving the directory
/// structure. The bundle's lock marker is never copied. Symlinks are copied
/// as the content they point to.
pub(crate) fn copy_tree(src: &Path, dst: &Path) -> PoolResult<u64> {
    let mut copied = 0u64;
    for entry in WalkDir::new(src).follow_links(false).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(src).to_path_buf();
            let message = e.to_string();
            let source = e
                .into_io_error()
                .unwrap_or_else(|| std::io::Error::other(message));
            PoolError::io("walk", path, source)
        })?;
        let Ok(rel) = entry.path().strip_prefix(src) else {
            continue;
        };
        if is_lock_marker(rel) {
            trace!(path = %entry.path().display(), "not copying lock marker");
            continue;
        }
        let target = dst.join(rel);
        let file_type = entry.file_type();
        if file_type.is_dir() {
            fs::create_dir_all(&target).map_err(|e| PoolError::io("create directory", &target, e))?;
        } else if file_type.is_file() || file_type.is_symlink() {
            match fs::copy(entry.path(), &target) {
                Ok(bytes) => copied += bytes,
                Err(e) if file_type.is_symlink() => {
                    trace!(
                        path = %entry.path().display(),
                        error = %e,
                        "skipping unreadable symlink"
                    );
                }
                Err(e) => return Err(PoolError::io("copy", entry.path(), e)),
            }
        }
    }
    Ok(copied)
}

fn is_lock_marker(rel: &Path) -> bool {
    let mut components = rel.components();
    matches!(
        (components.next(), components.next(), components.next()),
        (Some(a), Some(b), None) if a.as_os_str() == METADATA_DIR && b.as_os_str() == LOCK_FILE
    )
}
