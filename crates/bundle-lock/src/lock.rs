use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{LockError, LockResult};

/// Name of the per-bundle metadata directory that holds the marker.
pub const METADATA_DIR: &str = ".bundle";

/// File name of the lock marker inside [`METADATA_DIR`].
pub const LOCK_FILE: &str = ".lock";

/// Result of a lock attempt.
///
/// Contention is an ordinary outcome rather than an error: callers must
/// decide explicitly whether to give up, report or try again later.
#[must_use = "dropping a Locked outcome releases the lock immediately"]
#[derive(Debug)]
pub enum LockOutcome {
    /// The marker was created; the guard owns it until released or dropped.
    Locked(LockGuard),
    /// The marker already exists.
    AlreadyLocked { marker: PathBuf },
}

impl LockOutcome {
    pub fn is_locked(&self) -> bool {
        matches!(self, Self::Locked(_))
    }

    /// Convert contention into [`LockError::Held`] for `?`-style callers.
    pub fn into_guard(self) -> LockResult<LockGuard> {
        match self {
            Self::Locked(guard) => Ok(guard),
            Self::AlreadyLocked { marker } => Err(LockError::Held { marker }),
        }
    }
}

/// Exclusive ownership of a lock marker.
///
/// Release explicitly with [`LockGuard::release`] to observe removal errors.
/// A guard that is dropped without being released still removes its marker,
/// logging any failure, so error paths never leave a bundle locked.
#[derive(Debug)]
pub struct LockGuard {
    marker: PathBuf,
    released: bool,
}

impl LockGuard {
    /// Path of the marker file this guard owns.
    pub fn marker(&self) -> &Path {
        &self.marker
    }

    /// Remove the marker. Work already done under the lock stays done even
    /// if this fails.
    pub fn release(mut self) -> LockResult<()> {
        self.released = true;
        remove_marker(&self.marker)
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(e) = remove_marker(&self.marker) {
            warn!(error = %e, "failed to release lock on drop");
        }
    }
}

fn remove_marker(marker: &Path) -> LockResult<()> {
    fs::remove_file(marker).map_err(|e| LockError::io("remove", marker, e))?;
    debug!(marker = %marker.display(), "lock released");
    Ok(())
}

/// Entry point for the bundle write lock.
pub struct WriteLock;

impl WriteLock {
    /// Marker path for the bundle rooted at `root`.
    pub fn marker_path(root: &Path) -> PathBuf {
        root.join(METADATA_DIR).join(LOCK_FILE)
    }

    /// Try to lock the bundle at `root`, creating `.bundle/` if needed.
    ///
    /// Never blocks. The same process acquiring twice also gets
    /// [`LockOutcome::AlreadyLocked`]: there is no re-entrancy.
    pub fn acquire(root: &Path) -> LockResult<LockOutcome> {
        let meta_dir = root.join(METADATA_DIR);
        fs::create_dir_all(&meta_dir)
            .map_err(|e| LockError::io("create directory for", &meta_dir, e))?;
        Self::acquire_marker(&Self::marker_path(root))
    }

    /// Try to create an arbitrary marker file with exclusive-create semantics.
    ///
    /// The parent directory must already exist.
    pub fn acquire_marker(marker: &Path) -> LockResult<LockOutcome> {
        let mut file = match OpenOptions::new().write(true).create_new(true).open(marker) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                debug!(marker = %marker.display(), "lock already held");
                return Ok(LockOutcome::AlreadyLocked {
                    marker: marker.to_path_buf(),
                });
            }
            Err(e) => return Err(LockError::io("create", marker, e)),
        };

        // From here on the guard owns the marker, so a failed write still
        // cleans up through Drop.
        let guard = LockGuard {
            marker: marker.to_path_buf(),
            released: false,
        };
        writeln!(file, "PID: {}", std::process::id())
            .map_err(|e| LockError::io("write", marker, e))?;

        debug!(marker = %marker.display(), "lock acquired");
        Ok(LockOutcome::Locked(guard))
    }

    /// Whether a marker currently exists for the bundle at `root`.
    pub fn is_locked(root: &Path) -> bool {
        Self::marker_path(root).exists()
    }

    /// Diagnostic content of the marker, if the bundle is locked.
    pub fn holder(root: &Path) -> LockResult<Option<String>> {
        let marker = Self::marker_path(root);
        match fs::read_to_string(&marker) {
            Ok(text) => Ok(Some(text.trim().to_string())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(LockError::io("read", marker, e)),
        }
    }
}
