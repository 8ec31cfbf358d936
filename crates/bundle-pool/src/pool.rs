use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use bundle_core::{record_replica, BundleError, BundleLayout};
use bundle_lock::{LockGuard, LockOutcome, WriteLock};
use bundle_types::BundleId;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::copy::copy_tree;
use crate::error::{PoolError, PoolResult};

/// Whether the source bundle survives an import.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ImportMode {
    #[default]
    Copy,
    /// Remove the source once the pool copy is in place.
    Move,
}

/// A bundle stored in a pool.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PoolEntry {
    pub identity: BundleId,
    pub path: PathBuf,
}

/// One row of [`Pool::list`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PoolListing {
    pub identity: BundleId,
    pub title: String,
    pub author: String,
    pub created_at: DateTime<Utc>,
    pub path: PathBuf,
}

/// A content-addressed directory of bundles, each stored as `root/<identity>/`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Pool {
    name: String,
    root: PathBuf,
    title: String,
}

impl Pool {
    pub fn new(
        name: impl Into<String>,
        root: impl Into<PathBuf>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            root: root.into(),
            title: title.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Where a bundle with `identity` lives (or would live) in this pool.
    pub fn bundle_path(&self, identity: &BundleId) -> PathBuf {
        self.root.join(identity.to_hex())
    }

    pub fn contains(&self, identity: &BundleId) -> bool {
        self.bundle_path(identity).is_dir()
    }

    fn import_marker(&self, identity: &BundleId) -> PathBuf {
        self.root.join(format!("{}.import-lock", identity.to_hex()))
    }

    fn staging_path(&self, identity: &BundleId) -> PathBuf {
        self.root
            .join(format!(".{}.staging-{}", identity.to_hex(), Uuid::now_v7()))
    }

    /// Import the bundle at `source` under the identity recorded in its
    /// metadata.
    ///
    /// The copy is staged in a hidden sibling and renamed into place, so a
    /// partially copied bundle is never visible. Concurrent imports of the
    /// same identity are serialized by a per-identity marker; the loser gets
    /// [`PoolError::ImportInProgress`]. With [`ImportMode::Move`] the source
    /// is write-locked for the whole import (a locked source is refused with
    /// [`BundleError::Locked`]) and removed only after the rename succeeded.
    pub fn import(&self, source: &Path, mode: ImportMode) -> PoolResult<PoolEntry> {
        let layout = BundleLayout::new(source);
        layout.ensure_bundle()?;
        // A move deletes the source, so it must not be mid-write.
        let source_guard = match mode {
            ImportMode::Move => Some(lock_source(source)?),
            ImportMode::Copy => None,
        };
        let metadata = layout.read_metadata()?;
        let identity = metadata.bundle_checksum;
        debug!(
            pool = %self.name,
            source = %source.display(),
            identity = %identity.short_hex(),
            ?mode,
            "importing"
        );

        fs::create_dir_all(&self.root)
            .map_err(|e| PoolError::io("create pool root", &self.root, e))?;

        let guard = match WriteLock::acquire_marker(&self.import_marker(&identity))? {
            LockOutcome::Locked(guard) => guard,
            LockOutcome::AlreadyLocked { .. } => return Err(PoolError::ImportInProgress(identity)),
        };

        let dest = self.bundle_path(&identity);
        if dest.exists() {
            return Err(PoolError::Duplicate {
                identity,
                path: dest,
            });
        }

        let staging = self.staging_path(&identity);
        let bytes = match copy_tree(source, &staging) {
            Ok(bytes) => bytes,
            Err(e) => {
                remove_staging(&staging);
                return Err(e);
            }
        };
        if let Err(e) = fs::rename(&staging, &dest) {
            remove_staging(&staging);
            return Err(PoolError::io("rename", &dest, e));
        }
        info!(
            pool = %self.name,
            identity = %identity.short_hex(),
            bytes,
            dest = %dest.display(),
            "bundle imported"
        );

        match source_guard {
            Some(source_guard) => {
                // The marker lives inside the tree being removed.
                source_guard.release()?;
                fs::remove_dir_all(source).map_err(|e| PoolError::io("remove source", source, e))?;
                debug!(source = %source.display(), "source removed");
            }
            None => {
                if let Err(e) = record_replica(source, &dest.display().to_string()) {
                    warn!(error = %e, "failed to record replica on source");
                }
            }
        }

        guard.release()?;
        Ok(PoolEntry {
            identity,
            path: dest,
        })
    }

    /// Bundles in this pool, sorted by title then identity.
    ///
    /// Hidden entries, plain files and directories whose metadata cannot be
    /// loaded are skipped. A missing pool root is an empty pool.
    pub fn list(&self) -> PoolResult<Vec<PoolListing>> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(root = %self.root.display(), "pool root does not exist");
                return Ok(Vec::new());
            }
            Err(e) => return Err(PoolError::io("read", &self.root, e)),
        };

        let mut listings = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| PoolError::io("read", &self.root, e))?;
            if entry.file_name().to_string_lossy().starts_with('.') {
                continue;
            }
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            match BundleLayout::new(&path).read_metadata() {
                Ok(meta) => listings.push(PoolListing {
                    identity: meta.bundle_checksum,
                    title: meta.title,
                    author: meta.author,
                    created_at: meta.created_at,
                    path,
                }),
                Err(e) => debug!(path = %path.display(), error = %e, "skipping entry"),
            }
        }
        listings.sort_by(|a, b| a.title.cmp(&b.title).then(a.identity.cmp(&b.identity)));
        Ok(listings)
    }
}

fn lock_source(source: &Path) -> PoolResult<LockGuard> {
    let guard = WriteLock::acquire(source)?
        .into_guard()
        .map_err(BundleError::from)?;
    Ok(guard)
}

fn remove_staging(staging: &Path) {
    if staging.exists() {
        if let Err(e) = fs::remove_dir_all(staging) {
            warn!(
                path = %staging.display(),
                error = %e,
                "failed to remove staging directory"
            );
        }
    }
}
