//! Detecting drift between a bundle's files and its manifest.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use bundle_checksum::{hash_file, Manifest};
use bundle_lock::{LockOutcome, WriteLock};
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::error::BundleResult;
use crate::layout::BundleLayout;

/// Re-hash every file in `manifest` and return the paths that are missing,
/// unreadable, no longer regular files, or whose content changed.
///
/// Reads only; takes no lock. An empty set means the bundle is intact.
pub fn verify(root: &Path, manifest: &Manifest) -> BTreeSet<String> {
    let mut corrupted = BTreeSet::new();
    for record in manifest.iter() {
        let path = root.join(&record.path);
        match fs::metadata(&path) {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => {
                debug!(path = %record.path, "no longer a regular file");
                corrupted.insert(record.path.clone());
                continue;
            }
            Err(e) => {
                debug!(path = %record.path, error = %e, "missing");
                corrupted.insert(record.path.clone());
                continue;
            }
        }
        match hash_file(&path) {
            Ok(actual) if actual == record.hash => {}
            Ok(actual) => {
                debug!(
                    path = %record.path,
                    expected = %record.hash.short_hex(),
                    actual = %actual.short_hex(),
                    "content changed"
                );
                corrupted.insert(record.path.clone());
            }
            Err(e) => {
                debug!(path = %record.path, error = %e, "unreadable");
                corrupted.insert(record.path.clone());
            }
        }
    }
    corrupted
}

/// Outcome of [`verify_bundle`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerifyReport {
    pub files_checked: usize,
    pub corrupted: BTreeSet<String>,
    pub checked_at: DateTime<Utc>,
}

impl VerifyReport {
    pub fn is_valid(&self) -> bool {
        self.corrupted.is_empty()
    }
}

/// Verify a persisted bundle against its own `SHA256SUM.txt`.
///
/// The result is also recorded in `STATE.json` when the write lock is free.
/// Failing to record it is logged and does not affect the report.
pub fn verify_bundle(root: &Path) -> BundleResult<VerifyReport> {
    let layout = BundleLayout::new(root);
    let manifest = layout.read_manifest()?;
    let report = VerifyReport {
        files_checked: manifest.len(),
        corrupted: verify(root, &manifest),
        checked_at: Utc::now(),
    };
    if report.is_valid() {
        info!(root = %root.display(), files = report.files_checked, "bundle verified");
    } else {
        warn!(
            root = %root.display(),
            corrupted = report.corrupted.len(),
            "bundle verification failed"
        );
    }
    record_result(&layout, &report);
    Ok(report)
}

fn record_result(layout: &BundleLayout, report: &VerifyReport) {
    let guard = match WriteLock::acquire(layout.root()) {
        Ok(LockOutcome::Locked(guard)) => guard,
        Ok(LockOutcome::AlreadyLocked { .. }) => {
            debug!(root = %layout.root().display(), "locked, not recording verification");
            return;
        }
        Err(e) => {
            warn!(error = %e, "failed to record verification");
            return;
        }
    };
    let written = layout.read_state().and_then(|mut state| {
        state.mark_verified(report.is_valid(), report.checked_at);
        layout.write_state(&state)
    });
    if let Err(e) = written {
        warn!(error = %e, "failed to record verification");
    }
    if let Err(e) = guard.release() {
        warn!(error = %e, "failed to release lock after verification");
    }
}
