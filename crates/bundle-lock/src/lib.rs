//! Fail-fast exclusive write lock for bundle directories.
//!
//! A lock is a marker file created with exclusive-create semantics
//! (`O_CREAT | O_EXCL`), so two actors racing to acquire the same marker
//! always see exactly one winner, decided by the filesystem. There is no
//! waiting, retrying or timeout: [`WriteLock::acquire`] either returns
//! [`LockOutcome::Locked`] with a guard or [`LockOutcome::AlreadyLocked`].
//!
//! The lock is advisory and local to one path. It does not coordinate
//! readers, and it does not span multiple bundles.
//!
//! # Layout
//!
//! For a bundle at `root`, the marker lives at `root/.bundle/.lock` and holds
//! a diagnostic `PID: <pid>` line. The same primitive is available for any
//! marker path via [`WriteLock::acquire_marker`].

pub mod error;
pub mod lock;

pub use error::{LockError, LockResult};
pub use lock::{LockGuard, LockOutcome, WriteLock, LOCK_FILE, METADATA_DIR};
