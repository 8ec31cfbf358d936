//! Error types for lock operations.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while acquiring or releasing a lock.
#[derive(Debug, Error)]
pub enum LockError {
    /// The marker is held by another actor.
    ///
    /// Only produced by [`LockOutcome::into_guard`](crate::LockOutcome::into_guard);
    /// `acquire` itself reports contention as a regular outcome.
    #[error("locked by another process: {}", marker.display())]
    Held { marker: PathBuf },

    /// Filesystem failure while creating, writing or removing the marker.
    #[error("failed to {op} lock marker {}: {source}", path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl LockError {
    pub(crate) fn io(op: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            op,
            path: path.into(),
            source,
        }
    }
}

/// Convenience type alias for lock operations.
pub type LockResult<T> = std::result::Result<T, LockError>;
