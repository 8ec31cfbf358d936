//! Error types for pool operations.

use std::path::PathBuf;

use bundle_core::BundleError;
use bundle_lock::LockError;
use bundle_types::BundleId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PoolError {
    /// No pool with this name is configured.
    #[error("pool '{0}' not found in configuration")]
    PoolNotFound(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The pool already holds a bundle with this identity.
    #[error("bundle {identity} already exists in pool at {}", path.display())]
    Duplicate { identity: BundleId, path: PathBuf },

    /// Another import of the same identity is running.
    #[error("import of bundle {0} already in progress")]
    ImportInProgress(BundleId),

    #[error("failed to {op} {}: {source}", path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Bundle(#[from] BundleError),

    #[error(transparent)]
    Lock(#[from] LockError),
}

impl PoolError {
    pub(crate) fn io(op: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            op,
            path: path.into(),
            source,
        }
    }

    /// Whether this is an anticipated outcome rather than a system failure.
    pub fn is_expected(&self) -> bool {
        match self {
            Self::PoolNotFound(_)
            | Self::InvalidConfig(_)
            | Self::Duplicate { .. }
            | Self::ImportInProgress(_) => true,
            Self::Bundle(e) => e.is_expected(),
            Self::Io { .. } | Self::Lock(_) => false,
        }
    }
}

pub type PoolResult<T> = Result<T, PoolError>;
