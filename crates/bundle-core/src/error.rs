//! Error types for bundle operations.

use std::path::PathBuf;

use bundle_checksum::ChecksumError;
use bundle_lock::LockError;

/// Errors that can occur while creating, loading or verifying a bundle.
#[derive(Debug, thiserror::Error)]
pub enum BundleError {
    /// The directory has no `.bundle/` metadata subtree.
    #[error("directory is not a bundle (missing .bundle/): {}", .0.display())]
    NotABundle(PathBuf),

    /// The bundle root does not exist or is not a directory.
    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    /// Another actor holds the bundle's write lock.
    #[error("bundle is locked by another process: {}", .0.display())]
    Locked(PathBuf),

    /// Filesystem failure, tagged with the operation and path.
    #[error("failed to {op} {}: {source}", path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Hashing a file failed.
    #[error(transparent)]
    Checksum(ChecksumError),

    /// The persisted manifest could not be parsed.
    #[error("invalid manifest {}: {source}", path.display())]
    InvalidManifest {
        path: PathBuf,
        #[source]
        source: ChecksumError,
    },

    /// A metadata file could not be decoded or failed validation.
    #[error("invalid metadata {}: {reason}", path.display())]
    InvalidMetadata { path: PathBuf, reason: String },

    /// A file path under the bundle root is not valid UTF-8.
    #[error("path is not valid UTF-8: {}", .0.display())]
    NonUtf8Path(PathBuf),

    /// Creating or removing the lock marker failed.
    #[error(transparent)]
    Lock(LockError),
}

impl BundleError {
    pub(crate) fn io(op: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            op,
            path: path.into(),
            source,
        }
    }

    /// Whether this is an anticipated outcome (contention, wrong input)
    /// rather than a system failure.
    pub fn is_expected(&self) -> bool {
        matches!(
            self,
            Self::NotABundle(_) | Self::NotADirectory(_) | Self::Locked(_)
        )
    }
}

impl From<ChecksumError> for BundleError {
    fn from(e: ChecksumError) -> Self {
        Self::Checksum(e)
    }
}

impl From<LockError> for BundleError {
    fn from(e: LockError) -> Self {
        match e {
            LockError::Held { marker } => {
                let root = marker
                    .parent()
                    .and_then(|meta| meta.parent())
                    .map(PathBuf::from)
                    .unwrap_or(marker);
                Self::Locked(root)
            }
            other => Self::Lock(other),
        }
    }
}

/// Convenience alias for bundle results.
pub type BundleResult<T> = Result<T, BundleError>;
