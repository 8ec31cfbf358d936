use std::path::PathBuf;

/// Errors from checksum and manifest operations.
#[derive(Debug, thiserror::Error)]
pub enum ChecksumError {
    /// The file being hashed could not be opened or read.
    #[error("failed to {op} {}: {source}", path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A manifest line does not follow the `sha256sum` format.
    #[error("invalid manifest line {line}: {reason}")]
    InvalidLine { line: usize, reason: String },

    /// The same relative path appears twice in one manifest.
    #[error("duplicate path in manifest: {0}")]
    DuplicatePath(String),

    /// A relative path cannot be represented in the manifest format.
    #[error("invalid path in manifest: {0:?}")]
    InvalidPath(String),
}

impl ChecksumError {
    pub(crate) fn io(op: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            op,
            path: path.into(),
            source,
        }
    }
}

/// Result alias for checksum operations.
pub type ChecksumResult<T> = Result<T, ChecksumError>;
