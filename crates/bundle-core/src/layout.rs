//! On-disk layout of a bundle's metadata subtree.

use std::path::{Path, PathBuf};

use bundle_lock::{WriteLock, METADATA_DIR};

use crate::error::{BundleError, BundleResult};

/// Checksum manifest file name.
pub const MANIFEST_FILE: &str = "SHA256SUM.txt";
/// Metadata file name.
pub const METADATA_FILE: &str = "META.json";
/// State file name.
pub const STATE_FILE: &str = "STATE.json";
/// Tags file name.
pub const TAGS_FILE: &str = "TAGS.txt";

/// Paths of the files that make up a bundle at a given root.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BundleLayout {
    root: PathBuf,
}

impl BundleLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The `.bundle/` metadata directory.
    pub fn meta_dir(&self) -> PathBuf {
        self.root.join(METADATA_DIR)
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.meta_dir().join(MANIFEST_FILE)
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.meta_dir().join(METADATA_FILE)
    }

    pub fn state_path(&self) -> PathBuf {
        self.meta_dir().join(STATE_FILE)
    }

    pub fn tags_path(&self) -> PathBuf {
        self.meta_dir().join(TAGS_FILE)
    }

    pub fn lock_path(&self) -> PathBuf {
        WriteLock::marker_path(&self.root)
    }

    /// Whether the metadata directory exists.
    pub fn is_bundle(&self) -> bool {
        self.meta_dir().is_dir()
    }

    /// Fail with [`BundleError::NotABundle`] unless the metadata directory exists.
    pub fn ensure_bundle(&self) -> BundleResult<()> {
        if self.is_bundle() {
            Ok(())
        } else {
            Err(BundleError::NotABundle(self.root.clone()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_live_under_meta_dir() {
        let layout = BundleLayout::new("/data/photos");
        assert_eq!(layout.meta_dir(), PathBuf::from("/data/photos/.bundle"));
        assert_eq!(
            layout.manifest_path(),
            PathBuf::from("/data/photos/.bundle/SHA256SUM.txt")
        );
        assert_eq!(layout.metadata_path().file_name().unwrap(), "META.json");
        assert_eq!(layout.state_path().file_name().unwrap(), "STATE.json");
        assert_eq!(layout.tags_path().file_name().unwrap(), "TAGS.txt");
        assert_eq!(
            layout.lock_path(),
            PathBuf::from("/data/photos/.bundle/.lock")
        );
    }

    #[test]
    fn ensure_bundle_requires_meta_dir() {
        let dir = tempfile::tempdir().unwrap();
        let layout = BundleLayout::new(dir.path());
        assert!(matches!(layout.ensure_bundle(), Err(BundleError::NotABundle(_))));

        std::fs::create_dir(layout.meta_dir()).unwrap();
        assert!(layout.ensure_bundle().is_ok());
    }
}
