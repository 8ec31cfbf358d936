//! A loaded bundle and the metadata updates that can be applied to one.

use std::path::{Path, PathBuf};

use bundle_checksum::Manifest;
use bundle_lock::WriteLock;
use bundle_types::{BundleId, Metadata, State, Tags};
use tracing::info;

use crate::error::BundleResult;
use crate::layout::BundleLayout;

/// Everything persisted under a bundle's `.bundle/` directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bundle {
    pub path: PathBuf,
    pub metadata: Metadata,
    pub state: State,
    pub tags: Tags,
    pub manifest: Manifest,
}

impl Bundle {
    /// Load a bundle. Metadata and manifest are required; state and tags
    /// default when absent.
    pub fn load(path: &Path) -> BundleResult<Self> {
        let layout = BundleLayout::new(path);
        layout.ensure_bundle()?;
        Ok(Self {
            path: path.to_path_buf(),
            metadata: layout.read_metadata()?,
            state: layout.read_state()?,
            tags: layout.read_tags()?,
            manifest: layout.read_manifest()?,
        })
    }

    /// Identity recorded at creation time.
    pub fn identity(&self) -> BundleId {
        self.metadata.bundle_checksum
    }

    pub fn title(&self) -> &str {
        &self.metadata.title
    }

    pub fn layout(&self) -> BundleLayout {
        BundleLayout::new(&self.path)
    }
}

/// Run `f` on the bundle at `root` while holding its write lock.
fn with_lock<T>(root: &Path, f: impl FnOnce(&BundleLayout) -> BundleResult<T>) -> BundleResult<T> {
    let layout = BundleLayout::new(root);
    layout.ensure_bundle()?;
    let guard = WriteLock::acquire(root)?.into_guard()?;
    let value = f(&layout)?;
    guard.release()?;
    Ok(value)
}

/// Change a bundle's title, returning the previous one.
pub fn rename(root: &Path, title: &str) -> BundleResult<String> {
    with_lock(root, |layout| {
        let mut metadata = layout.read_metadata()?;
        let old = std::mem::replace(&mut metadata.title, title.to_string());
        layout.write_metadata(&metadata)?;
        info!(root = %root.display(), from = %old, to = %title, "bundle renamed");
        Ok(old)
    })
}

/// Add tags; invalid tags are ignored. Returns the resulting set.
pub fn add_tags<S: AsRef<str>>(root: &Path, new: &[S]) -> BundleResult<Tags> {
    with_lock(root, |layout| {
        let mut tags = layout.read_tags()?;
        let added = tags.add(new);
        layout.write_tags(&tags)?;
        info!(root = %root.display(), added, "tags added");
        Ok(tags)
    })
}

/// Remove tags. Returns the resulting set.
pub fn remove_tags<S: AsRef<str>>(root: &Path, old: &[S]) -> BundleResult<Tags> {
    with_lock(root, |layout| {
        let mut tags = layout.read_tags()?;
        let removed = tags.remove(old);
        layout.write_tags(&tags)?;
        info!(root = %root.display(), removed, "tags removed");
        Ok(tags)
    })
}

/// Record a replica location in `STATE.json`. Returns whether it was new.
pub fn record_replica(root: &Path, uri: &str) -> BundleResult<bool> {
    with_lock(root, |layout| {
        let mut state = layout.read_state()?;
        let added = state.add_replica(uri);
        if added {
            layout.write_state(&state)?;
        }
        Ok(added)
    })
}
