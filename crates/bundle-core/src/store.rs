//! Reading and writing the files under `.bundle/`.
//!
//! Every write goes to a sibling `*.tmp` file first and is then renamed over
//! the target, so readers never observe a half-written manifest or metadata
//! record.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use bundle_checksum::Manifest;
use bundle_types::{Metadata, State, Tags};
use tracing::debug;

use crate::error::{BundleError, BundleResult};
use crate::layout::BundleLayout;

/// Write `data` to `path` atomically via a temporary sibling.
pub(crate) fn write_atomic(path: &Path, data: &[u8]) -> BundleResult<()> {
    let tmp = tmp_path(path);
    fs::write(&tmp, data).map_err(|e| BundleError::io("write", &tmp, e))?;
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(BundleError::io("rename", path, e));
    }
    debug!(path = %path.display(), bytes = data.len(), "wrote");
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

fn read_text(path: &Path) -> BundleResult<String> {
    fs::read_to_string(path).map_err(|e| BundleError::io("read", path, e))
}

fn read_optional(path: &Path) -> BundleResult<Option<String>> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(BundleError::io("read", path, e)),
    }
}

fn to_json<T: serde::Serialize>(value: &T, path: &Path) -> BundleResult<Vec<u8>> {
    let mut data = serde_json::to_vec_pretty(value).map_err(|e| BundleError::InvalidMetadata {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    data.push(b'\n');
    Ok(data)
}

impl BundleLayout {
    pub fn read_manifest(&self) -> BundleResult<Manifest> {
        self.ensure_bundle()?;
        let path = self.manifest_path();
        let text = read_text(&path)?;
        Manifest::parse(&text).map_err(|source| BundleError::InvalidManifest { path, source })
    }

    pub fn write_manifest(&self, manifest: &Manifest) -> BundleResult<()> {
        write_atomic(&self.manifest_path(), manifest.render().as_bytes())
    }

    /// Load and validate `META.json`.
    pub fn read_metadata(&self) -> BundleResult<Metadata> {
        self.ensure_bundle()?;
        let path = self.metadata_path();
        let text = read_text(&path)?;
        let metadata: Metadata =
            serde_json::from_str(&text).map_err(|e| BundleError::InvalidMetadata {
                path: path.clone(),
                reason: e.to_string(),
            })?;
        metadata.validate().map_err(|e| BundleError::InvalidMetadata {
            path,
            reason: e.to_string(),
        })?;
        Ok(metadata)
    }

    pub fn write_metadata(&self, metadata: &Metadata) -> BundleResult<()> {
        let path = self.metadata_path();
        write_atomic(&path, &to_json(metadata, &path)?)
    }

    /// Load `STATE.json`, falling back to the default state when absent.
    pub fn read_state(&self) -> BundleResult<State> {
        self.ensure_bundle()?;
        let path = self.state_path();
        match read_optional(&path)? {
            Some(text) => serde_json::from_str(&text).map_err(|e| BundleError::InvalidMetadata {
                path,
                reason: e.to_string(),
            }),
            None => Ok(State::default()),
        }
    }

    pub fn write_state(&self, state: &State) -> BundleResult<()> {
        let path = self.state_path();
        write_atomic(&path, &to_json(state, &path)?)
    }

    /// Load `TAGS.txt`; a missing file means no tags.
    pub fn read_tags(&self) -> BundleResult<Tags> {
        self.ensure_bundle()?;
        Ok(read_optional(&self.tags_path())?
            .map(|text| Tags::parse(&text))
            .unwrap_or_default())
    }

    pub fn write_tags(&self, tags: &Tags) -> BundleResult<()> {
        write_atomic(&self.tags_path(), tags.render().as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bundle_checksum::{aggregate, hash_bytes, FileRecord};

    fn layout() -> (tempfile::TempDir, BundleLayout) {
        let dir = tempfile::tempdir().unwrap();
        let layout = BundleLayout::new(dir.path());
        fs::create_dir(layout.meta_dir()).unwrap();
        (dir, layout)
    }

    #[test]
    fn manifest_persists_in_sha256sum_format() {
        let (_dir, layout) = layout();
        let manifest = Manifest::new(vec![
            FileRecord::new(hash_bytes(b"hello"), "a.txt"),
            FileRecord::new(hash_bytes(b"world"), "sub/b.txt"),
        ])
        .unwrap();
        layout.write_manifest(&manifest).unwrap();

        let text = fs::read_to_string(layout.manifest_path()).unwrap();
        assert!(text.contains(&format!("{}  ./sub/b.txt\n", hash_bytes(b"world"))));
        assert_eq!(layout.read_manifest().unwrap(), manifest);
        assert!(!tmp_path(&layout.manifest_path()).exists());
    }

    #[test]
    fn metadata_round_trip_and_validation() {
        let (_dir, layout) = layout();
        let metadata = Metadata::new("Photos", "alice", aggregate(&[hash_bytes(b"x")]));
        layout.write_metadata(&metadata).unwrap();
        assert_eq!(layout.read_metadata().unwrap(), metadata);

        let mut broken = metadata.clone();
        broken.author = String::new();
        layout.write_metadata(&broken).unwrap();
        assert!(matches!(
            layout.read_metadata(),
            Err(BundleError::InvalidMetadata { .. })
        ));
    }

    #[test]
    fn garbage_metadata_is_invalid() {
        let (_dir, layout) = layout();
        fs::write(layout.metadata_path(), b"{not json").unwrap();
        assert!(matches!(
            layout.read_metadata(),
            Err(BundleError::InvalidMetadata { .. })
        ));
    }

    #[test]
    fn missing_optional_files_use_defaults() {
        let (_dir, layout) = layout();
        assert_eq!(layout.read_state().unwrap(), State::default());
        assert!(layout.read_tags().unwrap().is_empty());
    }

    #[test]
    fn reads_outside_a_bundle_fail() {
        let dir = tempfile::tempdir().unwrap();
        let layout = BundleLayout::new(dir.path());
        assert!(matches!(layout.read_manifest(), Err(BundleError::NotABundle(_))));
        assert!(matches!(layout.read_tags(), Err(BundleError::NotABundle(_))));
    }
}
