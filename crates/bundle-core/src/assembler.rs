//! Scanning a directory tree into a manifest and persisting a new bundle.

use std::fs;
use std::path::{Path, PathBuf};

use bundle_checksum::{hash_file, FileRecord, Manifest};
use bundle_lock::WriteLock;
use bundle_types::{BundleId, Metadata, State, Tags};
use tracing::{debug, info};

use crate::bundle::Bundle;
use crate::error::{BundleError, BundleResult};
use crate::layout::BundleLayout;
use crate::scanner::{scan_directory, SymlinkPolicy};

/// Output of [`scan`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScanResult {
    pub manifest: Manifest,
    /// Sum of the sizes of every hashed file.
    pub total_size: u64,
}

impl ScanResult {
    pub fn identity(&self) -> BundleId {
        self.manifest.identity()
    }
}

/// Hash every regular file under `root` outside `.bundle/`.
///
/// Any file that cannot be read aborts the scan.
pub fn scan(root: &Path, policy: SymlinkPolicy) -> BundleResult<ScanResult> {
    let mut records = Vec::new();
    let mut total_size = 0u64;
    for entry in scan_directory(root, policy)? {
        if entry.is_dir {
            continue;
        }
        let hash = hash_file(&entry.path)?;
        total_size += entry.size;
        records.push(FileRecord {
            hash,
            path: entry.relative,
        });
    }
    let manifest = Manifest::new(records)?;
    debug!(root = %root.display(), files = manifest.len(), total_size, "scanned");
    Ok(ScanResult {
        manifest,
        total_size,
    })
}

/// Options for [`create`].
#[derive(Clone, Debug)]
pub struct CreateOptions {
    /// Title to record. Defaults to the existing title, then the directory name.
    pub title: Option<String>,
    pub author: String,
    /// Tags to add on top of any already present.
    pub tags: Vec<String>,
    pub symlinks: SymlinkPolicy,
}

impl Default for CreateOptions {
    fn default() -> Self {
        Self {
            title: None,
            author: current_user(),
            tags: Vec::new(),
            symlinks: SymlinkPolicy::default(),
        }
    }
}

/// Name of the invoking system user, or `"unknown"`.
pub fn current_user() -> String {
    ["USER", "USERNAME"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|name| !name.trim().is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Turn `root` into a bundle, or refresh an existing one.
///
/// Holds the bundle's write lock for the whole scan-and-persist sequence and
/// fails with [`BundleError::Locked`] if another actor holds it. Re-creating
/// an unchanged tree rewrites byte-identical manifest and metadata files.
pub fn create(root: &Path, options: &CreateOptions) -> BundleResult<Bundle> {
    match fs::metadata(root) {
        Ok(meta) if meta.is_dir() => {}
        Ok(_) => return Err(BundleError::NotADirectory(root.to_path_buf())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(BundleError::NotADirectory(root.to_path_buf()))
        }
        Err(e) => return Err(BundleError::io("stat", root, e)),
    }

    let guard = WriteLock::acquire(root)?.into_guard()?;
    let layout = BundleLayout::new(root);

    let scanned = scan(root, options.symlinks)?;
    let identity = scanned.identity();

    let previous = layout.read_metadata().ok();
    let metadata = match previous {
        Some(mut existing) if existing.bundle_checksum == identity => {
            if let Some(title) = &options.title {
                existing.title = title.clone();
            }
            existing
        }
        previous => {
            let title = options
                .title
                .clone()
                .or_else(|| previous.map(|m| m.title))
                .unwrap_or_else(|| default_title(root));
            Metadata::new(title, options.author.clone(), identity)
        }
    };

    let mut state = State::new(scanned.total_size);
    if let Ok(old) = layout.read_state() {
        for replica in old.replicas {
            state.add_replica(replica);
        }
    }

    let mut tags = layout.read_tags().unwrap_or_else(|_| Tags::new());
    tags.add(&options.tags);

    layout.write_manifest(&scanned.manifest)?;
    layout.write_metadata(&metadata)?;
    layout.write_state(&state)?;
    layout.write_tags(&tags)?;
    guard.release()?;

    info!(
        root = %root.display(),
        identity = %identity.short_hex(),
        files = scanned.manifest.len(),
        "bundle created"
    );
    Ok(Bundle {
        path: root.to_path_buf(),
        metadata,
        state,
        tags,
        manifest: scanned.manifest,
    })
}

fn default_title(root: &Path) -> String {
    let absolute = fs::canonicalize(root).unwrap_or_else(|_| PathBuf::from(root));
    absolute
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bundle_checksum::hash_bytes;
    use bundle_lock::LockOutcome;

    fn options(title: &str) -> CreateOptions {
        CreateOptions {
            title: Some(title.to_string()),
            author: "tester".to_string(),
            ..CreateOptions::default()
        }
    }

    #[test]
    fn scan_hashes_files_and_sums_sizes() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), b"hello").unwrap();
        fs::create_dir(dir.path().join("d")).unwrap();
        fs::write(dir.path().join("d/b.txt"), b"world").unwrap();

        let result = scan(dir.path(), SymlinkPolicy::Skip).unwrap();
        assert_eq!(result.total_size, 10);
        let record = result.manifest.get("d/b.txt").unwrap();
        assert_eq!(record.hash, hash_bytes(b"world"));
        assert_eq!(result.manifest.len(), 2);
    }

    #[test]
    fn create_persists_all_files_and_releases_lock() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), b"hello").unwrap();

        let bundle = create(dir.path(), &options("Docs")).unwrap();
        let layout = BundleLayout::new(dir.path());
        assert!(layout.manifest_path().is_file());
        assert!(layout.metadata_path().is_file());
        assert!(layout.state_path().is_file());
        assert!(layout.tags_path().is_file());
        assert!(!WriteLock::is_locked(dir.path()));

        assert_eq!(bundle.metadata.title, "Docs");
        assert_eq!(bundle.metadata.author, "tester");
        assert_eq!(bundle.identity(), bundle.manifest.identity());
        assert!(bundle.state.verified);
        assert_eq!(bundle.state.size_bytes, 5);
    }

    #[test]
    fn create_rejects_missing_or_file_root() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(
            create(&missing, &options("x")),
            Err(BundleError::NotADirectory(_))
        ));
        let file = dir.path().join("f");
        fs::write(&file, b"x").unwrap();
        assert!(matches!(
            create(&file, &options("x")),
            Err(BundleError::NotADirectory(_))
        ));
    }

    #[test]
    fn create_fails_while_locked_and_leaves_marker() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), b"hello").unwrap();
        let guard = match WriteLock::acquire(dir.path()).unwrap() {
            LockOutcome::Locked(guard) => guard,
            LockOutcome::AlreadyLocked { .. } => panic!("fresh dir is locked"),
        };

        let err = create(dir.path(), &options("x")).unwrap_err();
        assert!(matches!(err, BundleError::Locked(ref p) if p == dir.path()));
        assert!(err.is_expected());
        assert!(WriteLock::is_locked(dir.path()));
        assert!(!BundleLayout::new(dir.path()).manifest_path().exists());
        guard.release().unwrap();
    }

    #[test]
    fn recreate_keeps_title_tags_and_replicas() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), b"hello").unwrap();
        let mut opts = options("First");
        opts.tags = vec!["Photos".to_string()];
        create(dir.path(), &opts).unwrap();
        crate::bundle::record_replica(dir.path(), "/pool/x").unwrap();

        let again = CreateOptions {
            title: None,
            author: "tester".to_string(),
            tags: vec!["2024".to_string()],
            ..CreateOptions::default()
        };
        let bundle = create(dir.path(), &again).unwrap();
        assert_eq!(bundle.metadata.title, "First");
        assert_eq!(bundle.tags.list(), ["2024", "photos"]);
        assert_eq!(bundle.state.replicas, ["/pool/x"]);
    }

    #[test]
    fn default_title_is_directory_name() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("holiday");
        fs::create_dir(&root).unwrap();
        let opts = CreateOptions {
            author: "tester".to_string(),
            ..CreateOptions::default()
        };
        assert_eq!(create(&root, &opts).unwrap().metadata.title, "holiday");
    }
}
