//! The per-bundle checksum manifest (`SHA256SUM.txt`).
//!
//! On-disk format, one line per file, compatible with `sha256sum -c`:
//!
//! ```text
//! <64 hex chars><two spaces>./<relative/path>\n
//! ```
//!
//! Lines are sorted by hash, then by path, so rendering the same manifest
//! twice always produces identical bytes.

use std::collections::BTreeSet;

use bundle_types::{BundleId, ContentHash};

use crate::engine::aggregate;
use crate::error::{ChecksumError, ChecksumResult};

/// Hash and bundle-relative path of one regular file.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FileRecord {
    /// SHA-256 of the file content.
    pub hash: ContentHash,
    /// Path relative to the bundle root, `/`-separated, no leading `./`.
    pub path: String,
}

impl FileRecord {
    pub fn new(hash: ContentHash, path: impl AsRef<str>) -> Self {
        Self {
            hash,
            path: normalize_relative_path(path.as_ref()),
        }
    }
}

/// Normalize a bundle-relative path: no leading `./` or `/`.
///
/// Backslashes are ordinary file name bytes on Unix and are kept as-is.
pub fn normalize_relative_path(raw: &str) -> String {
    let mut rest = raw;
    while let Some(stripped) = rest.strip_prefix("./") {
        rest = stripped;
    }
    rest.trim_start_matches('/').to_string()
}

/// Immutable, hash-ordered set of file records.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Manifest {
    records: Vec<FileRecord>,
}

impl Manifest {
    /// Build a manifest, sorting records and rejecting duplicate or
    /// unrepresentable paths. Paths that could escape the bundle root
    /// (absolute, or with a `..` component) are unrepresentable.
    pub fn new(mut records: Vec<FileRecord>) -> ChecksumResult<Self> {
        {
            let mut seen = BTreeSet::new();
            for record in &records {
                if !is_contained(&record.path) {
                    return Err(ChecksumError::InvalidPath(record.path.clone()));
                }
                if !seen.insert(record.path.as_str()) {
                    return Err(ChecksumError::DuplicatePath(record.path.clone()));
                }
            }
        }
        records.sort();
        Ok(Self { records })
    }

    pub fn records(&self) -> &[FileRecord] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &FileRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Look up a record by relative path.
    pub fn get(&self, path: &str) -> Option<&FileRecord> {
        let path = normalize_relative_path(path);
        self.records.iter().find(|r| r.path == path)
    }

    /// The bundle identity this manifest describes.
    pub fn identity(&self) -> BundleId {
        aggregate(self.records.iter().map(|r| &r.hash))
    }

    /// Render the `sha256sum`-compatible text form.
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(self.records.len() * 80);
        for record in &self.records {
            out.push_str(&record.hash.to_hex());
            out.push_str("  ./");
            out.push_str(&record.path);
            out.push('\n');
        }
        out
    }

    /// Parse the text form. Blank lines are skipped; the leading `./` and a
    /// `*` binary-mode marker are both optional.
    pub fn parse(text: &str) -> ChecksumResult<Self> {
        let mut records = Vec::new();
        for (idx, raw) in text.lines().enumerate() {
            let line_no = idx + 1;
            let line = raw.strip_suffix('\r').unwrap_or(raw);
            if line.trim().is_empty() {
                continue;
            }
            records.push(parse_line(line, line_no)?);
        }
        Self::new(records)
    }
}

fn is_contained(path: &str) -> bool {
    !path.is_empty()
        && !path.starts_with('/')
        && !path.contains(['\n', '\r'])
        && !path.split('/').any(|component| component == "..")
}

fn parse_line(line: &str, line_no: usize) -> ChecksumResult<FileRecord> {
    let invalid = |reason: &str| ChecksumError::InvalidLine {
        line: line_no,
        reason: reason.to_string(),
    };

    let (hex, rest) = match (line.get(..64), line.get(64..)) {
        (Some(hex), Some(rest)) => (hex, rest),
        _ => return Err(invalid("line too short for a SHA-256 digest")),
    };
    let hash = ContentHash::from_hex(hex).map_err(|e| invalid(&e.to_string()))?;

    let path = rest
        .strip_prefix("  ")
        .or_else(|| rest.strip_prefix(" *"))
        .ok_or_else(|| invalid("expected two spaces after digest"))?;
    let path = normalize_relative_path(path);
    if path.is_empty() {
        return Err(invalid("missing file path"));
    }

    Ok(FileRecord { hash, path })
}
