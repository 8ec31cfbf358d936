//! Checksum engine for bundles.
//!
//! Provides streaming SHA-256 hashing of files, the order-independent
//! aggregate that turns a set of file hashes into a [`BundleId`], and the
//! [`Manifest`] codec for `SHA256SUM.txt`, which stays byte-compatible with
//! the `sha256sum` tool.
//!
//! All hashing wraps the `sha2` crate. Nothing here touches process-wide
//! state; the only filesystem access is reading the file being hashed.
//!
//! [`BundleId`]: bundle_types::BundleId

pub mod engine;
pub mod error;
pub mod manifest;

pub use engine::{aggregate, hash_bytes, hash_file, hash_reader, BUFFER_SIZE};
pub use error::{ChecksumError, ChecksumResult};
pub use manifest::{normalize_relative_path, FileRecord, Manifest};
