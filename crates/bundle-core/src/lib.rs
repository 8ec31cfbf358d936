//! Bundle assembly and integrity verification.
//!
//! A bundle is a directory whose files are described by a checksum manifest
//! stored in a `.bundle/` subdirectory next to its metadata:
//!
//! ```text
//! photos/
//!   .bundle/
//!     SHA256SUM.txt   sha256sum-compatible manifest, sorted by hash
//!     META.json       title, author, created_at, bundle identity
//!     STATE.json      last verification result, replicas, size
//!     TAGS.txt        normalized tags, one per line
//!     .lock           present only while a writer holds the bundle
//!   a.jpg
//!   2024/b.jpg
//! ```
//!
//! # Operations
//!
//! - [`scan`] walks a tree and hashes every regular file outside `.bundle/`.
//! - [`create`] scans, computes the identity and persists everything while
//!   holding the bundle's write lock.
//! - [`verify`] re-hashes files against a manifest and reports every drifted
//!   path; [`verify_bundle`] does the same for a persisted bundle.
//! - [`Bundle::load`], [`rename`], [`add_tags`], [`remove_tags`] and
//!   [`record_replica`] read and update the metadata files.
//!
//! The crate keeps no global state; it only emits `tracing` events.

pub mod assembler;
pub mod bundle;
pub mod error;
pub mod layout;
pub mod scanner;
pub mod store;
pub mod verifier;

pub use assembler::{create, current_user, scan, CreateOptions, ScanResult};
pub use bundle::{add_tags, record_replica, remove_tags, rename, Bundle};
pub use error::{BundleError, BundleResult};
pub use layout::BundleLayout;
pub use scanner::{scan_directory, ScanEntry, SymlinkPolicy};
pub use verifier::{verify, verify_bundle, VerifyReport};
