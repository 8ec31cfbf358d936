//! Foundation types for content-addressed bundles.
//!
//! A bundle is a directory of files plus a `.bundle/` metadata subtree. Its
//! identity is derived from the SHA-256 hashes of its files, so two bundles
//! with identical content share the same identity regardless of where they
//! live or what they are called. Every other bundle crate depends on
//! `bundle-types`.
//!
//! # Key Types
//!
//! - [`ContentHash`] -- SHA-256 digest of a single file
//! - [`BundleId`] -- aggregate identity of a whole bundle
//! - [`Metadata`] -- title, author and identity persisted in `META.json`
//! - [`State`] -- verification status and size persisted in `STATE.json`
//! - [`Tags`] -- normalized tag set persisted in `TAGS.txt`

pub mod error;
pub mod hash;
pub mod metadata;
pub mod state;
pub mod tags;

pub use error::TypeError;
pub use hash::{BundleId, ContentHash};
pub use metadata::Metadata;
pub use state::State;
pub use tags::{normalize_tag, Tags};
