use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::hash::BundleId;

/// Descriptive metadata for a bundle, persisted as `.bundle/META.json`.
///
/// The `bundle_checksum` is written once at creation time. Pools trust it
/// rather than recomputing the identity on import.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    /// Human-readable name.
    pub title: String,
    /// Creation timestamp (RFC 3339, UTC).
    pub created_at: DateTime<Utc>,
    /// Aggregate identity of the bundle's content.
    pub bundle_checksum: BundleId,
    /// System user that created the bundle.
    pub author: String,
    /// Metadata format version, starts at 1.
    pub version: u32,
}

impl Metadata {
    /// Current metadata format version.
    pub const VERSION: u32 = 1;

    /// Create metadata for a freshly assembled bundle.
    pub fn new(title: impl Into<String>, author: impl Into<String>, id: BundleId) -> Self {
        Self {
            title: title.into(),
            created_at: Utc::now(),
            bundle_checksum: id,
            author: author.into(),
            version: Self::VERSION,
        }
    }

    /// Check the invariants a loaded metadata record must satisfy.
    pub fn validate(&self) -> Result<(), TypeError> {
        if self.version < 1 {
            return Err(TypeError::InvalidMetadata(format!(
                "invalid version: {}, must be >= 1",
                self.version
            )));
        }
        if self.author.trim().is_empty() {
            return Err(TypeError::InvalidMetadata("author cannot be empty".to_string()));
        }
        if self.created_at.timestamp() == 0 {
            return Err(TypeError::InvalidMetadata("created_at cannot be zero".to_string()));
        }
        Ok(())
    }
}
