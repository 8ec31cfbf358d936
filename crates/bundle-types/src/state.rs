use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Mutable bookkeeping for a bundle, persisted as `.bundle/STATE.json`.
///
/// Unlike the manifest, state changes over a bundle's lifetime: each
/// verification records its outcome here and each import records a replica.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct State {
    /// Result of the most recent verification.
    pub verified: bool,
    /// When the bundle was last verified.
    pub last_checked: DateTime<Utc>,
    /// Known replica locations.
    #[serde(default)]
    pub replicas: Vec<String>,
    /// Total size of the bundle's files in bytes, excluding `.bundle/`.
    pub size_bytes: u64,
}

impl State {
    /// State for a freshly created bundle: verified now, no replicas.
    pub fn new(size_bytes: u64) -> Self {
        Self {
            verified: true,
            last_checked: Utc::now(),
            replicas: Vec::new(),
            size_bytes,
        }
    }

    pub fn mark_verified(&mut self, verified: bool, at: DateTime<Utc>) {
        self.verified = verified;
        self.last_checked = at;
    }

    /// Record a replica location. Duplicates are ignored.
    pub fn add_replica(&mut self, uri: impl Into<String>) -> bool {
        let uri = uri.into();
        if self.replicas.contains(&uri) {
            return false;
        }
        self.replicas.push(uri);
        true
    }
}

impl Default for State {
    fn default() -> Self {
        Self {
            verified: false,
            last_checked: DateTime::<Utc>::default(),
            replicas: Vec::new(),
            size_bytes: 0,
        }
    }
}
