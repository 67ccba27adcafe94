//! Provenance and schema descriptors shared across vaxrisk result payloads.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Semantic version describing the schema of serialized payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SchemaVersion {
    /// Major version incremented for breaking changes.
    pub major: u32,
    /// Minor version incremented for additive changes.
    pub minor: u32,
    /// Patch version incremented for bug fixes and documentation updates.
    pub patch: u32,
}

impl SchemaVersion {
    /// Creates a new schema version descriptor.
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl Default for SchemaVersion {
    fn default() -> Self {
        Self::new(1, 0, 0)
    }
}

/// Provenance information attached to every result set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RunProvenance {
    /// Schema version of the payload.
    pub schema_version: SchemaVersion,
    /// Stable hash of the configuration used to produce the data.
    pub config_hash: String,
    /// Master deterministic seed used for all randomness.
    pub seed: u64,
    /// Version map for the crates involved in the run.
    pub tool_versions: BTreeMap<String, String>,
}

impl RunProvenance {
    /// Creates a provenance record for the given configuration hash and seed.
    pub fn new(config_hash: impl Into<String>, seed: u64) -> Self {
        let mut tool_versions = BTreeMap::new();
        tool_versions.insert(
            "vaxrisk-core".to_string(),
            env!("CARGO_PKG_VERSION").to_string(),
        );
        Self {
            schema_version: SchemaVersion::default(),
            config_hash: config_hash.into(),
            seed,
            tool_versions,
        }
    }
}
