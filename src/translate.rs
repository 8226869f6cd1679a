//! Path Translation
//!
//! Maps registry paths onto the sharded, content-addressed layout of the
//! backing store. A path under [`MANAGED_PREFIX`] is looked up in the
//! metadata map and replaced by the shard path of its fragment; every other
//! path passes through unchanged.

use crate::error::{DriverError, Result};
use crate::types::VirtualPath;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

/// Paths under this prefix are translated.
pub const MANAGED_PREFIX: &str = "/docker/registry";

/// Stripped from managed paths before the metadata lookup.
pub const MAPPING_PREFIX: &str = "/docker/registry/v2";

/// Terminal component naming a current-version pointer.
pub const DESCRIPTOR_COMPONENT: &str = "link";

/// Algorithm reported in synthesized descriptors.
pub const DESCRIPTOR_ALGORITHM: &str = "sha256";

/// Number of leading fragment characters used as the shard directory.
pub const SHARD_WIDTH: usize = 2;

/// Read-only mapping from a path suffix to its content-address fragment.
///
/// Loaded once during driver construction and shared between invocations.
#[derive(Debug, Clone, Default)]
pub struct MetadataMap {
    entries: Arc<HashMap<String, String>>,
}

impl MetadataMap {
    pub fn new(entries: HashMap<String, String>) -> Self {
        Self {
            entries: Arc::new(entries),
        }
    }

    /// Parse the bootstrap JSON object (string keys, string fragment values).
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        let entries: HashMap<String, String> = serde_json::from_slice(bytes)
            .map_err(|e| DriverError::Config(format!("failed to parse metadata: {}", e)))?;
        Ok(Self::new(entries))
    }

    pub fn get(&self, suffix: &str) -> Option<&str> {
        self.entries.get(suffix).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Shard a fragment: its first two characters as a directory, then the fragment.
///
/// Returns `None` when the fragment is too short to shard.
pub fn shard(fragment: &str) -> Option<String> {
    let split = fragment.char_indices().nth(SHARD_WIDTH).map(|(i, _)| i);
    let head = match split {
        Some(i) => &fragment[..i],
        None if fragment.chars().count() == SHARD_WIDTH => fragment,
        None => return None,
    };
    Some(format!("{}/{}", head, fragment))
}

/// Deterministic virtual-to-physical path mapping.
#[derive(Debug, Clone)]
pub struct PathTranslator {
    metadata: MetadataMap,
}

impl PathTranslator {
    pub fn new(metadata: MetadataMap) -> Self {
        Self { metadata }
    }

    pub fn metadata(&self) -> &MetadataMap {
        &self.metadata
    }

    pub fn is_managed(path: &VirtualPath) -> bool {
        path.is_under(MANAGED_PREFIX)
    }

    /// Whether reads of `path` synthesize a descriptor instead of reading bytes.
    pub fn is_descriptor(path: &VirtualPath) -> bool {
        Self::is_managed(path) && path.file_name() == Some(DESCRIPTOR_COMPONENT)
    }

    /// Look up the fragment for a managed path.
    pub fn fragment(&self, path: &VirtualPath) -> Result<&str> {
        if !Self::is_managed(path) {
            return Err(DriverError::not_found(path.as_str()));
        }
        let suffix = path
            .as_str()
            .strip_prefix(MAPPING_PREFIX)
            .unwrap_or_else(|| &path.as_str()[MANAGED_PREFIX.len()..]);
        match self.metadata.get(suffix) {
            Some(fragment) if shard(fragment).is_some() => Ok(fragment),
            Some(fragment) => {
                warn!(path = %path, fragment, "metadata fragment too short to shard");
                Err(DriverError::not_found(path.as_str()))
            }
            None => {
                warn!(path = %path, suffix, "no metadata entry for managed path");
                Err(DriverError::not_found(path.as_str()))
            }
        }
    }

    /// Translate a virtual path into the path of its physical object.
    pub fn translate(&self, path: &VirtualPath) -> Result<VirtualPath> {
        if !Self::is_managed(path) {
            return Ok(path.clone());
        }
        let fragment = self.fragment(path)?;
        let sharded = shard(fragment).ok_or_else(|| DriverError::not_found(path.as_str()))?;
        VirtualPath::new(&format!("/{}", sharded))
            .map_err(|_| DriverError::not_found(path.as_str()))
    }

    /// Synthesize the `algorithm:fragment` descriptor for a pointer path.
    pub fn descriptor(&self, path: &VirtualPath) -> Result<String> {
        let fragment = self.fragment(path)?;
        Ok(format!("{}:{}", DESCRIPTOR_ALGORITHM, fragment))
    }
}
