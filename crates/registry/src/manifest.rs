//! Capability manifest loading.
//!
//! A manifest is a YAML or JSON document listing the capability descriptors
//! a registry should expose. Format detection is by parse fallback: YAML is a
//! superset of JSON for these documents, so YAML parsing is attempted first
//! and JSON only as a secondary attempt for diagnostics.

use std::{fs, path::Path};

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use relay_types::CapabilityDescriptor;

/// Parsed capability manifest.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct CapabilityManifest {
    /// Descriptors in authoring order.
    #[serde(default)]
    pub capabilities: Vec<CapabilityDescriptor>,
}

/// Loads a manifest from the filesystem.
pub fn parse_manifest_file(path: impl AsRef<Path>) -> Result<CapabilityManifest> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).with_context(|| format!("failed to read capability manifest: {}", path.display()))?;
    parse_manifest_str(&content).with_context(|| format!("failed to parse capability manifest: {}", path.display()))
}

/// Parses a manifest from an in-memory document.
pub fn parse_manifest_str(content: &str) -> Result<CapabilityManifest> {
    if let Ok(manifest) = serde_yaml::from_str::<CapabilityManifest>(content) {
        return Ok(manifest);
    }
    if let Ok(manifest) = serde_json::from_str::<CapabilityManifest>(content) {
        return Ok(manifest);
    }
    bail!("unsupported manifest format; expected a YAML or JSON document with a 'capabilities' list");
}
