//! Registry configuration.

use serde::{Deserialize, Serialize};

use crate::ModelResult;

/// Configuration carried by a [`ModelRegistry`](crate::ModelRegistry) and
/// shared by every factory it builds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Binary codec limits.
    pub codec: CodecLimits,
}

impl ModelConfig {
    /// Parses a configuration document. Missing fields take their defaults.
    pub fn from_json(json: &str) -> ModelResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Bounds enforced by the binary codec on both encode and decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecLimits {
    /// Largest accepted payload, top-level or nested, in bytes.
    pub max_payload_len: usize,
    /// Deepest accepted model nesting.
    pub max_depth: usize,
    /// Largest accepted element count for a model array or collection.
    pub max_elements: usize,
}

impl Default for CodecLimits {
    fn default() -> Self {
        Self {
            max_payload_len: 64 * 1024 * 1024, // 64 MB
            max_depth: 64,
            max_elements: 1 << 20,
        }
    }
}
