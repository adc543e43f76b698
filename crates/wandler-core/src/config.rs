// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Engine configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, WandlerError};
use crate::types::InputFile;

/// What the dispatcher does when no real conversion path exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PassthroughPolicy {
    /// Return the input bytes unchanged under the new MIME type and extension.
    #[default]
    Passthrough,
    /// Fail with `UnsupportedFormat`.
    Reject,
}

/// Engine-wide settings. Every field has a default, so a partial JSON file is
/// enough to override a single value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Largest accepted input, in bytes (default 100 MiB).
    pub max_file_size_bytes: usize,
    /// Encoder quality used by front ends that do not ask the user.
    pub default_quality: u8,
    /// Fallback behaviour for unsupported target formats.
    pub passthrough: PassthroughPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_file_size_bytes: 100 * 1024 * 1024,
            default_quality: 90,
            passthrough: PassthroughPolicy::Passthrough,
        }
    }
}

impl EngineConfig {
    /// Parse a JSON document; absent fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load from a JSON file on disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&data)?;
        debug!(path = %path.display(), ?config, "engine config loaded");
        Ok(config)
    }

    /// Reject inputs larger than `max_file_size_bytes`.
    pub fn check_payload(&self, input: &InputFile) -> Result<()> {
        if input.len() > self.max_file_size_bytes {
            return Err(WandlerError::PayloadTooLarge {
                name: input.name().to_string(),
                size: input.len(),
                limit: self.max_file_size_bytes,
            });
        }
        Ok(())
    }
}
