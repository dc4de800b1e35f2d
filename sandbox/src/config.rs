//! Tracer configuration.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::SetupError;

/// Configuration record for the `wasip1` tracer.
///
/// Parsed from the raw JSON the tracer registry receives, e.g.
/// `{"wasm_path": "/opt/tracers/calls.wasm"}`. Unknown keys are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TracerConfig {
    /// Filesystem location of the compiled guest module.
    pub wasm_path: PathBuf,
}

impl TracerConfig {
    pub fn new(wasm_path: impl Into<PathBuf>) -> Self {
        Self {
            wasm_path: wasm_path.into(),
        }
    }

    /// Parse from an already-decoded JSON value.
    pub fn from_value(value: &serde_json::Value) -> Result<Self, SetupError> {
        Ok(Self::deserialize(value)?)
    }

    /// Parse from raw JSON bytes.
    pub fn from_slice(raw: &[u8]) -> Result<Self, SetupError> {
        Ok(serde_json::from_slice(raw)?)
    }

    pub fn wasm_path(&self) -> &Path {
        &self.wasm_path
    }
}
