// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Application configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::Result;
use crate::types::{CompressionPreset, DEFAULT_RENDER_SCALE};

/// Persistent application settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory finished documents are delivered to. `None` means the
    /// platform data directory.
    pub output_dir: Option<PathBuf>,
    /// Preset used when the caller gives no explicit quality.
    pub default_preset: CompressionPreset,
    /// Rasterisation scale for compression.
    pub render_scale: f32,
    /// Explicit location of the pdfium shared library. Falls back to the
    /// working directory and then the system library search path.
    pub pdfium_library_path: Option<PathBuf>,
    /// Replace files that already exist in the output directory.
    pub overwrite_existing: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            output_dir: None,
            default_preset: CompressionPreset::default(),
            render_scale: DEFAULT_RENDER_SCALE,
            pdfium_library_path: None,
            overwrite_existing: false,
        }
    }
}

impl AppConfig {
    /// Load settings from a JSON file. A missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        info!(path = %path.display(), "config loaded");
        Ok(config)
    }

    /// Persist settings as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        info!(path = %path.display(), "config saved");
        Ok(())
    }
}
