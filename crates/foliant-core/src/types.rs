// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Foliant document pipeline.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Scale factor applied when rasterising pages for compression.
pub const DEFAULT_RENDER_SCALE: f32 = 1.5;

/// Unique identifier for one pipeline invocation (used for log correlation).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OperationId(pub Uuid);

impl OperationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for OperationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for OperationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The transformation a caller asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationKind {
    ImagesToPdf,
    Merge,
    Split,
    Compress,
}

impl OperationKind {
    /// Short lowercase label used in logs and default output filenames.
    pub fn label(&self) -> &'static str {
        match self {
            Self::ImagesToPdf => "images",
            Self::Merge => "merged",
            Self::Split => "split",
            Self::Compress => "compressed",
        }
    }
}

/// Raster formats that can be embedded as PDF pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageKind {
    Jpeg,
    Png,
}

impl ImageKind {
    /// Resolve a MIME type. `image/jpg` is accepted as an alias of `image/jpeg`.
    /// Anything else is not embeddable.
    pub fn from_mime(mime_type: &str) -> Option<Self> {
        match mime_type.trim().to_ascii_lowercase().as_str() {
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/png" => Some(Self::Png),
            _ => None,
        }
    }

    /// Infer a MIME type from a file extension. Unknown extensions map to
    /// `application/octet-stream`, which the embedder skips.
    pub fn mime_for_extension(ext: &str) -> &'static str {
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => "image/jpeg",
            "png" => "image/png",
            "gif" => "image/gif",
            "webp" => "image/webp",
            "tif" | "tiff" => "image/tiff",
            "bmp" => "image/bmp",
            _ => "application/octet-stream",
        }
    }
}

/// One raster image handed to the images-to-PDF conversion.
#[derive(Debug, Clone)]
pub struct ImageInput {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl ImageInput {
    pub fn new(bytes: impl Into<Vec<u8>>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            mime_type: mime_type.into(),
        }
    }
}

/// Named JPEG quality presets offered to users.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionPreset {
    /// Light compression, best fidelity.
    Low,
    #[default]
    Medium,
    /// Aggressive compression, smallest output.
    High,
}

impl CompressionPreset {
    /// JPEG quality in `0.0..=1.0` passed straight to the encoder.
    pub fn quality(&self) -> f32 {
        match self {
            Self::Low => 0.8,
            Self::Medium => 0.6,
            Self::High => 0.4,
        }
    }
}

/// Per-page progress emitted by the compression pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    /// 1-based page number currently being processed.
    pub current: u32,
    pub total: u32,
}

impl Progress {
    pub fn new(current: u32, total: u32) -> Self {
        Self { current, total }
    }

    /// Completed fraction in `0.0..=1.0`.
    pub fn fraction(&self) -> f32 {
        if self.total == 0 {
            return 1.0;
        }
        self.current as f32 / self.total as f32
    }
}
