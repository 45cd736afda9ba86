// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Foliant.

use thiserror::Error;

/// Top-level error type for all Foliant operations.
///
/// Every variant aborts the operation that raised it; no partial output is
/// ever returned alongside an error.
#[derive(Debug, Error)]
pub enum FoliantError {
    // -- Input errors --
    /// The page-range expression produced no usable page indices.
    #[error("no valid pages in range expression {expression:?} for a {total_pages} page document")]
    InvalidRange {
        expression: String,
        total_pages: usize,
    },

    #[error("malformed PDF document: {0}")]
    MalformedDocument(String),

    /// Only used for skip bookkeeping; operations never abort on it.
    #[error("unsupported image format: {0}")]
    UnsupportedImageFormat(String),

    #[error("image could not be decoded: {0}")]
    InvalidImage(String),

    #[error("compression quality must be within 0.0..=1.0, got {0}")]
    InvalidQuality(f32),

    // -- Processing errors --
    #[error("PDF operation failed: {0}")]
    PdfError(String),

    #[error("render target unavailable: {0}")]
    RenderTargetUnavailable(String),

    // -- Collaborators --
    #[error("remote service error: {0}")]
    RemoteService(String),

    #[error("output delivery failed: {0}")]
    Output(String),

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, FoliantError>;
