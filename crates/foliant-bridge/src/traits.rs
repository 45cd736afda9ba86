// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Trait definitions for the two outward boundaries.

use std::path::PathBuf;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use foliant_core::error::{FoliantError, Result};
use serde::{Deserialize, Serialize};

/// Receipt for bytes handed to an [`OutputSink`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delivery {
    /// Where the file landed, for sinks that write files.
    pub path: Option<PathBuf>,
    pub size_bytes: u64,
    /// Lowercase hex SHA-256 of the delivered bytes.
    pub sha256: String,
    pub delivered_at: DateTime<Utc>,
}

/// Makes a finished byte buffer available to the user under a name.
///
/// Sinks never transform the bytes.
pub trait OutputSink: Send + Sync {
    fn deliver(&self, bytes: &[u8], filename: &str) -> Result<Delivery>;
}

/// An image plus an instruction for the remote assistant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssistantRequest {
    pub image_base64: String,
    pub mime_type: String,
    /// Free-form prompt, e.g. "extract all text" or "remove the background".
    pub task: String,
}

impl AssistantRequest {
    pub fn from_image(bytes: &[u8], mime_type: impl Into<String>, task: impl Into<String>) -> Self {
        Self {
            image_base64: STANDARD.encode(bytes),
            mime_type: mime_type.into(),
            task: task.into(),
        }
    }
}

/// Remote OCR and image-editing service.
///
/// Failures are reported as [`FoliantError::RemoteService`] and are never
/// retried here.
pub trait ImageAssistant: Send + Sync {
    /// Extract the text visible in the image.
    fn extract_text(&self, request: &AssistantRequest) -> Result<String>;

    /// Return the edited image bytes.
    fn edit_image(&self, request: &AssistantRequest) -> Result<Vec<u8>>;
}

/// Decode a base64 image returned by an assistant.
pub fn decode_image_payload(encoded: &str) -> Result<Vec<u8>> {
    STANDARD
        .decode(encoded.trim())
        .map_err(|err| {
            FoliantError::RemoteService(format!("assistant returned invalid base64: {err}"))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_carries_base64_image() {
        let request = AssistantRequest::from_image(b"\xff\xd8\xff", "image/jpeg", "extract text");
        assert_eq!(request.image_base64, "/9j/");
        assert_eq!(request.mime_type, "image/jpeg");
        assert_eq!(request.task, "extract text");
    }

    #[test]
    fn payload_round_trips_through_request_encoding() {
        let request = AssistantRequest::from_image(b"edited pixels", "image/png", "edit");
        assert_eq!(decode_image_payload(&request.image_base64).unwrap(), b"edited pixels");
    }

    #[test]
    fn invalid_payload_is_a_remote_service_error() {
        let err = decode_image_payload("***").unwrap_err();
        assert!(matches!(err, FoliantError::RemoteService(_)));
    }
}
