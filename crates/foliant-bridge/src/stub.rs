// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Stub assistant for builds without a configured remote service.
//
// Every call returns `RemoteService`.

use foliant_core::error::{FoliantError, Result};

use crate::traits::{AssistantRequest, ImageAssistant};

const NOT_CONFIGURED: &str = "no image assistant configured";

/// Assistant that refuses every request.
pub struct StubAssistant;

impl ImageAssistant for StubAssistant {
    fn extract_text(&self, _request: &AssistantRequest) -> Result<String> {
        tracing::warn!("ImageAssistant::extract_text called on stub assistant");
        Err(FoliantError::RemoteService(NOT_CONFIGURED.to_string()))
    }

    fn edit_image(&self, _request: &AssistantRequest) -> Result<Vec<u8>> {
        tracing::warn!("ImageAssistant::edit_image called on stub assistant");
        Err(FoliantError::RemoteService(NOT_CONFIGURED.to_string()))
    }
}
