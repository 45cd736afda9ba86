// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// foliant-bridge — boundaries between the document pipeline and the outside
// world: where finished PDFs are delivered, and the remote image assistant
// (OCR / image editing) that the pipeline treats as an opaque call.

pub mod sink;
pub mod stub;
pub mod traits;

pub use sink::{DirectorySink, StdoutSink, sanitize_filename};
pub use stub::StubAssistant;
pub use traits::{AssistantRequest, Delivery, ImageAssistant, OutputSink, decode_image_payload};

/// The image assistant available in this build.
///
/// No remote service is wired in yet, so every call fails with
/// `FoliantError::RemoteService`.
pub fn image_assistant() -> Box<dyn ImageAssistant> {
    Box::new(StubAssistant)
}
