// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for front ends.
//
// Every technical error is mapped to plain English with a clear suggestion.

use crate::error::FoliantError;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Something outside our control hiccupped; trying again may work.
    Transient,
    /// User must change the input (fix the page range, pick another file).
    ActionRequired,
    /// Cannot be fixed by retrying with the same input.
    Permanent,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    /// Whether retrying the same request could succeed.
    pub retriable: bool,
    pub severity: Severity,
}

/// Convert a `FoliantError` into a `HumanError`.
pub fn humanize_error(err: &FoliantError) -> HumanError {
    match err {
        FoliantError::InvalidRange {
            expression,
            total_pages,
        } => HumanError {
            message: "Those page numbers don't match this document.".into(),
            suggestion: format!(
                "Enter pages between 1 and {total_pages}, for example \"1-3, 5\". (You entered: {expression:?})"
            ),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        FoliantError::MalformedDocument(_) => HumanError {
            message: "This doesn't look like a working PDF file.".into(),
            suggestion: "The file may be damaged or not a PDF at all. Try opening it in a PDF viewer first, or pick a different file.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        FoliantError::UnsupportedImageFormat(mime) => HumanError {
            message: "This image type can't be added to a PDF.".into(),
            suggestion: format!("Save the picture as JPEG or PNG and try again. (File type: {mime})"),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        FoliantError::InvalidImage(_) => HumanError {
            message: "There's a problem with this image.".into(),
            suggestion: "The image may be damaged or not what its file type says. Try saving it again as a JPEG or PNG.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        FoliantError::InvalidQuality(_) => HumanError {
            message: "That compression level isn't valid.".into(),
            suggestion: "Choose low, medium, or high compression.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        FoliantError::PdfError(_) => HumanError {
            message: "Something went wrong while building the PDF.".into(),
            suggestion: "Try again with fewer files. If it keeps happening, one of the input files may be damaged.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        FoliantError::RenderTargetUnavailable(_) => HumanError {
            message: "Compression isn't available on this device.".into(),
            suggestion: "The PDF rendering library couldn't be loaded. Check that pdfium is installed, or set its location in the settings.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        FoliantError::RemoteService(detail) => HumanError {
            message: "The online helper didn't respond.".into(),
            suggestion: format!("Check your internet connection and try again. ({detail})"),
            retriable: true,
            severity: Severity::Transient,
        },

        FoliantError::Output(detail) => HumanError {
            message: "The finished file couldn't be saved.".into(),
            suggestion: format!("Pick a different name or folder and try again. ({detail})"),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        FoliantError::Io(io_err) => {
            if io_err.kind() == std::io::ErrorKind::NotFound {
                HumanError {
                    message: "The file couldn't be found.".into(),
                    suggestion: "It may have been moved or deleted. Try choosing the file again.".into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else if io_err.kind() == std::io::ErrorKind::PermissionDenied {
                HumanError {
                    message: "Foliant isn't allowed to use that file.".into(),
                    suggestion: "Check the file's permissions, or save to a different folder.".into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else {
                HumanError {
                    message: "There was a problem reading or writing a file.".into(),
                    suggestion: "Make sure there is free space on the disk, then try again.".into(),
                    retriable: true,
                    severity: Severity::Transient,
                }
            }
        }

        FoliantError::Serialization(_) => HumanError {
            message: "The settings file couldn't be read.".into(),
            suggestion: "Delete the settings file to restore the defaults.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },
    }
}
