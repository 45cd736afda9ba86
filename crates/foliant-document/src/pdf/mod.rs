// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module — the in-memory document model and page-range selection.

pub mod document;
pub mod ranges;

pub use document::{CopiedPage, Document, DocumentId, Page, PageSize};
pub use ranges::{PageIndexSet, parse_ranges};
