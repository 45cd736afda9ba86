// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Service layer — bridges the CLI to the foliant backend crates.
//
// Operations run off the async runtime (blocking pool or the render worker)
// and hand their output to an `OutputSink`.

pub mod data_dir;
pub mod document_services;
pub mod render_worker;
