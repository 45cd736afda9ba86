// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Dedicated rendering thread for compression jobs.
//
// Native renderers are bound once per process and their handles are not
// thread-safe, so a single OS thread owns the rasteriser and runs compression
// jobs one after another. Callers talk to it over channels.

use std::sync::mpsc as std_mpsc;
use std::thread;

use foliant_core::error::{FoliantError, Result};
use foliant_core::types::{OperationId, Progress};
use foliant_document::{Rasterizer, compress_pdf_at_scale};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

struct CompressJob {
    operation: OperationId,
    bytes: Vec<u8>,
    quality: f32,
    scale: f32,
    progress: Option<mpsc::UnboundedSender<Progress>>,
    reply: oneshot::Sender<Result<Vec<u8>>>,
}

/// Handle to the rendering thread. Cheap to clone; the thread exits once
/// every handle is dropped.
#[derive(Clone)]
pub struct RenderWorker {
    jobs: std_mpsc::Sender<CompressJob>,
}

impl RenderWorker {
    /// Start the thread. `make` builds the rasteriser on that thread, lazily,
    /// when the first job arrives. If it fails, every job is answered with
    /// `RenderTargetUnavailable`.
    pub fn spawn<R, F>(make: F) -> Result<Self>
    where
        R: Rasterizer + 'static,
        F: FnOnce() -> Result<R> + Send + 'static,
    {
        let (jobs, queue) = std_mpsc::channel::<CompressJob>();

        thread::Builder::new()
            .name("foliant-render".into())
            .spawn(move || {
                let mut make = Some(make);
                let mut rasterizer: Option<std::result::Result<R, String>> = None;

                for job in queue {
                    let ready = rasterizer.get_or_insert_with(|| match make.take() {
                        Some(make) => make().map_err(bind_failure),
                        None => Err("rasterizer was never built".to_string()),
                    });
                    let result = match ready {
                        Ok(rasterizer) => run(rasterizer, &job),
                        Err(reason) => Err(FoliantError::RenderTargetUnavailable(reason.clone())),
                    };
                    if job.reply.send(result).is_err() {
                        debug!(operation = %job.operation, "caller went away before the result");
                    }
                }
                debug!("render worker shutting down");
            })?;

        Ok(Self { jobs })
    }

    /// Compress `bytes` on the rendering thread. Per-page progress is
    /// forwarded to `progress`, if given, in page order.
    pub async fn compress(
        &self,
        operation: OperationId,
        bytes: Vec<u8>,
        quality: f32,
        scale: f32,
        progress: Option<mpsc::UnboundedSender<Progress>>,
    ) -> Result<Vec<u8>> {
        let (reply, answer) = oneshot::channel();
        self.jobs
            .send(CompressJob {
                operation,
                bytes,
                quality,
                scale,
                progress,
                reply,
            })
            .map_err(|_| {
                FoliantError::RenderTargetUnavailable("render worker has stopped".to_string())
            })?;

        answer.await.map_err(|_| {
            FoliantError::RenderTargetUnavailable("render worker dropped the job".to_string())
        })?
    }
}

fn run<R: Rasterizer>(rasterizer: &R, job: &CompressJob) -> Result<Vec<u8>> {
    info!(operation = %job.operation, input_bytes = job.bytes.len(), "compression started");

    let mut forward = |update: Progress| {
        if let Some(sender) = &job.progress {
            // A closed receiver only means nobody is watching.
            let _ = sender.send(update);
        }
    };
    let result = compress_pdf_at_scale(
        rasterizer,
        &job.bytes,
        job.quality,
        job.scale,
        Some(&mut forward),
    );

    if let Err(err) = &result {
        warn!(operation = %job.operation, %err, "compression failed");
    }
    result
}

fn bind_failure(err: FoliantError) -> String {
    match err {
        FoliantError::RenderTargetUnavailable(reason) => reason,
        other => other.to_string(),
    }
}
