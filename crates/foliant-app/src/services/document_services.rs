// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Central service layer — async wrappers around the document pipeline.
//
// Each call gets an `OperationId` for log correlation, runs the synchronous
// transformation off the async runtime, and delivers the result through the
// configured `OutputSink`. Invocations share no mutable state, so any number
// may run concurrently; compression jobs queue on the render worker.

use std::sync::Arc;

use foliant_bridge::{Delivery, OutputSink};
use foliant_core::error::{FoliantError, Result};
use foliant_core::types::{ImageInput, OperationId, OperationKind, Progress};
use tokio::sync::mpsc;
use tracing::{info, instrument};

use super::render_worker::RenderWorker;

/// What a finished operation produced.
#[derive(Debug, Clone)]
pub struct Outcome {
    pub operation: OperationId,
    pub kind: OperationKind,
    pub delivery: Delivery,
}

/// Shared document services. Cheaply cloneable.
#[derive(Clone)]
pub struct DocumentServices {
    sink: Arc<dyn OutputSink>,
    renderer: RenderWorker,
    render_scale: f32,
}

impl DocumentServices {
    pub fn new(sink: Arc<dyn OutputSink>, renderer: RenderWorker, render_scale: f32) -> Self {
        Self {
            sink,
            renderer,
            render_scale,
        }
    }

    // -- Operations -----------------------------------------------------------

    /// One page per JPEG/PNG image; other image types are skipped.
    #[instrument(skip_all, fields(images = images.len()))]
    pub async fn images_to_pdf(&self, images: Vec<ImageInput>, filename: &str) -> Result<Outcome> {
        let operation = OperationId::new();
        info!(%operation, "images-to-PDF started");
        let bytes = run_blocking(move || foliant_document::images_to_pdf(&images)).await?;
        self.deliver(operation, OperationKind::ImagesToPdf, bytes, filename)
            .await
    }

    /// Concatenate `files` in order.
    #[instrument(skip_all, fields(files = files.len()))]
    pub async fn merge_pdfs(&self, files: Vec<Vec<u8>>, filename: &str) -> Result<Outcome> {
        let operation = OperationId::new();
        info!(%operation, "merge started");
        let bytes = run_blocking(move || foliant_document::merge_pdfs(&files)).await?;
        self.deliver(operation, OperationKind::Merge, bytes, filename)
            .await
    }

    /// Keep the pages selected by `ranges`.
    #[instrument(skip(self, file), fields(bytes_len = file.len()))]
    pub async fn split_pdf(&self, file: Vec<u8>, ranges: &str, filename: &str) -> Result<Outcome> {
        let operation = OperationId::new();
        info!(%operation, "split started");
        let ranges = ranges.to_string();
        let bytes = run_blocking(move || foliant_document::split_pdf(&file, &ranges)).await?;
        self.deliver(operation, OperationKind::Split, bytes, filename)
            .await
    }

    /// Rasterise every page to JPEG at `quality`. Per-page progress goes to
    /// `progress` while the job runs; the sender is dropped when it ends.
    #[instrument(skip(self, file, progress), fields(bytes_len = file.len()))]
    pub async fn compress_pdf(
        &self,
        file: Vec<u8>,
        quality: f32,
        filename: &str,
        progress: Option<mpsc::UnboundedSender<Progress>>,
    ) -> Result<Outcome> {
        let operation = OperationId::new();
        info!(%operation, quality, scale = self.render_scale, "compression queued");
        let bytes = self
            .renderer
            .compress(operation, file, quality, self.render_scale, progress)
            .await?;
        self.deliver(operation, OperationKind::Compress, bytes, filename)
            .await
    }

    // -- Delivery -------------------------------------------------------------

    async fn deliver(
        &self,
        operation: OperationId,
        kind: OperationKind,
        bytes: Vec<u8>,
        filename: &str,
    ) -> Result<Outcome> {
        let sink = Arc::clone(&self.sink);
        let filename = filename.to_string();
        let delivery = run_blocking(move || sink.deliver(&bytes, &filename)).await?;

        info!(
            %operation,
            kind = kind.label(),
            size_bytes = delivery.size_bytes,
            "operation finished"
        );
        Ok(Outcome {
            operation,
            kind,
            delivery,
        })
    }
}

/// Run a synchronous job on tokio's blocking pool.
async fn run_blocking<T, F>(job: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(job)
        .await
        .map_err(|err| FoliantError::Io(std::io::Error::other(err)))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    use foliant_bridge::DirectorySink;
    use foliant_document::{Document, PageSize, RasterFrame, RasterSource, Rasterizer};
    use image::{ImageFormat, Rgba, RgbaImage};

    /// Renders flat frames sized from each page's MediaBox.
    struct FlatRasterizer;

    struct FlatSource {
        sizes: Vec<PageSize>,
    }

    impl Rasterizer for FlatRasterizer {
        type Source<'a> = FlatSource;

        fn load<'a>(&'a self, data: &'a [u8]) -> Result<FlatSource> {
            let document = Document::load(data)?;
            let sizes = document
                .pages()
                .map(|page| document.page_size(page))
                .collect::<Result<Vec<_>>>()?;
            Ok(FlatSource { sizes })
        }
    }

    impl RasterSource for FlatSource {
        fn page_count(&self) -> u32 {
            self.sizes.len() as u32
        }

        fn render_page(&mut self, page_number: u32, scale: f32) -> Result<RasterFrame> {
            let size = self.sizes[page_number as usize - 1];
            let width = (size.width * scale).round() as u32;
            let height = (size.height * scale).round() as u32;
            Ok(RasterFrame::new(RgbaImage::from_pixel(
                width,
                height,
                Rgba([255, 255, 255, 255]),
            )))
        }
    }

    fn services(dir: &std::path::Path) -> DocumentServices {
        let renderer = RenderWorker::spawn(|| Ok(FlatRasterizer)).unwrap();
        DocumentServices::new(Arc::new(DirectorySink::new(dir)), renderer, 1.5)
    }

    fn blank_pdf(pages: usize) -> Vec<u8> {
        let mut doc = Document::new();
        for _ in 0..pages {
            doc.add_blank_page(PageSize::new(100.0, 200.0)).unwrap();
        }
        doc.save().unwrap()
    }

    fn png(width: u32, height: u32) -> Vec<u8> {
        let mut bytes = Vec::new();
        RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 255]))
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    fn delivered_pages(outcome: &Outcome) -> usize {
        let bytes = std::fs::read(outcome.delivery.path.as_ref().unwrap()).unwrap();
        Document::load(&bytes).unwrap().page_count()
    }

    #[tokio::test]
    async fn merge_is_delivered_to_the_sink() {
        let dir = tempfile::tempdir().unwrap();
        let outcome = services(dir.path())
            .merge_pdfs(vec![blank_pdf(2), blank_pdf(3)], "merged.pdf")
            .await
            .unwrap();

        assert_eq!(outcome.kind, OperationKind::Merge);
        assert_eq!(outcome.delivery.path, Some(dir.path().join("merged.pdf")));
        assert_eq!(delivered_pages(&outcome), 5);
    }

    #[tokio::test]
    async fn images_skip_unsupported_types() {
        let dir = tempfile::tempdir().unwrap();
        let images = vec![
            ImageInput::new(png(10, 20), "image/png"),
            ImageInput::new(b"GIF89a".to_vec(), "image/gif"),
        ];
        let outcome = services(dir.path())
            .images_to_pdf(images, "images.pdf")
            .await
            .unwrap();
        assert_eq!(delivered_pages(&outcome), 1);
    }

    #[tokio::test]
    async fn invalid_split_delivers_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let err = services(dir.path())
            .split_pdf(blank_pdf(4), "9-12", "split.pdf")
            .await
            .unwrap_err();

        assert!(matches!(err, FoliantError::InvalidRange { total_pages: 4, .. }));
        assert!(!dir.path().join("split.pdf").exists());
    }

    #[tokio::test]
    async fn compression_streams_progress_over_the_channel() {
        let dir = tempfile::tempdir().unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();

        let outcome = services(dir.path())
            .compress_pdf(blank_pdf(3), 0.6, "compressed.pdf", Some(tx))
            .await
            .unwrap();

        let mut seen = Vec::new();
        while let Some(progress) = rx.recv().await {
            seen.push((progress.current, progress.total));
        }
        assert_eq!(seen, vec![(1, 3), (2, 3), (3, 3)]);
        assert_eq!(delivered_pages(&outcome), 3);
    }

    #[tokio::test]
    async fn unavailable_renderer_fails_compression() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = RenderWorker::spawn(|| -> Result<FlatRasterizer> {
            Err(FoliantError::RenderTargetUnavailable("no pdfium".into()))
        })
        .unwrap();
        let sink = Arc::new(DirectorySink::new(dir.path()));
        let services = DocumentServices::new(sink, renderer, 1.5);

        for _ in 0..2 {
            let err = services
                .compress_pdf(blank_pdf(1), 0.5, "c.pdf", None)
                .await
                .unwrap_err();
            match err {
                FoliantError::RenderTargetUnavailable(reason) => assert_eq!(reason, "no pdfium"),
                other => panic!("unexpected error: {other}"),
            }
        }
    }

    #[tokio::test]
    async fn concurrent_operations_are_independent() {
        let dir = tempfile::tempdir().unwrap();
        let services = services(dir.path());

        let (first, second) = tokio::join!(
            services.split_pdf(blank_pdf(5), "1-2", "a.pdf"),
            services.split_pdf(blank_pdf(5), "4", "b.pdf"),
        );
        assert_eq!(delivered_pages(&first.unwrap()), 2);
        assert_eq!(delivered_pages(&second.unwrap()), 1);
    }
}
