// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The four document transformations: images → PDF, merge, split, and
// compress-by-rasterisation.
//
// Every operation takes bytes and returns the bytes of a new PDF. Inputs are
// never modified, and a failed operation produces no output at all.

use foliant_core::error::{FoliantError, Result};
use foliant_core::types::{DEFAULT_RENDER_SCALE, ImageInput, Progress};
use tracing::{debug, info, instrument, warn};

use crate::image::embed::{embed_image, embed_jpeg};
use crate::pdf::{Document, PageSize, parse_ranges};
use crate::raster::{RasterSource, Rasterizer, encoder_quality, raster_to_jpeg_bytes};

/// Build a PDF with one page per supported image, each page sized to the
/// image's pixel dimensions with the image filling it.
///
/// Images whose MIME type is neither JPEG nor PNG are skipped, so the page
/// count may be lower than the input count (down to zero).
#[instrument(skip_all, fields(images = images.len()))]
pub fn images_to_pdf(images: &[ImageInput]) -> Result<Vec<u8>> {
    let mut doc = Document::new();

    for (position, input) in images.iter().enumerate() {
        let Some(image) = embed_image(&mut doc, &input.bytes, &input.mime_type)? else {
            debug!(position, mime_type = %input.mime_type, "image skipped");
            continue;
        };
        let size = image.natural_size();
        let page = doc.add_blank_page(size)?;
        doc.draw_image(page, &image, 0.0, 0.0, size.width, size.height)?;
    }

    let skipped = images.len() - doc.page_count();
    if skipped > 0 {
        warn!(skipped, "unsupported images left out of the PDF");
    }
    info!(pages = doc.page_count(), "images converted to PDF");
    doc.save()
}

/// Concatenate every page of every input, in input order.
///
/// An empty input list yields a valid zero-page PDF. Any input that fails to
/// parse fails the whole merge.
#[instrument(skip_all, fields(files = files.len()))]
pub fn merge_pdfs<B: AsRef<[u8]>>(files: &[B]) -> Result<Vec<u8>> {
    let mut merged = Document::new();

    for (position, file) in files.iter().enumerate() {
        let source = Document::load(file.as_ref()).map_err(|err| match err {
            FoliantError::MalformedDocument(reason) => {
                FoliantError::MalformedDocument(format!("input {}: {reason}", position + 1))
            }
            other => other,
        })?;

        let indices: Vec<usize> = (0..source.page_count()).collect();
        for page in merged.copy_pages(&source, &indices)? {
            merged.append_page(page)?;
        }
        debug!(position, pages = source.page_count(), "input merged");
    }

    info!(pages = merged.page_count(), "PDFs merged");
    merged.save()
}

/// Extract the pages selected by a range expression such as `"1-3, 5"`.
///
/// Pages appear in ascending order whatever order the expression lists
/// them in. An expression that selects nothing is an
/// [`FoliantError::InvalidRange`].
#[instrument(skip(file), fields(bytes_len = file.len()))]
pub fn split_pdf(file: &[u8], range_expression: &str) -> Result<Vec<u8>> {
    let source = Document::load(file)?;
    let selected = parse_ranges(range_expression, source.page_count())?;

    let mut output = Document::new();
    for page in output.copy_pages(&source, &selected.to_vec())? {
        output.append_page(page)?;
    }

    info!(
        selected = selected.len(),
        source_pages = source.page_count(),
        "PDF split"
    );
    output.save()
}

/// Re-encode every page as a JPEG at `quality` (`0.0..=1.0`), rendered at
/// the default scale.
///
/// See [`compress_pdf_at_scale`].
pub fn compress_pdf<R: Rasterizer>(
    rasterizer: &R,
    file: &[u8],
    quality: f32,
    on_progress: Option<&mut dyn FnMut(Progress)>,
) -> Result<Vec<u8>> {
    compress_pdf_at_scale(rasterizer, file, quality, DEFAULT_RENDER_SCALE, on_progress)
}

/// Re-encode every page as a JPEG rendered at `scale` times its intrinsic
/// size.
///
/// Pages are processed one at a time: render, encode, embed, then drop the
/// frame before the next page is touched. Each output page is sized to its
/// raster in pixels, so a 612×792 page at scale 1.5 becomes 918×1188.
/// Text, vector content, annotations, and forms are flattened.
///
/// `on_progress` is called with `(i, N)` once page `i` has been embedded.
/// It is always called from the calling thread, in strictly increasing
/// order, and never after an error.
#[instrument(skip(rasterizer, file, on_progress), fields(bytes_len = file.len()))]
pub fn compress_pdf_at_scale<R: Rasterizer>(
    rasterizer: &R,
    file: &[u8],
    quality: f32,
    scale: f32,
    mut on_progress: Option<&mut dyn FnMut(Progress)>,
) -> Result<Vec<u8>> {
    encoder_quality(quality)?;
    if !(scale.is_finite() && scale > 0.0) {
        return Err(FoliantError::PdfError(format!(
            "render scale must be positive, got {scale}"
        )));
    }

    let mut source = rasterizer.load(file)?;
    let total = source.page_count();
    let mut output = Document::new();

    for page_number in 1..=total {
        let frame = source.render_page(page_number, scale)?;
        let jpeg = raster_to_jpeg_bytes(&frame, quality)?;
        let size = PageSize::new(frame.width() as f32, frame.height() as f32);
        drop(frame);

        let image = embed_jpeg(&mut output, &jpeg)?;
        let page = output.add_blank_page(size)?;
        output.draw_image(page, &image, 0.0, 0.0, size.width, size.height)?;

        debug!(page_number, total, jpeg_bytes = jpeg.len(), "page compressed");
        if let Some(callback) = on_progress.as_mut() {
            callback(Progress::new(page_number, total));
        }
    }

    let bytes = output.save()?;
    info!(
        pages = total,
        input_bytes = file.len(),
        output_bytes = bytes.len(),
        "PDF compressed"
    );
    Ok(bytes)
}
