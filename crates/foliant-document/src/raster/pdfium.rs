// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// pdfium-backed rasteriser using the `pdfium-render` crate.
//
// pdfium is loaded dynamically at runtime. Failing to bind it, or failing to
// allocate a page bitmap, is reported as `RenderTargetUnavailable`.

use std::path::Path;

use foliant_core::error::{FoliantError, Result};
use image::RgbaImage;
use pdfium_render::prelude::{PdfDocument, PdfPageIndex, PdfRenderConfig, Pdfium};
use tracing::{debug, info, instrument};

use super::{RasterFrame, RasterSource, Rasterizer};

/// Renders pages through a bound pdfium library.
pub struct PdfiumRasterizer {
    pdfium: Pdfium,
}

impl PdfiumRasterizer {
    /// Bind pdfium.
    ///
    /// `library` may name the shared library itself or the directory holding
    /// it. Without it, the working directory is tried first and then the
    /// system library search path.
    pub fn bind(library: Option<&Path>) -> Result<Self> {
        let bindings = match library {
            Some(path) if path.is_dir() => {
                Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(path))
            }
            Some(path) => Pdfium::bind_to_library(path),
            None => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
                .or_else(|_| Pdfium::bind_to_system_library()),
        }
        .map_err(|err| {
            FoliantError::RenderTargetUnavailable(format!("failed to bind pdfium: {err}"))
        })?;

        info!("pdfium bound");
        Ok(Self {
            pdfium: Pdfium::new(bindings),
        })
    }
}

impl Rasterizer for PdfiumRasterizer {
    type Source<'a> = PdfiumSource<'a>;

    #[instrument(skip_all, fields(bytes_len = data.len()))]
    fn load<'a>(&'a self, data: &'a [u8]) -> Result<PdfiumSource<'a>> {
        let document = self
            .pdfium
            .load_pdf_from_byte_slice(data, None)
            .map_err(|err| {
                FoliantError::MalformedDocument(format!("pdfium could not open PDF: {err}"))
            })?;
        Ok(PdfiumSource { document })
    }
}

/// A document opened by pdfium.
pub struct PdfiumSource<'a> {
    document: PdfDocument<'a>,
}

impl RasterSource for PdfiumSource<'_> {
    fn page_count(&self) -> u32 {
        u32::try_from(self.document.pages().len()).unwrap_or(0)
    }

    fn render_page(&mut self, page_number: u32, scale: f32) -> Result<RasterFrame> {
        let index = page_number
            .checked_sub(1)
            .and_then(|index| PdfPageIndex::try_from(index).ok())
            .ok_or_else(|| {
                FoliantError::PdfError(format!("page {page_number} is not a valid page number"))
            })?;

        let page = self.document.pages().get(index).map_err(|err| {
            FoliantError::PdfError(format!("cannot open page {page_number}: {err}"))
        })?;

        let bitmap = page
            .render_with_config(&PdfRenderConfig::new().scale_page_by_factor(scale))
            .map_err(|err| {
                FoliantError::RenderTargetUnavailable(format!(
                    "cannot render page {page_number}: {err}"
                ))
            })?;

        let width = u32::try_from(bitmap.width()).unwrap_or(0);
        let height = u32::try_from(bitmap.height()).unwrap_or(0);
        let rgba = bitmap.as_rgba_bytes();

        // Closing the page frees pdfium's parsed page and render cache.
        drop(bitmap);
        drop(page);

        let pixels = RgbaImage::from_raw(width, height, rgba).ok_or_else(|| {
            FoliantError::RenderTargetUnavailable(format!(
                "bitmap for page {page_number} does not match {width}x{height}"
            ))
        })?;

        debug!(page_number, width, height, "page rendered");
        Ok(RasterFrame::new(pixels))
    }
}
