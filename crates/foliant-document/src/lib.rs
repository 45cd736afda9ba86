// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// foliant-document — PDF processing for Foliant.
//
// Provides the document model (load, copy pages, append, save), page-range
// parsing, JPEG/PNG embedding, page rasterisation, and the four
// transformations built on them (images → PDF, merge, split, compress).

pub mod convert;
pub mod image;
pub mod pdf;
pub mod raster;

#[cfg(test)]
mod fixtures;

// Re-export the primary entry points so callers can use `foliant_document::merge_pdfs` etc.
pub use crate::image::embed::{EmbeddedImage, embed_image};
pub use convert::{compress_pdf, compress_pdf_at_scale, images_to_pdf, merge_pdfs, split_pdf};
pub use pdf::{Document, Page, PageIndexSet, PageSize, parse_ranges};
pub use raster::{RasterFrame, RasterSource, Rasterizer, raster_to_jpeg_bytes};

#[cfg(feature = "pdfium")]
pub use raster::PdfiumRasterizer;
