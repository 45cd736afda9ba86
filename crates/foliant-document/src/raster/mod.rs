// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page rasterisation — render PDF pages to pixel buffers and encode them as
// JPEG for the compression pipeline.
//
// The renderer sits behind the `Rasterizer` / `RasterSource` traits. The
// production backend is pdfium (feature "pdfium").

#[cfg(feature = "pdfium")]
pub mod pdfium;

use foliant_core::error::{FoliantError, Result};
use image::codecs::jpeg::JpegEncoder;
use image::{Rgb, RgbImage, RgbaImage};
use tracing::debug;

#[cfg(feature = "pdfium")]
pub use self::pdfium::PdfiumRasterizer;

/// Pixels of one rendered page. Produced, encoded, and dropped before the
/// next page is rendered.
#[derive(Debug, Clone)]
pub struct RasterFrame {
    pixels: RgbaImage,
}

impl RasterFrame {
    pub fn new(pixels: RgbaImage) -> Self {
        Self { pixels }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }
}

/// A PDF renderer able to open documents for page-by-page rasterisation.
pub trait Rasterizer {
    type Source<'a>: RasterSource
    where
        Self: 'a;

    /// Open `data` for rendering. Unparseable input is a
    /// [`FoliantError::MalformedDocument`].
    fn load<'a>(&'a self, data: &'a [u8]) -> Result<Self::Source<'a>>;
}

/// An opened document that renders one page at a time.
pub trait RasterSource {
    fn page_count(&self) -> u32;

    /// Render `page_number` (1-based) at its intrinsic size times `scale`.
    ///
    /// Implementations release every per-page resource before returning, so
    /// at most one page is held by the renderer at any time.
    fn render_page(&mut self, page_number: u32, scale: f32) -> Result<RasterFrame>;
}

/// Lossy-encode a frame as JPEG.
///
/// `quality` in `0.0..=1.0` maps linearly onto the encoder's 1–100 scale.
/// Transparent pixels are composited onto white.
pub fn raster_to_jpeg_bytes(frame: &RasterFrame, quality: f32) -> Result<Vec<u8>> {
    let encoder_quality = encoder_quality(quality)?;

    let rgba = frame.pixels();
    let rgb = RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        Rgb([over_white(r, a), over_white(g, a), over_white(b, a)])
    });

    let mut buffer = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buffer, encoder_quality);
    rgb.write_with_encoder(encoder)
        .map_err(|err| FoliantError::InvalidImage(format!("JPEG encoding failed: {err}")))?;

    debug!(
        width = frame.width(),
        height = frame.height(),
        encoder_quality,
        jpeg_bytes = buffer.len(),
        "frame encoded"
    );
    Ok(buffer)
}

/// Validate a `0.0..=1.0` quality and convert it to the encoder's 1–100.
pub(crate) fn encoder_quality(quality: f32) -> Result<u8> {
    if !(0.0..=1.0).contains(&quality) {
        return Err(FoliantError::InvalidQuality(quality));
    }
    Ok((quality * 100.0).round().clamp(1.0, 100.0) as u8)
}

fn over_white(channel: u8, alpha: u8) -> u8 {
    let (c, a) = (u32::from(channel), u32::from(alpha));
    ((c * a + 255 * (255 - a) + 127) / 255) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn quality_maps_onto_encoder_scale() {
        assert_eq!(encoder_quality(0.8).unwrap(), 80);
        assert_eq!(encoder_quality(1.0).unwrap(), 100);
        assert_eq!(encoder_quality(0.0).unwrap(), 1);
    }

    #[test]
    fn quality_outside_unit_interval_is_rejected() {
        assert!(matches!(encoder_quality(1.2), Err(FoliantError::InvalidQuality(_))));
        assert!(matches!(encoder_quality(-0.1), Err(FoliantError::InvalidQuality(_))));
        assert!(encoder_quality(f32::NAN).is_err());
    }

    #[test]
    fn jpeg_keeps_frame_dimensions() {
        let frame = RasterFrame::new(RgbaImage::from_pixel(40, 25, Rgba([10, 200, 30, 255])));
        let jpeg = raster_to_jpeg_bytes(&frame, 0.6).unwrap();

        let decoded = image::load_from_memory(&jpeg).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (40, 25));
    }

    #[test]
    fn lower_quality_gives_smaller_output() {
        let frame = RasterFrame::new(RgbaImage::from_fn(64, 64, |x, y| {
            Rgba([(x * 4) as u8, (y * 4) as u8, ((x ^ y) * 4) as u8, 255])
        }));
        let high = raster_to_jpeg_bytes(&frame, 0.95).unwrap();
        let low = raster_to_jpeg_bytes(&frame, 0.1).unwrap();
        assert!(low.len() < high.len());
    }

    #[test]
    fn transparency_flattens_to_white() {
        assert_eq!(over_white(0, 0), 255);
        assert_eq!(over_white(0, 255), 0);
        assert_eq!(over_white(100, 255), 100);
    }
}
