// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image embedder — turns JPEG and PNG bytes into image XObjects owned by a
// `Document`. JPEG data is stored as-is behind /DCTDecode; PNG data is
// decoded with the `image` crate and stored as Flate-compressed samples, with
// a soft mask when the source has an alpha channel.

use std::io::{Cursor, Write};

use flate2::Compression;
use flate2::write::ZlibEncoder;
use foliant_core::ImageKind;
use foliant_core::error::{FoliantError, Result};
use image::codecs::jpeg::JpegDecoder;
use image::{ColorType, ImageDecoder, ImageFormat};
use lopdf::{Dictionary, Object, ObjectId, Stream};
use tracing::{debug, instrument, warn};

use crate::pdf::document::{Document, DocumentId, PageSize};

/// An image stored in a document, ready to be drawn onto its pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmbeddedImage {
    owner: DocumentId,
    object_id: ObjectId,
    width: u32,
    height: u32,
}

impl EmbeddedImage {
    /// Intrinsic width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Intrinsic height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Natural size at scale 1.0: one pixel per PDF point.
    pub fn natural_size(&self) -> PageSize {
        PageSize::new(self.width as f32, self.height as f32)
    }

    pub(crate) fn owner(&self) -> DocumentId {
        self.owner
    }

    pub(crate) fn object_id(&self) -> ObjectId {
        self.object_id
    }
}

/// Embed an image according to its MIME type.
///
/// Returns `Ok(None)` for MIME types other than JPEG and PNG: the caller is
/// expected to skip such images. Bytes that claim a supported type but fail
/// to decode are an error.
#[instrument(skip(doc, bytes), fields(bytes_len = bytes.len()))]
pub fn embed_image(
    doc: &mut Document,
    bytes: &[u8],
    mime_type: &str,
) -> Result<Option<EmbeddedImage>> {
    let Some(kind) = ImageKind::from_mime(mime_type) else {
        let skipped = FoliantError::UnsupportedImageFormat(mime_type.to_string());
        warn!(%skipped, "skipping image");
        return Ok(None);
    };

    let embedded = match kind {
        ImageKind::Jpeg => embed_jpeg(doc, bytes)?,
        ImageKind::Png => embed_png(doc, bytes)?,
    };
    Ok(Some(embedded))
}

/// Embed JPEG bytes without re-encoding them.
pub fn embed_jpeg(doc: &mut Document, bytes: &[u8]) -> Result<EmbeddedImage> {
    let decoder = JpegDecoder::new(Cursor::new(bytes))
        .map_err(|err| FoliantError::InvalidImage(format!("unreadable JPEG header: {err}")))?;
    let (width, height) = decoder.dimensions();
    // The decoder reports the colour it converts to, which is RGB for CMYK
    // files, so the component count comes from the frame header.
    let layout = JpegLayout::scan(bytes);
    let color_space = match layout.components {
        Some(4) => "DeviceCMYK",
        Some(1) => "DeviceGray",
        Some(_) => "DeviceRGB",
        None if matches!(decoder.color_type(), ColorType::L8 | ColorType::L16) => "DeviceGray",
        None => "DeviceRGB",
    };

    let mut dict = image_dictionary(width, height, color_space);
    dict.set("Filter", Object::Name(b"DCTDecode".to_vec()));
    if color_space == "DeviceCMYK" && layout.adobe {
        // Adobe writers store CMYK inverted.
        let decode = [1, 0, 1, 0, 1, 0, 1, 0].map(Object::Integer);
        dict.set("Decode", Object::Array(decode.to_vec()));
    }
    let object_id = doc.add_xobject(Stream::new(dict, bytes.to_vec()));

    debug!(width, height, color_space, "JPEG embedded");
    Ok(EmbeddedImage {
        owner: doc.id(),
        object_id,
        width,
        height,
    })
}

/// Decode PNG bytes and embed the samples.
pub fn embed_png(doc: &mut Document, bytes: &[u8]) -> Result<EmbeddedImage> {
    let decoded = image::load_from_memory_with_format(bytes, ImageFormat::Png)
        .map_err(|err| FoliantError::InvalidImage(format!("failed to decode PNG: {err}")))?;
    let (width, height) = (decoded.width(), decoded.height());
    let color = decoded.color();

    let soft_mask = if color.has_alpha() {
        let alpha: Vec<u8> = decoded.to_rgba8().pixels().map(|pixel| pixel[3]).collect();
        let mask = flate_image_stream(image_dictionary(width, height, "DeviceGray"), &alpha)?;
        Some(doc.add_xobject(mask))
    } else {
        None
    };

    let (samples, color_space) = if color.has_color() {
        (decoded.to_rgb8().into_raw(), "DeviceRGB")
    } else {
        (decoded.to_luma8().into_raw(), "DeviceGray")
    };

    let mut dict = image_dictionary(width, height, color_space);
    if let Some(mask_id) = soft_mask {
        dict.set("SMask", Object::Reference(mask_id));
    }
    let object_id = doc.add_xobject(flate_image_stream(dict, &samples)?);

    debug!(
        width,
        height,
        color_space,
        alpha = soft_mask.is_some(),
        "PNG embedded"
    );
    Ok(EmbeddedImage {
        owner: doc.id(),
        object_id,
        width,
        height,
    })
}

/// What the JPEG marker segments say about the colour layout.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct JpegLayout {
    /// Component count from the first frame header.
    components: Option<u8>,
    /// An APP14 "Adobe" segment is present.
    adobe: bool,
}

impl JpegLayout {
    /// Walk the marker segments up to the start of scan.
    fn scan(bytes: &[u8]) -> Self {
        let mut layout = Self::default();
        if !bytes.starts_with(&[0xFF, 0xD8]) {
            return layout;
        }

        let mut pos = 2;
        while pos + 4 <= bytes.len() && bytes[pos] == 0xFF {
            let marker = bytes[pos + 1];
            match marker {
                0xFF => {
                    pos += 1;
                    continue;
                }
                0x01 | 0xD0..=0xD7 => {
                    pos += 2;
                    continue;
                }
                0xD9 | 0xDA => break,
                _ => {}
            }

            let length = usize::from(u16::from_be_bytes([bytes[pos + 2], bytes[pos + 3]]));
            let Some(payload) = bytes.get(pos + 4..pos + 2 + length) else {
                break;
            };
            match marker {
                0xEE if payload.starts_with(b"Adobe") => layout.adobe = true,
                // SOF0..SOF15, minus DHT, JPG and DAC.
                0xC0..=0xCF if !matches!(marker, 0xC4 | 0xC8 | 0xCC) => {
                    if layout.components.is_none() {
                        layout.components = payload.get(5).copied();
                    }
                }
                _ => {}
            }
            pos += 2 + length;
        }
        layout
    }
}

fn image_dictionary(width: u32, height: u32, color_space: &str) -> Dictionary {
    let mut dict = Dictionary::new();
    dict.set("Type", Object::Name(b"XObject".to_vec()));
    dict.set("Subtype", Object::Name(b"Image".to_vec()));
    dict.set("Width", Object::Integer(i64::from(width)));
    dict.set("Height", Object::Integer(i64::from(height)));
    dict.set("ColorSpace", Object::Name(color_space.as_bytes().to_vec()));
    dict.set("BitsPerComponent", Object::Integer(8));
    dict
}

fn flate_image_stream(mut dict: Dictionary, samples: &[u8]) -> Result<Stream> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(samples)?;
    let compressed = encoder.finish()?;

    dict.set("Filter", Object::Name(b"FlateDecode".to_vec()));
    Ok(Stream::new(dict, compressed))
}
