// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-memory test fixtures: small PDFs built with lopdf, synthetic JPEG/PNG
// images, and a deterministic rasteriser that needs no native library.

use std::cell::RefCell;
use std::io::Cursor;

use foliant_core::error::{FoliantError, Result};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document as LoDocument, Object, ObjectId, Stream, dictionary};

use crate::pdf::{Document, PageSize};
use crate::raster::{RasterFrame, RasterSource, Rasterizer};

// -- PDFs ---------------------------------------------------------------------

/// One page per entry, each with its own MediaBox.
pub(crate) fn sized_pdf(sizes: &[(i64, i64)]) -> Vec<u8> {
    let pages: Vec<(Option<&str>, i64, i64)> = sizes.iter().map(|&(w, h)| (None, w, h)).collect();
    build_pdf(&pages)
}

/// US Letter pages, each tagged with a `/Label` string so tests can follow
/// pages through copies.
pub(crate) fn labelled_pdf(labels: &[&str]) -> Vec<u8> {
    let pages: Vec<(Option<&str>, i64, i64)> =
        labels.iter().map(|&label| (Some(label), 612, 792)).collect();
    build_pdf(&pages)
}

/// The `/Label` of every page, in page order.
pub(crate) fn page_labels(bytes: &[u8]) -> Vec<String> {
    let doc = LoDocument::load_mem(bytes).unwrap();
    doc.get_pages()
        .into_values()
        .map(|id| {
            let page = doc.get_dictionary(id).unwrap();
            let label = page.get(b"Label").unwrap().as_str().unwrap();
            String::from_utf8_lossy(label).into_owned()
        })
        .collect()
}

/// A single page whose MediaBox sits on the root /Pages node and whose
/// Resources sit on an intermediate node.
pub(crate) fn inherited_media_box_pdf(width: i64, height: i64) -> Vec<u8> {
    let mut doc = LoDocument::with_version("1.5");
    let root_id = doc.new_object_id();
    let middle_id = doc.new_object_id();
    let resources_id = helvetica_resources(&mut doc);
    let content_id = text_content(&mut doc, "inherited");

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => middle_id,
        "Contents" => content_id,
    });
    doc.objects.insert(
        middle_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Parent" => root_id,
            "Kids" => vec![page_id.into()],
            "Count" => 1,
            "Resources" => resources_id,
        }),
    );
    doc.objects.insert(
        root_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![middle_id.into()],
            "Count" => 1,
            "MediaBox" => vec![0.into(), 0.into(), width.into(), height.into()],
        }),
    );
    finish(doc, root_id)
}

/// One page carrying a text widget whose /Parent is the form field `name`.
pub(crate) fn form_field_pdf(name: &str) -> Vec<u8> {
    let mut doc = LoDocument::with_version("1.5");
    let root_id = doc.new_object_id();
    let page_id = doc.new_object_id();
    let field_id = doc.new_object_id();

    let widget_id = doc.add_object(dictionary! {
        "Type" => "Annot",
        "Subtype" => "Widget",
        "Rect" => vec![72.into(), 700.into(), 272.into(), 720.into()],
        "P" => page_id,
        "Parent" => field_id,
    });
    doc.objects.insert(
        field_id,
        Object::Dictionary(dictionary! {
            "FT" => "Tx",
            "T" => Object::string_literal(name),
            "Kids" => vec![widget_id.into()],
        }),
    );
    doc.objects.insert(
        page_id,
        Object::Dictionary(dictionary! {
            "Type" => "Page",
            "Parent" => root_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Annots" => vec![widget_id.into()],
        }),
    );
    doc.objects.insert(
        root_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        }),
    );
    finish(doc, root_id)
}

fn build_pdf(pages: &[(Option<&str>, i64, i64)]) -> Vec<u8> {
    let mut doc = LoDocument::with_version("1.5");
    let root_id = doc.new_object_id();
    let resources_id = helvetica_resources(&mut doc);

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for &(label, width, height) in pages {
        let content_id = text_content(&mut doc, label.unwrap_or("page"));
        let mut page = dictionary! {
            "Type" => "Page",
            "Parent" => root_id,
            "MediaBox" => vec![0.into(), 0.into(), width.into(), height.into()],
            "Contents" => content_id,
            "Resources" => resources_id,
        };
        if let Some(label) = label {
            page.set("Label", Object::string_literal(label));
        }
        kids.push(doc.add_object(page).into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        root_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    finish(doc, root_id)
}

fn helvetica_resources(doc: &mut LoDocument) -> ObjectId {
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    })
}

fn text_content(doc: &mut LoDocument, text: &str) -> ObjectId {
    let content = Content {
        operations: vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 24.into()]),
            Operation::new("Td", vec![72.into(), 720.into()]),
            Operation::new("Tj", vec![Object::string_literal(text)]),
            Operation::new("ET", vec![]),
        ],
    };
    doc.add_object(Stream::new(Dictionary::new(), content.encode().unwrap()))
}

fn finish(mut doc: LoDocument, pages_id: ObjectId) -> Vec<u8> {
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

// -- Images -------------------------------------------------------------------

pub(crate) fn jpeg(width: u32, height: u32) -> Vec<u8> {
    let image = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x * 7 % 256) as u8, (y * 5 % 256) as u8, 128])
    });
    let mut bytes = Vec::new();
    image
        .write_with_encoder(JpegEncoder::new_with_quality(&mut bytes, 90))
        .unwrap();
    bytes
}

/// A four-component JPEG as Adobe writers produce it: inverted CMYK samples
/// behind an APP14 "Adobe" segment.
pub(crate) fn cmyk_jpeg(width: u16, height: u16) -> Vec<u8> {
    let samples: Vec<u8> = (0..usize::from(width) * usize::from(height))
        .flat_map(|i| [(i * 3 % 256) as u8, 40, 200, 10])
        .collect();
    let mut bytes = Vec::new();
    jpeg_encoder::Encoder::new(&mut bytes, 90)
        .encode(&samples, width, height, jpeg_encoder::ColorType::Cmyk)
        .unwrap();
    bytes
}

pub(crate) fn png(width: u32, height: u32, alpha: bool) -> Vec<u8> {
    let image = if alpha {
        DynamicImage::ImageRgba8(RgbaImage::from_fn(width, height, |x, _| {
            Rgba([255, 0, 0, (x * 30 % 256) as u8])
        }))
    } else {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([0, 90, 180])))
    };
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

// -- Rasteriser ---------------------------------------------------------------

/// Renders every page as a flat grey frame sized from the page's MediaBox.
/// Records which pages were rendered and can be told to fail on one page.
#[derive(Default)]
pub(crate) struct FakeRasterizer {
    pub rendered: RefCell<Vec<u32>>,
    pub fail_on: Option<u32>,
}

impl FakeRasterizer {
    pub fn failing_on(page_number: u32) -> Self {
        Self {
            fail_on: Some(page_number),
            ..Self::default()
        }
    }
}

pub(crate) struct FakeSource<'a> {
    sizes: Vec<PageSize>,
    rasterizer: &'a FakeRasterizer,
}

impl Rasterizer for FakeRasterizer {
    type Source<'a> = FakeSource<'a>;

    fn load<'a>(&'a self, data: &'a [u8]) -> Result<FakeSource<'a>> {
        let document = Document::load(data)?;
        let sizes = document
            .pages()
            .map(|page| document.page_size(page))
            .collect::<Result<Vec<_>>>()?;
        Ok(FakeSource {
            sizes,
            rasterizer: self,
        })
    }
}

impl RasterSource for FakeSource<'_> {
    fn page_count(&self) -> u32 {
        self.sizes.len() as u32
    }

    fn render_page(&mut self, page_number: u32, scale: f32) -> Result<RasterFrame> {
        if self.rasterizer.fail_on == Some(page_number) {
            return Err(FoliantError::RenderTargetUnavailable(format!(
                "no bitmap for page {page_number}"
            )));
        }
        let size = page_number
            .checked_sub(1)
            .and_then(|index| self.sizes.get(index as usize))
            .ok_or_else(|| FoliantError::PdfError(format!("no page {page_number}")))?;

        self.rasterizer.rendered.borrow_mut().push(page_number);
        let width = (size.width * scale).round().max(1.0) as u32;
        let height = (size.height * scale).round().max(1.0) as u32;
        Ok(RasterFrame::new(RgbaImage::from_pixel(
            width,
            height,
            Rgba([200, 200, 200, 255]),
        )))
    }
}
