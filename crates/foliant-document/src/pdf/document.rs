// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF document model — load existing PDFs, create empty ones, copy pages
// between documents, append pages, draw images, and serialise, using the
// `lopdf` crate.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use foliant_core::error::{FoliantError, Result};
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document as LoDocument, Object, ObjectId, Stream, StringFormat};
use tracing::{debug, instrument, warn};

use crate::image::embed::EmbeddedImage;

/// US Letter, used when a page carries no resolvable /MediaBox.
const DEFAULT_PAGE_SIZE: PageSize = PageSize {
    width: 612.0,
    height: 792.0,
};

/// Page attributes that may live on an ancestor node of the page tree.
const INHERITABLE_KEYS: [&[u8]; 4] = [b"MediaBox", b"CropBox", b"Resources", b"Rotate"];

/// Upper bound on /Parent hops, so damaged files with cyclic trees terminate.
const MAX_TREE_DEPTH: usize = 64;

static NEXT_DOCUMENT_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of one in-memory document. Page and image handles carry it so
/// they can't be used against a document that didn't create them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocumentId(u64);

impl DocumentId {
    fn next() -> Self {
        Self(NEXT_DOCUMENT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Page dimensions in PDF points (1/72 inch).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width: f32,
    pub height: f32,
}

impl PageSize {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Handle to a page that is part of a document's page sequence.
///
/// A handle is an index into the owning document's page table; it is only
/// meaningful together with that document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    owner: DocumentId,
    slot: usize,
}

impl Page {
    /// Zero-based position of the page in its document.
    pub fn index(&self) -> usize {
        self.slot
    }
}

/// A page imported from another document but not yet placed in the page
/// sequence. Consumed by [`Document::append_page`].
#[derive(Debug)]
pub struct CopiedPage {
    owner: DocumentId,
    object_id: ObjectId,
    dict: Dictionary,
    size: PageSize,
}

impl CopiedPage {
    pub fn size(&self) -> PageSize {
        self.size
    }
}

#[derive(Debug, Clone, Copy)]
struct PageEntry {
    object_id: ObjectId,
    size: PageSize,
}

/// An ordered sequence of pages backed by a `lopdf::Document`.
pub struct Document {
    id: DocumentId,
    inner: LoDocument,
    /// Root /Pages node new pages are attached to.
    pages_root: ObjectId,
    pages: Vec<PageEntry>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    // -- Construction ---------------------------------------------------------

    /// Create an empty document with zero pages.
    pub fn new() -> Self {
        let mut inner = LoDocument::with_version("1.7");

        let pages_root = inner.new_object_id();
        let mut pages = Dictionary::new();
        pages.set("Type", Object::Name(b"Pages".to_vec()));
        pages.set("Kids", Object::Array(Vec::new()));
        pages.set("Count", Object::Integer(0));
        inner.objects.insert(pages_root, Object::Dictionary(pages));

        let mut catalog = Dictionary::new();
        catalog.set("Type", Object::Name(b"Catalog".to_vec()));
        catalog.set("Pages", Object::Reference(pages_root));
        let catalog_id = inner.add_object(Object::Dictionary(catalog));
        inner.trailer.set("Root", Object::Reference(catalog_id));

        let mut info = Dictionary::new();
        info.set(
            "Producer",
            Object::String(b"Foliant".to_vec(), StringFormat::Literal),
        );
        let info_id = inner.add_object(Object::Dictionary(info));
        inner.trailer.set("Info", Object::Reference(info_id));

        Self {
            id: DocumentId::next(),
            inner,
            pages_root,
            pages: Vec::new(),
        }
    }

    /// Parse a PDF held in memory.
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn load(data: &[u8]) -> Result<Self> {
        let inner = LoDocument::load_mem(data).map_err(|err| {
            FoliantError::MalformedDocument(format!("failed to parse PDF: {err}"))
        })?;

        let pages_root = find_pages_root(&inner).map_err(FoliantError::MalformedDocument)?;

        let pages: Vec<PageEntry> = inner
            .get_pages()
            .into_values()
            .map(|object_id| PageEntry {
                object_id,
                size: resolve_page_size(&inner, object_id),
            })
            .collect();

        debug!(pages = pages.len(), "PDF loaded from bytes");

        Ok(Self {
            id: DocumentId::next(),
            inner,
            pages_root,
            pages,
        })
    }

    // -- Inspection -----------------------------------------------------------

    pub fn id(&self) -> DocumentId {
        self.id
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Handle for the page at `index`, if it exists.
    pub fn page(&self, index: usize) -> Option<Page> {
        (index < self.pages.len()).then_some(Page {
            owner: self.id,
            slot: index,
        })
    }

    /// Handles for every page, in document order.
    pub fn pages(&self) -> impl Iterator<Item = Page> + '_ {
        (0..self.pages.len()).map(|slot| Page {
            owner: self.id,
            slot,
        })
    }

    /// Media-box size of a page, captured when the page was loaded or added.
    pub fn page_size(&self, page: Page) -> Result<PageSize> {
        Ok(self.entry(page)?.size)
    }

    // -- Page copying ---------------------------------------------------------

    /// Import the pages at `indices` (zero-based) from `source`.
    ///
    /// The result follows `indices` exactly: repeated indices give repeated,
    /// independent pages. Objects shared between the requested pages (fonts,
    /// images) are imported once per call. Inherited attributes are copied
    /// onto each page since the source page tree is not carried over.
    #[instrument(skip_all, fields(requested = indices.len(), source_pages = source.pages.len()))]
    pub fn copy_pages(&mut self, source: &Document, indices: &[usize]) -> Result<Vec<CopiedPage>> {
        let mut shared = ObjectCopier::new(&source.inner);
        let mut copied = Vec::with_capacity(indices.len());

        for &index in indices {
            let entry = source.pages.get(index).copied().ok_or_else(|| {
                FoliantError::PdfError(format!(
                    "page index {} out of range (document has {} pages)",
                    index,
                    source.pages.len()
                ))
            })?;

            let page_dict = source.inner.get_dictionary(entry.object_id).map_err(|err| {
                FoliantError::PdfError(format!(
                    "cannot read page object {:?}: {}",
                    entry.object_id, err
                ))
            })?;

            let object_id = self.inner.new_object_id();

            // Annotations point back at their page through /P, so each copy
            // gets its own annotation objects wired to the new page.
            let mut annotations = ObjectCopier::new(&source.inner);
            annotations.memo.insert(entry.object_id, object_id);

            let mut dict = Dictionary::new();
            for (key, value) in page_dict.iter() {
                if key.as_slice() == b"Parent" {
                    continue;
                }
                let cloned = if key.as_slice() == b"Annots" {
                    annotations.copy(&mut self.inner, value)
                } else {
                    shared.copy(&mut self.inner, value)
                };
                dict.set(key.clone(), cloned);
            }

            for key in INHERITABLE_KEYS {
                if dict.has(key) {
                    continue;
                }
                if let Some(value) = inherited_attribute(&source.inner, entry.object_id, key) {
                    let cloned = shared.copy(&mut self.inner, &value);
                    dict.set(key.to_vec(), cloned);
                }
            }

            copied.push(CopiedPage {
                owner: self.id,
                object_id,
                dict,
                size: entry.size,
            });
        }

        debug!(
            copied = copied.len(),
            shared_objects = shared.memo.len(),
            "pages copied"
        );
        Ok(copied)
    }

    // -- Page sequence mutation -----------------------------------------------

    /// Append a page previously produced by [`Document::copy_pages`] on this
    /// document.
    pub fn append_page(&mut self, page: CopiedPage) -> Result<Page> {
        if page.owner != self.id {
            return Err(FoliantError::PdfError(
                "page was copied for a different document".to_string(),
            ));
        }

        let CopiedPage {
            object_id,
            mut dict,
            size,
            ..
        } = page;
        dict.set("Parent", Object::Reference(self.pages_root));
        self.inner
            .objects
            .insert(object_id, Object::Dictionary(dict));

        self.attach_page(object_id, size)
    }

    /// Append an empty page of the given size and return it for drawing.
    pub fn add_blank_page(&mut self, size: PageSize) -> Result<Page> {
        let mut dict = Dictionary::new();
        dict.set("Type", Object::Name(b"Page".to_vec()));
        dict.set("Parent", Object::Reference(self.pages_root));
        dict.set(
            "MediaBox",
            Object::Array(vec![
                Object::Integer(0),
                Object::Integer(0),
                number(size.width),
                number(size.height),
            ]),
        );
        dict.set("Resources", Object::Dictionary(Dictionary::new()));
        let object_id = self.inner.add_object(Object::Dictionary(dict));

        self.attach_page(object_id, size)
    }

    /// Draw an embedded image into the rectangle whose lower-left corner is
    /// `(x, y)`, in page points.
    pub fn draw_image(
        &mut self,
        page: Page,
        image: &EmbeddedImage,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    ) -> Result<()> {
        let page_id = self.entry(page)?.object_id;
        if image.owner() != self.id {
            return Err(FoliantError::PdfError(
                "image was embedded into a different document".to_string(),
            ));
        }

        let name = self.register_xobject(page_id, image.object_id())?;

        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        number(width),
                        Object::Integer(0),
                        Object::Integer(0),
                        number(height),
                        number(x),
                        number(y),
                    ],
                ),
                Operation::new("Do", vec![Object::Name(name.into_bytes())]),
                Operation::new("Q", vec![]),
            ],
        };
        let encoded = content.encode().map_err(|err| {
            FoliantError::PdfError(format!("failed to encode page content: {err}"))
        })?;
        let stream_id = self
            .inner
            .add_object(Object::Stream(Stream::new(Dictionary::new(), encoded)));

        self.push_content(page_id, stream_id)
    }

    // -- Serialisation --------------------------------------------------------

    /// Serialise the document to PDF bytes.
    #[instrument(skip(self), fields(pages = self.pages.len()))]
    pub fn save(&mut self) -> Result<Vec<u8>> {
        let mut output = Vec::new();
        self.inner.save_to(&mut output).map_err(|err| {
            FoliantError::PdfError(format!("failed to serialise PDF: {err}"))
        })?;
        debug!(output_bytes = output.len(), "PDF serialised");
        Ok(output)
    }

    // -- Crate-internal helpers -----------------------------------------------

    /// Store an image XObject stream and return its object id.
    pub(crate) fn add_xobject(&mut self, stream: Stream) -> ObjectId {
        self.inner.add_object(Object::Stream(stream))
    }

    fn entry(&self, page: Page) -> Result<PageEntry> {
        if page.owner != self.id {
            return Err(FoliantError::PdfError(
                "page handle belongs to a different document".to_string(),
            ));
        }
        self.pages.get(page.slot).copied().ok_or_else(|| {
            FoliantError::PdfError(format!("page slot {} no longer exists", page.slot))
        })
    }

    fn page_dict_mut(&mut self, object_id: ObjectId) -> Result<&mut Dictionary> {
        self.inner
            .get_object_mut(object_id)
            .and_then(|object| object.as_dict_mut())
            .map_err(|err| {
                FoliantError::PdfError(format!("cannot access object {object_id:?}: {err}"))
            })
    }

    /// Add a page object to the root /Kids array and the page table.
    fn attach_page(&mut self, object_id: ObjectId, size: PageSize) -> Result<Page> {
        let new_count = self.pages.len() + 1;
        let pages_root = self.pages_root;
        let root = self.page_dict_mut(pages_root)?;

        if !matches!(root.get(b"Kids"), Ok(Object::Array(_))) {
            root.set("Kids", Object::Array(Vec::new()));
        }
        if let Ok(Object::Array(kids)) = root.get_mut(b"Kids") {
            kids.push(Object::Reference(object_id));
        }
        // The root node counts every leaf in the tree, which is exactly the
        // page table.
        root.set("Count", Object::Integer(new_count as i64));

        self.pages.push(PageEntry { object_id, size });
        Ok(Page {
            owner: self.id,
            slot: new_count - 1,
        })
    }

    /// Add `image_id` to the page's /XObject resources under a fresh name.
    fn register_xobject(&mut self, page_id: ObjectId, image_id: ObjectId) -> Result<String> {
        let page = self.inner.get_dictionary(page_id).map_err(|err| {
            FoliantError::PdfError(format!("cannot read page object {page_id:?}: {err}"))
        })?;

        let resources_id = match page.get(b"Resources") {
            Ok(Object::Reference(id)) => Some(*id),
            _ => None,
        };
        let mut resources = match resources_id {
            Some(id) => self.inner.get_dictionary(id).ok().cloned(),
            None => inherited_attribute(&self.inner, page_id, b"Resources")
                .and_then(|value| resolve_dictionary(&self.inner, &value)),
        }
        .unwrap_or_else(Dictionary::new);

        let mut xobjects = resources
            .get(b"XObject")
            .ok()
            .and_then(|value| resolve_dictionary(&self.inner, value))
            .unwrap_or_else(Dictionary::new);

        let mut counter = xobjects.len() + 1;
        let name = loop {
            let candidate = format!("Im{counter}");
            if !xobjects.has(candidate.as_bytes()) {
                break candidate;
            }
            counter += 1;
        };
        xobjects.set(name.as_bytes().to_vec(), Object::Reference(image_id));
        resources.set("XObject", Object::Dictionary(xobjects));

        match resources_id {
            Some(id) => {
                self.inner.objects.insert(id, Object::Dictionary(resources));
            }
            None => {
                self.page_dict_mut(page_id)?
                    .set("Resources", Object::Dictionary(resources));
            }
        }

        Ok(name)
    }

    /// Append a content stream to the page's /Contents.
    fn push_content(&mut self, page_id: ObjectId, stream_id: ObjectId) -> Result<()> {
        let page = self.page_dict_mut(page_id)?;
        let appended = Object::Reference(stream_id);
        let contents = match page.get(b"Contents") {
            Ok(Object::Array(items)) => {
                let mut items = items.clone();
                items.push(appended);
                items
            }
            Ok(existing) => vec![existing.clone(), appended],
            Err(_) => vec![appended],
        };
        page.set("Contents", Object::Array(contents));
        Ok(())
    }
}

/// Copies objects out of one `lopdf` document into another, following
/// references. Each source object is imported at most once per copier, which
/// also makes reference cycles terminate.
struct ObjectCopier<'a> {
    source: &'a LoDocument,
    memo: HashMap<ObjectId, ObjectId>,
}

impl<'a> ObjectCopier<'a> {
    fn new(source: &'a LoDocument) -> Self {
        Self {
            source,
            memo: HashMap::new(),
        }
    }

    fn copy(&mut self, target: &mut LoDocument, object: &Object) -> Object {
        match object {
            Object::Reference(id) => self.copy_reference(target, *id),
            Object::Dictionary(dict) => Object::Dictionary(self.copy_dictionary(target, dict)),
            Object::Array(items) => {
                Object::Array(items.iter().map(|item| self.copy(target, item)).collect())
            }
            Object::Stream(stream) => {
                let dict = self.copy_dictionary(target, &stream.dict);
                Object::Stream(Stream::new(dict, stream.content.clone()))
            }
            other => other.clone(),
        }
    }

    fn copy_reference(&mut self, target: &mut LoDocument, id: ObjectId) -> Object {
        if let Some(&mapped) = self.memo.get(&id) {
            return Object::Reference(mapped);
        }

        let source = self.source;
        let Ok(resolved) = source.get_object(id) else {
            warn!(?id, "cannot resolve reference, using Null");
            return Object::Null;
        };

        // Reserve the id before descending so cycles resolve to it.
        let new_id = target.new_object_id();
        self.memo.insert(id, new_id);
        let cloned = self.copy(target, resolved);
        target.objects.insert(new_id, cloned);
        Object::Reference(new_id)
    }

    /// Page tree nodes lose their /Parent link, so a page reached through an
    /// annotation does not drag in the source page tree. Other dictionaries,
    /// such as form widgets, keep theirs.
    fn copy_dictionary(&mut self, target: &mut LoDocument, dict: &Dictionary) -> Dictionary {
        let page_node = matches!(
            dict.get(b"Type").and_then(Object::as_name),
            Ok(b"Page" | b"Pages")
        );
        let mut copy = Dictionary::new();
        for (key, value) in dict.iter() {
            if page_node && key.as_slice() == b"Parent" {
                continue;
            }
            copy.set(key.clone(), self.copy(target, value));
        }
        copy
    }
}

fn find_pages_root(doc: &LoDocument) -> std::result::Result<ObjectId, String> {
    let catalog = doc.catalog().map_err(|err| format!("no catalog: {err}"))?;
    match catalog.get(b"Pages") {
        Ok(Object::Reference(id)) => Ok(*id),
        Ok(_) => Err("/Pages is not a reference".to_string()),
        Err(err) => Err(format!("no /Pages: {err}")),
    }
}

/// Look `key` up on the page, then on each ancestor page-tree node.
fn inherited_attribute(doc: &LoDocument, page_id: ObjectId, key: &[u8]) -> Option<Object> {
    let mut node = doc.get_dictionary(page_id).ok()?;
    for _ in 0..MAX_TREE_DEPTH {
        if let Ok(value) = node.get(key) {
            return Some(value.clone());
        }
        let parent = node.get(b"Parent").ok()?.as_reference().ok()?;
        node = doc.get_dictionary(parent).ok()?;
    }
    None
}

fn resolve_dictionary(doc: &LoDocument, object: &Object) -> Option<Dictionary> {
    match object {
        Object::Reference(id) => doc.get_dictionary(*id).ok().cloned(),
        Object::Dictionary(dict) => Some(dict.clone()),
        _ => None,
    }
}

fn resolve_page_size(doc: &LoDocument, page_id: ObjectId) -> PageSize {
    inherited_attribute(doc, page_id, b"MediaBox")
        .and_then(|value| media_box_size(doc, &value))
        .unwrap_or(DEFAULT_PAGE_SIZE)
}

fn media_box_size(doc: &LoDocument, object: &Object) -> Option<PageSize> {
    let array = match object {
        Object::Reference(id) => doc.get_object(*id).ok()?.as_array().ok()?,
        other => other.as_array().ok()?,
    };
    if array.len() != 4 {
        return None;
    }

    let mut coords = [0.0f32; 4];
    for (slot, value) in coords.iter_mut().zip(array) {
        *slot = match value {
            Object::Reference(id) => doc.get_object(*id).ok()?.as_float().ok()?,
            other => other.as_float().ok()?,
        };
    }

    Some(PageSize::new(
        (coords[2] - coords[0]).abs(),
        (coords[3] - coords[1]).abs(),
    ))
}

/// Integral values are written as PDF integers, everything else as reals.
fn number(value: f32) -> Object {
    if value.fract() == 0.0 && value.abs() < i32::MAX as f32 {
        Object::Integer(value as i64)
    } else {
        Object::Real(value.into())
    }
}
