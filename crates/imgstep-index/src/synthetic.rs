#![forbid(unsafe_code)]

//! Synthetic in-memory document host.
//!
//! [`SyntheticPage`] models just enough of a DOM for the index builder:
//! documents, nested frames (readable or cross-origin), offset-parent chains,
//! and image metrics. It is the test double for the browser binding and the
//! page model the replay harness loads fixtures into.
//!
//! # Example
//!
//! ```ignore
//! let mut page = SyntheticPage::new();
//! let root = page.root();
//! let column = page.add_block(root, None, 120.0);
//! page.add_image(root, Some(column), 0.0, 640.0, 480.0);
//! let (frame, inner) = page.add_frame(root, Some(column), 600.0);
//! page.add_image(inner, None, 20.0, 640.0, 900.0);
//! ```

use crate::host::{DocumentHost, FrameAccess, ImageMetrics};
use crate::index::absolute_top;

/// Width given to images created by [`SyntheticPage::with_images`].
pub const DEFAULT_IMAGE_WIDTH: f64 = 600.0;

/// Synthetic document handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocId(usize);

/// Synthetic element handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElemId(usize);

#[derive(Debug, Clone)]
enum ElementKind {
    Block,
    Image(ImageMetrics),
    Frame(Option<DocId>),
}

#[derive(Debug, Clone)]
struct ElementNode {
    document: DocId,
    offset_top: f64,
    offset_parent: Option<ElemId>,
    kind: ElementKind,
}

#[derive(Debug, Clone, Default)]
struct DocumentNode {
    images: Vec<ElemId>,
    frames: Vec<ElemId>,
}

/// In-memory page implementing [`DocumentHost`].
#[derive(Debug, Clone)]
pub struct SyntheticPage {
    documents: Vec<DocumentNode>,
    elements: Vec<ElementNode>,
    document_height: Option<f64>,
}

impl Default for SyntheticPage {
    fn default() -> Self {
        Self::new()
    }
}

impl SyntheticPage {
    /// A page with an empty root document.
    #[must_use]
    pub fn new() -> Self {
        Self {
            documents: vec![DocumentNode::default()],
            elements: Vec::new(),
            document_height: None,
        }
    }

    /// A page whose root holds one image per `(top, bottom)` pair.
    #[must_use]
    pub fn with_images(spans: &[(f64, f64)]) -> Self {
        let mut page = Self::new();
        let root = page.root();
        for &(top, bottom) in spans {
            page.add_image(root, None, top, DEFAULT_IMAGE_WIDTH, bottom - top);
        }
        page
    }

    /// The top-level document.
    #[must_use]
    pub const fn root(&self) -> DocId {
        DocId(0)
    }

    /// Add a non-image element that can serve as an offset parent.
    pub fn add_block(&mut self, document: DocId, parent: Option<ElemId>, offset_top: f64) -> ElemId {
        self.push_element(document, parent, offset_top, ElementKind::Block)
    }

    /// Add a loaded, visible image.
    pub fn add_image(
        &mut self,
        document: DocId,
        parent: Option<ElemId>,
        offset_top: f64,
        width: f64,
        height: f64,
    ) -> ElemId {
        let metrics = ImageMetrics::loaded(width, height);
        let id = self.push_element(document, parent, offset_top, ElementKind::Image(metrics));
        self.documents[document.0].images.push(id);
        id
    }

    /// Add a same-origin frame and return it with its new content document.
    pub fn add_frame(
        &mut self,
        document: DocId,
        parent: Option<ElemId>,
        offset_top: f64,
    ) -> (ElemId, DocId) {
        let inner = DocId(self.documents.len());
        self.documents.push(DocumentNode::default());
        let id = self.push_element(document, parent, offset_top, ElementKind::Frame(Some(inner)));
        self.documents[document.0].frames.push(id);
        (id, inner)
    }

    /// Add a frame whose document cannot be read.
    pub fn add_cross_origin_frame(
        &mut self,
        document: DocId,
        parent: Option<ElemId>,
        offset_top: f64,
    ) -> ElemId {
        let id = self.push_element(document, parent, offset_top, ElementKind::Frame(None));
        self.documents[document.0].frames.push(id);
        id
    }

    /// Add a document that no frame hosts.
    pub fn add_orphan_document(&mut self) -> DocId {
        let id = DocId(self.documents.len());
        self.documents.push(DocumentNode::default());
        id
    }

    /// Mutable metrics of an image element.
    ///
    /// # Panics
    ///
    /// Panics if `image` is not an image.
    pub fn metrics_mut(&mut self, image: ElemId) -> &mut ImageMetrics {
        match &mut self.elements[image.0].kind {
            ElementKind::Image(metrics) => metrics,
            other => panic!("{image:?} is not an image: {other:?}"),
        }
    }

    /// Move an element within its offset parent.
    pub fn set_offset_top(&mut self, element: ElemId, offset_top: f64) {
        self.elements[element.0].offset_top = offset_top;
    }

    /// Detach an image or frame from its document.
    pub fn remove(&mut self, element: ElemId) {
        let document = self.elements[element.0].document;
        let node = &mut self.documents[document.0];
        node.images.retain(|id| *id != element);
        node.frames.retain(|id| *id != element);
    }

    /// Override the scrollable document height.
    pub fn set_document_height(&mut self, height: f64) {
        self.document_height = Some(height);
    }

    /// Scrollable document height: the override, or the lowest image bottom.
    #[must_use]
    pub fn document_height(&self) -> f64 {
        if let Some(height) = self.document_height {
            return height;
        }
        self.documents
            .iter()
            .flat_map(|document| document.images.iter())
            .filter_map(|&id| match self.elements[id.0].kind {
                ElementKind::Image(metrics) => Some(absolute_top(self, &id) + metrics.height),
                _ => None,
            })
            .filter(|bottom| bottom.is_finite())
            .fold(0.0, f64::max)
    }

    fn push_element(
        &mut self,
        document: DocId,
        offset_parent: Option<ElemId>,
        offset_top: f64,
        kind: ElementKind,
    ) -> ElemId {
        let id = ElemId(self.elements.len());
        self.elements.push(ElementNode {
            document,
            offset_top,
            offset_parent,
            kind,
        });
        id
    }
}

impl DocumentHost for SyntheticPage {
    type Element = ElemId;
    type Document = DocId;

    fn root_document(&self) -> DocId {
        self.root()
    }

    fn images(&self, document: &DocId) -> Vec<ElemId> {
        self.documents[document.0].images.clone()
    }

    fn frames(&self, document: &DocId) -> Vec<ElemId> {
        self.documents[document.0].frames.clone()
    }

    fn frame_document(&self, frame: &ElemId) -> FrameAccess<DocId> {
        match self.elements[frame.0].kind {
            ElementKind::Frame(Some(document)) => FrameAccess::Accessible(document),
            _ => FrameAccess::Inaccessible,
        }
    }

    fn image_metrics(&self, image: &ElemId) -> ImageMetrics {
        match self.elements[image.0].kind {
            ElementKind::Image(metrics) => metrics,
            _ => ImageMetrics {
                complete: false,
                ..ImageMetrics::loaded(0.0, 0.0)
            },
        }
    }

    fn offset_top(&self, element: &ElemId) -> f64 {
        self.elements[element.0].offset_top
    }

    fn offset_parent(&self, element: &ElemId) -> Option<ElemId> {
        self.elements[element.0].offset_parent
    }

    fn owner_document(&self, element: &ElemId) -> DocId {
        self.elements[element.0].document
    }
}
