#![forbid(unsafe_code)]

//! [`DocumentHost`] over the live browser DOM.
//!
//! Elements of nested documents belong to another JS realm, so `instanceof`
//! checks against this realm's constructors fail for them. Casts here use
//! `unchecked_ref` on nodes whose type is already known from how they were
//! obtained (`document.images`, `querySelectorAll("iframe")`).

use imgstep_index::{DocumentHost, FrameAccess, ImageMetrics};
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlElement, HtmlIFrameElement, HtmlImageElement, Window};

/// The page the script runs in.
#[derive(Debug, Clone)]
pub struct DomHost {
    window: Window,
    root: Document,
}

impl DomHost {
    /// Wrap a window and its document.
    #[must_use]
    pub fn new(window: Window, root: Document) -> Self {
        Self { window, root }
    }

    /// Wrap the global window, if there is one.
    #[must_use]
    pub fn from_global() -> Option<Self> {
        let window = web_sys::window()?;
        let root = window.document()?;
        Some(Self::new(window, root))
    }

    /// The window.
    #[must_use]
    pub fn window(&self) -> &Window {
        &self.window
    }

    /// The top-level document.
    #[must_use]
    pub fn document(&self) -> &Document {
        &self.root
    }

    /// The window whose styles apply to `element`.
    ///
    /// Elements of a same-origin frame resolve against the frame's window,
    /// not the top-level one.
    #[must_use]
    pub fn style_view(&self, element: &Element) -> Window {
        element
            .owner_document()
            .and_then(|document| document.default_view())
            .unwrap_or_else(|| self.window.clone())
    }

    fn computed_property(&self, element: &Element, name: &str) -> Option<String> {
        let style = self.style_view(element).get_computed_style(element).ok()??;
        style.get_property_value(name).ok()
    }
}

impl DocumentHost for DomHost {
    type Element = Element;
    type Document = Document;

    fn root_document(&self) -> Document {
        self.root.clone()
    }

    fn images(&self, document: &Document) -> Vec<Element> {
        let collection = document.images();
        (0..collection.length())
            .filter_map(|i| collection.item(i))
            .collect()
    }

    fn frames(&self, document: &Document) -> Vec<Element> {
        let Ok(list) = document.query_selector_all("iframe") else {
            return Vec::new();
        };
        (0..list.length())
            .filter_map(|i| list.item(i))
            .map(|node| node.unchecked_into::<Element>())
            .collect()
    }

    fn frame_document(&self, frame: &Element) -> FrameAccess<Document> {
        // `contentDocument` is null for cross-origin frames.
        match frame.unchecked_ref::<HtmlIFrameElement>().content_document() {
            Some(document) => FrameAccess::Accessible(document),
            None => FrameAccess::Inaccessible,
        }
    }

    fn image_metrics(&self, image: &Element) -> ImageMetrics {
        let img = image.unchecked_ref::<HtmlImageElement>();
        ImageMetrics {
            width: f64::from(img.width()),
            height: f64::from(img.height()),
            natural_width: f64::from(img.natural_width()),
            natural_height: f64::from(img.natural_height()),
            complete: img.complete(),
            display_none: self.computed_property(image, "display").as_deref() == Some("none"),
            visibility_hidden: self.computed_property(image, "visibility").as_deref()
                == Some("hidden"),
        }
    }

    fn offset_top(&self, element: &Element) -> f64 {
        f64::from(element.unchecked_ref::<HtmlElement>().offset_top())
    }

    fn offset_parent(&self, element: &Element) -> Option<Element> {
        element.unchecked_ref::<HtmlElement>().offset_parent()
    }

    fn owner_document(&self, element: &Element) -> Document {
        element
            .owner_document()
            .unwrap_or_else(|| self.root.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};

    wasm_bindgen_test_configure!(run_in_browser);

    fn frame_with_body(host: &DomHost, body: &str) -> (HtmlIFrameElement, Document) {
        let frame = host
            .document()
            .create_element("iframe")
            .expect("create iframe")
            .unchecked_into::<HtmlIFrameElement>();
        host.document()
            .body()
            .expect("body")
            .append_child(&frame)
            .expect("append iframe");
        let document = frame.content_document().expect("same-origin frame");
        document
            .body()
            .expect("frame body")
            .set_inner_html(body);
        (frame, document)
    }

    #[wasm_bindgen_test]
    fn frame_image_styles_resolve_in_frame_window() {
        let host = DomHost::from_global().expect("browser window");
        let (frame, document) = frame_with_body(
            &host,
            "<style>img { visibility: hidden; }</style><img width=\"10\" height=\"10\">",
        );
        let image = host.images(&document).pop().expect("frame image");

        assert_eq!(Some(host.style_view(&image)), frame.content_window());
        assert_ne!(&host.style_view(&image), host.window());
        assert!(host.image_metrics(&image).visibility_hidden);
        frame.remove();
    }

    #[wasm_bindgen_test]
    fn top_level_elements_use_host_window() {
        let host = DomHost::from_global().expect("browser window");
        let element = host.document().create_element("img").expect("create img");
        assert_eq!(&host.style_view(&element), host.window());
    }
}
