#![forbid(unsafe_code)]

//! DOM-change signal.
//!
//! Mutation and load callbacks run outside the key handler. They never
//! rebuild the index themselves; they only raise a [`StaleHandle`] flag that
//! the cache consumes on its next access.
//!
//! [`DomChange`] decides which host notifications are image-relevant:
//!
//! | Notification | Relevant when |
//! |--------------|---------------|
//! | nodes added or removed | any node is `IMG`, `IFRAME`, `HTML`, `BODY`, or contains an image |
//! | attribute changed | target is `IMG`/`IFRAME` and the attribute is `src`, `width`, `height`, `style` or `class` |
//! | load finished | target is `IMG` or `IFRAME` |

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Attributes whose change can move or resize an image.
pub const WATCHED_ATTRIBUTES: [&str; 5] = ["src", "width", "height", "style", "class"];

/// Cloneable "index is stale" flag.
///
/// All clones share one flag. Writers call [`mark`](Self::mark); the cache
/// calls [`take`](Self::take), which reads and clears it atomically.
#[derive(Debug, Clone, Default)]
pub struct StaleHandle {
    flag: Arc<AtomicBool>,
}

impl StaleHandle {
    /// A fresh, unmarked flag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the index stale.
    pub fn mark(&self) {
        self.flag.store(true, Ordering::Release);
    }

    /// Whether the flag is currently raised.
    #[must_use]
    pub fn is_marked(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    /// Read and clear the flag.
    pub fn take(&self) -> bool {
        self.flag.swap(false, Ordering::AcqRel)
    }

    /// Mark the index stale if `change` is image-relevant.
    ///
    /// Returns whether the flag was raised.
    pub fn observe(&self, change: &DomChange<'_>) -> bool {
        let relevant = change.affects_images();
        if relevant {
            self.mark();
        }
        relevant
    }
}

/// Coarse classification of a DOM node for change filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// An `IMG` element.
    Image,
    /// An `IFRAME` element.
    Frame,
    /// An `HTML` or `BODY` element (a document being swapped in).
    DocumentRoot,
    /// Any other node; `contains_image` if its subtree holds an `IMG`.
    Other {
        /// Whether the node's subtree contains an image.
        contains_image: bool,
    },
}

impl NodeKind {
    /// Classify from a DOM `nodeName`.
    #[must_use]
    pub fn from_node_name(node_name: &str, contains_image: bool) -> Self {
        if node_name.eq_ignore_ascii_case("img") {
            Self::Image
        } else if node_name.eq_ignore_ascii_case("iframe") {
            Self::Frame
        } else if node_name.eq_ignore_ascii_case("html") || node_name.eq_ignore_ascii_case("body") {
            Self::DocumentRoot
        } else {
            Self::Other { contains_image }
        }
    }

    /// Whether inserting or removing this node can change the index.
    #[must_use]
    pub const fn is_structural(self) -> bool {
        match self {
            Self::Image | Self::Frame | Self::DocumentRoot => true,
            Self::Other { contains_image } => contains_image,
        }
    }

    /// Whether the node is an image or frame element.
    #[must_use]
    pub const fn is_image_or_frame(self) -> bool {
        matches!(self, Self::Image | Self::Frame)
    }
}

/// A host notification about the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomChange<'a> {
    /// Child-list mutation.
    ChildList {
        /// Inserted nodes.
        added: &'a [NodeKind],
        /// Removed nodes.
        removed: &'a [NodeKind],
    },
    /// Attribute mutation.
    Attribute {
        /// Element whose attribute changed.
        target: NodeKind,
        /// Attribute name.
        name: &'a str,
    },
    /// A load event finished on an element.
    Loaded {
        /// Element that finished loading.
        target: NodeKind,
    },
}

impl DomChange<'_> {
    /// Whether this change can alter the position index.
    #[must_use]
    pub fn affects_images(&self) -> bool {
        match self {
            Self::ChildList { added, removed } => added
                .iter()
                .chain(removed.iter())
                .any(|node| node.is_structural()),
            Self::Attribute { target, name } => {
                target.is_image_or_frame()
                    && WATCHED_ATTRIBUTES
                        .iter()
                        .any(|watched| watched.eq_ignore_ascii_case(name))
            }
            Self::Loaded { target } => target.is_image_or_frame(),
        }
    }
}
