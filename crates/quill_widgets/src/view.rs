//! Base view wrapping one display-tree node
//!
//! Every widget in this crate derefs to a [`View`], so the class, style and
//! child helpers below are available on all of them.
//!
//! # Example
//!
//! ```rust
//! use quill_core::SharedDocument;
//! use quill_widgets::view::{Child, View};
//!
//! let doc = SharedDocument::new();
//! let bar = View::with_presets(&doc, "fixed bottom flex");
//! bar.set_children(vec![
//!     Child::from(View::element(&doc, "span.title")),
//!     Child::from("Ready"),
//! ]);
//! assert_eq!(bar.style("position").as_deref(), Some("fixed"));
//! assert_eq!(bar.text(), "Ready");
//! ```

use quill_core::{preset, Event, EventKind, ListenerId, NodeId, SharedDocument, WeakDocument};

/// Something that can be placed inside a [`View`]
pub enum Child {
    View(View),
    Node(NodeId),
    Text(String),
}

impl From<View> for Child {
    fn from(view: View) -> Self {
        Child::View(view)
    }
}

impl From<&View> for Child {
    fn from(view: &View) -> Self {
        Child::Node(view.node)
    }
}

impl From<NodeId> for Child {
    fn from(node: NodeId) -> Self {
        Child::Node(node)
    }
}

impl From<&str> for Child {
    fn from(text: &str) -> Self {
        Child::Text(text.to_string())
    }
}

impl From<String> for Child {
    fn from(text: String) -> Self {
        Child::Text(text)
    }
}

/// Handle to one element of a shared document
#[derive(Clone)]
pub struct View {
    doc: SharedDocument,
    node: NodeId,
}

impl std::fmt::Debug for View {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("View").field("node", &self.node).finish()
    }
}

impl View {
    /// A detached `div`
    pub fn new(doc: &SharedDocument) -> Self {
        Self::element(doc, "div")
    }

    /// A detached element described as `tag.class.class`
    ///
    /// The tag defaults to `div` when the description starts with a dot.
    pub fn element(doc: &SharedDocument, description: &str) -> Self {
        let mut parts = description.split('.');
        let tag = match parts.next() {
            Some(tag) if !tag.is_empty() => tag,
            _ => "div",
        };
        let node = {
            let mut d = doc.write();
            let node = d.create_element(tag);
            for class in parts.filter(|c| !c.is_empty()) {
                d.add_class(node, class);
            }
            node
        };
        Self::from_node(doc, node)
    }

    /// A `div` with the named style presets applied in order
    ///
    /// Unknown preset names are ignored.
    pub fn with_presets(doc: &SharedDocument, presets: &str) -> Self {
        let view = Self::new(doc);
        for name in presets.split_whitespace() {
            match preset(name) {
                Some(styles) => {
                    view.css(styles);
                }
                None => tracing::trace!("unknown view preset `{}`", name),
            }
        }
        view
    }

    /// A `div` holding the given children
    pub fn with_children(doc: &SharedDocument, children: Vec<Child>) -> Self {
        let view = Self::new(doc);
        view.set_children(children);
        view
    }

    /// Wrap an existing node
    pub fn from_node(doc: &SharedDocument, node: NodeId) -> Self {
        Self {
            doc: doc.clone(),
            node,
        }
    }

    pub fn doc(&self) -> &SharedDocument {
        &self.doc
    }

    pub fn weak_doc(&self) -> WeakDocument {
        self.doc.downgrade()
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    // =========================================================================
    // CLASSES AND STYLE
    // =========================================================================

    /// Add space-separated classes
    pub fn css_class(&self, classes: &str) -> &Self {
        let mut d = self.doc.write();
        for class in classes.split_whitespace() {
            d.add_class(self.node, class);
        }
        self
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.doc.read().has_class(self.node, class)
    }

    /// Set several inline style properties at once
    pub fn css(&self, styles: &[(&str, &str)]) -> &Self {
        let mut d = self.doc.write();
        for &(property, value) in styles {
            d.set_style(self.node, property, Some(value));
        }
        self
    }

    /// Set or clear a single inline style property
    pub fn set_style(&self, property: &str, value: Option<&str>) -> &Self {
        self.doc.write().set_style(self.node, property, value);
        self
    }

    pub fn style(&self, property: &str) -> Option<String> {
        self.doc
            .read()
            .style(self.node, property)
            .map(str::to_string)
    }

    pub fn font(&self, font: &str) -> &Self {
        self.set_style("font", Some(font))
    }

    pub fn color(&self, foreground: &str, background: &str) -> &Self {
        self.css(&[("color", foreground), ("background-color", background)])
    }

    pub fn set_attribute(&self, name: &str, value: &str) -> &Self {
        self.doc.write().set_attribute(self.node, name, value);
        self
    }

    pub fn attribute(&self, name: &str) -> Option<String> {
        self.doc
            .read()
            .attribute(self.node, name)
            .map(str::to_string)
    }

    // =========================================================================
    // CHILDREN
    // =========================================================================

    /// Element children, text nodes skipped
    pub fn children(&self) -> Vec<NodeId> {
        self.doc.read().element_children(self.node)
    }

    /// Replace the current children
    ///
    /// Previous children are detached, not destroyed, so views passed in
    /// elsewhere stay usable.
    pub fn set_children(&self, children: Vec<Child>) -> &Self {
        {
            let mut d = self.doc.write();
            for child in d.children(self.node) {
                d.detach(child);
            }
        }
        for child in children {
            self.append(child);
        }
        self
    }

    pub fn append(&self, child: impl Into<Child>) -> &Self {
        let mut d = self.doc.write();
        let node = match child.into() {
            Child::View(view) => view.node,
            Child::Node(node) => node,
            Child::Text(text) => d.create_text(&text),
        };
        d.append_child(self.node, node);
        self
    }

    /// Attach this view under `parent`
    pub fn mount(&self, parent: NodeId) -> &Self {
        self.doc.write().append_child(parent, self.node);
        self
    }

    /// Attach this view under the document body
    pub fn mount_to_body(&self) -> &Self {
        let body = self.doc.read().body();
        self.mount(body)
    }

    /// First descendant matching `selector`
    pub fn query(&self, selector: &str) -> Option<NodeId> {
        self.doc.read().query_selector(self.node, selector)
    }

    /// Every descendant matching `selector`
    pub fn query_all(&self, selector: &str) -> Vec<NodeId> {
        self.doc.read().query_selector_all(self.node, selector)
    }

    pub fn text(&self) -> String {
        self.doc.read().text_content(self.node)
    }

    pub fn set_text(&self, text: &str) -> &Self {
        self.doc.write().set_text(self.node, text);
        self
    }

    /// Destroy every child and append `nodes` in order
    pub fn replace_children(&self, nodes: &[NodeId]) -> &Self {
        let mut d = self.doc.write();
        d.destroy_children(self.node);
        for node in nodes {
            d.append_child(self.node, *node);
        }
        self
    }

    /// Destroy every child
    pub fn remove_children(&self) -> &Self {
        self.doc.write().destroy_children(self.node);
        self
    }

    // =========================================================================
    // EVENTS
    // =========================================================================

    /// Listen for events dispatched to this view or bubbling through it
    pub fn on(&self, kind: EventKind, callback: impl Fn(&Event) + 'static) -> ListenerId {
        self.doc.write().add_event_listener(self.node, kind, callback)
    }

    /// Dispatch an event with this view as target
    pub fn fire(&self, kind: EventKind) {
        self.doc.fire(self.node, kind);
    }
}
