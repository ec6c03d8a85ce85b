//! Display tree management
//!
//! [`Document`] is an arena of element and text nodes addressed by
//! [`NodeId`]. It stands in for the host's native node tree: widgets create
//! elements, toggle classes and inline styles, wire event listeners (see
//! [`crate::events`]) and read back the geometry the host wrote with
//! [`Document::set_bounds`].
//!
//! # Example
//!
//! ```rust
//! use quill_core::document::Document;
//!
//! let mut doc = Document::new();
//! let card = doc.create_element("div");
//! doc.set_class_list(card, "card highlighted");
//!
//! let title = doc.create_element("span");
//! doc.add_class(title, "title");
//! doc.append_child(card, title);
//! doc.set_text(title, "Hello");
//!
//! let copy = doc.clone_node(card).unwrap();
//! let copy_title = doc.query_selector(copy, ".title").unwrap();
//! assert_eq!(doc.text_content(copy_title), "Hello");
//! ```

use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use slotmap::{new_key_type, Key, SlotMap};
use smallvec::SmallVec;

use crate::events::Listener;
use crate::style::normalize_property;

new_key_type! {
    /// Identity of a node in a [`Document`]
    ///
    /// Keys are generational: once a node is destroyed its id never
    /// compares equal to a node created later.
    pub struct NodeId;
}

impl NodeId {
    /// Convert to a raw u64 representation
    pub fn to_raw(self) -> u64 {
        self.data().as_ffi()
    }

    /// Create from a raw u64 representation produced by [`NodeId::to_raw`]
    pub fn from_raw(raw: u64) -> Self {
        Self::from(slotmap::KeyData::from_ffi(raw))
    }
}

/// Viewport-relative geometry of a node, written by the host layout
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Bounds {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    /// Bounds with only a vertical extent
    pub fn vertical(top: f64, height: f64) -> Self {
        Self {
            top,
            height,
            ..Default::default()
        }
    }
}

#[derive(Clone, Debug)]
enum NodeKind {
    Element(String),
    Text(String),
}

#[derive(Clone, Debug)]
struct NodeData {
    kind: NodeKind,
    classes: SmallVec<[String; 4]>,
    style: IndexMap<String, String>,
    attributes: IndexMap<String, String>,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
    bounds: Bounds,
}

impl NodeData {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            classes: SmallVec::new(),
            style: IndexMap::new(),
            attributes: IndexMap::new(),
            children: Vec::new(),
            parent: None,
            bounds: Bounds::default(),
        }
    }
}

/// Arena-backed node tree with a `html` root and a `body` child
pub struct Document {
    nodes: SlotMap<NodeId, NodeData>,
    root: NodeId,
    body: NodeId,
    pub(crate) listeners: FxHashMap<NodeId, Vec<Listener>>,
    pub(crate) next_listener: u64,
}

impl Document {
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(NodeData::new(NodeKind::Element("html".to_string())));
        let mut body_data = NodeData::new(NodeKind::Element("body".to_string()));
        body_data.parent = Some(root);
        let body = nodes.insert(body_data);
        nodes[root].children.push(body);
        Self {
            nodes,
            root,
            body,
            listeners: FxHashMap::default(),
            next_listener: 0,
        }
    }

    /// The document element (`html`)
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The `body` element
    pub fn body(&self) -> NodeId {
        self.body
    }

    /// Number of live nodes, detached ones included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Check if a node exists in this document
    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains_key(node)
    }

    // =========================================================================
    // CREATION
    // =========================================================================

    /// Create a detached element
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.nodes
            .insert(NodeData::new(NodeKind::Element(tag.to_ascii_lowercase())))
    }

    /// Create a detached text node
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.nodes.insert(NodeData::new(NodeKind::Text(text.to_string())))
    }

    /// Deep-clone a node and its subtree
    ///
    /// The clone is detached, has default bounds and carries no listeners.
    pub fn clone_node(&mut self, node: NodeId) -> Option<NodeId> {
        let data = self.nodes.get(node)?;
        let mut copy = data.clone();
        let children = std::mem::take(&mut copy.children);
        copy.parent = None;
        copy.bounds = Bounds::default();
        let id = self.nodes.insert(copy);
        for child in children {
            if let Some(child_copy) = self.clone_node(child) {
                self.nodes[child_copy].parent = Some(id);
                self.nodes[id].children.push(child_copy);
            }
        }
        Some(id)
    }

    // =========================================================================
    // TREE STRUCTURE
    // =========================================================================

    /// Append `child` as the last child of `parent`, detaching it first
    ///
    /// Appending a node under itself or one of its descendants is ignored.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if !self.contains(parent) || !self.contains(child) || self.is_inclusive_ancestor(child, parent)
        {
            return;
        }
        if matches!(self.nodes[parent].kind, NodeKind::Text(_)) {
            return;
        }
        self.detach(child);
        self.nodes[child].parent = Some(parent);
        self.nodes[parent].children.push(child);
    }

    /// Detach `child` from `parent`; the child stays alive
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) {
        if self.parent(child) == Some(parent) {
            self.detach(child);
        }
    }

    /// Detach a node from its parent, if any
    pub fn detach(&mut self, node: NodeId) {
        let Some(parent) = self.nodes.get(node).and_then(|n| n.parent) else {
            return;
        };
        if let Some(parent_data) = self.nodes.get_mut(parent) {
            parent_data.children.retain(|c| *c != node);
        }
        self.nodes[node].parent = None;
    }

    /// Detach and free a node and its whole subtree
    pub fn destroy(&mut self, node: NodeId) {
        if node == self.root || node == self.body {
            return;
        }
        self.detach(node);
        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            if let Some(data) = self.nodes.remove(id) {
                stack.extend(data.children);
                self.listeners.remove(&id);
            }
        }
    }

    /// Free every child of a node
    pub fn destroy_children(&mut self, node: NodeId) {
        for child in self.children(node) {
            self.destroy(child);
        }
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node).and_then(|n| n.parent)
    }

    /// Children in order (empty for missing nodes)
    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.nodes
            .get(node)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    /// Element children only, text nodes skipped
    pub fn element_children(&self, node: NodeId) -> Vec<NodeId> {
        self.children(node)
            .into_iter()
            .filter(|c| !self.is_text(*c))
            .collect()
    }

    /// All descendants in document order, excluding `node` itself
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(node).into_iter().rev().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            if let Some(data) = self.nodes.get(id) {
                stack.extend(data.children.iter().rev().copied());
            }
        }
        out
    }

    /// Topmost ancestor of a node (the node itself when detached)
    pub fn tree_root(&self, node: NodeId) -> NodeId {
        let mut current = node;
        while let Some(parent) = self.parent(current) {
            current = parent;
        }
        current
    }

    /// Whether `ancestor` is `node` or one of its ancestors
    pub fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// Whether the node is attached under the document root
    pub fn is_connected(&self, node: NodeId) -> bool {
        self.contains(node) && self.tree_root(node) == self.root
    }

    // =========================================================================
    // ELEMENT DATA
    // =========================================================================

    /// Lowercase tag name, `#text` for text nodes
    pub fn tag(&self, node: NodeId) -> Option<&str> {
        self.nodes.get(node).map(|n| match &n.kind {
            NodeKind::Element(tag) => tag.as_str(),
            NodeKind::Text(_) => "#text",
        })
    }

    pub fn is_text(&self, node: NodeId) -> bool {
        matches!(
            self.nodes.get(node).map(|n| &n.kind),
            Some(NodeKind::Text(_))
        )
    }

    /// Replace the class list with a space-separated list
    pub fn set_class_list(&mut self, node: NodeId, classes: &str) {
        if let Some(data) = self.nodes.get_mut(node) {
            data.classes = classes.split_whitespace().map(str::to_string).collect();
        }
    }

    pub fn add_class(&mut self, node: NodeId, class: &str) {
        if let Some(data) = self.nodes.get_mut(node) {
            if !data.classes.iter().any(|c| c == class) {
                data.classes.push(class.to_string());
            }
        }
    }

    pub fn remove_class(&mut self, node: NodeId, class: &str) {
        if let Some(data) = self.nodes.get_mut(node) {
            data.classes.retain(|c| c != class);
        }
    }

    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.nodes
            .get(node)
            .is_some_and(|n| n.classes.iter().any(|c| c == class))
    }

    pub fn classes(&self, node: NodeId) -> &[String] {
        self.nodes.get(node).map(|n| n.classes.as_slice()).unwrap_or(&[])
    }

    /// Set (`Some`) or clear (`None` or empty) an inline style property
    ///
    /// Property names may be given in camelCase or kebab-case.
    pub fn set_style(&mut self, node: NodeId, property: &str, value: Option<&str>) {
        let Some(data) = self.nodes.get_mut(node) else {
            return;
        };
        let property = normalize_property(property);
        match value {
            Some(v) if !v.is_empty() => {
                data.style.insert(property, v.to_string());
            }
            _ => {
                data.style.shift_remove(&property);
            }
        }
    }

    pub fn style(&self, node: NodeId, property: &str) -> Option<&str> {
        let property = normalize_property(property);
        self.nodes
            .get(node)
            .and_then(|n| n.style.get(&property))
            .map(String::as_str)
    }

    /// All inline style properties in insertion order
    pub fn styles(&self, node: NodeId) -> Vec<(String, String)> {
        self.nodes
            .get(node)
            .map(|n| {
                n.style
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        if let Some(data) = self.nodes.get_mut(node) {
            data.attributes
                .insert(name.to_ascii_lowercase(), value.to_string());
        }
    }

    pub fn remove_attribute(&mut self, node: NodeId, name: &str) {
        if let Some(data) = self.nodes.get_mut(node) {
            data.attributes.shift_remove(&name.to_ascii_lowercase());
        }
    }

    pub fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.nodes
            .get(node)
            .and_then(|n| n.attributes.get(&name.to_ascii_lowercase()))
            .map(String::as_str)
    }

    pub fn has_attribute(&self, node: NodeId, name: &str) -> bool {
        self.attribute(node, name).is_some()
    }

    /// Set or clear a boolean attribute such as `checked` or `disabled`
    pub fn toggle_attribute(&mut self, node: NodeId, name: &str, on: bool) {
        if on {
            self.set_attribute(node, name, "");
        } else {
            self.remove_attribute(node, name);
        }
    }

    // =========================================================================
    // TEXT
    // =========================================================================

    /// Replace the content of a node with a single text node
    pub fn set_text(&mut self, node: NodeId, text: &str) {
        let Some(data) = self.nodes.get_mut(node) else {
            return;
        };
        if let NodeKind::Text(existing) = &mut data.kind {
            *existing = text.to_string();
            return;
        }
        self.destroy_children(node);
        if !text.is_empty() {
            let text_node = self.create_text(text);
            self.append_child(node, text_node);
        }
    }

    /// Concatenated text of the node and its descendants
    pub fn text_content(&self, node: NodeId) -> String {
        let Some(data) = self.nodes.get(node) else {
            return String::new();
        };
        if let NodeKind::Text(text) = &data.kind {
            return text.clone();
        }
        self.descendants(node)
            .into_iter()
            .filter_map(|id| match &self.nodes[id].kind {
                NodeKind::Text(text) => Some(text.as_str()),
                NodeKind::Element(_) => None,
            })
            .collect()
    }

    // =========================================================================
    // GEOMETRY
    // =========================================================================

    /// Live geometry of a node
    pub fn bounds(&self, node: NodeId) -> Bounds {
        self.nodes.get(node).map(|n| n.bounds).unwrap_or_default()
    }

    /// Written by the host after layout
    pub fn set_bounds(&mut self, node: NodeId, bounds: Bounds) {
        if let Some(data) = self.nodes.get_mut(node) {
            data.bounds = bounds;
        }
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    /// First descendant of `scope` matching `selector`, in document order
    pub fn query_selector(&self, scope: NodeId, selector: &str) -> Option<NodeId> {
        let selector = Selector::parse(selector)?;
        self.descendants(scope)
            .into_iter()
            .find(|id| selector.matches(self, *id))
    }

    /// Every descendant of `scope` matching `selector`, in document order
    pub fn query_selector_all(&self, scope: NodeId, selector: &str) -> Vec<NodeId> {
        let Some(selector) = Selector::parse(selector) else {
            return Vec::new();
        };
        self.descendants(scope)
            .into_iter()
            .filter(|id| selector.matches(self, *id))
            .collect()
    }

    /// Element with the given `id` attribute in the tree containing `scope`
    pub fn element_by_id(&self, scope: NodeId, id: &str) -> Option<NodeId> {
        let top = self.tree_root(scope);
        std::iter::once(top)
            .chain(self.descendants(top))
            .find(|node| self.attribute(*node, "id") == Some(id))
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// SELECTORS
// =============================================================================

/// One compound selector such as `input.option[type=radio]`
#[derive(Debug, Default, PartialEq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attributes: Vec<(String, Option<String>)>,
}

impl Compound {
    fn parse(input: &str) -> Option<Self> {
        let mut compound = Compound::default();
        let chars: Vec<char> = input.chars().collect();
        let mut i = 0;

        let ident = |chars: &[char], start: usize| -> (String, usize) {
            let mut end = start;
            while end < chars.len()
                && (chars[end].is_alphanumeric() || chars[end] == '-' || chars[end] == '_')
            {
                end += 1;
            }
            (chars[start..end].iter().collect(), end)
        };

        if i < chars.len() && chars[i] == '*' {
            i += 1;
        } else {
            let (tag, end) = ident(&chars, i);
            if !tag.is_empty() {
                compound.tag = Some(tag.to_ascii_lowercase());
            }
            i = end;
        }

        while i < chars.len() {
            match chars[i] {
                '.' => {
                    let (class, end) = ident(&chars, i + 1);
                    if class.is_empty() {
                        return None;
                    }
                    compound.classes.push(class);
                    i = end;
                }
                '#' => {
                    let (id, end) = ident(&chars, i + 1);
                    if id.is_empty() {
                        return None;
                    }
                    compound.id = Some(id);
                    i = end;
                }
                '[' => {
                    let close = chars[i..].iter().position(|c| *c == ']')? + i;
                    let inner: String = chars[i + 1..close].iter().collect();
                    let attribute = match inner.split_once('=') {
                        Some((name, value)) => (
                            name.trim().to_ascii_lowercase(),
                            Some(value.trim().trim_matches(|c| c == '"' || c == '\'').to_string()),
                        ),
                        None => (inner.trim().to_ascii_lowercase(), None),
                    };
                    compound.attributes.push(attribute);
                    i = close + 1;
                }
                _ => return None,
            }
        }
        Some(compound)
    }

    fn matches(&self, doc: &Document, node: NodeId) -> bool {
        if doc.is_text(node) {
            return false;
        }
        if let Some(tag) = &self.tag {
            if doc.tag(node) != Some(tag.as_str()) {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if doc.attribute(node, "id") != Some(id.as_str()) {
                return false;
            }
        }
        if !self.classes.iter().all(|c| doc.has_class(node, c)) {
            return false;
        }
        self.attributes.iter().all(|(name, value)| match value {
            Some(v) => doc.attribute(node, name) == Some(v.as_str()),
            None => doc.has_attribute(node, name),
        })
    }
}

/// Compounds joined by descendant combinators
#[derive(Debug)]
struct Selector {
    parts: Vec<Compound>,
}

impl Selector {
    fn parse(input: &str) -> Option<Self> {
        let parts = input
            .split_whitespace()
            .map(Compound::parse)
            .collect::<Option<Vec<_>>>()?;
        if parts.is_empty() {
            return None;
        }
        Some(Self { parts })
    }

    fn matches(&self, doc: &Document, node: NodeId) -> bool {
        let Some((last, rest)) = self.parts.split_last() else {
            return false;
        };
        if !last.matches(doc, node) {
            return false;
        }
        // Remaining compounds must match ancestors, right to left
        let mut ancestor = doc.parent(node);
        for compound in rest.iter().rev() {
            loop {
                match ancestor {
                    Some(id) if compound.matches(doc, id) => {
                        ancestor = doc.parent(id);
                        break;
                    }
                    Some(id) => ancestor = doc.parent(id),
                    None => return false,
                }
            }
        }
        true
    }
}
