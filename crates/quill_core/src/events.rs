//! Event listeners and dispatch
//!
//! Listeners are stored per node inside the [`Document`] and dispatched
//! through [`SharedDocument::dispatch`], which bubbles the event from the
//! target up to the tree root. The document borrow is released before any
//! callback runs, so handlers are free to mutate the tree.
//!
//! ```text
//! SharedDocument::dispatch(target, event)
//!     ↓ host default action (checkbox toggle, radio check)
//! listeners on target
//!     ↓ unless stop_propagation()
//! listeners on each ancestor
//!     ↓ change on toggled controls, click forwarded by labels
//! ```

use std::cell::{Cell, Ref, RefCell, RefMut};
use std::rc::{Rc, Weak};

use crate::document::{Document, NodeId};

/// Callback for handling events
///
/// Uses Rc since the UI is single-threaded.
pub type EventCallback = Rc<dyn Fn(&Event)>;

/// Kinds of events the widgets listen to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    Click,
    Input,
    Change,
    Submit,
    KeyDown,
    KeyUp,
    PointerEnter,
    PointerLeave,
    PointerDown,
    PointerUp,
    TouchStart,
    TouchEnd,
    TouchMove,
}

impl EventKind {
    /// Whether the event travels up to ancestors after the target
    pub fn bubbles(self) -> bool {
        !matches!(self, EventKind::PointerEnter | EventKind::PointerLeave)
    }
}

/// Handle returned by [`Document::add_event_listener`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

pub(crate) struct Listener {
    id: ListenerId,
    kind: EventKind,
    callback: EventCallback,
}

/// An event travelling through the tree
#[derive(Debug)]
pub struct Event {
    pub kind: EventKind,
    /// Node the event was dispatched to
    pub target: NodeId,
    /// Key name for KeyDown/KeyUp
    pub key: Option<String>,
    /// Pointer position for pointer events
    pub client_x: f64,
    pub client_y: f64,
    current_target: Cell<Option<NodeId>>,
    propagation_stopped: Cell<bool>,
    default_prevented: Cell<bool>,
}

impl Event {
    pub fn new(kind: EventKind, target: NodeId) -> Self {
        Self {
            kind,
            target,
            key: None,
            client_x: 0.0,
            client_y: 0.0,
            current_target: Cell::new(None),
            propagation_stopped: Cell::new(false),
            default_prevented: Cell::new(false),
        }
    }

    /// Set the key name (for KeyDown/KeyUp)
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Set the pointer position
    pub fn with_client_pos(mut self, x: f64, y: f64) -> Self {
        self.client_x = x;
        self.client_y = y;
        self
    }

    /// Node whose listener is currently running
    pub fn current_target(&self) -> Option<NodeId> {
        self.current_target.get()
    }

    pub fn stop_propagation(&self) {
        self.propagation_stopped.set(true);
    }

    pub fn is_propagation_stopped(&self) -> bool {
        self.propagation_stopped.get()
    }

    pub fn prevent_default(&self) {
        self.default_prevented.set(true);
    }

    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented.get()
    }
}

impl Document {
    /// Register a listener on a node
    pub fn add_event_listener(
        &mut self,
        node: NodeId,
        kind: EventKind,
        callback: impl Fn(&Event) + 'static,
    ) -> ListenerId {
        self.next_listener += 1;
        let id = ListenerId(self.next_listener);
        if self.contains(node) {
            self.listeners.entry(node).or_default().push(Listener {
                id,
                kind,
                callback: Rc::new(callback),
            });
        }
        id
    }

    /// Remove a listener; unknown ids are ignored
    pub fn remove_event_listener(&mut self, node: NodeId, id: ListenerId) {
        if let Some(list) = self.listeners.get_mut(&node) {
            list.retain(|l| l.id != id);
        }
    }

    /// Number of listeners registered on a node
    pub fn listener_count(&self, node: NodeId) -> usize {
        self.listeners.get(&node).map(Vec::len).unwrap_or(0)
    }

    fn callbacks_for(&self, node: NodeId, kind: EventKind) -> Vec<EventCallback> {
        self.listeners
            .get(&node)
            .map(|list| {
                list.iter()
                    .filter(|l| l.kind == kind)
                    .map(|l| Rc::clone(&l.callback))
                    .collect()
            })
            .unwrap_or_default()
    }
}

// =============================================================================
// SHARED DOCUMENT
// =============================================================================

/// Shared, single-threaded handle to a [`Document`]
#[derive(Clone, Default)]
pub struct SharedDocument(Rc<RefCell<Document>>);

/// Non-owning handle, used by listeners stored inside the document
#[derive(Clone, Default)]
pub struct WeakDocument(Weak<RefCell<Document>>);

impl SharedDocument {
    pub fn new() -> Self {
        Self(Rc::new(RefCell::new(Document::new())))
    }

    pub fn read(&self) -> Ref<'_, Document> {
        self.0.borrow()
    }

    pub fn write(&self) -> RefMut<'_, Document> {
        self.0.borrow_mut()
    }

    /// Mutable access unless the document is already borrowed
    pub fn try_write(&self) -> Option<RefMut<'_, Document>> {
        self.0.try_borrow_mut().ok()
    }

    pub fn downgrade(&self) -> WeakDocument {
        WeakDocument(Rc::downgrade(&self.0))
    }

    /// Whether two handles point at the same document
    pub fn ptr_eq(&self, other: &SharedDocument) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Dispatch an event to `event.target`, bubbling to the tree root
    pub fn dispatch(&self, event: &Event) {
        let follow_up = self.apply_default_action(event);

        let path: Vec<NodeId> = {
            let doc = self.read();
            let mut path = vec![event.target];
            if event.kind.bubbles() {
                let mut current = doc.parent(event.target);
                while let Some(id) = current {
                    path.push(id);
                    current = doc.parent(id);
                }
            }
            path
        };

        for node in path {
            let callbacks = self.read().callbacks_for(node, event.kind);
            event.current_target.set(Some(node));
            for callback in callbacks {
                callback(event);
            }
            if event.is_propagation_stopped() {
                break;
            }
        }
        event.current_target.set(None);

        match follow_up {
            FollowUp::None => {}
            FollowUp::Activate(labelled) => {
                if !event.is_default_prevented() {
                    self.fire(labelled, EventKind::Click);
                }
            }
            FollowUp::Changed(input) => self.fire(input, EventKind::Change),
        }
    }

    /// Convenience for `dispatch(&Event::new(kind, target))`
    pub fn fire(&self, target: NodeId, kind: EventKind) {
        self.dispatch(&Event::new(kind, target));
    }

    /// What the host does natively when a click lands on a form control
    fn apply_default_action(&self, event: &Event) -> FollowUp {
        if event.kind != EventKind::Click {
            return FollowUp::None;
        }
        let mut doc = self.write();
        let target = event.target;
        let tag = doc.tag(target).map(str::to_string);
        let input_type = doc.attribute(target, "type").map(str::to_string);
        let follow_up = match (tag.as_deref(), input_type.as_deref()) {
            (Some("input"), Some("checkbox")) => {
                let checked = doc.has_attribute(target, "checked");
                doc.toggle_attribute(target, "checked", !checked);
                FollowUp::Changed(target)
            }
            (Some("input"), Some("radio")) => {
                if let Some(name) = doc.attribute(target, "name").map(str::to_string) {
                    let top = doc.tree_root(target);
                    for other in doc.query_selector_all(top, "input[type=radio]") {
                        if doc.attribute(other, "name") == Some(name.as_str()) {
                            doc.toggle_attribute(other, "checked", false);
                        }
                    }
                }
                doc.toggle_attribute(target, "checked", true);
                FollowUp::Changed(target)
            }
            _ => enclosing_label(&doc, target)
                .and_then(|label| labelled_control(&doc, label))
                .filter(|control| *control != target)
                .map(FollowUp::Activate)
                .unwrap_or(FollowUp::None),
        };
        follow_up
    }
}

/// Nearest `label` at or above `node`
fn enclosing_label(doc: &Document, node: NodeId) -> Option<NodeId> {
    let mut current = Some(node);
    while let Some(id) = current {
        if doc.tag(id) == Some("label") {
            return Some(id);
        }
        current = doc.parent(id);
    }
    None
}

/// Control a label activates: its `for` target, else its first `input`
fn labelled_control(doc: &Document, label: NodeId) -> Option<NodeId> {
    match doc.attribute(label, "for") {
        Some(id) => doc.element_by_id(label, id),
        None => doc.query_selector(label, "input"),
    }
}

/// Host work that runs after listeners saw the click
enum FollowUp {
    None,
    Activate(NodeId),
    Changed(NodeId),
}

impl WeakDocument {
    pub fn upgrade(&self) -> Option<SharedDocument> {
        self.0.upgrade().map(SharedDocument)
    }
}
