//! Modal overlay and the [`Dropdown`] built on it
//!
//! The open state lives in a hidden checkbox. The backdrop and the header
//! are labels for that checkbox, so clicking either closes the modal without
//! any extra wiring.
//!
//! ```text
//! div.editor-modal-container
//! ├── input#quill-modal-N.editor-modal-checkbox
//! ├── label.editor-modal-backdrop[for=quill-modal-N]
//! └── div.editor-modal-content
//!     ├── label.editor-modal-header[for=quill-modal-N]
//!     └── content…
//! ```

use std::cell::RefCell;
use std::future::Future;
use std::ops::Deref;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::oneshot;

use quill_core::{choose_presentation, DefaultValidators, EventKind, NodeId, SharedDocument};

use crate::button::Button;
use crate::view::{Child, View};

static NEXT_MODAL_ID: AtomicU64 = AtomicU64::new(1);

/// Screen-filling window with custom content
#[derive(Clone)]
pub struct Modal {
    inner: View,
    checkbox: NodeId,
    content: NodeId,
    waiters: Rc<RefCell<Vec<oneshot::Sender<()>>>>,
}

impl Deref for Modal {
    type Target = View;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl Modal {
    pub fn new(doc: &SharedDocument, content: Vec<Child>) -> Self {
        let id = format!("quill-modal-{}", NEXT_MODAL_ID.fetch_add(1, Ordering::Relaxed));
        let inner = View::element(doc, "div.editor-modal-container");

        let (checkbox, content_node) = {
            let mut d = doc.write();
            let checkbox = d.create_element("input");
            d.set_attribute(checkbox, "type", "checkbox");
            d.set_attribute(checkbox, "id", &id);
            d.add_class(checkbox, "editor-modal-checkbox");

            let backdrop = d.create_element("label");
            d.set_attribute(backdrop, "for", &id);
            d.add_class(backdrop, "editor-modal-backdrop");

            let content_node = d.create_element("div");
            d.add_class(content_node, "editor-modal-content");
            let header = d.create_element("label");
            d.set_attribute(header, "for", &id);
            d.add_class(header, "editor-modal-header");
            d.append_child(content_node, header);

            for child in [checkbox, backdrop, content_node] {
                d.append_child(inner.node(), child);
            }
            (checkbox, content_node)
        };

        for kind in [
            EventKind::PointerDown,
            EventKind::PointerUp,
            EventKind::TouchStart,
            EventKind::TouchEnd,
            EventKind::TouchMove,
        ] {
            inner.on(kind, |event| event.stop_propagation());
        }

        let waiters: Rc<RefCell<Vec<oneshot::Sender<()>>>> = Rc::default();
        {
            let waiters = Rc::clone(&waiters);
            let weak = doc.downgrade();
            doc.write()
                .add_event_listener(checkbox, EventKind::Change, move |_| {
                    let closed = weak
                        .upgrade()
                        .is_some_and(|doc| !doc.read().has_attribute(checkbox, "checked"));
                    if closed {
                        for waiter in waiters.borrow_mut().drain(..) {
                            let _ = waiter.send(());
                        }
                    }
                });
        }

        let modal = Self {
            inner,
            checkbox,
            content: content_node,
            waiters,
        };
        modal.set_content(content);
        modal
    }

    pub fn is_open(&self) -> bool {
        self.doc().read().has_attribute(self.checkbox, "checked")
    }

    /// Open the modal; the returned future resolves when it next closes
    pub fn open(&self) -> impl Future<Output = ()> + 'static {
        let (tx, rx) = oneshot::channel();
        self.waiters.borrow_mut().push(tx);
        self.doc()
            .write()
            .toggle_attribute(self.checkbox, "checked", true);
        async move {
            let _ = rx.await;
        }
    }

    pub fn close(&self) {
        set_open(self.doc(), self.checkbox, false);
    }

    pub fn toggle(&self) {
        toggle(self.doc(), self.checkbox);
    }

    /// Replace everything below the header
    pub fn set_content(&self, content: Vec<Child>) -> &Self {
        {
            let mut d = self.doc().write();
            for child in d.children(self.content).into_iter().skip(1) {
                d.detach(child);
            }
        }
        let content_view = View::from_node(self.doc(), self.content);
        for child in content {
            content_view.append(child);
        }
        self
    }

    /// Content nodes below the header
    pub fn content(&self) -> Vec<NodeId> {
        self.doc()
            .read()
            .children(self.content)
            .into_iter()
            .skip(1)
            .collect()
    }

    pub fn checkbox(&self) -> NodeId {
        self.checkbox
    }
}

/// Flip the checkbox behind a modal, firing `change` when it moved
fn set_open(doc: &SharedDocument, checkbox: NodeId, open: bool) {
    let was_open = doc.read().has_attribute(checkbox, "checked");
    if was_open == open {
        return;
    }
    doc.write().toggle_attribute(checkbox, "checked", open);
    doc.fire(checkbox, EventKind::Change);
}

fn toggle(doc: &SharedDocument, checkbox: NodeId) {
    let open = doc.read().has_attribute(checkbox, "checked");
    set_open(doc, checkbox, !open);
}

// ============================================================================
// Dropdown
// ============================================================================

/// A button opening a modal list of radio options
#[derive(Clone)]
pub struct Dropdown {
    inner: View,
    button: Button,
    modal: Modal,
}

impl Deref for Dropdown {
    type Target = View;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl Dropdown {
    pub fn new(doc: &SharedDocument, label: &str, options: &[&str]) -> Self {
        let label = if label.is_empty() { "Dropdown" } else { label };
        let rows: Vec<Child> = options
            .iter()
            .map(|value| {
                let row = View::element(doc, "div.option");
                {
                    let mut d = doc.write();
                    let input = d.create_element("input");
                    d.set_attribute(input, "type", "radio");
                    d.set_attribute(input, "id", value);
                    d.set_attribute(input, "name", label);
                    d.set_attribute(input, "value", value);
                    d.toggle_attribute(input, "checked", *value == label);
                    let caption = d.create_element("label");
                    d.set_attribute(caption, "for", value);
                    let span = d.create_element("span");
                    d.set_text(span, &choose_presentation(&DefaultValidators, value));
                    d.append_child(caption, span);
                    d.append_child(row.node(), input);
                    d.append_child(row.node(), caption);
                }
                Child::from(row)
            })
            .collect();

        let modal = Modal::new(doc, rows);
        modal.css_class("dropdown");

        let button = {
            let weak = doc.downgrade();
            let checkbox = modal.checkbox();
            Button::new(doc, label).on_click(move |_| {
                if let Some(doc) = weak.upgrade() {
                    toggle(&doc, checkbox);
                }
            })
        };

        let inner = View::with_children(
            doc,
            vec![Child::from(&*button), Child::from(&*modal)],
        );
        Self {
            inner,
            button,
            modal,
        }
    }

    /// Called with the option value when an option is picked
    ///
    /// Picking also relabels the button and closes the list.
    pub fn on_select(self, handler: impl Fn(&str) + 'static) -> Self {
        let handler = Rc::new(handler);
        let button = self.button.button();
        let checkbox = self.modal.checkbox();
        for input in self.modal.query_all(".option input") {
            let handler = Rc::clone(&handler);
            let weak = self.weak_doc();
            self.doc()
                .write()
                .add_event_listener(input, EventKind::Click, move |event| {
                    let Some(doc) = weak.upgrade() else {
                        return;
                    };
                    let value = doc
                        .read()
                        .attribute(event.target, "value")
                        .unwrap_or("")
                        .to_string();
                    handler(&value);
                    doc.write()
                        .set_text(button, &choose_presentation(&DefaultValidators, &value));
                    toggle(&doc, checkbox);
                });
        }
        self
    }

    /// Show `label` on the button
    pub fn set_label(&self, label: &str) {
        self.doc().write().set_text(
            self.button.button(),
            &choose_presentation(&DefaultValidators, label),
        );
    }

    pub fn label(&self) -> String {
        self.doc().read().text_content(self.button.button())
    }

    pub fn modal(&self) -> &Modal {
        &self.modal
    }

    pub fn button(&self) -> &Button {
        &self.button
    }

    /// Currently checked option value
    pub fn selected(&self) -> Option<String> {
        let d = self.doc().read();
        d.query_selector_all(self.modal.node(), ".option input")
            .into_iter()
            .find(|input| d.has_attribute(*input, "checked"))
            .and_then(|input| d.attribute(input, "value").map(str::to_string))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_modal_structure() {
        let doc = SharedDocument::new();
        let body = View::element(&doc, "p");
        let modal = Modal::new(&doc, vec![Child::from(&body)]);
        assert!(modal.has_class("editor-modal-container"));
        assert!(modal.query(".editor-modal-backdrop").is_some());
        assert!(modal.query(".editor-modal-header").is_some());
        assert_eq!(modal.content(), vec![body.node()]);
        assert!(!modal.is_open());
    }

    #[test]
    fn test_modal_ids_are_unique() {
        let doc = SharedDocument::new();
        let a = Modal::new(&doc, vec![]);
        let b = Modal::new(&doc, vec![]);
        assert_ne!(
            doc.read().attribute(a.checkbox(), "id"),
            doc.read().attribute(b.checkbox(), "id")
        );
    }

    #[test]
    fn test_backdrop_click_closes() {
        let doc = SharedDocument::new();
        let modal = Modal::new(&doc, vec![]);
        modal.mount_to_body();
        modal.toggle();
        assert!(modal.is_open());
        let backdrop = modal.query(".editor-modal-backdrop").unwrap();
        doc.fire(backdrop, EventKind::Click);
        assert!(!modal.is_open());
    }

    #[tokio::test]
    async fn test_open_resolves_on_close() {
        let doc = SharedDocument::new();
        let modal = Modal::new(&doc, vec![]);
        let closed = modal.open();
        assert!(modal.is_open());
        modal.close();
        tokio::time::timeout(std::time::Duration::from_secs(1), closed)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_open_resolves_on_header_click() {
        let doc = SharedDocument::new();
        let modal = Modal::new(&doc, vec![]);
        let closed = modal.open();
        let header = modal.query(".editor-modal-header").unwrap();
        doc.fire(header, EventKind::Click);
        tokio::time::timeout(std::time::Duration::from_secs(1), closed)
            .await
            .unwrap();
    }

    #[test]
    fn test_pointer_events_stop_at_modal() {
        let doc = SharedDocument::new();
        let outside = Rc::new(Cell::new(0));
        let modal = Modal::new(&doc, vec![]);
        modal.mount_to_body();
        {
            let outside = outside.clone();
            let body = doc.read().body();
            doc.write()
                .add_event_listener(body, EventKind::PointerDown, move |_| {
                    outside.set(outside.get() + 1)
                });
        }
        let header = modal.query(".editor-modal-header").unwrap();
        doc.fire(header, EventKind::PointerDown);
        assert_eq!(outside.get(), 0);
    }

    #[test]
    fn test_set_content_keeps_header() {
        let doc = SharedDocument::new();
        let modal = Modal::new(&doc, vec![Child::from("first")]);
        modal.set_content(vec![Child::from(View::element(&doc, "em"))]);
        assert_eq!(modal.content().len(), 1);
        assert!(modal.query(".editor-modal-header").is_some());
        assert!(modal.query("em").is_some());
    }

    #[test]
    fn test_dropdown_selection() {
        let doc = SharedDocument::new();
        let picked = Rc::new(RefCell::new(Vec::new()));
        let dropdown = {
            let picked = picked.clone();
            Dropdown::new(&doc, "Small", &["Small", "Medium", "Large"])
                .on_select(move |v| picked.borrow_mut().push(v.to_string()))
        };
        dropdown.mount_to_body();
        assert!(dropdown.modal().has_class("dropdown"));
        assert_eq!(dropdown.selected().as_deref(), Some("Small"));

        doc.fire(dropdown.button().button(), EventKind::Click);
        assert!(dropdown.modal().is_open());

        let large = dropdown.modal().query("#Large").unwrap();
        doc.fire(large, EventKind::Click);
        assert_eq!(*picked.borrow(), vec!["Large".to_string()]);
        assert_eq!(dropdown.label(), "Large");
        assert_eq!(dropdown.selected().as_deref(), Some("Large"));
        assert!(!dropdown.modal().is_open());
    }

    #[test]
    fn test_dropdown_option_label_click() {
        let doc = SharedDocument::new();
        let picked = Rc::new(RefCell::new(Vec::new()));
        let dropdown = {
            let picked = picked.clone();
            Dropdown::new(&doc, "", &["a", "b"])
                .on_select(move |v| picked.borrow_mut().push(v.to_string()))
        };
        assert_eq!(dropdown.label(), "Dropdown");
        dropdown.modal().toggle();
        let caption = dropdown.modal().query("label[for=b] span").unwrap();
        doc.fire(caption, EventKind::Click);
        assert_eq!(*picked.borrow(), vec!["b".to_string()]);
        assert!(!dropdown.modal().is_open());
    }
}
