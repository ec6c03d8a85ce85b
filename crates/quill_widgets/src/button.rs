//! Buttons: [`Button`], [`Toggle`] and [`Shortcut`]
//!
//! A button pairs a label with an action. [`Button::click`] wraps an async
//! action in a small user flow: the button shows a pending text while the
//! action runs, then its outcome, then its label again.
//!
//! # Example
//!
//! ```ignore
//! let save = Button::new(&doc, "Save").click("Saving…", "Saved", || async {
//!     upload().await?;
//!     Ok(())
//! });
//! ```

use std::cell::Cell;
use std::future::Future;
use std::ops::Deref;
use std::rc::Rc;

use quill_core::{
    choose_presentation, ButtonSettings, DefaultValidators, Event, EventKind, NodeId,
    SharedDocument, WeakDocument,
};

use crate::view::{Child, View};

// ============================================================================
// Button
// ============================================================================

/// A label paired with an action
#[derive(Clone)]
pub struct Button {
    inner: View,
    button: NodeId,
    label: Rc<str>,
    settings: ButtonSettings,
}

impl Deref for Button {
    type Target = View;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl Button {
    pub fn new(doc: &SharedDocument, label: &str) -> Self {
        let button = View::element(doc, "button");
        button.set_text(&choose_presentation(&DefaultValidators, label));
        let node = button.node();
        Self {
            inner: View::with_children(doc, vec![Child::from(button)]),
            button: node,
            label: Rc::from(label),
            settings: ButtonSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: ButtonSettings) -> Self {
        self.settings = settings;
        self
    }

    /// The inner `button` element
    pub fn button(&self) -> NodeId {
        self.button
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Run `handler` on every click
    pub fn on_click(self, handler: impl Fn(&Event) + 'static) -> Self {
        {
            let mut d = self.doc().write();
            d.add_event_listener(self.button, EventKind::Click, handler);
            d.set_style(self.button, "cursor", Some("pointer"));
        }
        self
    }

    /// Run an async action as a user flow
    ///
    /// While the action runs the button is disabled, shows `pending` and
    /// ignores further clicks. Afterwards it shows `done`, or the error text
    /// if the action failed, and returns to its label after the configured
    /// restore delay. Clicks must be dispatched inside a
    /// [`tokio::task::LocalSet`].
    pub fn click<F, Fut>(self, pending: &str, done: &str, action: F) -> Self
    where
        F: Fn() -> Fut + 'static,
        Fut: Future<Output = anyhow::Result<()>> + 'static,
    {
        let busy = Rc::new(Cell::new(false));
        let weak = self.weak_doc();
        let button = self.button;
        let label = choose_presentation(&DefaultValidators, &self.label);
        let pending = pending.to_string();
        let done = done.to_string();
        let restore_delay = self.settings.restore_delay();

        let handler = move |_: &Event| {
            if busy.get() {
                return;
            }
            let Some(doc) = weak.upgrade() else {
                return;
            };
            busy.set(true);
            {
                let mut d = doc.write();
                d.set_style(button, "cursor", Some("default"));
                d.toggle_attribute(button, "disabled", true);
                d.set_text(button, &pending);
            }

            let restore = Restore {
                busy: Rc::clone(&busy),
                doc: weak.clone(),
                button,
                label: label.clone(),
            };
            let running = action();
            let weak = weak.clone();
            let done = done.clone();
            tokio::task::spawn_local(async move {
                let outcome = running.await;
                let message = match &outcome {
                    Ok(()) => done,
                    Err(e) => {
                        tracing::error!("button action failed: {:#}", e);
                        e.to_string()
                    }
                };
                if let Some(doc) = weak.upgrade() {
                    doc.write().set_text(button, &message);
                }
                tokio::time::sleep(restore_delay).await;
                drop(restore);
            });
        };

        {
            let mut d = self.doc().write();
            d.add_event_listener(self.button, EventKind::Click, handler);
            d.set_style(self.button, "cursor", Some("pointer"));
        }
        self
    }
}

/// Puts a busy button back to its idle state when dropped
struct Restore {
    busy: Rc<Cell<bool>>,
    doc: WeakDocument,
    button: NodeId,
    label: String,
}

impl Drop for Restore {
    fn drop(&mut self) {
        if let Some(doc) = self.doc.upgrade() {
            match doc.try_write() {
                Some(mut d) => {
                    d.set_style(self.button, "cursor", Some("pointer"));
                    d.toggle_attribute(self.button, "disabled", false);
                    d.set_text(self.button, &self.label);
                }
                None => tracing::warn!("document busy, button left disabled"),
            }
        }
        self.busy.set(false);
    }
}

// ============================================================================
// Toggle
// ============================================================================

/// A labelled checkbox
///
/// A label starting with `[x]` makes the toggle initially checked.
#[derive(Clone)]
pub struct Toggle {
    inner: View,
    input: NodeId,
}

impl Deref for Toggle {
    type Target = View;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl Toggle {
    pub fn new(doc: &SharedDocument, label: &str) -> Self {
        let (checked, label) = match label.strip_prefix("[x]") {
            Some(rest) => (true, rest.trim()),
            None => (false, label),
        };

        let (wrapper, input) = {
            let mut d = doc.write();
            let wrapper = d.create_element("label");
            let input = d.create_element("input");
            d.set_attribute(input, "type", "checkbox");
            d.set_attribute(input, "name", label);
            d.toggle_attribute(input, "checked", checked);
            let span = d.create_element("span");
            d.set_text(span, label);
            d.append_child(wrapper, input);
            d.append_child(wrapper, span);
            (wrapper, input)
        };

        Self {
            inner: View::with_children(doc, vec![Child::from(wrapper)]),
            input,
        }
    }

    /// Call `handler` with the new state on every click
    pub fn on_toggle(self, handler: impl Fn(bool) + 'static) -> Self {
        let weak = self.weak_doc();
        let input = self.input;
        {
            let mut d = self.doc().write();
            d.add_event_listener(input, EventKind::Click, move |_| {
                if let Some(doc) = weak.upgrade() {
                    let checked = doc.read().has_attribute(input, "checked");
                    handler(checked);
                }
            });
            if let Some(wrapper) = d.children(self.node()).first().copied() {
                d.set_style(wrapper, "cursor", Some("pointer"));
            }
        }
        self
    }

    pub fn input(&self) -> NodeId {
        self.input
    }

    pub fn is_checked(&self) -> bool {
        self.doc().read().has_attribute(self.input, "checked")
    }
}

// ============================================================================
// Shortcut
// ============================================================================

/// A key cap that lights up while its key is held
#[derive(Clone)]
pub struct Shortcut {
    inner: View,
    key: Rc<str>,
    cap: NodeId,
}

impl Deref for Shortcut {
    type Target = View;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl Shortcut {
    pub fn new(doc: &SharedDocument, key: &str) -> Self {
        let cap = View::element(doc, "span");
        cap.set_text(&key.to_uppercase());
        let cap_node = cap.node();
        let inner = View::with_children(doc, vec![Child::from(cap)]);
        inner.css(&[
            ("border", "2px solid rgba(0,0,0,.5)"),
            ("border-radius", "8px"),
            ("padding", ".5em 1em"),
        ]);

        let root = doc.read().root();
        for (kind, background) in [
            (EventKind::KeyDown, Some("rgba(0,0,0,.5)")),
            (EventKind::KeyUp, None),
        ] {
            let weak = doc.downgrade();
            let node = inner.node();
            let key = key.to_string();
            doc.write().add_event_listener(root, kind, move |event| {
                if event.key.as_deref() != Some(key.as_str()) {
                    return;
                }
                if let Some(doc) = weak.upgrade() {
                    doc.write().set_style(node, "background", background);
                }
            });
        }

        Self {
            inner,
            key: Rc::from(key),
            cap: cap_node,
        }
    }

    /// Show `description` as the hover title
    pub fn description(self, description: &str) -> Self {
        self.set_attribute("title", description);
        self
    }

    /// Run `handler` when the key cap is clicked
    pub fn on_click(self, handler: impl Fn(&Event) + 'static) -> Self {
        {
            let mut d = self.doc().write();
            d.add_event_listener(self.cap, EventKind::Click, handler);
            d.set_style(self.cap, "cursor", Some("pointer"));
        }
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}
