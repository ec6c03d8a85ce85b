//! Scroll container
//!
//! [`ScrollContainer`] ties the scroll pieces together: it owns the batch of
//! stamped items, feeds host scroll samples to its [`ScrollReactor`] and
//! answers the reactor's in-view queries from live geometry.
//!
//! # Example
//!
//! ```rust
//! use std::rc::Rc;
//!
//! use quill_core::{ScrollSettings, SharedDocument, StaticViewport};
//! use quill_widgets::scroll::{RowData, ScrollContainer};
//! use serde_json::json;
//!
//! let doc = SharedDocument::new();
//! let viewport = Rc::new(StaticViewport::new(800.0));
//! let feed = ScrollContainer::new(&doc, viewport, ScrollSettings::default());
//!
//! let template = {
//!     let mut d = doc.write();
//!     let card = d.create_element("article");
//!     let title = d.create_element("h2");
//!     d.add_class(title, "title");
//!     d.append_child(card, title);
//!     card
//! };
//! feed.configure_template(template);
//!
//! let rows = RowData::new().with("title", vec![json!("First"), json!("Second")]);
//! feed.fill(&rows).unwrap();
//! assert_eq!(feed.rendered().len(), 2);
//! ```

use std::cell::{Cell, RefCell};
use std::future::Future;
use std::ops::Deref;
use std::rc::{Rc, Weak};

use futures::Stream;

use quill_core::{
    DefaultValidators, Document, NodeId, QuillError, Result, ScrollSettings, SharedDocument,
    Validators, Viewport,
};

use super::focus::{FocusState, FocusTransition};
use super::membership;
use super::reactor::{ReactorPhase, ReactorStats, ScrollReactor, SettleProbe, WeakScrollReactor};
use super::stamp::{stamp, RenderedNode, RowData};
use crate::view::View;

struct ContainerState {
    doc: SharedDocument,
    node: NodeId,
    viewport: Rc<dyn Viewport>,
    validators: RefCell<Rc<dyn Validators>>,
    template: Cell<Option<NodeId>>,
    rendered: RefCell<Vec<RenderedNode>>,
    disabled: Cell<bool>,
}

impl ContainerState {
    fn visible(&self) -> Vec<RenderedNode> {
        let rendered = self.rendered.borrow();
        membership::in_view(&self.doc.read(), &rendered, self.viewport.inner_height())
    }
}

impl SettleProbe for ContainerState {
    fn in_view(&self) -> Vec<RenderedNode> {
        self.visible()
    }

    fn total(&self) -> usize {
        self.rendered.borrow().len()
    }

    fn opacity(&self, node: &RenderedNode) -> f64 {
        node.opacity(&self.doc.read())
    }
}

/// Scroll-tracked list of items stamped from a template
///
/// Derefs to the [`View`] holding the items.
#[derive(Clone)]
pub struct ScrollContainer {
    inner: View,
    reactor: ScrollReactor,
    state: Rc<ContainerState>,
}

impl Deref for ScrollContainer {
    type Target = View;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl ScrollContainer {
    /// A container on a new `div`
    pub fn new(doc: &SharedDocument, viewport: Rc<dyn Viewport>, settings: ScrollSettings) -> Self {
        Self::from_view(View::new(doc), viewport, settings)
    }

    /// A container on an existing view
    pub fn from_view(view: View, viewport: Rc<dyn Viewport>, settings: ScrollSettings) -> Self {
        view.set_style("flex-direction", Some("column"));
        let state = Rc::new(ContainerState {
            doc: view.doc().clone(),
            node: view.node(),
            viewport,
            validators: RefCell::new(Rc::new(DefaultValidators)),
            template: Cell::new(None),
            rendered: RefCell::new(Vec::new()),
            disabled: Cell::new(false),
        });
        let reactor = ScrollReactor::new(settings.settle_delay());
        reactor.set_probe(state.clone());
        Self {
            inner: view,
            reactor,
            state,
        }
    }

    /// Replace the URL/markup validators used by [`ScrollContainer::fill`]
    pub fn set_validators(&self, validators: Rc<dyn Validators>) {
        *self.state.validators.borrow_mut() = validators;
    }

    pub fn reactor(&self) -> &ScrollReactor {
        &self.reactor
    }

    pub fn downgrade(&self) -> WeakScrollContainer {
        WeakScrollContainer {
            inner: self.inner.clone(),
            reactor: self.reactor.downgrade(),
            state: Rc::downgrade(&self.state),
        }
    }

    // =========================================================================
    // TEMPLATE AND BATCH
    // =========================================================================

    /// Set the node every item is cloned from; it is never modified
    pub fn configure_template(&self, template: NodeId) {
        self.state.template.set(Some(template));
    }

    pub fn template(&self) -> Option<NodeId> {
        self.state.template.get()
    }

    /// Stamp one item per row and make them the container's content
    ///
    /// On error nothing changes: the previous batch stays rendered.
    pub fn fill(&self, rows: &RowData) -> Result<()> {
        let template = self.state.template.get().ok_or(QuillError::NoTemplate);
        let outcome = template.and_then(|template| {
            let validators = Rc::clone(&*self.state.validators.borrow());
            let mut d = self.state.doc.write();
            let batch = stamp(&mut d, template, rows, validators.as_ref())?;

            let node = self.state.node;
            remove_items(&mut d, node, Some(template));
            for item in &batch {
                d.append_child(node, item.node);
            }
            Ok(batch)
        });

        match outcome {
            Ok(batch) => {
                tracing::debug!("rendered batch of {} items", batch.len());
                *self.state.rendered.borrow_mut() = batch;
                Ok(())
            }
            Err(e) => {
                tracing::warn!("fill rejected: {}", e);
                Err(e)
            }
        }
    }

    /// Current batch, in index order
    pub fn rendered(&self) -> Vec<RenderedNode> {
        self.state.rendered.borrow().clone()
    }

    /// Items whose top edge is inside the host viewport
    pub fn in_view(&self) -> Vec<RenderedNode> {
        self.state.visible()
    }

    // =========================================================================
    // OBSERVERS AND SCROLL
    // =========================================================================

    pub fn register_scroll_observer<F, Fut>(&self, observer: F)
    where
        F: Fn(f64) -> Fut + 'static,
        Fut: Future<Output = anyhow::Result<()>> + 'static,
    {
        self.reactor.register_scroll_observer(observer);
    }

    pub fn register_render_observer<F, Fut>(&self, observer: F)
    where
        F: Fn(f64) -> Fut + 'static,
        Fut: Future<Output = anyhow::Result<()>> + 'static,
    {
        self.reactor.register_render_observer(observer);
    }

    pub fn register_focus_observer<F>(&self, observer: F)
    where
        F: Fn(&FocusTransition) -> anyhow::Result<()> + 'static,
    {
        self.reactor.register_focus_observer(observer);
    }

    /// Host scroll notification: samples the viewport and feeds the reactor
    pub fn handle_scroll(&self) {
        self.reactor.on_scroll(self.state.viewport.scroll_y());
    }

    /// Feed an explicit scroll position
    pub fn on_scroll(&self, position: f64) {
        self.reactor.on_scroll(position);
    }

    /// Feed every position of a stream until it ends
    pub async fn drive<S>(&self, positions: S)
    where
        S: Stream<Item = f64>,
    {
        self.reactor.drive(positions).await;
    }

    pub fn focus(&self) -> FocusState {
        self.reactor.focus()
    }

    pub fn phase(&self) -> ReactorPhase {
        self.reactor.phase()
    }

    pub fn stats(&self) -> ReactorStats {
        self.reactor.stats()
    }

    // =========================================================================
    // LIFECYCLE
    // =========================================================================

    /// Remove every item, report focus loss, forget the focused element
    ///
    /// A template living inside the container is kept.
    pub fn clear(&self) {
        remove_items(
            &mut self.state.doc.write(),
            self.state.node,
            self.state.template.get(),
        );
        self.state.rendered.borrow_mut().clear();
        self.reactor.clear_focus();
        tracing::debug!("scroll container cleared");
    }

    /// Same as [`ScrollContainer::clear`]
    pub fn reset(&self) {
        self.clear();
    }

    /// Run `operation` with page scrolling suspended
    ///
    /// Sets `overflow: hidden` on the body, and on the document element
    /// unless `keep_document_scroll_state`. Both are cleared and the
    /// container re-enabled when the operation ends or is dropped.
    pub async fn disable_until<F>(&self, operation: F, keep_document_scroll_state: bool) -> F::Output
    where
        F: Future,
    {
        let _lock = ScrollLock::engage(&self.state, keep_document_scroll_state);
        operation.await
    }

    pub fn is_disabled(&self) -> bool {
        self.state.disabled.get()
    }
}

/// Destroy the children of `node`, sparing the one holding `template`
fn remove_items(d: &mut Document, node: NodeId, template: Option<NodeId>) {
    for child in d.children(node) {
        if !template.is_some_and(|t| d.is_inclusive_ancestor(child, t)) {
            d.destroy(child);
        }
    }
}

/// Restores page scrolling when dropped
struct ScrollLock {
    state: Rc<ContainerState>,
}

impl ScrollLock {
    fn engage(state: &Rc<ContainerState>, keep_document_scroll_state: bool) -> Self {
        state.disabled.set(true);
        {
            let mut d = state.doc.write();
            let (body, root) = (d.body(), d.root());
            d.set_style(body, "overflow", Some("hidden"));
            if !keep_document_scroll_state {
                d.set_style(root, "overflow", Some("hidden"));
            }
        }
        Self {
            state: Rc::clone(state),
        }
    }
}

impl Drop for ScrollLock {
    fn drop(&mut self) {
        match self.state.doc.try_write() {
            Some(mut d) => {
                let (body, root) = (d.body(), d.root());
                d.set_style(body, "overflow", None);
                d.set_style(root, "overflow", None);
            }
            None => tracing::warn!("document busy, page scrolling left suspended"),
        }
        self.state.disabled.set(false);
    }
}

/// Non-owning handle for observers that need to reach their container
#[derive(Clone)]
pub struct WeakScrollContainer {
    inner: View,
    reactor: WeakScrollReactor,
    state: Weak<ContainerState>,
}

impl WeakScrollContainer {
    pub fn upgrade(&self) -> Option<ScrollContainer> {
        Some(ScrollContainer {
            inner: self.inner.clone(),
            reactor: self.reactor.upgrade()?,
            state: self.state.upgrade()?,
        })
    }
}
