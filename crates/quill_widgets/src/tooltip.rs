//! Floating tooltip attached to a target element

use std::cell::RefCell;
use std::ops::Deref;
use std::rc::Rc;

use tokio::task::JoinHandle;

use quill_core::{EventKind, NodeId, SharedDocument, TooltipSettings, Viewport};

use crate::view::{Child, View};

const DETAIL_LINES: usize = 3;

/// A title, a description and three detail lines, shown while the pointer
/// is over the target
#[derive(Clone)]
pub struct Tooltip {
    inner: View,
    title: NodeId,
    description: NodeId,
    details: [NodeId; DETAIL_LINES],
    settings: Rc<TooltipSettings>,
    auto_hide: Rc<RefCell<Option<JoinHandle<()>>>>,
}

impl Deref for Tooltip {
    type Target = View;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl Tooltip {
    pub fn new(
        doc: &SharedDocument,
        target: NodeId,
        viewport: Rc<dyn Viewport>,
        settings: TooltipSettings,
    ) -> Self {
        let title = View::element(doc, "strong.title");
        let description = View::element(doc, "em.description");
        let details = [
            View::element(doc, "span.detail"),
            View::element(doc, "span.detail"),
            View::element(doc, "span.detail"),
        ];

        let mut children = vec![Child::from(&title), Child::from(&description)];
        children.extend(details.iter().map(Child::from));
        let inner = View::with_children(doc, children);
        inner
            .css_class("tooltip")
            .font("menu")
            .color("black", "white")
            .css(&[("width", settings.width.as_str())]);
        hide(doc, inner.node());
        inner.mount_to_body();

        let tooltip = Self {
            title: title.node(),
            description: description.node(),
            details: details.map(|d| d.node()),
            inner,
            settings: Rc::new(settings),
            auto_hide: Rc::default(),
        };

        for (kind, visible) in [(EventKind::PointerEnter, true), (EventKind::PointerLeave, false)] {
            let weak = doc.downgrade();
            let node = tooltip.node();
            let viewport = Rc::clone(&viewport);
            doc.write().add_event_listener(target, kind, move |_| {
                if !viewport.has_focus() {
                    return;
                }
                if let Some(doc) = weak.upgrade() {
                    if visible {
                        show(&doc, node);
                    } else {
                        hide(&doc, node);
                    }
                }
            });
        }
        tooltip
    }

    /// Set the title and blank out every other line
    pub fn set_title(&self, title: &str) -> &Self {
        let mut d = self.doc().write();
        d.set_text(self.title, title);
        d.set_text(self.description, " ");
        for detail in self.details {
            d.set_text(detail, " ");
        }
        self
    }

    pub fn title(&self) -> String {
        self.doc().read().text_content(self.title)
    }

    pub fn set_description(&self, description: &str) -> &Self {
        self.doc().write().set_text(self.description, description);
        self
    }

    pub fn description(&self) -> String {
        self.doc().read().text_content(self.description)
    }

    /// Set detail line `index`; out of range indices are ignored
    pub fn set_detail(&self, index: usize, text: &str) -> &Self {
        match self.details.get(index) {
            Some(node) => self.doc().write().set_text(*node, text),
            None => tracing::debug!(index, "tooltip has no such detail line"),
        }
        self
    }

    pub fn detail(&self, index: usize) -> Option<String> {
        self.details
            .get(index)
            .map(|node| self.doc().read().text_content(*node))
    }

    /// Position the tooltip left of `(x, y)` and restart the auto-hide timer
    ///
    /// Must be called from within a `LocalSet`.
    pub fn update(&self, x: f64, y: f64) {
        let left = format!("calc({}px - {})", x - 20.0, self.settings.width);
        let top = format!("{y}px");
        self.css(&[("left", left.as_str()), ("top", top.as_str())]);

        if let Some(previous) = self.auto_hide.borrow_mut().take() {
            previous.abort();
        }
        let weak = self.weak_doc();
        let node = self.node();
        let delay = self.settings.auto_hide();
        let handle = tokio::task::spawn_local(async move {
            tokio::time::sleep(delay).await;
            if let Some(doc) = weak.upgrade() {
                hide(&doc, node);
            }
        });
        *self.auto_hide.borrow_mut() = Some(handle);
    }

    pub fn show(&self) {
        show(self.doc(), self.node());
    }

    pub fn hide(&self) {
        hide(self.doc(), self.node());
    }

    pub fn is_visible(&self) -> bool {
        self.style("opacity").as_deref() == Some("1")
    }
}

fn show(doc: &SharedDocument, node: NodeId) {
    let mut d = doc.write();
    d.set_style(node, "transform", Some("translateX(0)"));
    d.set_style(node, "opacity", Some("1"));
}

fn hide(doc: &SharedDocument, node: NodeId) {
    let mut d = doc.write();
    d.set_style(node, "transform", Some("translateX(-50px)"));
    d.set_style(node, "opacity", Some("0"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_core::StaticViewport;
    use std::time::Duration;
    use tokio::task::LocalSet;

    fn setup() -> (SharedDocument, NodeId, Rc<StaticViewport>, Tooltip) {
        let doc = SharedDocument::new();
        let target = View::element(&doc, "div.target");
        target.mount_to_body();
        let viewport = Rc::new(StaticViewport::default());
        let tooltip = Tooltip::new(
            &doc,
            target.node(),
            viewport.clone(),
            TooltipSettings::default(),
        );
        (doc, target.node(), viewport, tooltip)
    }

    #[test]
    fn test_starts_hidden() {
        let (_doc, _target, _viewport, tooltip) = setup();
        assert!(!tooltip.is_visible());
        assert!(tooltip.has_class("tooltip"));
        assert_eq!(tooltip.style("width").as_deref(), Some("200px"));
        assert_eq!(
            tooltip.style("transform").as_deref(),
            Some("translateX(-50px)")
        );
    }

    #[test]
    fn test_pointer_shows_and_hides() {
        let (doc, target, _viewport, tooltip) = setup();
        doc.fire(target, EventKind::PointerEnter);
        assert!(tooltip.is_visible());
        doc.fire(target, EventKind::PointerLeave);
        assert!(!tooltip.is_visible());
    }

    #[test]
    fn test_unfocused_page_ignores_pointer() {
        let (doc, target, viewport, tooltip) = setup();
        viewport.set_focused(false);
        doc.fire(target, EventKind::PointerEnter);
        assert!(!tooltip.is_visible());
    }

    #[test]
    fn test_set_title_clears_lines() {
        let (_doc, _target, _viewport, tooltip) = setup();
        tooltip
            .set_description("old")
            .set_detail(0, "a")
            .set_detail(2, "c")
            .set_detail(7, "ignored");
        assert_eq!(tooltip.detail(2).as_deref(), Some("c"));
        assert_eq!(tooltip.detail(7), None);

        tooltip.set_title("Flags");
        assert_eq!(tooltip.title(), "Flags");
        assert_eq!(tooltip.description(), " ");
        assert_eq!(tooltip.detail(0).as_deref(), Some(" "));
    }

    #[tokio::test(start_paused = true)]
    async fn test_update_positions_and_auto_hides() {
        LocalSet::new()
            .run_until(async {
                let (_doc, _target, _viewport, tooltip) = setup();
                tooltip.show();
                tooltip.update(120.0, 40.0);
                assert_eq!(
                    tooltip.style("left").as_deref(),
                    Some("calc(100px - 200px)")
                );
                assert_eq!(tooltip.style("top").as_deref(), Some("40px"));

                tokio::time::sleep(Duration::from_millis(4000)).await;
                tooltip.update(130.0, 40.0);
                tokio::time::sleep(Duration::from_millis(4000)).await;
                assert!(tooltip.is_visible());

                tokio::time::sleep(Duration::from_millis(1500)).await;
                assert!(!tooltip.is_visible());
            })
            .await;
    }
}
