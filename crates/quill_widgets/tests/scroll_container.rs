//! End-to-end behaviour of the scroll container

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use quill_core::{Bounds, NodeId, QuillError, ScrollSettings, SharedDocument, StaticViewport};
use quill_widgets::scroll::{FocusTransition, RenderedNode, RowData, ScrollContainer};
use serde_json::json;
use tokio::task::LocalSet;
use tokio::time::sleep;

const SETTLE: Duration = Duration::from_millis(200);

struct Fixture {
    doc: SharedDocument,
    viewport: Rc<StaticViewport>,
    feed: ScrollContainer,
    transitions: Rc<RefCell<Vec<FocusTransition>>>,
}

impl Fixture {
    fn new() -> Self {
        let doc = SharedDocument::new();
        let viewport = Rc::new(StaticViewport::new(800.0));
        let feed = ScrollContainer::new(&doc, viewport.clone(), ScrollSettings::default());
        feed.mount_to_body();

        let transitions = Rc::new(RefCell::new(Vec::new()));
        {
            let transitions = transitions.clone();
            feed.register_focus_observer(move |t| {
                transitions.borrow_mut().push(*t);
                Ok(())
            });
        }
        Self {
            doc,
            viewport,
            feed,
            transitions,
        }
    }

    /// Template with one markup slot per field
    fn template(&self, fields: &[&str]) -> NodeId {
        let mut d = self.doc.write();
        let card = d.create_element("article");
        d.set_style(card, "display", Some("none"));
        for field in fields {
            let slot = d.create_element("span");
            d.add_class(slot, field);
            d.append_child(card, slot);
        }
        card
    }

    /// Fill `count` items and return them
    fn items(&self, count: usize) -> Vec<RenderedNode> {
        let template = self.template(&["title"]);
        self.feed.configure_template(template);
        let titles = (0..count).map(|i| json!(format!("item {i}"))).collect();
        self.feed
            .fill(&RowData::new().with("title", titles))
            .unwrap();
        self.feed.rendered()
    }

    /// Place each item's top edge, 100px tall
    fn layout(&self, items: &[RenderedNode], tops: &[f64]) {
        let mut d = self.doc.write();
        for (item, top) in items.iter().zip(tops) {
            d.set_bounds(item.node, Bounds::vertical(*top, 100.0));
        }
    }

    fn slot_text(&self, item: &RenderedNode, field: &str) -> Option<String> {
        let d = self.doc.read();
        d.query_selector(item.node, &format!(".{field}"))
            .map(|slot| d.text_content(slot))
    }
}

// ============================================================================
// Reactor behaviour
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_immediate_pipeline_never_overlaps() {
    LocalSet::new()
        .run_until(async {
            let fx = Fixture::new();
            let active = Rc::new(Cell::new(0u32));
            let peak = Rc::new(Cell::new(0u32));
            {
                let (active, peak) = (active.clone(), peak.clone());
                fx.feed.register_scroll_observer(move |_| {
                    let (active, peak) = (active.clone(), peak.clone());
                    async move {
                        active.set(active.get() + 1);
                        peak.set(peak.get().max(active.get()));
                        sleep(Duration::from_millis(50)).await;
                        active.set(active.get() - 1);
                        Ok(())
                    }
                });
            }

            for i in 0..30 {
                fx.feed.on_scroll(i as f64 * 10.0);
                sleep(Duration::from_millis(10)).await;
            }
            sleep(Duration::from_millis(500)).await;

            assert_eq!(peak.get(), 1);
            assert_eq!(active.get(), 0);
            let stats = fx.feed.stats();
            assert_eq!(stats.events, 30);
            assert!(stats.immediate_runs > 1);
            assert_eq!(stats.immediate_runs + stats.immediate_dropped, 30);
            assert!(!fx.feed.reactor().is_hot());
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn test_failing_observer_releases_pipeline() {
    LocalSet::new()
        .run_until(async {
            let fx = Fixture::new();
            let calls = Rc::new(Cell::new(0));
            {
                let calls = calls.clone();
                fx.feed.register_scroll_observer(move |_| {
                    calls.set(calls.get() + 1);
                    async { Err(anyhow::anyhow!("observer failed")) }
                });
            }

            fx.feed.on_scroll(10.0);
            sleep(Duration::from_millis(1)).await;
            assert!(!fx.feed.reactor().is_hot());

            fx.feed.on_scroll(20.0);
            sleep(Duration::from_millis(1)).await;
            assert_eq!(calls.get(), 2);
            let stats = fx.feed.stats();
            assert_eq!(stats.immediate_runs, 2);
            assert_eq!(stats.observer_failures, 2);
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn test_settle_fires_once_per_quiet_window() {
    LocalSet::new()
        .run_until(async {
            let fx = Fixture::new();
            fx.items(3);

            // 24 samples, 30ms apart, spanning 690ms
            for i in 0..24 {
                fx.feed.on_scroll(i as f64);
                sleep(Duration::from_millis(30)).await;
            }
            sleep(Duration::from_millis(300)).await;

            let stats = fx.feed.stats();
            assert_eq!(stats.settle_runs, 4);
            assert_eq!(stats.settle_dropped, 20);
            assert!(!fx.feed.reactor().is_warm());
        })
        .await;
}

// ============================================================================
// Focus
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_dwell_time_between_transitions() {
    LocalSet::new()
        .run_until(async {
            let fx = Fixture::new();
            let items = fx.items(3);

            fx.layout(&items, &[-150.0, 100.0, 300.0]);
            fx.feed.on_scroll(150.0);
            sleep(Duration::from_millis(1000)).await;

            fx.layout(&items, &[-350.0, -100.0, 100.0]);
            fx.feed.on_scroll(350.0);
            sleep(Duration::from_millis(500)).await;

            let transitions = fx.transitions.borrow();
            assert_eq!(transitions.len(), 2);

            assert_eq!(transitions[0].index, 1);
            assert_eq!(transitions[0].element, Some(items[1]));
            assert_eq!(transitions[0].total, 3);
            assert!(transitions[0].dwell_millis().abs_diff(200) <= 5);

            assert_eq!(transitions[1].index, 2);
            assert_eq!(transitions[1].previous_index, 1);
            assert_eq!(transitions[1].previous_element, Some(items[1]));
            assert_eq!(transitions[1].element, Some(items[2]));
            assert!(transitions[1].dwell_millis().abs_diff(1000) <= 5);
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn test_same_element_is_not_refocused() {
    LocalSet::new()
        .run_until(async {
            let fx = Fixture::new();
            let items = fx.items(3);

            fx.layout(&items, &[-50.0, 100.0, 300.0]);
            fx.feed.on_scroll(50.0);
            sleep(SETTLE * 2).await;

            // Item 0 comes back into view but is fully transparent
            fx.doc
                .write()
                .set_style(items[0].node, "opacity", Some("0"));
            fx.layout(&items, &[50.0, 100.0, 300.0]);
            fx.feed.on_scroll(0.0);
            sleep(SETTLE * 2).await;

            let transitions = fx.transitions.borrow();
            assert_eq!(transitions.len(), 2);
            assert_eq!(transitions[0].element, Some(items[1]));
            assert_eq!(transitions[1].index, 0);
            assert_eq!(transitions[1].previous_index, 1);
            assert_eq!(transitions[1].element, None);
            assert_eq!(fx.feed.focus().current_index, 0);
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn test_clear_reports_focus_loss_once() {
    LocalSet::new()
        .run_until(async {
            let fx = Fixture::new();
            let items = fx.items(2);

            fx.layout(&items, &[-50.0, 100.0]);
            fx.feed.on_scroll(50.0);
            sleep(SETTLE * 2).await;
            assert_eq!(fx.feed.focus().current_index, 1);
            assert_eq!(fx.transitions.borrow().len(), 1);

            sleep(Duration::from_millis(600)).await;
            fx.feed.clear();

            let transitions = fx.transitions.borrow();
            assert_eq!(transitions.len(), 2);
            let loss = transitions[1];
            assert_eq!(loss.element, None);
            assert_eq!(loss.previous_element, Some(items[1]));
            assert_eq!(loss.previous_index, 1);
            assert!(loss.dwell_millis() >= 600);

            let focus = fx.feed.focus();
            assert_eq!(focus.current_index, 0);
            assert_eq!(focus.current_element, None);
            assert!(fx.feed.rendered().is_empty());
            assert!(fx.feed.children().is_empty());
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn test_clear_from_focus_observer_wins() {
    LocalSet::new()
        .run_until(async {
            let fx = Fixture::new();
            let items = fx.items(2);
            {
                let weak = fx.feed.downgrade();
                fx.feed.register_focus_observer(move |t| {
                    if t.element.is_some() {
                        if let Some(feed) = weak.upgrade() {
                            feed.clear();
                        }
                    }
                    Ok(())
                });
            }

            fx.layout(&items, &[-50.0, 100.0]);
            fx.feed.on_scroll(50.0);
            sleep(SETTLE * 2).await;

            assert_eq!(fx.transitions.borrow().len(), 1);
            let focus = fx.feed.focus();
            assert_eq!(focus.current_element, None);
            assert_eq!(focus.current_index, 0);
            assert!(!fx.doc.read().contains(items[1].node));

            // Nothing focused, so a second clear stays silent
            fx.feed.clear();
            assert_eq!(fx.transitions.borrow().len(), 1);
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn test_clear_without_focus_is_silent() {
    LocalSet::new()
        .run_until(async {
            let fx = Fixture::new();
            fx.items(2);
            fx.feed.clear();
            assert!(fx.transitions.borrow().is_empty());
        })
        .await;
}

// ============================================================================
// Fill
// ============================================================================

#[test]
fn test_refill_after_clear_with_template_inside() {
    let fx = Fixture::new();
    let template = fx.template(&["title"]);
    fx.feed.append(template);
    fx.feed.configure_template(template);
    fx.feed
        .fill(&RowData::new().with("title", vec![json!("a"), json!("b")]))
        .unwrap();

    fx.feed.clear();
    assert!(fx.doc.read().contains(template));

    fx.feed
        .fill(&RowData::new().with("title", vec![json!("c")]))
        .unwrap();
    let items = fx.feed.rendered();
    assert_eq!(items.len(), 1);
    assert_eq!(fx.slot_text(&items[0], "title").as_deref(), Some("c"));
}

#[test]
fn test_fill_is_row_aligned() {
    let fx = Fixture::new();
    let template = fx.template(&["a", "b"]);
    fx.feed.configure_template(template);
    fx.feed
        .fill(
            &RowData::new()
                .with("a", vec![json!(1), json!(2)])
                .with("b", vec![json!("x"), json!("y")]),
        )
        .unwrap();

    let items = fx.feed.rendered();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].index, 0);
    assert_eq!(items[1].index, 1);
    assert_eq!(fx.slot_text(&items[0], "a").as_deref(), Some("1"));
    assert_eq!(fx.slot_text(&items[0], "b").as_deref(), Some("x"));
    assert_eq!(fx.slot_text(&items[1], "a").as_deref(), Some("2"));
    assert_eq!(fx.slot_text(&items[1], "b").as_deref(), Some("y"));

    let d = fx.doc.read();
    assert_eq!(d.attribute(items[1].node, "id"), Some("1"));
    assert_eq!(d.style(items[0].node, "display"), None);
    assert_eq!(d.style(template, "display"), Some("none"));
    assert_eq!(d.text_content(template), "");
}

#[test]
fn test_rejected_media_source_removes_slot_and_toggle() {
    let fx = Fixture::new();
    let template = {
        let mut d = fx.doc.write();
        let card = d.create_element("article");
        let media = d.create_element("video");
        d.add_class(media, "src");
        let source = d.create_element("source");
        d.append_child(media, source);
        let toggle = d.create_element("button");
        d.add_class(toggle, "src-toggle");
        d.append_child(card, media);
        d.append_child(card, toggle);
        card
    };
    fx.feed.configure_template(template);
    fx.feed
        .fill(&RowData::new().with("src", vec![json!("not a url")]))
        .unwrap();

    let item = fx.feed.rendered()[0];
    let d = fx.doc.read();
    assert!(d.contains(item.node));
    assert_eq!(d.query_selector(item.node, ".src"), None);
    assert_eq!(d.query_selector(item.node, ".src-toggle"), None);
    assert_eq!(d.query_selector(item.node, "source"), None);
}

#[test]
fn test_mismatched_rows_leave_batch_untouched() {
    let fx = Fixture::new();
    let before = fx.items(2);
    let children = fx.feed.children();

    let result = fx.feed.fill(
        &RowData::new()
            .with("a", vec![json!(1), json!(2)])
            .with("b", vec![json!(1)]),
    );
    assert!(matches!(result, Err(QuillError::LengthMismatch { .. })));
    assert_eq!(fx.feed.rendered(), before);
    assert_eq!(fx.feed.children(), children);
    assert!(before.iter().all(|item| fx.doc.read().contains(item.node)));
}

// ============================================================================
// Membership
// ============================================================================

#[test]
fn test_membership_bounds_are_exclusive() {
    let fx = Fixture::new();
    let items = fx.items(4);
    fx.layout(&items, &[0.0, 400.0, 800.0, 799.5]);
    assert_eq!(fx.feed.in_view(), vec![items[1], items[3]]);

    fx.viewport.set_inner_height(1000.0);
    assert_eq!(fx.feed.in_view(), vec![items[1], items[2], items[3]]);
}
