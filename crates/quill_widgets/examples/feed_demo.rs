//! Feed Demo
//!
//! Stamps a small feed from JSON row data and scrolls through it on a
//! simulated host, logging every focus change.
//!
//! Run with: cargo run -p quill_widgets --example feed_demo

use std::rc::Rc;
use std::time::Duration;

use anyhow::Context;
use futures::stream::{self, StreamExt};
use quill_core::{Bounds, QuillConfig, SharedDocument, StaticViewport};
use quill_widgets::scroll::{RowData, ScrollContainer};
use tokio::task::LocalSet;

const ROWS: &str = r##"{
    "title": ["Harbour at dawn", "Night market", "Ridge walk", "Snow line", "Last ferry"],
    "clip": ["https://example.com/a.mp4", "not a url", "https://example.com/c.mp4",
             "https://example.com/d.mp4", "https://example.com/e.mp4"],
    "background-color": ["#102030", "#203040", "#304050", "#405060", "#506070"]
}"##;

const ITEM_HEIGHT: f64 = 300.0;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .context("Failed to build runtime")?;
    LocalSet::new().block_on(&runtime, run())
}

async fn run() -> anyhow::Result<()> {
    let config = QuillConfig::default();
    let doc = SharedDocument::new();
    let viewport = Rc::new(StaticViewport::new(800.0));
    let feed = ScrollContainer::new(&doc, viewport.clone(), config.scroll.clone());
    feed.mount_to_body();

    let template = {
        let mut d = doc.write();
        let card = d.create_element("article");
        d.set_style(card, "display", Some("none"));
        let title = d.create_element("h2");
        d.add_class(title, "title");
        let clip = d.create_element("video");
        d.add_class(clip, "clip");
        let source = d.create_element("source");
        d.append_child(clip, source);
        let play = d.create_element("button");
        d.add_class(play, "clip-toggle");
        for child in [title, clip, play] {
            d.append_child(card, child);
        }
        card
    };
    feed.configure_template(template);

    let rows: RowData = serde_json::from_str(ROWS).context("Failed to parse rows")?;
    feed.fill(&rows)?;

    feed.register_scroll_observer(|y| async move {
        tracing::trace!(y, "scrolled");
        Ok(())
    });
    feed.register_focus_observer(|t| {
        tracing::info!(
            index = t.index,
            total = t.total,
            previous = t.previous_index,
            dwell_ms = t.dwell_millis() as u64,
            "focus changed"
        );
        Ok(())
    });

    // Simulated host: scroll 0 -> 1200 in 20px steps every 16ms, pausing
    // halfway long enough for the feed to settle
    let positions = stream::iter((0..=60).map(|step| step as f64 * 20.0)).then(|y| {
        let doc = doc.clone();
        let viewport = viewport.clone();
        let feed = feed.clone();
        async move {
            let pause = if y == 600.0 { 500 } else { 16 };
            tokio::time::sleep(Duration::from_millis(pause)).await;
            viewport.set_scroll_y(y);
            let mut d = doc.write();
            for item in feed.rendered() {
                let top = item.index as f64 * ITEM_HEIGHT - y + 1.0;
                d.set_bounds(item.node, Bounds::vertical(top, ITEM_HEIGHT));
            }
            y
        }
    });
    feed.drive(positions).await;
    tokio::time::sleep(config.scroll.settle_delay() * 2).await;

    let stats = feed.stats();
    tracing::info!(
        events = stats.events,
        immediate = stats.immediate_runs,
        settles = stats.settle_runs,
        transitions = stats.focus_transitions,
        "feed finished"
    );

    feed.clear();
    Ok(())
}
