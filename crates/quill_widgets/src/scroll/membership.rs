//! Viewport membership
//!
//! A node is in view when its top edge lies strictly inside
//! `(0, viewport_height)`. Only the top edge is considered: a tall node whose
//! top scrolled above the viewport is out of view even if it still covers it.

use quill_core::Document;

use super::stamp::RenderedNode;

/// Whether a top offset lies inside the viewport band
pub fn top_in_band(top: f64, viewport_height: f64) -> bool {
    top > 0.0 && top < viewport_height
}

/// Nodes whose top edge is inside the viewport, in batch order
///
/// Nodes that no longer exist are skipped.
pub fn in_view(doc: &Document, nodes: &[RenderedNode], viewport_height: f64) -> Vec<RenderedNode> {
    nodes
        .iter()
        .filter(|n| doc.contains(n.node) && top_in_band(n.bounds(doc).top, viewport_height))
        .copied()
        .collect()
}
