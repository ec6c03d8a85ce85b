//! Fixed overlay above an externally rendered viewport

use std::ops::Deref;

use quill_core::SharedDocument;

use crate::view::View;

/// What an overlay lets through to the viewport below it
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OverlayKind {
    /// Hidden, all events pass through
    None,
    /// Transparent, catches events
    EventsOnly,
    /// Opaque, lets events pass through
    ColorOnly,
    /// Transparent, lets events pass through; only its text shows
    TextOnly,
    /// Opaque, catches events
    Full,
    #[default]
    Default,
}

impl OverlayKind {
    /// Parse `none`, `events-only`, `color-only`, `text-only` or `full`;
    /// anything else is [`OverlayKind::Default`]
    pub fn from_name(name: &str) -> Self {
        match name {
            "none" => OverlayKind::None,
            "events-only" => OverlayKind::EventsOnly,
            "color-only" => OverlayKind::ColorOnly,
            "text-only" => OverlayKind::TextOnly,
            "full" => OverlayKind::Full,
            _ => OverlayKind::Default,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            OverlayKind::None => "none",
            OverlayKind::EventsOnly => "events-only",
            OverlayKind::ColorOnly => "color-only",
            OverlayKind::TextOnly => "text-only",
            OverlayKind::Full => "full",
            OverlayKind::Default => "default",
        }
    }

    fn styles(self) -> &'static [(&'static str, &'static str)] {
        match self {
            OverlayKind::None => &[("pointer-events", "none"), ("display", "none")],
            OverlayKind::EventsOnly => &[("background-color", "transparent")],
            OverlayKind::ColorOnly => &[("pointer-events", "none"), ("opacity", "1")],
            OverlayKind::TextOnly => &[
                ("pointer-events", "none"),
                ("background-color", "transparent"),
            ],
            OverlayKind::Full => &[("opacity", "1")],
            OverlayKind::Default => &[],
        }
    }
}

/// A `position: fixed` layer appended to the body
#[derive(Clone)]
pub struct ViewportOverlay {
    inner: View,
    kind: OverlayKind,
}

impl Deref for ViewportOverlay {
    type Target = View;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl ViewportOverlay {
    pub fn new(doc: &SharedDocument, kind: OverlayKind) -> Self {
        let inner = View::element(doc, &format!("div.viewport-overlay-{}", kind.name()));
        inner.css(kind.styles()).css(&[("position", "fixed")]);
        inner.mount_to_body();
        Self { inner, kind }
    }

    pub fn kind(&self) -> OverlayKind {
        self.kind
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name() {
        assert_eq!(OverlayKind::from_name("full"), OverlayKind::Full);
        assert_eq!(OverlayKind::from_name("text-only"), OverlayKind::TextOnly);
        assert_eq!(OverlayKind::from_name("webgl"), OverlayKind::Default);
    }

    #[test]
    fn test_overlay_is_fixed_on_body() {
        let doc = SharedDocument::new();
        let overlay = ViewportOverlay::new(&doc, OverlayKind::None);
        assert!(overlay.has_class("viewport-overlay-none"));
        assert_eq!(overlay.style("position").as_deref(), Some("fixed"));
        assert_eq!(overlay.style("display").as_deref(), Some("none"));
        let body = doc.read().body();
        assert_eq!(doc.read().parent(overlay.node()), Some(body));
    }

    #[test]
    fn test_default_overlay_has_no_extra_styles() {
        let doc = SharedDocument::new();
        let overlay = ViewportOverlay::new(&doc, OverlayKind::Default);
        assert_eq!(overlay.style("opacity"), None);
        assert_eq!(overlay.style("pointer-events"), None);
    }
}
