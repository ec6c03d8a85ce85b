//! Quill Widgets
//!
//! Retained widgets over a [`quill_core::Document`], headed by
//! [`ScrollContainer`]: a list stamped from row data whose focused item
//! follows the scroll position.
//!
//! # Example
//!
//! ```ignore
//! use quill_widgets::prelude::*;
//!
//! let doc = SharedDocument::new();
//! let viewport = Rc::new(StaticViewport::new(800.0));
//! let feed = ScrollContainer::new(&doc, viewport, ScrollSettings::default());
//! feed.configure_template(template);
//! feed.fill(&RowData::new().with("title", vec![json!("First"), json!("Second")]))?;
//! feed.register_focus_observer(|t| {
//!     tracing::info!(index = t.index, dwell_ms = t.dwell_millis(), "focus");
//!     Ok(())
//! });
//! ```
//!
//! Everything is single-threaded: handles are `Rc`-based and asynchronous
//! work runs on a tokio `LocalSet`.

pub mod button;
pub mod link;
pub mod modal;
pub mod overlay;
pub mod scroll;
pub mod text;
pub mod tooltip;
pub mod view;

pub use button::{Button, Shortcut, Toggle};
pub use link::{merge_query, Link, LinkTarget, Slider, SliderRange, Textfield};
pub use modal::{Dropdown, Modal};
pub use overlay::{OverlayKind, ViewportOverlay};
pub use scroll::{
    FocusTransition, ReactorPhase, ReactorStats, RenderedNode, RowData, ScrollContainer,
    ScrollReactor, WeakScrollContainer,
};
pub use text::Text;
pub use tooltip::Tooltip;
pub use view::{Child, View};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::button::{Button, Shortcut, Toggle};
    pub use crate::link::{Link, LinkTarget, Slider, SliderRange, Textfield};
    pub use crate::modal::{Dropdown, Modal};
    pub use crate::overlay::{OverlayKind, ViewportOverlay};
    pub use crate::scroll::{FocusTransition, RenderedNode, RowData, ScrollContainer};
    pub use crate::text::Text;
    pub use crate::tooltip::Tooltip;
    pub use crate::view::{Child, View};

    pub use quill_core::{
        EventKind, NodeId, QuillConfig, ScrollSettings, SharedDocument, StaticViewport,
        Viewport,
    };
}
