//! Quill Core
//!
//! Foundational pieces shared by every Quill widget:
//!
//! - **Document**: arena-backed display tree with classes, inline styles,
//!   attributes, deep clone, selector queries and host-written geometry
//! - **Events**: per-node listeners with bubbling dispatch
//! - **Host**: the [`Viewport`] trait through which the page is queried
//! - **Validation**: URL and markup checks gating injected values
//! - **Config**: `quill.toml` timing settings
//!
//! # Example
//!
//! ```rust
//! use quill_core::{EventKind, SharedDocument};
//!
//! let doc = SharedDocument::new();
//! let button = {
//!     let mut d = doc.write();
//!     let button = d.create_element("button");
//!     let body = d.body();
//!     d.append_child(body, button);
//!     d.set_text(button, "Save");
//!     button
//! };
//!
//! let weak = doc.downgrade();
//! doc.write().add_event_listener(button, EventKind::Click, move |event| {
//!     if let Some(doc) = weak.upgrade() {
//!         doc.write().set_text(event.target, "Saved");
//!     }
//! });
//!
//! doc.fire(button, EventKind::Click);
//! assert_eq!(doc.read().text_content(button), "Saved");
//! ```

pub mod config;
pub mod document;
pub mod error;
pub mod events;
pub mod host;
pub mod style;
pub mod validate;

pub use config::{ButtonSettings, QuillConfig, ScrollSettings, TooltipSettings};
pub use document::{Bounds, Document, NodeId};
pub use error::{QuillError, Result};
pub use events::{Event, EventCallback, EventKind, ListenerId, SharedDocument, WeakDocument};
pub use host::{StaticViewport, Viewport};
pub use style::{css_property, normalize_property, preset};
pub use validate::{choose_presentation, DefaultValidators, Validators};
