//! Scroll-driven list rendering
//!
//! - [`inject`]: validated substitution of one field into one slot
//! - [`stamp`]: one template clone per row of structure-of-arrays data
//! - [`membership`]: which items are in view (top edge only)
//! - [`focus`]: the focused item and its transitions
//! - [`reactor`]: the immediate and settle pipelines behind every scroll sample
//! - [`container`]: the widget tying it all together

pub mod container;
pub mod focus;
pub mod inject;
pub mod membership;
pub mod reactor;
pub mod stamp;

pub use container::{ScrollContainer, WeakScrollContainer};
pub use focus::{FocusState, FocusTransition};
pub use inject::{inject, Injection, Slot, SlotKind};
pub use membership::in_view;
pub use reactor::{
    FocusObserver, ReactorPhase, ReactorStats, ScrollObserver, ScrollReactor, SettleProbe,
    WeakScrollReactor,
};
pub use stamp::{stamp, RenderedNode, RowData};
