//! Host environment queries
//!
//! The toolkit never owns a window. Everything it needs to know about the
//! surrounding page comes through [`Viewport`].

use std::cell::{Cell, RefCell};

/// Page-level state provided by the host
pub trait Viewport {
    /// Current vertical scroll offset of the page
    fn scroll_y(&self) -> f64;

    /// Height of the visible viewport
    fn inner_height(&self) -> f64;

    /// Whether the page currently has input focus
    fn has_focus(&self) -> bool {
        true
    }

    /// Query string of the current location, with or without the leading `?`
    fn location_search(&self) -> String {
        String::new()
    }
}

/// A [`Viewport`] whose values are set by hand
///
/// Used by headless hosts and tests.
#[derive(Debug)]
pub struct StaticViewport {
    scroll_y: Cell<f64>,
    inner_height: Cell<f64>,
    focused: Cell<bool>,
    search: RefCell<String>,
}

impl StaticViewport {
    pub fn new(inner_height: f64) -> Self {
        Self {
            scroll_y: Cell::new(0.0),
            inner_height: Cell::new(inner_height),
            focused: Cell::new(true),
            search: RefCell::new(String::new()),
        }
    }

    pub fn set_scroll_y(&self, y: f64) {
        self.scroll_y.set(y);
    }

    pub fn set_inner_height(&self, height: f64) {
        self.inner_height.set(height);
    }

    pub fn set_focused(&self, focused: bool) {
        self.focused.set(focused);
    }

    pub fn set_location_search(&self, search: &str) {
        *self.search.borrow_mut() = search.to_string();
    }
}

impl Default for StaticViewport {
    fn default() -> Self {
        Self::new(800.0)
    }
}

impl Viewport for StaticViewport {
    fn scroll_y(&self) -> f64 {
        self.scroll_y.get()
    }

    fn inner_height(&self) -> f64 {
        self.inner_height.get()
    }

    fn has_focus(&self) -> bool {
        self.focused.get()
    }

    fn location_search(&self) -> String {
        self.search.borrow().clone()
    }
}
