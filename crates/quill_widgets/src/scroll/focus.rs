//! Focused-item bookkeeping
//!
//! The focused item is the one the user is presumably looking at. It is
//! re-evaluated by the settle pipeline; every change is reported once as a
//! [`FocusTransition`].

use std::time::Duration;

use tokio::time::Instant;

use super::stamp::RenderedNode;

/// Which rendered item currently holds focus, and since when
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FocusState {
    pub current_element: Option<RenderedNode>,
    /// Index of the first in-view item at the last transition, 0 when none
    pub current_index: usize,
    pub view_started_at: Instant,
}

impl FocusState {
    pub fn new(now: Instant) -> Self {
        Self {
            current_element: None,
            current_index: 0,
            view_started_at: now,
        }
    }

    /// Compute the transition for a freshly measured in-view set
    ///
    /// Returns `None` when the first in-view index did not change. The new
    /// element is the first in-view item that is not fully transparent,
    /// unless that is the element already focused.
    pub fn evaluate(
        &self,
        in_view: &[RenderedNode],
        opacity: impl Fn(&RenderedNode) -> f64,
        total: usize,
        now: Instant,
    ) -> Option<FocusTransition> {
        let index = in_view.first().map(|n| n.index).unwrap_or(0);
        if index == self.current_index {
            return None;
        }
        let candidate = in_view.iter().find(|n| opacity(*n) != 0.0).copied();
        let element = if candidate == self.current_element {
            None
        } else {
            candidate
        };
        Some(FocusTransition {
            element,
            index,
            total,
            previous_element: self.current_element,
            previous_index: self.current_index,
            dwell: now.saturating_duration_since(self.view_started_at),
        })
    }

    /// Record a transition reported at `now`
    pub fn apply(&mut self, transition: &FocusTransition, now: Instant) {
        self.current_element = transition.element;
        self.current_index = transition.index;
        self.view_started_at = now;
    }

    /// Forget the focused element
    pub fn reset(&mut self, now: Instant) {
        *self = Self::new(now);
    }
}

/// A change of the focused item, as reported to focus observers
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FocusTransition {
    /// Newly focused item, `None` on focus loss or when it was already focused
    pub element: Option<RenderedNode>,
    pub index: usize,
    /// Number of items in the current batch
    pub total: usize,
    pub previous_element: Option<RenderedNode>,
    pub previous_index: usize,
    /// How long the previous item held focus
    pub dwell: Duration,
}

impl FocusTransition {
    pub fn dwell_millis(&self) -> u128 {
        self.dwell.as_millis()
    }
}
