//! Dual-rate scroll reactor
//!
//! Every scroll sample feeds two pipelines, each allowed at most one
//! instance in flight:
//!
//! ```text
//! on_scroll(y)
//!   ├─ hot?  no → immediate: scroll observers (join_all) → render observer
//!   │        yes → dropped
//!   └─ warm? no → settle: sleep(settle_delay) → in-view set → focus observers
//!            yes → dropped
//! ```
//!
//! The settle timer is armed once per warm window and never re-armed by
//! later samples, so a continuous scroll still settles every `settle_delay`.
//! Both flags are released by guards, so observer errors and panics never
//! leave a pipeline stuck.
//!
//! Pipelines run as `spawn_local` tasks; [`ScrollReactor::on_scroll`] must be
//! called from inside a [`tokio::task::LocalSet`].

use std::cell::{Cell, RefCell};
use std::future::Future;
use std::rc::{Rc, Weak};
use std::time::Duration;

use futures::future::{join_all, LocalBoxFuture};
use futures::{FutureExt, Stream, StreamExt};
use tokio::time::Instant;

use super::focus::{FocusState, FocusTransition};
use super::stamp::RenderedNode;

/// Per-scroll observer, awaited before the render step
pub type ScrollObserver = Rc<dyn Fn(f64) -> LocalBoxFuture<'static, anyhow::Result<()>>>;

/// Focus-transition observer
pub type FocusObserver = Rc<dyn Fn(&FocusTransition) -> anyhow::Result<()>>;

/// What the settle pipeline measures
pub trait SettleProbe {
    /// Items whose top edge is inside the viewport, in batch order
    fn in_view(&self) -> Vec<RenderedNode>;

    /// Size of the current batch
    fn total(&self) -> usize;

    /// Inline opacity of an item
    fn opacity(&self, node: &RenderedNode) -> f64;
}

/// Which pipelines are in flight
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReactorPhase {
    Idle,
    ImmediateInFlight,
    SettlePending,
    ImmediateAndSettlePending,
}

/// Reactor counters
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReactorStats {
    /// Scroll samples received
    pub events: u64,
    /// Immediate pipeline instances started
    pub immediate_runs: u64,
    /// Samples that found an immediate pipeline in flight
    pub immediate_dropped: u64,
    /// Settle checks that fired
    pub settle_runs: u64,
    /// Samples that found a settle check pending
    pub settle_dropped: u64,
    /// Focus transitions reported
    pub focus_transitions: u64,
    /// Observer calls that returned an error
    pub observer_failures: u64,
}

#[derive(Clone, Copy, Debug)]
enum Flag {
    Hot,
    Warm,
}

struct ReactorInner {
    hot: Cell<bool>,
    warm: Cell<bool>,
    last_position: Cell<f64>,
    settle_delay: Duration,
    scroll_observers: RefCell<Vec<ScrollObserver>>,
    render_observer: RefCell<Option<ScrollObserver>>,
    focus_observers: RefCell<Vec<FocusObserver>>,
    focus: RefCell<FocusState>,
    /// Bumped whenever `focus` is replaced
    focus_generation: Cell<u64>,
    probe: RefCell<Option<Rc<dyn SettleProbe>>>,
    stats: Cell<ReactorStats>,
}

impl ReactorInner {
    fn bump_focus_generation(&self) {
        self.focus_generation.set(self.focus_generation.get().wrapping_add(1));
    }

    fn flag(&self, flag: Flag) -> &Cell<bool> {
        match flag {
            Flag::Hot => &self.hot,
            Flag::Warm => &self.warm,
        }
    }

    fn bump(&self, update: impl FnOnce(&mut ReactorStats)) {
        let mut stats = self.stats.get();
        update(&mut stats);
        self.stats.set(stats);
    }
}

/// Clears a pipeline flag when the pipeline ends, however it ends
struct FlagGuard {
    inner: Rc<ReactorInner>,
    flag: Flag,
}

impl FlagGuard {
    fn raise(inner: &Rc<ReactorInner>, flag: Flag) -> Self {
        inner.flag(flag).set(true);
        Self {
            inner: Rc::clone(inner),
            flag,
        }
    }
}

impl Drop for FlagGuard {
    fn drop(&mut self) {
        self.inner.flag(self.flag).set(false);
    }
}

/// Coalescing scroll scheduler owning the focus state of one container
#[derive(Clone)]
pub struct ScrollReactor {
    inner: Rc<ReactorInner>,
}

impl ScrollReactor {
    pub fn new(settle_delay: Duration) -> Self {
        Self {
            inner: Rc::new(ReactorInner {
                hot: Cell::new(false),
                warm: Cell::new(false),
                last_position: Cell::new(0.0),
                settle_delay,
                scroll_observers: RefCell::new(Vec::new()),
                render_observer: RefCell::new(None),
                focus_observers: RefCell::new(Vec::new()),
                focus: RefCell::new(FocusState::new(Instant::now())),
                focus_generation: Cell::new(0),
                probe: RefCell::new(None),
                stats: Cell::new(ReactorStats::default()),
            }),
        }
    }

    pub fn downgrade(&self) -> WeakScrollReactor {
        WeakScrollReactor(Rc::downgrade(&self.inner))
    }

    /// Source of in-view measurements for the settle pipeline
    pub fn set_probe(&self, probe: Rc<dyn SettleProbe>) {
        *self.inner.probe.borrow_mut() = Some(probe);
    }

    // =========================================================================
    // OBSERVERS
    // =========================================================================

    pub fn register_scroll_observer<F, Fut>(&self, observer: F)
    where
        F: Fn(f64) -> Fut + 'static,
        Fut: Future<Output = anyhow::Result<()>> + 'static,
    {
        let observer: ScrollObserver = Rc::new(move |y| observer(y).boxed_local());
        self.inner.scroll_observers.borrow_mut().push(observer);
    }

    /// Set the render observer, replacing the previous one
    pub fn register_render_observer<F, Fut>(&self, observer: F)
    where
        F: Fn(f64) -> Fut + 'static,
        Fut: Future<Output = anyhow::Result<()>> + 'static,
    {
        let observer: ScrollObserver = Rc::new(move |y| observer(y).boxed_local());
        *self.inner.render_observer.borrow_mut() = Some(observer);
    }

    pub fn register_focus_observer<F>(&self, observer: F)
    where
        F: Fn(&FocusTransition) -> anyhow::Result<()> + 'static,
    {
        self.inner.focus_observers.borrow_mut().push(Rc::new(observer));
    }

    // =========================================================================
    // EVENTS
    // =========================================================================

    /// Feed one scroll sample
    pub fn on_scroll(&self, position: f64) {
        let inner = &self.inner;
        inner.last_position.set(position);
        inner.bump(|s| s.events += 1);

        if inner.hot.get() {
            inner.bump(|s| s.immediate_dropped += 1);
            tracing::trace!("immediate pipeline busy, sample {} coalesced", position);
        } else {
            let guard = FlagGuard::raise(inner, Flag::Hot);
            inner.bump(|s| s.immediate_runs += 1);
            tokio::task::spawn_local(run_immediate(Rc::clone(inner), guard));
        }

        if inner.warm.get() {
            inner.bump(|s| s.settle_dropped += 1);
        } else {
            let guard = FlagGuard::raise(inner, Flag::Warm);
            tokio::task::spawn_local(run_settle(Rc::clone(inner), guard));
        }
    }

    /// Feed every sample of `positions` until the stream ends
    pub async fn drive<S>(&self, positions: S)
    where
        S: Stream<Item = f64>,
    {
        futures::pin_mut!(positions);
        while let Some(position) = positions.next().await {
            self.on_scroll(position);
        }
    }

    /// Report focus loss and forget the focused element
    ///
    /// Observers are notified only when an element was focused.
    pub fn clear_focus(&self) {
        let now = Instant::now();
        let state = *self.inner.focus.borrow();
        if let Some(previous) = state.current_element {
            let transition = FocusTransition {
                element: None,
                index: 0,
                total: 0,
                previous_element: Some(previous),
                previous_index: state.current_index,
                dwell: now.saturating_duration_since(state.view_started_at),
            };
            notify_focus(&self.inner, &transition);
        }
        self.inner.focus.borrow_mut().reset(now);
        self.inner.bump_focus_generation();
    }

    // =========================================================================
    // STATE
    // =========================================================================

    pub fn phase(&self) -> ReactorPhase {
        match (self.inner.hot.get(), self.inner.warm.get()) {
            (false, false) => ReactorPhase::Idle,
            (true, false) => ReactorPhase::ImmediateInFlight,
            (false, true) => ReactorPhase::SettlePending,
            (true, true) => ReactorPhase::ImmediateAndSettlePending,
        }
    }

    pub fn is_hot(&self) -> bool {
        self.inner.hot.get()
    }

    pub fn is_warm(&self) -> bool {
        self.inner.warm.get()
    }

    /// Most recent scroll sample
    pub fn last_position(&self) -> f64 {
        self.inner.last_position.get()
    }

    pub fn focus(&self) -> FocusState {
        *self.inner.focus.borrow()
    }

    pub fn settle_delay(&self) -> Duration {
        self.inner.settle_delay
    }

    pub fn stats(&self) -> ReactorStats {
        self.inner.stats.get()
    }
}

/// Non-owning handle to a [`ScrollReactor`]
#[derive(Clone)]
pub struct WeakScrollReactor(Weak<ReactorInner>);

impl WeakScrollReactor {
    pub fn upgrade(&self) -> Option<ScrollReactor> {
        self.0.upgrade().map(|inner| ScrollReactor { inner })
    }
}

async fn run_immediate(inner: Rc<ReactorInner>, _guard: FlagGuard) {
    let position = inner.last_position.get();
    let observers: Vec<ScrollObserver> = inner.scroll_observers.borrow().clone();
    let results = join_all(observers.iter().map(|observer| observer(position))).await;
    for (i, result) in results.into_iter().enumerate() {
        if let Err(e) = result {
            inner.bump(|s| s.observer_failures += 1);
            tracing::warn!("scroll observer {} failed: {:#}", i, e);
        }
    }

    let render = inner.render_observer.borrow().clone();
    match render {
        Some(render) => {
            let position = inner.last_position.get();
            if let Err(e) = render(position).await {
                inner.bump(|s| s.observer_failures += 1);
                tracing::warn!("render observer failed: {:#}", e);
            }
        }
        None => tracing::trace!("no render observer registered"),
    }
    tracing::trace!("immediate pipeline done at {}", position);
}

async fn run_settle(inner: Rc<ReactorInner>, _guard: FlagGuard) {
    tokio::time::sleep(inner.settle_delay).await;
    inner.bump(|s| s.settle_runs += 1);

    let probe = inner.probe.borrow().clone();
    let Some(probe) = probe else {
        return;
    };
    let in_view = probe.in_view();
    let now = Instant::now();
    let transition = inner
        .focus
        .borrow()
        .evaluate(&in_view, |n| probe.opacity(n), probe.total(), now);

    if let Some(transition) = transition {
        tracing::debug!(
            "focus {} -> {} after {:?}",
            transition.previous_index,
            transition.index,
            transition.dwell
        );
        let generation = inner.focus_generation.get();
        notify_focus(&inner, &transition);
        // An observer may have cleared the container meanwhile
        if inner.focus_generation.get() == generation {
            inner.focus.borrow_mut().apply(&transition, now);
            inner.bump_focus_generation();
        } else {
            tracing::debug!("focus replaced during notification, transition dropped");
        }
    }
}

fn notify_focus(inner: &ReactorInner, transition: &FocusTransition) {
    inner.bump(|s| s.focus_transitions += 1);
    let observers: Vec<FocusObserver> = inner.focus_observers.borrow().clone();
    for (i, observer) in observers.iter().enumerate() {
        if let Err(e) = observer(transition) {
            inner.bump(|s| s.observer_failures += 1);
            tracing::warn!("focus observer {} failed: {:#}", i, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::task::LocalSet;
    use tokio::time::sleep;

    const SETTLE: Duration = Duration::from_millis(200);

    #[tokio::test(start_paused = true)]
    async fn test_idle_until_first_sample() {
        let reactor = ScrollReactor::new(SETTLE);
        assert_eq!(reactor.phase(), ReactorPhase::Idle);
        assert_eq!(reactor.stats(), ReactorStats::default());
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_is_coalesced() {
        LocalSet::new()
            .run_until(async {
                let reactor = ScrollReactor::new(SETTLE);
                let seen = Rc::new(RefCell::new(Vec::new()));
                {
                    let seen = seen.clone();
                    reactor.register_scroll_observer(move |y| {
                        seen.borrow_mut().push(y);
                        async {
                            sleep(Duration::from_millis(50)).await;
                            Ok(())
                        }
                    });
                }
                for y in [10.0, 20.0, 30.0] {
                    reactor.on_scroll(y);
                }
                assert_eq!(reactor.phase(), ReactorPhase::ImmediateAndSettlePending);
                sleep(Duration::from_millis(60)).await;
                assert_eq!(reactor.phase(), ReactorPhase::SettlePending);
                sleep(SETTLE).await;
                assert_eq!(reactor.phase(), ReactorPhase::Idle);

                // The pipeline started on the first sample but reads the latest position
                assert_eq!(*seen.borrow(), vec![30.0]);
                let stats = reactor.stats();
                assert_eq!(stats.events, 3);
                assert_eq!(stats.immediate_runs, 1);
                assert_eq!(stats.immediate_dropped, 2);
                assert_eq!(stats.settle_runs, 1);
                assert_eq!(stats.settle_dropped, 2);
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_render_runs_after_every_observer() {
        LocalSet::new()
            .run_until(async {
                let reactor = ScrollReactor::new(SETTLE);
                let log = Rc::new(RefCell::new(Vec::new()));
                for (name, delay) in [("slow", 40), ("fast", 5)] {
                    let log = log.clone();
                    reactor.register_scroll_observer(move |_| {
                        let log = log.clone();
                        async move {
                            sleep(Duration::from_millis(delay)).await;
                            log.borrow_mut().push(name);
                            Ok(())
                        }
                    });
                }
                {
                    let log = log.clone();
                    reactor.register_render_observer(move |_| {
                        log.borrow_mut().push("render");
                        async { Ok(()) }
                    });
                }
                reactor.on_scroll(1.0);
                sleep(Duration::from_millis(100)).await;
                assert_eq!(*log.borrow(), vec!["fast", "slow", "render"]);
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_observer_releases_flag() {
        LocalSet::new()
            .run_until(async {
                let reactor = ScrollReactor::new(SETTLE);
                let renders = Rc::new(Cell::new(0));
                reactor.register_scroll_observer(|_| async { anyhow::bail!("observer broke") });
                {
                    let renders = renders.clone();
                    reactor.register_render_observer(move |_| {
                        renders.set(renders.get() + 1);
                        async { Ok(()) }
                    });
                }
                reactor.on_scroll(5.0);
                tokio::task::yield_now().await;
                assert!(!reactor.is_hot());
                assert_eq!(renders.get(), 1);

                reactor.on_scroll(6.0);
                tokio::task::yield_now().await;
                assert_eq!(reactor.stats().immediate_runs, 2);
                assert_eq!(reactor.stats().observer_failures, 2);
                assert_eq!(renders.get(), 2);
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicking_observer_releases_flag() {
        LocalSet::new()
            .run_until(async {
                let reactor = ScrollReactor::new(SETTLE);
                reactor.register_scroll_observer(|y| async move {
                    if y > 0.0 {
                        panic!("observer panicked");
                    }
                    Ok(())
                });
                reactor.on_scroll(5.0);
                tokio::task::yield_now().await;
                assert!(!reactor.is_hot());
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_drive_consumes_stream() {
        LocalSet::new()
            .run_until(async {
                let reactor = ScrollReactor::new(SETTLE);
                reactor
                    .drive(futures::stream::iter(vec![1.0, 2.0, 3.0, 4.0]))
                    .await;
                assert_eq!(reactor.stats().events, 4);
                assert_eq!(reactor.last_position(), 4.0);
            })
            .await;
    }

    struct FixedProbe {
        visible: RefCell<Vec<RenderedNode>>,
    }

    impl SettleProbe for FixedProbe {
        fn in_view(&self) -> Vec<RenderedNode> {
            self.visible.borrow().clone()
        }

        fn total(&self) -> usize {
            10
        }

        fn opacity(&self, _node: &RenderedNode) -> f64 {
            1.0
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_settle_reports_transition_and_clear_reports_loss() {
        LocalSet::new()
            .run_until(async {
                let mut doc = quill_core::Document::new();
                let node = doc.create_element("div");
                let item = RenderedNode { index: 3, node };

                let reactor = ScrollReactor::new(SETTLE);
                reactor.set_probe(Rc::new(FixedProbe {
                    visible: RefCell::new(vec![item]),
                }));
                let seen = Rc::new(RefCell::new(Vec::new()));
                {
                    let seen = seen.clone();
                    reactor.register_focus_observer(move |t| {
                        seen.borrow_mut().push(*t);
                        Ok(())
                    });
                }
                reactor.register_focus_observer(|_| anyhow::bail!("ignored"));

                reactor.on_scroll(300.0);
                sleep(SETTLE + Duration::from_millis(1)).await;
                assert_eq!(seen.borrow().len(), 1);
                assert_eq!(seen.borrow()[0].element, Some(item));
                assert_eq!(seen.borrow()[0].total, 10);
                assert_eq!(reactor.focus().current_index, 3);

                reactor.clear_focus();
                assert_eq!(seen.borrow().len(), 2);
                assert_eq!(seen.borrow()[1].element, None);
                assert_eq!(seen.borrow()[1].previous_element, Some(item));
                assert_eq!(reactor.focus().current_index, 0);

                reactor.clear_focus();
                assert_eq!(seen.borrow().len(), 2);
            })
            .await;
    }

    #[test]
    fn test_instances_do_not_share_flags() {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .start_paused(true)
            .build()
            .unwrap();
        LocalSet::new().block_on(&runtime, async {
            let a = ScrollReactor::new(SETTLE);
            let b = ScrollReactor::new(SETTLE);
            a.on_scroll(1.0);
            assert!(a.is_hot());
            assert!(!b.is_hot());
            assert_eq!(b.phase(), ReactorPhase::Idle);
        });
    }
}
