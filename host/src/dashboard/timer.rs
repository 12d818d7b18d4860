//! ==============================================================================
//! timer.rs - cancellable recurring refresh timer
//! ==============================================================================
//!
//! purpose:
//!     owns at most one background tokio task that runs a tick, waits the
//!     period, runs the tick again, and so on. the period is measured from the
//!     end of a tick, so a slow backend never causes ticks to pile up.
//!
//!     start()  - stop whatever is running, then spawn a fresh task
//!     stop()   - abort the task and wait until it is gone
//!     reset()  - restart the stored tick from zero
//!
//!     live_count() counts tasks that are still alive (a guard inside the task
//!     decrements it when the task is dropped), which makes the "one timer"
//!     rule checkable from tests.
//!
//! ==============================================================================

use futures::future::BoxFuture;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

pub type Tick = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

pub struct RefreshTimer {
    period: Duration,
    tick: Option<Tick>,
    handle: Option<JoinHandle<()>>,
    live: Arc<AtomicUsize>,
}

/// decrements the live counter when the owning task is dropped
struct LiveGuard(Arc<AtomicUsize>);

impl Drop for LiveGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl RefreshTimer {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            tick: None,
            handle: None,
            live: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Replace any running task with one that runs `tick` now and then every period.
    pub async fn start(&mut self, tick: Tick) {
        self.stop().await;
        self.tick = Some(tick.clone());
        self.spawn(tick);
    }

    /// Cancel the running task, if any. Returns once the task has been dropped.
    pub async fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            // cancelled (or already finished) - either way it no longer runs
            let _ = handle.await;
        }
    }

    /// Restart the countdown with the last tick passed to `start`.
    pub async fn reset(&mut self) {
        self.stop().await;
        if let Some(tick) = self.tick.clone() {
            self.spawn(tick);
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    pub fn live_count(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    fn spawn(&mut self, tick: Tick) {
        self.live.fetch_add(1, Ordering::SeqCst);
        let guard = LiveGuard(self.live.clone());
        let period = self.period;
        self.handle = Some(tokio::spawn(async move {
            let _guard = guard;
            loop {
                tick().await;
                tokio::time::sleep(period).await;
            }
        }));
    }
}

impl Drop for RefreshTimer {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
