//! Cooperative cancellation for monitoring tasks.
//!
//! A monitoring task never gets dropped mid-cycle to stop it: the manager
//! trips its [`CancelToken`] and then joins the task, which notices the
//! token at its next suspension point and runs its normal cleanup.

use core::cell::Cell;
use core::time::Duration;

use async_io_mini::Timer;
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_sync::signal::Signal;
use futures_lite::future;

/// Single-executor cancellation flag with an awaitable edge.
///
/// The flag is sticky: once cancelled, every later check and wait
/// resolves immediately.
pub struct CancelToken {
    cancelled: Cell<bool>,
    signal: Signal<NoopRawMutex, ()>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self {
            cancelled: Cell::new(false),
            signal: Signal::new(),
        }
    }

    pub fn cancel(&self) {
        self.cancelled.set(true);
        self.signal.signal(());
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }

    /// Resolves once [`cancel`](Self::cancel) has been called.
    pub async fn cancelled(&self) {
        if self.is_cancelled() {
            return;
        }
        self.signal.wait().await;
    }

    /// Sleep for `period` unless cancelled first.
    /// Returns `true` if the sleep was cut short by cancellation.
    pub async fn sleep(&self, period: Duration) -> bool {
        future::or(
            async {
                self.cancelled().await;
                true
            },
            async {
                Timer::after(period).await;
                false
            },
        )
        .await
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}
