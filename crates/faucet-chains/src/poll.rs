//! Cancellable fixed-interval polling.
//!
//! [`poll_until`] runs an attempt once per interval until it yields a value,
//! fails terminally, or the paired [`CancelHandle`] fires. The first attempt
//! happens one full interval after the call, and cancellation is checked
//! before every attempt.

use crate::error::{ChainError, ChainResult};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::debug;

/// Create a linked cancel handle and cancellation signal.
pub fn cancellation() -> (CancelHandle, Cancellation) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx: Arc::new(tx) }, Cancellation { rx })
}

/// Fires the paired [`Cancellation`].
#[derive(Debug, Clone)]
pub struct CancelHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

/// Observed by long-running waits. Cloning yields another observer of the
/// same signal.
#[derive(Debug, Clone)]
pub struct Cancellation {
    rx: watch::Receiver<bool>,
}

impl Cancellation {
    /// A signal that never fires.
    pub fn never() -> Self {
        let (_, cancellation) = cancellation();
        cancellation
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once cancelled. Pends forever if every handle is dropped
    /// without cancelling.
    pub async fn cancelled(&mut self) {
        if self.rx.wait_for(|cancelled| *cancelled).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Run `attempt` every `interval` until it returns `Ok(Some(_))`.
///
/// `Ok(None)` means "not yet" and waits for the next tick. Errors are
/// terminal; callers that want to ride out transient failures map them to
/// `Ok(None)` inside the attempt.
pub async fn poll_until<T, F, Fut>(
    interval: Duration,
    mut cancel: Cancellation,
    mut attempt: F,
) -> ChainResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ChainResult<Option<T>>>,
{
    if interval.is_zero() {
        return Err(ChainError::Config("poll interval must be non-zero".to_string()));
    }
    if cancel.is_cancelled() {
        return Err(ChainError::Cancelled);
    }

    let mut ticker = time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut attempts: u64 = 0;
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ChainError::Cancelled),
            _ = ticker.tick() => {}
        }

        attempts += 1;
        debug!("Poll attempt {}", attempts);

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ChainError::Cancelled),
            outcome = attempt() => {
                if let Some(value) = outcome? {
                    return Ok(value);
                }
            }
        }
    }
}
