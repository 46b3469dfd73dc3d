//! Cooperative cancellation for typing runs.
//!
//! A run is driven by a single worker thread that polls a shared flag at
//! every suspension point. The flag is write-once-effective: any number of
//! holders may call [`CancellationToken::cancel`], repeated calls are
//! no-ops, and the worker only ever reads it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Upper bound on any single uninterrupted sleep inside a run.
///
/// Every configured wait (countdown steps, character pacing, inter-message
/// delay) is decomposed into sub-waits of at most this size, with the token
/// checked before each one. Worst-case stop latency is therefore one
/// sub-wait, no matter how large the configured delay is.
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Shared stop signal for one typing run.
///
/// Cloning is cheap and all clones observe the same flag.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent and safe from any thread.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// Has cancellation been requested?
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Sleep for `total`, waking early on cancellation.
    ///
    /// The sleep is chunked into [`POLL_INTERVAL`] sub-waits and the flag is
    /// checked before each chunk. Returns `true` if cancellation was
    /// observed, either before sleeping or part-way through.
    pub fn sleep(&self, total: Duration) -> bool {
        let mut remaining = total;
        while !remaining.is_zero() {
            if self.is_cancelled() {
                return true;
            }
            let step = remaining.min(POLL_INTERVAL);
            thread::sleep(step);
            remaining = remaining.saturating_sub(step);
        }
        self.is_cancelled()
    }
}
