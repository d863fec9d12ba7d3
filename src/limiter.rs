//! Shared rate limiter: one gate for the whole process, enforcing both a
//! concurrency ceiling and a minimum spacing between dispatches.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::{Mutex, Semaphore};
use tokio::time::{self, Duration, Instant};

/// Gate shared by every worker. A task is dispatched only when
/// (a) fewer than `max_concurrent` scheduled tasks are unresolved, and
/// (b) at least `1/rate_per_second` seconds have passed since the most
/// recent dispatch through this limiter.
///
/// Waiters are served in arrival order per gate (semaphore and mutex both
/// queue fairly); no ordering is promised across workers racing each other.
#[derive(Debug)]
pub struct RateLimiter {
    slots: Semaphore,
    min_interval: Duration,
    last_dispatch: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(max_concurrent: usize, rate_per_second: f64) -> Arc<Self> {
        Arc::new(Self {
            slots: Semaphore::new(max_concurrent),
            min_interval: Duration::from_secs_f64(1.0 / rate_per_second),
            last_dispatch: Mutex::new(None),
        })
    }

    /// Blocks until both gating conditions hold, dispatches `task`, and
    /// frees the concurrency slot when it resolves — success or failure
    /// alike, so a failed request never leaks capacity.
    pub async fn schedule<F, T>(&self, task: F) -> T
    where
        F: Future<Output = T>,
    {
        // The semaphore is never closed, acquire cannot fail.
        let _slot = self.slots.acquire().await.unwrap();

        {
            // Holding the lock across the sleep serializes the spacing gate:
            // each waiter sleeps to its own deadline, stamps, then releases.
            let mut last = self.last_dispatch.lock().await;
            if let Some(previous) = *last {
                time::sleep_until(previous + self.min_interval).await;
            }
            *last = Some(Instant::now());
        }

        task.await
        // _slot drops here, releasing the concurrency slot.
    }
}
