//! Minimum-interval pacing for rate-limited upstream dependencies.
//!
//! The public forward-geocoding endpoint asks for at most one request per
//! second per client; [`MinInterval`] enforces a configurable spacing
//! across every concurrent task sharing one resolver.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// Serializes callers so that consecutive `wait` returns are at least
/// `interval` apart. The first caller proceeds immediately.
#[derive(Debug)]
pub struct MinInterval {
    interval: Duration,
    last: Mutex<Option<Instant>>,
}

impl MinInterval {
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: Mutex::new(None),
        }
    }

    /// Sleeps until at least `interval` has passed since the previous
    /// caller was released. Holding the lock across the sleep is what
    /// spaces concurrent callers out instead of releasing them as a herd.
    pub async fn wait(&self) {
        let mut last = self.last.lock().await;
        if let Some(previous) = *last {
            let next_allowed = previous + self.interval;
            let now = Instant::now();
            if next_allowed > now {
                tokio::time::sleep(next_allowed - now).await;
            }
        }
        *last = Some(Instant::now());
    }
}
