//! Time source for version candidates and backoff waits.

use std::time::Duration;

use assetlift_transport::BoxFuture;

/// Wall clock and sleep, injectable so backoff runs without real delays.
pub trait Clock: Send + Sync {
    /// Seconds since the Unix epoch.
    fn now_unix(&self) -> i64;

    fn sleep(&self, duration: Duration) -> BoxFuture<'_, ()>;
}

/// [`Clock`] backed by the system time and the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_unix(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }

    fn sleep(&self, duration: Duration) -> BoxFuture<'_, ()> {
        Box::pin(tokio::time::sleep(duration))
    }
}
