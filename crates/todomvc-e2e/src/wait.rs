// Bounded polling
//
// Evaluate, sleep, re-evaluate until the observation is accepted or the
// deadline passes. The last observation is returned either way so callers can
// report what they actually saw.

use crate::error::Result;
use std::future::Future;
use std::time::{Duration, Instant};

/// Default timeout for assertions (5 seconds, matching Playwright)
pub const DEFAULT_ASSERTION_TIMEOUT: Duration = Duration::from_secs(5);

/// Default polling interval for assertions (100ms)
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Outcome of a bounded poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Polled<T> {
    /// The observation was accepted before the deadline
    Matched(T),
    /// The deadline passed; carries the last observation
    TimedOut(T),
}

/// Polls `probe` until `accept` returns true or `timeout` elapses.
///
/// The probe always runs at least once, even with a zero timeout. Errors from
/// the probe end the poll immediately: a strict-mode violation will not go
/// away by waiting.
pub async fn poll_until<T, F, Fut, A>(
    timeout: Duration,
    interval: Duration,
    mut probe: F,
    accept: A,
) -> Result<Polled<T>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
    A: Fn(&T) -> bool,
{
    let start = Instant::now();

    loop {
        let observed = probe().await?;

        if accept(&observed) {
            return Ok(Polled::Matched(observed));
        }

        if start.elapsed() >= timeout {
            return Ok(Polled::TimedOut(observed));
        }

        // Never sleep past the deadline
        let remaining = timeout.saturating_sub(start.elapsed());
        tokio::time::sleep(interval.min(remaining)).await;
    }
}
