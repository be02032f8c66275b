//! Retry and busy-wait primitives.
//!
//! The camera exposes no event stream, so completion of a shutter, a mode
//! change or a transcode job is observed by re-reading a status field.  Both
//! loops here are bounded: [`RetryPolicy`] caps attempts with exponential
//! backoff, [`PollPolicy`] caps polls with a fixed interval (zero gives the
//! tight loop, one HTTP round trip per iteration).

use std::future::Future;
use std::time::Duration;

use log::{debug, warn};
use rand::Rng;

use crate::error::{GoProError, Result};

/// Bounded retry with exponential backoff, applied to transport failures only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts:    u32,
    pub initial_backoff: Duration,
    pub max_backoff:     Duration,
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (1-based), capped at `max_backoff`,
    /// plus up to 10% jitter.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(16);
        let base = self.initial_backoff.saturating_mul(1u32 << shift).min(self.max_backoff);
        let spread = (base.as_millis() / 10) as u64;
        let jitter = if spread == 0 { 0 } else { rand::thread_rng().gen_range(0..=spread) };
        base + Duration::from_millis(jitter)
    }

    /// Run `op` until it succeeds, fails with a non-transport error, or the
    /// attempt budget is spent.  The last error is returned on exhaustion.
    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(v) => return Ok(v),
                Err(e) if e.is_transport() && attempt < self.max_attempts => {
                    let delay = self.backoff(attempt);
                    warn!("{label}: attempt {attempt}/{} failed: {e}; retrying in {delay:?}", self.max_attempts);
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Bounded status polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval:  Duration,
    pub max_polls: u32,
}

impl PollPolicy {
    /// No delay between polls.
    pub fn tight(max_polls: u32) -> Self {
        Self { interval: Duration::ZERO, max_polls }
    }
}

/// Re-run `read` until `accept` holds for its value.  Returns the accepted
/// value and the number of reads made.  Read errors end the wait.
pub async fn poll_until<T, F, Fut, P>(
    policy: &PollPolicy,
    field:  &str,
    mut read: F,
    accept: P,
) -> Result<(T, u32)>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
    P: Fn(&T) -> bool,
{
    for poll in 1..=policy.max_polls {
        let value = read().await?;
        if accept(&value) {
            debug!("{field}: condition met after {poll} poll(s)");
            return Ok((value, poll));
        }
        if !policy.interval.is_zero() {
            tokio::time::sleep(policy.interval).await;
        }
    }
    Err(GoProError::PollExhausted { field: field.to_string(), polls: policy.max_polls })
}
