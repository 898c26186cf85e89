use std::thread;
use std::time::Duration;

use tracing::debug;

use crate::error::Result;

/// Outcome of one poll of an eventually-consistent endpoint.
#[derive(Debug, Clone, PartialEq)]
pub enum Poll<T> {
    Ready(T),
    NotReady,
}

/// Bounded retry with a fixed delay between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// Upper bound on time spent sleeping inside [`RetryPolicy::poll`].
    pub fn max_wait(&self) -> Duration {
        self.delay * self.max_attempts.saturating_sub(1)
    }

    /// Calls `attempt` until it is ready, errors, or attempts run out.
    ///
    /// Returns `Ok(Poll::NotReady)` when every attempt came back not ready;
    /// errors end the loop immediately.
    pub fn poll<T, F>(&self, mut attempt: F) -> Result<Poll<T>>
    where
        F: FnMut(u32) -> Result<Poll<T>>,
    {
        let attempts = self.max_attempts.max(1);
        for n in 1..=attempts {
            match attempt(n)? {
                Poll::Ready(value) => return Ok(Poll::Ready(value)),
                Poll::NotReady => {
                    debug!(attempt = n, of = attempts, "not ready yet");
                    if n < attempts && !self.delay.is_zero() {
                        thread::sleep(self.delay);
                    }
                }
            }
        }
        Ok(Poll::NotReady)
    }
}
