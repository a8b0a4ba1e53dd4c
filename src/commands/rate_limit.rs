//! Creation Rate Limiter
//!
//! Two rules guard todo creation: a minimum spacing between successful
//! creations and a ceiling per fixed window. Checking never records an
//! attempt; only `commit` does, once the creation actually went through.

use chrono::{DateTime, Duration, Utc};

use crate::config::Limits;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RateLimitError {
    #[error("Please wait before adding another todo")]
    TooFast,
    #[error("Too many todos added. Please wait a moment.")]
    TooMany,
}

#[derive(Debug, Clone)]
pub struct RateLimiter {
    min_interval: Duration,
    window: Duration,
    max_per_window: u32,
    last_success: Option<DateTime<Utc>>,
    count: u32,
    window_start: Option<DateTime<Utc>>,
}

impl RateLimiter {
    pub fn new(limits: &Limits) -> Self {
        Self {
            min_interval: Duration::milliseconds(limits.rate_min_interval_ms),
            window: Duration::milliseconds(limits.rate_window_ms),
            max_per_window: limits.rate_max_per_window,
            last_success: None,
            count: 0,
            window_start: None,
        }
    }

    /// May a creation happen at `now`? Starts a new window when the
    /// current one has run out or none was opened yet.
    pub fn check(&mut self, now: DateTime<Utc>) -> Result<(), RateLimitError> {
        if let Some(last) = self.last_success {
            if now - last < self.min_interval {
                return Err(RateLimitError::TooFast);
            }
        }

        let expired = match self.window_start {
            Some(start) => now - start > self.window,
            None => true,
        };
        if expired {
            self.count = 0;
            self.window_start = Some(now);
        }

        if self.count >= self.max_per_window {
            return Err(RateLimitError::TooMany);
        }
        Ok(())
    }

    /// Record a successful creation
    pub fn commit(&mut self, now: DateTime<Utc>) {
        self.last_success = Some(now);
        self.count += 1;
    }

    pub fn try_acquire(&mut self, now: DateTime<Utc>) -> Result<(), RateLimitError> {
        self.check(now)?;
        self.commit(now);
        Ok(())
    }

    pub fn count(&self) -> u32 {
        self.count
    }
}
