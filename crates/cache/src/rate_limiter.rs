//! Fixed-window attempt limiting.
//!
//! A [`Limit`] says how many attempts a bucket key may make per decay window.
//! The [`RateLimiter`] records attempts in a [`RateLimitStore`]; the first hit
//! on a key opens a window of `decay_seconds`, and once `max_attempts` hits
//! have landed inside the window further attempts are refused until it ends.

use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Outcome of recording one attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hit {
    /// Attempts recorded in the current window, including this one.
    pub attempts: u32,
    /// Seconds until the current window closes.
    pub available_in: u64,
}

/// Counter storage backing the limiter.
#[async_trait]
pub trait RateLimitStore: Send + Sync {
    /// Record an attempt, opening a new window when none is active.
    async fn hit(&self, key: &str, decay_seconds: u64) -> Result<Hit>;

    /// Attempts recorded in the active window, 0 when there is none.
    async fn attempts(&self, key: &str) -> Result<u32>;

    /// Seconds until the active window closes, 0 when there is none.
    async fn available_in(&self, key: &str) -> Result<u64>;

    async fn clear(&self, key: &str) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Limit {
    pub key: String,
    pub max_attempts: u32,
    pub decay_seconds: u64,
}

impl Limit {
    pub fn per_minute(max_attempts: u32) -> Self {
        Self::per_seconds(max_attempts, 60)
    }

    pub fn per_seconds(max_attempts: u32, decay_seconds: u64) -> Self {
        Self {
            key: String::new(),
            max_attempts,
            decay_seconds,
        }
    }

    /// Bucket attempts by `key`.
    pub fn by(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }
}

/// Decision for a single attempt against a limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attempt {
    Allowed { remaining: u32 },
    TooMany { retry_after: u64 },
}

#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn RateLimitStore>,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn RateLimitStore>) -> Self {
        Self { store }
    }

    /// Check `limit` for the named policy and record the attempt when allowed.
    ///
    /// Buckets are namespaced by policy so two policies sharing a key never
    /// share a counter.
    pub async fn attempt(&self, policy: &str, limit: &Limit) -> Result<Attempt> {
        let key = format!("{}:{}", policy, limit.key);

        if self.store.attempts(&key).await? >= limit.max_attempts {
            let retry_after = self.store.available_in(&key).await?;
            return Ok(Attempt::TooMany {
                retry_after: if retry_after == 0 {
                    limit.decay_seconds
                } else {
                    retry_after
                },
            });
        }

        let hit = self.store.hit(&key, limit.decay_seconds).await?;
        if hit.attempts > limit.max_attempts {
            // Lost a race with a concurrent attempt on the same bucket
            return Ok(Attempt::TooMany {
                retry_after: hit.available_in,
            });
        }

        Ok(Attempt::Allowed {
            remaining: limit.max_attempts - hit.attempts,
        })
    }

    pub async fn clear(&self, policy: &str, key: &str) -> Result<()> {
        self.store.clear(&format!("{}:{}", policy, key)).await
    }
}
