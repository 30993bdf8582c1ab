use crate::error::Result;
use crate::rate_limiter::{Hit, RateLimitStore};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};

#[derive(Debug, Clone, Copy)]
struct Window {
    attempts: u32,
    expires_at: Instant,
}

impl Window {
    fn remaining(&self, now: Instant) -> u64 {
        let left = self.expires_at.saturating_duration_since(now);
        // Round up so a live window never reports 0 seconds
        left.as_secs() + u64::from(left.subsec_nanos() > 0)
    }
}

/// In-process counter store, used when no Redis URL is configured.
#[derive(Clone, Default)]
pub struct MemoryStore {
    windows: Arc<Mutex<HashMap<String, Window>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a background task that drops closed windows.
    pub fn start_cleanup_task(&self, interval_secs: u64) {
        let windows = Arc::clone(&self.windows);
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(Duration::from_secs(interval_secs)).await;
                let now = Instant::now();
                let mut windows = windows.lock().await;
                let before = windows.len();
                windows.retain(|_, w| w.expires_at > now);
                let removed = before - windows.len();
                if removed > 0 {
                    tracing::debug!("Rate limit cleanup: removed {} closed windows", removed);
                }
            }
        });
    }

    async fn live_window(&self, key: &str) -> Option<Window> {
        let now = Instant::now();
        self.windows
            .lock()
            .await
            .get(key)
            .copied()
            .filter(|w| w.expires_at > now)
    }
}

#[async_trait]
impl RateLimitStore for MemoryStore {
    async fn hit(&self, key: &str, decay_seconds: u64) -> Result<Hit> {
        let now = Instant::now();
        let mut windows = self.windows.lock().await;

        let window = windows
            .entry(key.to_string())
            .and_modify(|w| {
                if w.expires_at <= now {
                    *w = Window {
                        attempts: 0,
                        expires_at: now + Duration::from_secs(decay_seconds),
                    };
                }
            })
            .or_insert(Window {
                attempts: 0,
                expires_at: now + Duration::from_secs(decay_seconds),
            });
        window.attempts += 1;

        Ok(Hit {
            attempts: window.attempts,
            available_in: window.remaining(now),
        })
    }

    async fn attempts(&self, key: &str) -> Result<u32> {
        Ok(self.live_window(key).await.map(|w| w.attempts).unwrap_or(0))
    }

    async fn available_in(&self, key: &str) -> Result<u64> {
        Ok(self
            .live_window(key)
            .await
            .map(|w| w.remaining(Instant::now()))
            .unwrap_or(0))
    }

    async fn clear(&self, key: &str) -> Result<()> {
        self.windows.lock().await.remove(key);
        Ok(())
    }
}
