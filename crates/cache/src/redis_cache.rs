use crate::error::Result;
use crate::rate_limiter::{Hit, RateLimitStore};
use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands, Client, Script};
use serde::Deserialize;

/// Increment the window counter and make sure it expires.
///
/// Runs atomically, so a counter can never be left without a TTL. A counter
/// that somehow lost its TTL (-1) gets it re-armed on the next hit.
const HIT_SCRIPT: &str = r#"
local attempts = redis.call('INCR', KEYS[1])
local ttl = redis.call('TTL', KEYS[1])
if ttl < 0 then
    redis.call('EXPIRE', KEYS[1], ARGV[1])
    ttl = tonumber(ARGV[1])
end
return {attempts, ttl}
"#;

/// Current attempts; a counter without a TTL is a broken window and is dropped.
const ATTEMPTS_SCRIPT: &str = r#"
local attempts = tonumber(redis.call('GET', KEYS[1]) or '0')
if attempts > 0 and redis.call('TTL', KEYS[1]) == -1 then
    redis.call('DEL', KEYS[1])
    return 0
end
return attempts
"#;

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    pub url: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            url: "redis://localhost:6379".to_string(),
        }
    }
}

impl CacheConfig {
    pub fn from_env() -> Self {
        Self {
            url: std::env::var("REDIS_URL").unwrap_or_else(|_| Self::default().url),
        }
    }
}

#[derive(Clone)]
pub struct Cache {
    manager: ConnectionManager,
    hit_script: Script,
    attempts_script: Script,
}

impl Cache {
    pub async fn new(config: CacheConfig) -> Result<Self> {
        let client = Client::open(config.url)?;
        let manager = ConnectionManager::new(client).await?;

        Ok(Self {
            manager,
            hit_script: Script::new(HIT_SCRIPT),
            attempts_script: Script::new(ATTEMPTS_SCRIPT),
        })
    }

    pub async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.manager.clone();
        conn.del::<_, ()>(key).await?;
        Ok(())
    }

    /// Get TTL of a key (seconds remaining, negative when missing or persistent)
    pub async fn ttl(&self, key: &str) -> Result<i64> {
        let mut conn = self.manager.clone();
        let ttl: i64 = conn.ttl(key).await?;
        Ok(ttl)
    }

    /// Increment a counter and return it with its remaining TTL, arming the
    /// TTL in the same round trip.
    pub async fn incr_with_ttl(&self, key: &str, ttl_seconds: u64) -> Result<(i64, i64)> {
        let mut conn = self.manager.clone();
        let (value, ttl): (i64, i64) = self
            .hit_script
            .key(key)
            .arg(ttl_seconds)
            .invoke_async(&mut conn)
            .await?;
        Ok((value, ttl))
    }

    /// Ping Redis to check connection
    pub async fn ping(&self) -> Result<()> {
        let mut conn = self.manager.clone();
        redis::cmd("PING").query_async::<()>(&mut conn).await?;
        Ok(())
    }
}

fn window_hit(attempts: i64, ttl: i64, decay_seconds: u64) -> Hit {
    Hit {
        attempts: attempts.max(0) as u32,
        available_in: if ttl > 0 { ttl as u64 } else { decay_seconds },
    }
}

#[async_trait]
impl RateLimitStore for Cache {
    async fn hit(&self, key: &str, decay_seconds: u64) -> Result<Hit> {
        let (attempts, ttl) = self
            .incr_with_ttl(&rate_limit_key(key), decay_seconds)
            .await?;
        Ok(window_hit(attempts, ttl, decay_seconds))
    }

    async fn attempts(&self, key: &str) -> Result<u32> {
        let mut conn = self.manager.clone();
        let value: i64 = self
            .attempts_script
            .key(rate_limit_key(key))
            .invoke_async(&mut conn)
            .await?;
        Ok(value.max(0) as u32)
    }

    async fn available_in(&self, key: &str) -> Result<u64> {
        let ttl = self.ttl(&rate_limit_key(key)).await?;
        Ok(ttl.max(0) as u64)
    }

    async fn clear(&self, key: &str) -> Result<()> {
        self.delete(&rate_limit_key(key)).await
    }
}

pub fn rate_limit_key(identifier: &str) -> String {
    format!("ratelimit:{}", identifier)
}
