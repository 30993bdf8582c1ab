pub mod error;
pub mod memory;
pub mod rate_limiter;
pub mod redis_cache;

pub use error::{CacheError, Result};
pub use memory::MemoryStore;
pub use rate_limiter::{Attempt, Hit, Limit, RateLimitStore, RateLimiter};
pub use redis_cache::{rate_limit_key, Cache, CacheConfig};
