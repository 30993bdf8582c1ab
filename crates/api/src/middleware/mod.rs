pub mod rate_limit;
pub mod session;
pub mod tenancy;

pub use rate_limit::{throttle, RateLimiterRegistry, ThrottleRequest};
pub use session::{start_session, SessionHandle};
pub use tenancy::resolve_guard;
