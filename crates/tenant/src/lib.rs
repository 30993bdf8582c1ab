// Tenant identification for inbound requests: host classification,
// domain-to-tenant resolution and the per-request tenant context.

pub mod context;
pub mod domain;
pub mod error;
pub mod extractor;
pub mod resolver;

pub use context::TenantContext;
pub use domain::{classify, normalize_host, CentralDomains, HostClass};
pub use error::TenantError;
pub use extractor::TenantExtractor;
pub use resolver::{CachedTenantResolver, DatabaseTenantResolver, TenantResolver};
