//! Domain-to-tenant resolution.

use crate::error::TenantError;
use async_trait::async_trait;
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;
use tenantauth_database::TenantRepository;
use tenantauth_models::Tenant;

#[async_trait]
pub trait TenantResolver: Send + Sync {
    /// Resolve the tenant owning `domain`.
    ///
    /// Fails with [`TenantError::NotIdentifiedOnDomain`] when no active tenant
    /// owns it.
    async fn resolve(&self, domain: &str) -> Result<Tenant, TenantError>;
}

/// Looks domains up in the `domains` table.
#[derive(Clone)]
pub struct DatabaseTenantResolver {
    tenants: TenantRepository,
}

impl DatabaseTenantResolver {
    pub fn new(tenants: TenantRepository) -> Self {
        Self { tenants }
    }
}

#[async_trait]
impl TenantResolver for DatabaseTenantResolver {
    async fn resolve(&self, domain: &str) -> Result<Tenant, TenantError> {
        match self.tenants.find_by_domain(domain).await? {
            Some(tenant) if tenant.is_active() => Ok(tenant),
            Some(tenant) => {
                tracing::info!(tenant = %tenant.slug, domain, "Ignoring inactive tenant");
                Err(TenantError::NotIdentifiedOnDomain(domain.to_string()))
            }
            None => Err(TenantError::NotIdentifiedOnDomain(domain.to_string())),
        }
    }
}

/// Caches successful resolutions of an inner resolver.
///
/// Misses are not cached so a freshly added domain is picked up on the next
/// request.
#[derive(Clone)]
pub struct CachedTenantResolver {
    inner: Arc<dyn TenantResolver>,
    cache: Cache<String, Tenant>,
}

impl CachedTenantResolver {
    pub fn new(inner: Arc<dyn TenantResolver>, ttl: Duration, max_capacity: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(ttl)
            .build();

        Self { inner, cache }
    }
}

#[async_trait]
impl TenantResolver for CachedTenantResolver {
    async fn resolve(&self, domain: &str) -> Result<Tenant, TenantError> {
        if let Some(tenant) = self.cache.get(domain).await {
            tracing::trace!(domain, "Tenant cache hit");
            return Ok(tenant);
        }

        let tenant = self.inner.resolve(domain).await?;
        self.cache.insert(domain.to_string(), tenant.clone()).await;
        Ok(tenant)
    }
}
