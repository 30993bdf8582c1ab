//! Tenant-aware guard resolution.
//!
//! Before handing out a guard, the factory works out whether the request
//! host belongs to a tenant and, if so, initializes the request's tenant
//! context so the guard (and everything after it) runs under that tenant.
//! Hosts that are not tenant hosts, and tenant hosts nobody owns, fall back
//! to the plain guard; neither fails the request.

use crate::error::Result;
use crate::guard::SessionGuard;
use crate::manager::GuardManager;
use std::sync::Arc;
use tenantauth_tenant::{classify, CentralDomains, HostClass, TenantContext, TenantError, TenantResolver};

#[derive(Debug, Clone, Default)]
pub struct GuardFactoryConfig {
    pub central_domains: CentralDomains,
    /// Look hosts outside every central domain up as custom tenant domains.
    pub resolve_custom_domains: bool,
    /// Guard to hand out; the manager's default when `None`.
    pub guard: Option<String>,
}

#[derive(Clone)]
pub struct TenantAwareGuardFactory {
    config: GuardFactoryConfig,
    resolver: Arc<dyn TenantResolver>,
    guards: GuardManager,
}

impl TenantAwareGuardFactory {
    pub fn new(
        config: GuardFactoryConfig,
        resolver: Arc<dyn TenantResolver>,
        guards: GuardManager,
    ) -> Self {
        Self {
            config,
            resolver,
            guards,
        }
    }

    pub fn central_domains(&self) -> &CentralDomains {
        &self.config.central_domains
    }

    /// Domain to resolve for `host`, or `None` when tenancy does not apply.
    fn tenant_domain(&self, host: &str) -> Option<String> {
        match classify(host, &self.config.central_domains) {
            HostClass::TenantCandidate(domain) => Some(domain),
            HostClass::ThirdParty if self.config.resolve_custom_domains => {
                Some(tenantauth_tenant::normalize_host(host))
            }
            class => {
                tracing::trace!(host, ?class, "Host is not a tenant domain");
                None
            }
        }
    }

    /// Resolve the guard for the current request.
    ///
    /// Initializes `tenancy` at most once: when it is already initialized the
    /// resolver is not consulted again.
    pub async fn make(
        &self,
        host: Option<&str>,
        tenancy: &mut TenantContext,
    ) -> Result<SessionGuard> {
        if !tenancy.is_initialized() {
            if let Some(domain) = host.and_then(|h| self.tenant_domain(h)) {
                match self.resolver.resolve(&domain).await {
                    Ok(tenant) => {
                        tenancy.initialize(tenant)?;
                    }
                    Err(TenantError::NotIdentifiedOnDomain(domain)) => {
                        tracing::debug!(%domain, "No tenant on domain, using plain guard");
                    }
                    Err(e) => return Err(e.into()),
                }
            }
        }

        self.guards
            .guard(self.config.guard.as_deref(), tenancy.tenant())
    }
}
