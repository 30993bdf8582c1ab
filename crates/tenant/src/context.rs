// Per-request tenant context

use crate::error::TenantError;
use tenantauth_models::Tenant;
use uuid::Uuid;

/// Which tenant, if any, the current request runs under.
///
/// Created uninitialized by the request pipeline and initialized at most
/// once. Handlers downstream of guard resolution read it from the request
/// extensions, so they all observe the same tenant.
#[derive(Debug, Clone, Default)]
pub struct TenantContext {
    tenant: Option<Tenant>,
}

impl TenantContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_initialized(&self) -> bool {
        self.tenant.is_some()
    }

    pub fn initialize(&mut self, tenant: Tenant) -> Result<&Tenant, TenantError> {
        if let Some(current) = &self.tenant {
            return Err(TenantError::AlreadyInitialized(current.slug.clone()));
        }

        tracing::debug!(tenant = %tenant.slug, "Tenancy initialized");
        Ok(self.tenant.insert(tenant))
    }

    pub fn tenant(&self) -> Option<&Tenant> {
        self.tenant.as_ref()
    }

    pub fn tenant_id(&self) -> Option<Uuid> {
        self.tenant.as_ref().map(|t| t.id)
    }

    /// Tear the context down, returning the tenant that was active.
    pub fn end(&mut self) -> Option<Tenant> {
        self.tenant.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn tenant(slug: &str) -> Tenant {
        Tenant {
            id: Uuid::new_v4(),
            slug: slug.to_string(),
            name: slug.to_uppercase(),
            status: "active".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_starts_uninitialized() {
        let context = TenantContext::new();
        assert!(!context.is_initialized());
        assert!(context.tenant_id().is_none());
    }

    #[test]
    fn test_initialize_once() {
        let mut context = TenantContext::new();
        let acme = tenant("acme");
        let acme_id = acme.id;

        context.initialize(acme).unwrap();
        assert_eq!(context.tenant_id(), Some(acme_id));

        let err = context.initialize(tenant("globex")).unwrap_err();
        assert!(matches!(err, TenantError::AlreadyInitialized(slug) if slug == "acme"));
        assert_eq!(context.tenant_id(), Some(acme_id));
    }

    #[test]
    fn test_end_tears_down() {
        let mut context = TenantContext::new();
        context.initialize(tenant("acme")).unwrap();

        let ended = context.end().unwrap();
        assert_eq!(ended.slug, "acme");
        assert!(!context.is_initialized());
    }
}
