use thiserror::Error;

#[derive(Debug, Error)]
pub enum TenantError {
    /// No tenant owns the domain. Callers fall back to non-tenant handling.
    #[error("Tenant could not be identified on domain {0}")]
    NotIdentifiedOnDomain(String),

    #[error("Tenancy is already initialized for tenant {0}")]
    AlreadyInitialized(String),

    #[error("Tenant lookup failed: {0}")]
    Lookup(#[from] tenantauth_database::DatabaseError),
}
