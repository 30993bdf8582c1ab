// In-memory collaborators for driving the router without Postgres or Redis

use crate::config::{AuthConfig, SessionConfig, TenancyConfig};
use crate::session::SessionManager;
use crate::{provider, AppState};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tenantauth_auth::{PasswordHasher, UserActions, UserProvider};
use tenantauth_cache::{MemoryStore, RateLimiter};
use tenantauth_database::DatabaseError;
use tenantauth_models::{Tenant, User};
use tenantauth_tenant::{TenantError, TenantExtractor, TenantResolver};
use uuid::Uuid;

pub const CENTRAL_DOMAIN: &str = "example.com";
pub const TENANT_DOMAIN: &str = "acme.example.com";
pub const PASSWORD: &str = "Secret123";
pub const TWO_FACTOR_SECRET: &str = "JBSWY3DPEHPK3PXP";

pub struct MemoryTenants {
    domains: HashMap<String, Tenant>,
    failing: bool,
}

#[async_trait]
impl TenantResolver for MemoryTenants {
    async fn resolve(&self, domain: &str) -> Result<Tenant, TenantError> {
        if self.failing {
            return Err(TenantError::Lookup(DatabaseError::Other(
                "connection refused".to_string(),
            )));
        }
        self.domains
            .get(domain)
            .cloned()
            .ok_or_else(|| TenantError::NotIdentifiedOnDomain(domain.to_string()))
    }
}

#[derive(Default)]
pub struct MemoryUsers {
    users: Vec<User>,
}

#[async_trait]
impl UserProvider for MemoryUsers {
    async fn retrieve_by_id(
        &self,
        tenant_id: Option<Uuid>,
        id: Uuid,
    ) -> tenantauth_auth::Result<Option<User>> {
        Ok(self
            .users
            .iter()
            .find(|u| u.tenant_id == tenant_id && u.id == id)
            .cloned())
    }

    async fn retrieve_by_email(
        &self,
        tenant_id: Option<Uuid>,
        email: &str,
    ) -> tenantauth_auth::Result<Option<User>> {
        Ok(self
            .users
            .iter()
            .find(|u| u.tenant_id == tenant_id && u.email == email)
            .cloned())
    }
}

pub fn tenant(slug: &str) -> Tenant {
    Tenant {
        id: Uuid::new_v4(),
        slug: slug.to_string(),
        name: slug.to_string(),
        status: "active".to_string(),
        created_at: Utc::now(),
    }
}

pub fn user(tenant_id: Option<Uuid>, email: &str) -> User {
    User {
        id: Uuid::new_v4(),
        tenant_id,
        name: "Test User".to_string(),
        email: email.to_string(),
        password_hash: PasswordHasher::hash(PASSWORD).unwrap(),
        two_factor_secret: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn two_factor_user(email: &str) -> User {
    let mut user = user(None, email);
    user.two_factor_secret = Some(TWO_FACTOR_SECRET.to_string());
    user
}

/// One central user, one `acme` tenant user and two central two-factor users.
pub struct TestApp {
    pub tenant: Tenant,
    pub resolver: Arc<dyn TenantResolver>,
    pub users: Arc<dyn UserProvider>,
    pub trust_forwarded_for: bool,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_resolver(false)
    }

    /// Every tenant lookup fails as if the database were down.
    pub fn with_failing_resolver() -> Self {
        Self::with_resolver(true)
    }

    fn with_resolver(failing: bool) -> Self {
        let tenant = tenant("acme");

        let users = MemoryUsers {
            users: vec![
                user(None, "central@example.com"),
                user(Some(tenant.id), "jane@acme.test"),
                two_factor_user("otp@example.com"),
                two_factor_user("otp2@example.com"),
            ],
        };

        let resolver = MemoryTenants {
            domains: HashMap::from([(TENANT_DOMAIN.to_string(), tenant.clone())]),
            failing,
        };

        Self {
            tenant,
            resolver: Arc::new(resolver),
            users: Arc::new(users),
            trust_forwarded_for: false,
        }
    }

    pub fn trusting_forwarded_for(mut self) -> Self {
        self.trust_forwarded_for = true;
        self
    }

    pub fn state(&self) -> Arc<AppState> {
        let tenancy = TenancyConfig {
            central_domains: vec![CENTRAL_DOMAIN.to_string()],
            resolve_custom_domains: true,
            cache_ttl_seconds: 60,
            trust_forwarded_host: false,
        };

        let sessions = SessionManager::new(&SessionConfig {
            secret: "0123456789abcdef0123456789abcdef".to_string(),
            cookie_name: "tenantauth_session".to_string(),
            cookie_domain: String::new(),
            max_age_seconds: 7200,
            secure: false,
        });

        Arc::new(AppState {
            guard_factory: provider::guard_factory(
                &tenancy,
                &AuthConfig::default(),
                self.resolver.clone(),
                self.users.clone(),
            ),
            extractor: TenantExtractor::new(),
            sessions,
            limiter: RateLimiter::new(Arc::new(MemoryStore::new())),
            rate_limits: provider::rate_limits(),
            trust_forwarded_for: self.trust_forwarded_for,
            actions: UserActions::new(),
        })
    }
}
