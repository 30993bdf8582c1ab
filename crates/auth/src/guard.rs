use crate::error::Result;
use crate::password::PasswordHasher;
use crate::session::Session;
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tenantauth_database::UserRepository;
use tenantauth_models::{Tenant, User};
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Source of users for a guard. `tenant_id` is `None` for central users.
#[async_trait]
pub trait UserProvider: Send + Sync {
    async fn retrieve_by_id(&self, tenant_id: Option<Uuid>, id: Uuid) -> Result<Option<User>>;

    async fn retrieve_by_email(&self, tenant_id: Option<Uuid>, email: &str)
        -> Result<Option<User>>;
}

#[derive(Clone)]
pub struct DatabaseUserProvider {
    users: UserRepository,
}

impl DatabaseUserProvider {
    pub fn new(users: UserRepository) -> Self {
        Self { users }
    }
}

#[async_trait]
impl UserProvider for DatabaseUserProvider {
    async fn retrieve_by_id(&self, tenant_id: Option<Uuid>, id: Uuid) -> Result<Option<User>> {
        Ok(self.users.find_by_id(tenant_id, id).await?)
    }

    async fn retrieve_by_email(
        &self,
        tenant_id: Option<Uuid>,
        email: &str,
    ) -> Result<Option<User>> {
        Ok(self.users.find_by_email(tenant_id, email).await?)
    }
}

/// Stateful guard keeping the authenticated user id in the session.
///
/// A guard built while a tenant is active only ever sees that tenant's users.
#[derive(Clone)]
pub struct SessionGuard {
    name: String,
    tenant: Option<Tenant>,
    users: Arc<dyn UserProvider>,
}

impl SessionGuard {
    pub fn new(name: impl Into<String>, tenant: Option<Tenant>, users: Arc<dyn UserProvider>) -> Self {
        Self {
            name: name.into(),
            tenant,
            users,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tenant(&self) -> Option<&Tenant> {
        self.tenant.as_ref()
    }

    pub fn tenant_id(&self) -> Option<Uuid> {
        self.tenant.as_ref().map(|t| t.id)
    }

    fn session_key(&self) -> String {
        format!("login_{}", self.name)
    }

    /// Check credentials without touching the session.
    pub async fn validate(&self, credentials: &Credentials) -> Result<Option<User>> {
        let Some(user) = self
            .users
            .retrieve_by_email(self.tenant_id(), &credentials.email)
            .await?
        else {
            return Ok(None);
        };

        if PasswordHasher::verify(&credentials.password, &user.password_hash)? {
            Ok(Some(user))
        } else {
            Ok(None)
        }
    }

    /// Validate credentials and log the user in on success.
    pub async fn attempt(
        &self,
        session: &mut Session,
        credentials: &Credentials,
    ) -> Result<Option<User>> {
        let user = self.validate(credentials).await?;
        if let Some(user) = &user {
            self.login(session, user);
        }
        Ok(user)
    }

    pub fn login(&self, session: &mut Session, user: &User) {
        session.put(&self.session_key(), user.id);
        session.regenerate();
        tracing::info!(
            guard = %self.name,
            user_id = %user.id,
            tenant = self.tenant.as_ref().map(|t| t.slug.as_str()).unwrap_or("-"),
            "User logged in"
        );
    }

    pub fn logout(&self, session: &mut Session) {
        session.forget(&self.session_key());
        session.regenerate();
    }

    pub fn id(&self, session: &Session) -> Option<Uuid> {
        session.get(&self.session_key())
    }

    pub fn check(&self, session: &Session) -> bool {
        self.id(session).is_some()
    }

    /// The authenticated user, re-read through the provider.
    pub async fn user(&self, session: &Session) -> Result<Option<User>> {
        match self.id(session) {
            Some(id) => self.users.retrieve_by_id(self.tenant_id(), id).await,
            None => Ok(None),
        }
    }

    pub fn provider(&self) -> &Arc<dyn UserProvider> {
        &self.users
    }
}
