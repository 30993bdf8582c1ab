//! User-management actions bound by the application at boot.

use crate::error::{AuthError, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tenantauth_models::{NewUser, ResetUserPassword, UpdateUserPassword, UpdateUserProfile, User};
use uuid::Uuid;

#[async_trait]
pub trait CreatesNewUsers: Send + Sync {
    /// Register a user under `tenant_id` (`None` for the central application).
    async fn create(&self, tenant_id: Option<Uuid>, input: NewUser) -> Result<User>;
}

#[async_trait]
pub trait UpdatesUserProfileInformation: Send + Sync {
    async fn update(&self, user: &User, input: UpdateUserProfile) -> Result<User>;
}

#[async_trait]
pub trait UpdatesUserPasswords: Send + Sync {
    async fn update(&self, user: &User, input: UpdateUserPassword) -> Result<()>;
}

#[async_trait]
pub trait ResetsUserPasswords: Send + Sync {
    async fn reset(&self, user: &User, input: ResetUserPassword) -> Result<()>;
}

/// The four action bindings. Unbound actions report [`AuthError::ActionNotBound`].
#[derive(Clone, Default)]
pub struct UserActions {
    create_users: Option<Arc<dyn CreatesNewUsers>>,
    update_profiles: Option<Arc<dyn UpdatesUserProfileInformation>>,
    update_passwords: Option<Arc<dyn UpdatesUserPasswords>>,
    reset_passwords: Option<Arc<dyn ResetsUserPasswords>>,
}

impl UserActions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_users_using(mut self, action: Arc<dyn CreatesNewUsers>) -> Self {
        self.create_users = Some(action);
        self
    }

    pub fn update_user_profile_information_using(
        mut self,
        action: Arc<dyn UpdatesUserProfileInformation>,
    ) -> Self {
        self.update_profiles = Some(action);
        self
    }

    pub fn update_user_passwords_using(mut self, action: Arc<dyn UpdatesUserPasswords>) -> Self {
        self.update_passwords = Some(action);
        self
    }

    pub fn reset_user_passwords_using(mut self, action: Arc<dyn ResetsUserPasswords>) -> Self {
        self.reset_passwords = Some(action);
        self
    }

    pub fn create_users(&self) -> Result<&Arc<dyn CreatesNewUsers>> {
        self.create_users
            .as_ref()
            .ok_or(AuthError::ActionNotBound("creating users"))
    }

    pub fn update_profiles(&self) -> Result<&Arc<dyn UpdatesUserProfileInformation>> {
        self.update_profiles
            .as_ref()
            .ok_or(AuthError::ActionNotBound("updating profile information"))
    }

    pub fn update_passwords(&self) -> Result<&Arc<dyn UpdatesUserPasswords>> {
        self.update_passwords
            .as_ref()
            .ok_or(AuthError::ActionNotBound("updating passwords"))
    }

    pub fn reset_passwords(&self) -> Result<&Arc<dyn ResetsUserPasswords>> {
        self.reset_passwords
            .as_ref()
            .ok_or(AuthError::ActionNotBound("resetting passwords"))
    }
}
