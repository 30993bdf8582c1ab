// Database-backed user-management actions bound at boot

use async_trait::async_trait;
use tenantauth_auth::{
    AuthError, CreatesNewUsers, PasswordHasher, ResetsUserPasswords, Result, UpdatesUserPasswords,
    UpdatesUserProfileInformation,
};
use tenantauth_database::{DatabaseError, UserRepository};
use tenantauth_models::{NewUser, ResetUserPassword, UpdateUserPassword, UpdateUserProfile, User};
use uuid::Uuid;
use validator::Validate;

fn email_taken(err: DatabaseError) -> AuthError {
    match err {
        DatabaseError::DuplicateEntry(_) => {
            AuthError::ValidationError("The email has already been taken.".to_string())
        }
        other => other.into(),
    }
}

#[derive(Clone)]
pub struct CreateNewUser {
    users: UserRepository,
}

impl CreateNewUser {
    pub fn new(users: UserRepository) -> Self {
        Self { users }
    }
}

#[async_trait]
impl CreatesNewUsers for CreateNewUser {
    async fn create(&self, tenant_id: Option<Uuid>, input: NewUser) -> Result<User> {
        input.validate()?;

        let password_hash = PasswordHasher::hash(&input.password)?;
        let user = self
            .users
            .create(tenant_id, input.name.trim(), input.email.trim(), &password_hash)
            .await
            .map_err(email_taken)?;

        tracing::info!(user_id = %user.id, ?tenant_id, "User registered");
        Ok(user)
    }
}

#[derive(Clone)]
pub struct UpdateUserProfileInformation {
    users: UserRepository,
}

impl UpdateUserProfileInformation {
    pub fn new(users: UserRepository) -> Self {
        Self { users }
    }
}

#[async_trait]
impl UpdatesUserProfileInformation for UpdateUserProfileInformation {
    async fn update(&self, user: &User, input: UpdateUserProfile) -> Result<User> {
        input.validate()?;

        self.users
            .update_profile(user.id, input.name.trim(), input.email.trim())
            .await
            .map_err(email_taken)
    }
}

#[derive(Clone)]
pub struct UpdateUserPasswordAction {
    users: UserRepository,
}

impl UpdateUserPasswordAction {
    pub fn new(users: UserRepository) -> Self {
        Self { users }
    }
}

#[async_trait]
impl UpdatesUserPasswords for UpdateUserPasswordAction {
    async fn update(&self, user: &User, input: UpdateUserPassword) -> Result<()> {
        input.validate()?;

        if !PasswordHasher::verify(&input.current_password, &user.password_hash)? {
            return Err(AuthError::ValidationError(
                "The provided password does not match your current password.".to_string(),
            ));
        }

        let password_hash = PasswordHasher::hash(&input.password)?;
        self.users.update_password(user.id, &password_hash).await?;
        Ok(())
    }
}

#[derive(Clone)]
pub struct ResetUserPasswordAction {
    users: UserRepository,
}

impl ResetUserPasswordAction {
    pub fn new(users: UserRepository) -> Self {
        Self { users }
    }
}

#[async_trait]
impl ResetsUserPasswords for ResetUserPasswordAction {
    async fn reset(&self, user: &User, input: ResetUserPassword) -> Result<()> {
        input.validate()?;

        if !input.email.eq_ignore_ascii_case(&user.email) {
            return Err(AuthError::ValidationError(
                "The email does not belong to this user.".to_string(),
            ));
        }

        let password_hash = PasswordHasher::hash(&input.password)?;
        self.users.update_password(user.id, &password_hash).await?;
        tracing::info!(user_id = %user.id, "Password reset");
        Ok(())
    }
}
