use thiserror::Error;

pub type Result<T> = std::result::Result<T, AuthError>;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid two-factor authentication code")]
    InvalidTwoFactorCode,

    #[error("No pending two-factor login")]
    NoPendingLogin,

    #[error("Unauthenticated")]
    Unauthenticated,

    #[error("Auth guard [{0}] is not defined")]
    UnknownGuard(String),

    #[error("No action bound for {0}")]
    ActionNotBound(&'static str),

    #[error("Tenancy error: {0}")]
    Tenancy(#[from] tenantauth_tenant::TenantError),

    #[error("Database error: {0}")]
    DatabaseError(#[from] tenantauth_database::DatabaseError),

    #[error("Password hashing error: {0}")]
    PasswordHashError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<argon2::password_hash::Error> for AuthError {
    fn from(err: argon2::password_hash::Error) -> Self {
        AuthError::PasswordHashError(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AuthError {
    fn from(err: validator::ValidationErrors) -> Self {
        AuthError::ValidationError(err.to_string())
    }
}
