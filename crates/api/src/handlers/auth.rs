use crate::middleware::SessionHandle;
use axum::{http::StatusCode, Extension, Json};
use serde::{Deserialize, Serialize};
use tenantauth_auth::{totp, AuthError, Credentials, SessionGuard};
use tenantauth_models::UserProfile;
use uuid::Uuid;

/// Session key holding the user id of a login awaiting its second factor.
pub const PENDING_LOGIN_KEY: &str = "login.id";

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: &str, message: &str) -> Self {
        Self {
            error: error.to_string(),
            message: message.to_string(),
        }
    }
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

/// Map an auth failure to its HTTP response.
pub fn auth_error(err: AuthError) -> ApiError {
    let (status, code) = match &err {
        AuthError::InvalidCredentials => (StatusCode::UNPROCESSABLE_ENTITY, "invalid_credentials"),
        AuthError::InvalidTwoFactorCode => (StatusCode::UNPROCESSABLE_ENTITY, "invalid_code"),
        AuthError::NoPendingLogin => (StatusCode::UNPROCESSABLE_ENTITY, "no_pending_login"),
        AuthError::ValidationError(_) => (StatusCode::UNPROCESSABLE_ENTITY, "validation_error"),
        AuthError::Unauthenticated => (StatusCode::UNAUTHORIZED, "unauthenticated"),
        _ => {
            tracing::error!("Request failed: {}", err);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("internal_error", "Internal server error")),
            );
        }
    };

    (status, Json(ErrorResponse::new(code, &err.to_string())))
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub two_factor: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserProfile>,
}

pub async fn login(
    Extension(guard): Extension<SessionGuard>,
    Extension(session): Extension<SessionHandle>,
    Json(credentials): Json<Credentials>,
) -> Result<Json<LoginResponse>, ApiError> {
    let user = guard
        .validate(&credentials)
        .await
        .map_err(auth_error)?
        .ok_or_else(|| auth_error(AuthError::InvalidCredentials))?;

    let mut session = session.lock().await;

    if user.has_two_factor() {
        session.put(PENDING_LOGIN_KEY, user.id);
        session.regenerate();
        tracing::debug!(user_id = %user.id, "Login awaiting two-factor challenge");
        return Ok(Json(LoginResponse {
            two_factor: true,
            user: None,
        }));
    }

    guard.login(&mut session, &user);
    Ok(Json(LoginResponse {
        two_factor: false,
        user: Some(user.into()),
    }))
}

#[derive(Debug, Deserialize)]
pub struct TwoFactorChallenge {
    pub code: String,
}

pub async fn two_factor_challenge(
    Extension(guard): Extension<SessionGuard>,
    Extension(session): Extension<SessionHandle>,
    Json(challenge): Json<TwoFactorChallenge>,
) -> Result<Json<UserProfile>, ApiError> {
    let mut session = session.lock().await;

    let user_id: Uuid = session
        .get(PENDING_LOGIN_KEY)
        .ok_or_else(|| auth_error(AuthError::NoPendingLogin))?;

    let user = guard
        .provider()
        .retrieve_by_id(guard.tenant_id(), user_id)
        .await
        .map_err(auth_error)?
        .ok_or_else(|| auth_error(AuthError::NoPendingLogin))?;

    let secret = user
        .two_factor_secret
        .as_deref()
        .ok_or_else(|| auth_error(AuthError::NoPendingLogin))?;

    if !totp::verify_totp(secret, &challenge.code).map_err(auth_error)? {
        return Err(auth_error(AuthError::InvalidTwoFactorCode));
    }

    session.forget(PENDING_LOGIN_KEY);
    guard.login(&mut session, &user);

    Ok(Json(user.into()))
}

pub async fn logout(
    Extension(guard): Extension<SessionGuard>,
    Extension(session): Extension<SessionHandle>,
) -> StatusCode {
    let mut session = session.lock().await;
    guard.logout(&mut session);
    session.flush();
    StatusCode::NO_CONTENT
}
