use crate::handlers::auth::{auth_error, ApiError};
use crate::middleware::SessionHandle;
use crate::AppState;
use axum::{extract::State, http::StatusCode, Extension, Json};
use std::sync::Arc;
use tenantauth_auth::{AuthError, SessionGuard};
use tenantauth_models::{NewUser, UpdateUserPassword, UpdateUserProfile, User, UserProfile};

async fn authenticated_user(guard: &SessionGuard, session: &SessionHandle) -> Result<User, ApiError> {
    let session = session.lock().await;
    guard
        .user(&session)
        .await
        .map_err(auth_error)?
        .ok_or_else(|| auth_error(AuthError::Unauthenticated))
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    Extension(guard): Extension<SessionGuard>,
    Extension(session): Extension<SessionHandle>,
    Json(input): Json<NewUser>,
) -> Result<(StatusCode, Json<UserProfile>), ApiError> {
    let user = state
        .actions
        .create_users()
        .map_err(auth_error)?
        .create(guard.tenant_id(), input)
        .await
        .map_err(auth_error)?;

    guard.login(&mut *session.lock().await, &user);

    Ok((StatusCode::CREATED, Json(user.into())))
}

pub async fn current_user(
    Extension(guard): Extension<SessionGuard>,
    Extension(session): Extension<SessionHandle>,
) -> Result<Json<UserProfile>, ApiError> {
    let user = authenticated_user(&guard, &session).await?;
    Ok(Json(user.into()))
}

pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    Extension(guard): Extension<SessionGuard>,
    Extension(session): Extension<SessionHandle>,
    Json(input): Json<UpdateUserProfile>,
) -> Result<Json<UserProfile>, ApiError> {
    let user = authenticated_user(&guard, &session).await?;

    let updated = state
        .actions
        .update_profiles()
        .map_err(auth_error)?
        .update(&user, input)
        .await
        .map_err(auth_error)?;

    Ok(Json(updated.into()))
}

pub async fn update_password(
    State(state): State<Arc<AppState>>,
    Extension(guard): Extension<SessionGuard>,
    Extension(session): Extension<SessionHandle>,
    Json(input): Json<UpdateUserPassword>,
) -> Result<StatusCode, ApiError> {
    let user = authenticated_user(&guard, &session).await?;

    state
        .actions
        .update_passwords()
        .map_err(auth_error)?
        .update(&user, input)
        .await
        .map_err(auth_error)?;

    Ok(StatusCode::NO_CONTENT)
}
