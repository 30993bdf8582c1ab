use crate::handlers;
use crate::middleware;
use crate::provider::{LOGIN_LIMITER, TWO_FACTOR_LIMITER};
use crate::AppState;
use axum::{
    middleware::from_fn_with_state,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;

pub fn create_router(state: Arc<AppState>) -> Router {
    let auth = Router::new()
        // Authentication
        .route(
            "/login",
            post(handlers::auth::login).layer(from_fn_with_state(
                (state.clone(), LOGIN_LIMITER),
                middleware::throttle,
            )),
        )
        .route(
            "/two-factor-challenge",
            post(handlers::auth::two_factor_challenge).layer(from_fn_with_state(
                (state.clone(), TWO_FACTOR_LIMITER),
                middleware::throttle,
            )),
        )
        .route("/logout", post(handlers::auth::logout))
        // User management
        .route("/register", post(handlers::user::register))
        .route("/user", get(handlers::user::current_user))
        .route("/user/profile-information", put(handlers::user::update_profile))
        .route("/user/password", put(handlers::user::update_password))
        // Runs after the session is loaded
        .layer(from_fn_with_state(state.clone(), middleware::resolve_guard))
        .layer(from_fn_with_state(state.clone(), middleware::start_session));

    Router::new()
        // Health check, outside tenancy and sessions
        .route("/health", get(handlers::health::health_check))
        .merge(auth)
        .with_state(state)
}
