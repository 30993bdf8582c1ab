use crate::handlers::auth::ErrorResponse;
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
    Json,
};
use std::sync::Arc;
use tenantauth_tenant::TenantContext;

/// Resolve the request's guard, initializing tenancy for tenant hosts.
///
/// Inserts the [`TenantContext`] and the `SessionGuard` into the request
/// extensions for handlers to extract.
pub async fn resolve_guard(
    State(state): State<Arc<crate::AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, (StatusCode, Json<ErrorResponse>)> {
    let host = state.extractor.host(request.headers(), request.uri());
    let mut tenancy = TenantContext::new();

    let guard = state
        .guard_factory
        .make(host.as_deref(), &mut tenancy)
        .await
        .map_err(|e| {
            tracing::error!(host = host.as_deref().unwrap_or("-"), "Guard resolution failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("tenancy_error", "Could not resolve tenant")),
            )
        })?;

    request.extensions_mut().insert(guard);
    request.extensions_mut().insert(tenancy);

    Ok(next.run(request).await)
}
