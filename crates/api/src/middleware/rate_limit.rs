use crate::middleware::session::SessionHandle;
use axum::{
    body::{to_bytes, Body},
    extract::{ConnectInfo, Request, State},
    http::{
        header::{CONTENT_TYPE, RETRY_AFTER},
        HeaderMap, HeaderName, HeaderValue, StatusCode,
    },
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tenantauth_auth::Session;
use tenantauth_cache::{Attempt, Limit};

/// Largest body buffered to read throttle keys from.
const MAX_THROTTLE_BODY: usize = 64 * 1024;

const RATE_LIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
const RATE_LIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");

#[derive(Debug, Serialize)]
struct RateLimitError {
    error: String,
    message: String,
    retry_after: u64,
}

/// What a policy may look at when deriving its bucket key.
#[derive(Debug, Clone, Default)]
pub struct ThrottleRequest {
    ip: String,
    input: Map<String, Value>,
    session: Session,
}

impl ThrottleRequest {
    pub fn new(ip: impl Into<String>, input: Map<String, Value>, session: Session) -> Self {
        Self {
            ip: ip.into(),
            input,
            session,
        }
    }

    pub fn ip(&self) -> &str {
        &self.ip
    }

    /// A submitted field, stringified when it is not a JSON string.
    pub fn input(&self, key: &str) -> Option<String> {
        match self.input.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }
}

type LimitFn = dyn Fn(&ThrottleRequest) -> Limit + Send + Sync;

/// Named rate-limit policies.
#[derive(Clone, Default)]
pub struct RateLimiterRegistry {
    policies: HashMap<String, Arc<LimitFn>>,
}

impl RateLimiterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, name: &str, policy: F)
    where
        F: Fn(&ThrottleRequest) -> Limit + Send + Sync + 'static,
    {
        self.policies.insert(name.to_string(), Arc::new(policy));
    }

    pub fn limit(&self, name: &str, request: &ThrottleRequest) -> Option<Limit> {
        self.policies.get(name).map(|policy| policy(request))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.policies.contains_key(name)
    }
}

/// Client IP for throttle keys.
///
/// The peer address is used unless `trust_forwarded` is set, in which case a
/// reverse proxy's `X-Forwarded-For` / `X-Real-IP` take precedence.
fn extract_ip(headers: &HeaderMap, peer: Option<SocketAddr>, trust_forwarded: bool) -> String {
    let forwarded = if trust_forwarded {
        headers
            .get("x-forwarded-for")
            .and_then(|h| h.to_str().ok())
            .and_then(|s| s.split(',').next())
            .or_else(|| headers.get("x-real-ip").and_then(|h| h.to_str().ok()))
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    } else {
        None
    };

    forwarded
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|h| h.to_str().ok())
        .map(|ct| ct.starts_with("application/json"))
        .unwrap_or(false)
}

fn too_many_attempts(limit: &Limit, retry_after: u64) -> Response {
    let mut response = (
        StatusCode::TOO_MANY_REQUESTS,
        Json(RateLimitError {
            error: "rate_limit_exceeded".to_string(),
            message: format!(
                "Too many attempts. Please try again in {} seconds.",
                retry_after
            ),
            retry_after,
        }),
    )
        .into_response();

    let headers = response.headers_mut();
    headers.insert(RETRY_AFTER, HeaderValue::from(retry_after));
    headers.insert(RATE_LIMIT_LIMIT, HeaderValue::from(limit.max_attempts));
    headers.insert(RATE_LIMIT_REMAINING, HeaderValue::from(0u32));
    response
}

/// Enforce the named policy on a route.
///
/// Mount with `from_fn_with_state((state, "login"), throttle)`. Counter store
/// failures let the request through.
pub async fn throttle(
    State((state, policy)): State<(Arc<crate::AppState>, &'static str)>,
    request: Request,
    next: Next,
) -> Response {
    let (parts, body) = request.into_parts();

    let bytes = match to_bytes(body, MAX_THROTTLE_BODY).await {
        Ok(bytes) => bytes,
        Err(_) => return StatusCode::PAYLOAD_TOO_LARGE.into_response(),
    };

    let input = if is_json(&parts.headers) {
        serde_json::from_slice::<Map<String, Value>>(&bytes).unwrap_or_default()
    } else {
        Map::new()
    };

    let session = match parts.extensions.get::<SessionHandle>() {
        Some(handle) => handle.snapshot().await,
        None => Session::new(),
    };

    let peer = parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let throttle_request = ThrottleRequest::new(
        extract_ip(&parts.headers, peer, state.trust_forwarded_for),
        input,
        session,
    );
    let request = Request::from_parts(parts, Body::from(bytes));

    let Some(limit) = state.rate_limits.limit(policy, &throttle_request) else {
        tracing::error!("Rate limiter [{}] is not registered", policy);
        return next.run(request).await;
    };

    match state.limiter.attempt(policy, &limit).await {
        Ok(Attempt::Allowed { remaining }) => {
            let mut response = next.run(request).await;
            let headers = response.headers_mut();
            headers.insert(RATE_LIMIT_LIMIT, HeaderValue::from(limit.max_attempts));
            headers.insert(RATE_LIMIT_REMAINING, HeaderValue::from(remaining));
            response
        }
        Ok(Attempt::TooMany { retry_after }) => {
            tracing::warn!(
                policy,
                ip = throttle_request.ip(),
                "Rate limit exceeded, retry after {}s",
                retry_after
            );
            too_many_attempts(&limit, retry_after)
        }
        Err(e) => {
            tracing::error!("Rate limit check error: {}", e);
            // On error, allow the request (fail open)
            next.run(request).await
        }
    }
}
