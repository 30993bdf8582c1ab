use axum::{
    extract::{Request, State},
    http::{header::SET_COOKIE, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tenantauth_auth::Session;
use tokio::sync::{Mutex, MutexGuard};

/// The request's session, shared between the middleware and the handler.
#[derive(Clone)]
pub struct SessionHandle(Arc<Mutex<Session>>);

impl SessionHandle {
    pub fn new(session: Session) -> Self {
        Self(Arc::new(Mutex::new(session)))
    }

    pub async fn lock(&self) -> MutexGuard<'_, Session> {
        self.0.lock().await
    }

    pub async fn snapshot(&self) -> Session {
        self.0.lock().await.clone()
    }
}

/// Load the visitor's session before the handler and persist it afterwards.
pub async fn start_session(
    State(state): State<Arc<crate::AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let session_id = state.sessions.extract_session_id(request.headers());
    let session = match &session_id {
        Some(id) => state.sessions.get_session(id).await.unwrap_or_default(),
        None => Session::new(),
    };

    let handle = SessionHandle::new(session);
    request.extensions_mut().insert(handle.clone());

    let mut response = next.run(request).await;

    let session = handle.snapshot().await;
    if !session.is_dirty() {
        return response;
    }

    match state.sessions.save(session_id.as_deref(), session).await {
        Ok(Some(cookie)) => match HeaderValue::from_str(&cookie) {
            Ok(value) => {
                response.headers_mut().append(SET_COOKIE, value);
            }
            Err(e) => tracing::error!("Invalid session cookie header: {}", e),
        },
        Ok(None) => {}
        Err(e) => tracing::error!("Failed to persist session: {}", e),
    }

    response
}
