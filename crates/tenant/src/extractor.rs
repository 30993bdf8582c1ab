// Reads the request host used for tenant identification

use crate::domain::normalize_host;
use axum::http::{header::HOST, HeaderMap, Uri};

#[derive(Debug, Clone, Default)]
pub struct TenantExtractor {
    trust_forwarded_host: bool,
}

impl TenantExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prefer `X-Forwarded-Host` over `Host` (only behind a trusted proxy).
    pub fn trusting_forwarded_host(mut self, trust: bool) -> Self {
        self.trust_forwarded_host = trust;
        self
    }

    /// Normalized request host, or `None` when the request carries none.
    pub fn host(&self, headers: &HeaderMap, uri: &Uri) -> Option<String> {
        let forwarded = if self.trust_forwarded_host {
            headers
                .get("x-forwarded-host")
                .and_then(|h| h.to_str().ok())
                .and_then(|s| s.split(',').next())
        } else {
            None
        };

        forwarded
            .or_else(|| headers.get(HOST).and_then(|h| h.to_str().ok()))
            .or_else(|| uri.host())
            .map(normalize_host)
            .filter(|h| !h.is_empty())
    }
}
