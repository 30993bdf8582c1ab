use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Nonce};
use axum::http::header::COOKIE;
use axum::http::HeaderMap;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;
use tenantauth_auth::Session;
use tokio::sync::RwLock;

use crate::config::SessionConfig;

#[derive(Debug, Clone)]
struct StoredSession {
    session: Session,
    expires_at: i64,
}

/// Server-side session store addressed by an encrypted session-id cookie.
pub struct SessionManager {
    cipher: Aes256Gcm,
    store: Arc<RwLock<HashMap<String, StoredSession>>>,
    cookie_name: String,
    cookie_domain: String,
    max_age_seconds: u64,
    secure: bool,
}

impl SessionManager {
    pub fn new(config: &SessionConfig) -> Self {
        // Derive a 256-bit key from the secret using SHA-256
        let key_bytes = Sha256::digest(config.secret.as_bytes());

        Self {
            cipher: Aes256Gcm::new(&key_bytes),
            store: Arc::new(RwLock::new(HashMap::new())),
            cookie_name: config.cookie_name.clone(),
            cookie_domain: config.cookie_domain.clone(),
            max_age_seconds: config.max_age_seconds,
            secure: config.secure,
        }
    }

    /// Extract and decrypt the session ID from request cookies.
    pub fn extract_session_id(&self, headers: &HeaderMap) -> Option<String> {
        let prefix = format!("{}=", self.cookie_name);
        let encoded = headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|h| h.to_str().ok())
            .flat_map(|h| h.split(';'))
            .map(str::trim)
            .find_map(|s| s.strip_prefix(&prefix))?;

        let payload = URL_SAFE_NO_PAD.decode(encoded).ok()?;
        if payload.len() < 12 {
            return None;
        }

        let (nonce_bytes, ciphertext) = payload.split_at(12);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .ok()?;
        String::from_utf8(plaintext).ok()
    }

    /// Look up a live session by ID.
    pub async fn get_session(&self, session_id: &str) -> Option<Session> {
        let now = chrono::Utc::now().timestamp();
        self.store
            .read()
            .await
            .get(session_id)
            .filter(|s| s.expires_at > now)
            .map(|s| s.session.clone())
    }

    /// Persist `session`. Returns a Set-Cookie value when the visitor needs a
    /// new cookie (fresh session or regenerated id).
    pub async fn save(
        &self,
        session_id: Option<&str>,
        session: Session,
    ) -> Result<Option<String>, String> {
        let regenerate = session.wants_regeneration();
        let stored = StoredSession {
            session: session.into_clean(),
            expires_at: chrono::Utc::now().timestamp() + self.max_age_seconds as i64,
        };

        let mut store = self.store.write().await;
        match session_id {
            Some(id) if !regenerate => {
                store.insert(id.to_string(), stored);
                Ok(None)
            }
            previous => {
                if let Some(id) = previous {
                    store.remove(id);
                }
                let new_id = uuid::Uuid::new_v4().to_string();
                store.insert(new_id.clone(), stored);
                tracing::debug!("Issued session {}", new_id);
                self.encrypt_cookie(&new_id).map(Some)
            }
        }
    }

    /// Start a background task to periodically clean up expired sessions.
    pub fn start_cleanup_task(&self, interval_secs: u64) {
        let store = Arc::clone(&self.store);
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(tokio::time::Duration::from_secs(interval_secs)).await;
                let now = chrono::Utc::now().timestamp();
                let mut sessions = store.write().await;
                let before = sessions.len();
                sessions.retain(|_, s| s.expires_at > now);
                let removed = before - sessions.len();
                if removed > 0 {
                    tracing::debug!("Session cleanup: removed {} expired sessions", removed);
                }
            }
        });
    }

    /// Encrypt a session ID into a cookie value.
    fn encrypt_cookie(&self, session_id: &str) -> Result<String, String> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

        let ciphertext = self
            .cipher
            .encrypt(&nonce, session_id.as_bytes())
            .map_err(|e| format!("Session encrypt error: {}", e))?;

        let mut payload = Vec::with_capacity(12 + ciphertext.len());
        payload.extend_from_slice(&nonce);
        payload.extend_from_slice(&ciphertext);

        let mut cookie = format!(
            "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
            self.cookie_name,
            URL_SAFE_NO_PAD.encode(&payload),
            self.max_age_seconds
        );
        if self.secure {
            cookie.push_str("; Secure");
        }
        if !self.cookie_domain.is_empty() {
            cookie.push_str(&format!("; Domain={}", self.cookie_domain));
        }

        Ok(cookie)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn manager() -> SessionManager {
        SessionManager::new(&SessionConfig {
            secret: "0123456789abcdef0123456789abcdef".to_string(),
            cookie_name: "sid".to_string(),
            cookie_domain: String::new(),
            max_age_seconds: 60,
            secure: false,
        })
    }

    fn cookie_headers(set_cookie: &str) -> HeaderMap {
        let pair = set_cookie.split(';').next().unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_str(&format!("theme=dark; {}", pair)).unwrap());
        headers
    }

    #[tokio::test]
    async fn test_new_session_round_trips_through_cookie() {
        let manager = manager();
        let mut session = Session::new();
        session.put("login.id", "u-1");

        let cookie = manager.save(None, session).await.unwrap().unwrap();
        assert!(cookie.starts_with("sid="));
        assert!(cookie.contains("HttpOnly"));

        let id = manager.extract_session_id(&cookie_headers(&cookie)).unwrap();
        let restored = manager.get_session(&id).await.unwrap();
        assert_eq!(restored.get_string("login.id").as_deref(), Some("u-1"));
        assert!(!restored.is_dirty());
    }

    #[tokio::test]
    async fn test_update_keeps_id() {
        let manager = manager();
        let cookie = manager.save(None, Session::new()).await.unwrap().unwrap();
        let id = manager.extract_session_id(&cookie_headers(&cookie)).unwrap();

        let mut session = manager.get_session(&id).await.unwrap();
        session.put("a", 1);
        assert!(manager.save(Some(&id), session).await.unwrap().is_none());
        assert_eq!(manager.get_session(&id).await.unwrap().get::<i32>("a"), Some(1));
    }

    #[tokio::test]
    async fn test_regeneration_replaces_id() {
        let manager = manager();
        let cookie = manager.save(None, Session::new()).await.unwrap().unwrap();
        let old_id = manager.extract_session_id(&cookie_headers(&cookie)).unwrap();

        let mut session = manager.get_session(&old_id).await.unwrap();
        session.regenerate();
        let cookie = manager.save(Some(&old_id), session).await.unwrap().unwrap();
        let new_id = manager.extract_session_id(&cookie_headers(&cookie)).unwrap();

        assert_ne!(old_id, new_id);
        assert!(manager.get_session(&old_id).await.is_none());
        assert!(manager.get_session(&new_id).await.is_some());
    }

    #[test]
    fn test_tampered_cookie_is_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("sid=AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA"));
        assert!(manager().extract_session_id(&headers).is_none());
    }
}
