use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Key/value attributes of one visitor's server-side session.
///
/// The HTTP layer loads it before the handler runs and persists it afterwards
/// when [`Session::is_dirty`] reports a change.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Session {
    attributes: HashMap<String, Value>,
    #[serde(skip)]
    dirty: bool,
    #[serde(skip)]
    regenerate: bool,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.attributes
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// String form of a value, numbers included (`login.id` may be either).
    pub fn get_string(&self, key: &str) -> Option<String> {
        match self.attributes.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }

    pub fn has(&self, key: &str) -> bool {
        self.attributes.contains_key(key)
    }

    pub fn put<T: Serialize>(&mut self, key: &str, value: T) {
        match serde_json::to_value(value) {
            Ok(value) => {
                self.attributes.insert(key.to_string(), value);
                self.dirty = true;
            }
            Err(e) => tracing::error!("Failed to serialize session value {}: {}", key, e),
        }
    }

    pub fn forget(&mut self, key: &str) {
        if self.attributes.remove(key).is_some() {
            self.dirty = true;
        }
    }

    pub fn flush(&mut self) {
        if !self.attributes.is_empty() {
            self.attributes.clear();
            self.dirty = true;
        }
    }

    /// Ask the HTTP layer to issue a fresh session id (after login or logout).
    pub fn regenerate(&mut self) {
        self.regenerate = true;
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn wants_regeneration(&self) -> bool {
        self.regenerate
    }

    /// The session as persisted: same attributes, change tracking reset.
    pub fn into_clean(mut self) -> Self {
        self.dirty = false;
        self.regenerate = false;
        self
    }
}
