use crate::error::{AuthError, Result};
use crate::guard::{SessionGuard, UserProvider};
use std::collections::BTreeSet;
use std::sync::Arc;
use tenantauth_models::Tenant;

pub const DEFAULT_GUARD: &str = "web";

/// Named guard configurations sharing one user provider.
#[derive(Clone)]
pub struct GuardManager {
    guards: BTreeSet<String>,
    default_guard: String,
    users: Arc<dyn UserProvider>,
}

impl GuardManager {
    pub fn new(users: Arc<dyn UserProvider>) -> Self {
        Self {
            guards: BTreeSet::from([DEFAULT_GUARD.to_string()]),
            default_guard: DEFAULT_GUARD.to_string(),
            users,
        }
    }

    pub fn with_guard(mut self, name: impl Into<String>) -> Self {
        self.guards.insert(name.into());
        self
    }

    pub fn default_guard(&self) -> &str {
        &self.default_guard
    }

    /// Build the named guard (default guard when `None`), scoped to `tenant`.
    pub fn guard(&self, name: Option<&str>, tenant: Option<&Tenant>) -> Result<SessionGuard> {
        let name = name.unwrap_or(&self.default_guard);
        if !self.guards.contains(name) {
            return Err(AuthError::UnknownGuard(name.to_string()));
        }

        Ok(SessionGuard::new(name, tenant.cloned(), Arc::clone(&self.users)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guard::tests::{tenant, MemoryUsers};

    #[test]
    fn test_default_guard() {
        let manager = GuardManager::new(MemoryUsers::with(vec![]));
        let guard = manager.guard(None, None).unwrap();
        assert_eq!(guard.name(), "web");
        assert!(guard.tenant().is_none());
    }

    #[test]
    fn test_named_guard_with_tenant() {
        let manager = GuardManager::new(MemoryUsers::with(vec![])).with_guard("admin");
        let acme = tenant("acme");

        let guard = manager.guard(Some("admin"), Some(&acme)).unwrap();
        assert_eq!(guard.name(), "admin");
        assert_eq!(guard.tenant_id(), Some(acme.id));
    }

    #[test]
    fn test_unknown_guard() {
        let manager = GuardManager::new(MemoryUsers::with(vec![]));
        assert!(matches!(
            manager.guard(Some("api"), None),
            Err(AuthError::UnknownGuard(name)) if name == "api"
        ));
    }
}
