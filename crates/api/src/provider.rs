// Boot-time wiring of the authentication collaborators

use crate::actions::{
    CreateNewUser, ResetUserPasswordAction, UpdateUserPasswordAction, UpdateUserProfileInformation,
};
use crate::config::{AuthConfig, TenancyConfig};
use crate::handlers::auth::PENDING_LOGIN_KEY;
use crate::middleware::{RateLimiterRegistry, ThrottleRequest};
use std::sync::Arc;
use tenantauth_auth::{
    GuardFactoryConfig, GuardManager, TenantAwareGuardFactory, UserActions, UserProvider,
};
use tenantauth_cache::Limit;
use tenantauth_database::UserRepository;
use tenantauth_tenant::{CentralDomains, TenantResolver};

pub const LOGIN_LIMITER: &str = "login";
pub const TWO_FACTOR_LIMITER: &str = "two-factor";

/// Bind the tenant-aware guard factory.
pub fn guard_factory(
    tenancy: &TenancyConfig,
    auth: &AuthConfig,
    resolver: Arc<dyn TenantResolver>,
    users: Arc<dyn UserProvider>,
) -> TenantAwareGuardFactory {
    let guards = auth
        .guards
        .iter()
        .fold(GuardManager::new(users), |manager, name| manager.with_guard(name.clone()));

    TenantAwareGuardFactory::new(
        GuardFactoryConfig {
            central_domains: CentralDomains::new(&tenancy.central_domains),
            resolve_custom_domains: tenancy.resolve_custom_domains,
            guard: auth.guard.clone(),
        },
        resolver,
        guards,
    )
}

pub fn user_actions(users: UserRepository) -> UserActions {
    UserActions::new()
        .create_users_using(Arc::new(CreateNewUser::new(users.clone())))
        .update_user_profile_information_using(Arc::new(UpdateUserProfileInformation::new(
            users.clone(),
        )))
        .update_user_passwords_using(Arc::new(UpdateUserPasswordAction::new(users.clone())))
        .reset_user_passwords_using(Arc::new(ResetUserPasswordAction::new(users)))
}

/// Register the `login` and `two-factor` rate limiters.
pub fn rate_limits() -> RateLimiterRegistry {
    let mut limits = RateLimiterRegistry::new();

    limits.register(LOGIN_LIMITER, |request: &ThrottleRequest| {
        let email = request.input("email").unwrap_or_default();
        Limit::per_minute(5).by(format!("{}{}", email, request.ip()))
    });

    limits.register(TWO_FACTOR_LIMITER, |request: &ThrottleRequest| {
        Limit::per_minute(5).by(request.session().get_string(PENDING_LOGIN_KEY).unwrap_or_default())
    });

    limits
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map, Value};
    use tenantauth_auth::Session;

    fn input(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_login_limit_keys_on_email_and_ip() {
        let limits = rate_limits();
        let request = ThrottleRequest::new(
            "10.0.0.1",
            input(json!({ "email": "jane@example.com", "password": "x" })),
            Session::new(),
        );

        let limit = limits.limit(LOGIN_LIMITER, &request).unwrap();
        assert_eq!(limit.key, "jane@example.com10.0.0.1");
        assert_eq!(limit.max_attempts, 5);
        assert_eq!(limit.decay_seconds, 60);
    }

    #[test]
    fn test_two_factor_limit_keys_on_pending_login() {
        let limits = rate_limits();
        let mut session = Session::new();
        session.put(PENDING_LOGIN_KEY, "7f1c");
        let request = ThrottleRequest::new("10.0.0.1", Map::new(), session);

        let limit = limits.limit(TWO_FACTOR_LIMITER, &request).unwrap();
        assert_eq!(limit, Limit::per_minute(5).by("7f1c"));
    }

    #[test]
    fn test_two_factor_without_pending_login_uses_empty_key() {
        let limits = rate_limits();
        let request = ThrottleRequest::new("10.0.0.1", Map::new(), Session::new());
        assert_eq!(limits.limit(TWO_FACTOR_LIMITER, &request).unwrap().key, "");
    }

    #[test]
    fn test_guard_factory_registers_extra_guards() {
        let tenancy = TenancyConfig {
            central_domains: vec!["example.com".to_string()],
            resolve_custom_domains: false,
            cache_ttl_seconds: 60,
            trust_forwarded_host: false,
        };
        let auth = AuthConfig {
            guard: Some("admin".to_string()),
            guards: vec!["admin".to_string()],
        };
        let state = crate::test_support::TestApp::new();

        let factory = guard_factory(&tenancy, &auth, state.resolver.clone(), state.users.clone());
        assert!(factory.central_domains().contains("example.com"));
    }
}
