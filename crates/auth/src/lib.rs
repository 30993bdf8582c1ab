// Session authentication for tenant-scoped users

pub mod actions;
pub mod error;
pub mod factory;
pub mod guard;
pub mod manager;
pub mod password;
pub mod session;
pub mod totp;

pub use actions::{
    CreatesNewUsers, ResetsUserPasswords, UpdatesUserPasswords, UpdatesUserProfileInformation,
    UserActions,
};
pub use error::{AuthError, Result};
pub use factory::{GuardFactoryConfig, TenantAwareGuardFactory};
pub use guard::{Credentials, DatabaseUserProvider, SessionGuard, UserProvider};
pub use manager::{GuardManager, DEFAULT_GUARD};
pub use password::PasswordHasher;
pub use session::Session;
