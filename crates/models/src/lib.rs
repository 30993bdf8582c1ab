pub mod tenant;
pub mod user;

pub use tenant::{Tenant, TenantStatus};
pub use user::{
    NewUser, ResetUserPassword, UpdateUserPassword, UpdateUserProfile, User, UserProfile,
};
