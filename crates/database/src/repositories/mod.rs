pub mod tenants;
pub mod users;

pub use tenants::TenantRepository;
pub use users::UserRepository;
