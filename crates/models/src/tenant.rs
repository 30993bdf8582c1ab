use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TenantStatus {
    Active,
    Suspended,
}

impl Default for TenantStatus {
    fn default() -> Self {
        Self::Active
    }
}

impl From<String> for TenantStatus {
    fn from(s: String) -> Self {
        match s.to_lowercase().as_str() {
            "suspended" | "disabled" => Self::Suspended,
            _ => Self::Active,
        }
    }
}

/// An isolated customer organization sharing the application instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Tenant {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl Tenant {
    pub fn status(&self) -> TenantStatus {
        TenantStatus::from(self.status.clone())
    }

    pub fn is_active(&self) -> bool {
        self.status() == TenantStatus::Active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_from_string() {
        assert_eq!(TenantStatus::from("active".to_string()), TenantStatus::Active);
        assert_eq!(TenantStatus::from("SUSPENDED".to_string()), TenantStatus::Suspended);
        assert_eq!(TenantStatus::from("disabled".to_string()), TenantStatus::Suspended);
        assert_eq!(TenantStatus::from("whatever".to_string()), TenantStatus::Active);
    }

    #[test]
    fn test_suspended_tenant_is_inactive() {
        let tenant = Tenant {
            id: Uuid::new_v4(),
            slug: "acme".to_string(),
            name: "Acme".to_string(),
            status: "suspended".to_string(),
            created_at: Utc::now(),
        };
        assert!(!tenant.is_active());
    }
}
