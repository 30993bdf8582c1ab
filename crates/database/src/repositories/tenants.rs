use crate::error::Result;
use sqlx::PgPool;
use tenantauth_models::Tenant;

#[derive(Clone)]
pub struct TenantRepository {
    pool: PgPool,
}

impl TenantRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find the tenant owning `domain` (exact, already-normalized host).
    pub async fn find_by_domain(&self, domain: &str) -> Result<Option<Tenant>> {
        let tenant = sqlx::query_as::<_, Tenant>(
            r#"
            SELECT t.id, t.slug, t.name, t.status, t.created_at
            FROM tenants t
            INNER JOIN domains d ON d.tenant_id = t.id
            WHERE d.domain = $1
            "#,
        )
        .bind(domain)
        .fetch_optional(&self.pool)
        .await?;

        Ok(tenant)
    }
}
