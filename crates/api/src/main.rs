// Tenant-aware authentication API server

mod actions;
mod config;
mod handlers;
mod middleware;
mod provider;
mod routes;
mod session;

#[cfg(test)]
mod test_support;

use anyhow::Context;
use config::Config;
use dotenvy::dotenv;
use middleware::RateLimiterRegistry;
use session::SessionManager;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tenantauth_auth::{DatabaseUserProvider, TenantAwareGuardFactory, UserActions};
use tenantauth_cache::{Cache, MemoryStore, RateLimitStore, RateLimiter};
use tenantauth_database::{Database, TenantRepository, UserRepository};
use tenantauth_tenant::{CachedTenantResolver, DatabaseTenantResolver, TenantExtractor};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

/// Upper bound on tenants kept in the resolver cache.
const TENANT_CACHE_CAPACITY: u64 = 10_000;

pub struct AppState {
    pub guard_factory: TenantAwareGuardFactory,
    pub extractor: TenantExtractor,
    pub sessions: SessionManager,
    pub limiter: RateLimiter,
    pub rate_limits: RateLimiterRegistry,
    pub trust_forwarded_for: bool,
    pub actions: UserActions,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tenantauth_api=debug,tower_http=debug")),
        )
        .init();

    tracing::info!("Starting tenantauth API server");
    tracing::info!("Version: {}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = Config::load().context("Failed to load configuration")?;
    tracing::info!("Server: {}:{}", config.server.host, config.server.port);
    tracing::info!("Central domains: {:?}", config.tenancy.central_domains);

    // Initialize database
    tracing::info!("Connecting to database...");
    let database = Database::new(config.database.clone())
        .await
        .context("Failed to connect to database")?;
    database.ping().await.context("Database ping failed")?;
    tracing::info!("Database connected");

    // Rate-limit counters
    let store: Arc<dyn RateLimitStore> = match &config.redis {
        Some(redis) => {
            tracing::info!("Connecting to Redis...");
            let cache = Cache::new(redis.clone())
                .await
                .context("Failed to connect to Redis")?;
            cache.ping().await.context("Redis ping failed")?;
            tracing::info!("Redis connected");
            Arc::new(cache)
        }
        None => {
            tracing::warn!("No redis configured, rate-limit counters are per process");
            let store = MemoryStore::new();
            store.start_cleanup_task(60);
            Arc::new(store)
        }
    };

    // Tenancy and guards
    let resolver = Arc::new(CachedTenantResolver::new(
        Arc::new(DatabaseTenantResolver::new(TenantRepository::new(
            database.pool().clone(),
        ))),
        Duration::from_secs(config.tenancy.cache_ttl_seconds),
        TENANT_CACHE_CAPACITY,
    ));
    let users = UserRepository::new(database.pool().clone());
    let guard_factory = provider::guard_factory(
        &config.tenancy,
        &config.auth,
        resolver,
        Arc::new(DatabaseUserProvider::new(users.clone())),
    );
    tracing::info!(
        "Guard factory initialized (guard: {})",
        config.auth.guard.as_deref().unwrap_or(tenantauth_auth::DEFAULT_GUARD)
    );

    let sessions = SessionManager::new(&config.session);
    sessions.start_cleanup_task(300);

    let state = Arc::new(AppState {
        guard_factory,
        extractor: TenantExtractor::new().trusting_forwarded_host(config.tenancy.trust_forwarded_host),
        sessions,
        limiter: RateLimiter::new(store),
        rate_limits: provider::rate_limits(),
        trust_forwarded_for: config.server.trust_forwarded_for,
        actions: provider::user_actions(users),
    });

    // Create router
    let app = routes::create_router(state).layer(TraceLayer::new_for_http());

    tracing::info!("Routes configured:");
    tracing::info!("   GET  /health");
    tracing::info!("   POST /login                      [throttle: login]");
    tracing::info!("   POST /two-factor-challenge       [throttle: two-factor]");
    tracing::info!("   POST /logout");
    tracing::info!("   POST /register");
    tracing::info!("   GET  /user");
    tracing::info!("   PUT  /user/profile-information");
    tracing::info!("   PUT  /user/password");

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    tracing::info!("Server ready at http://{}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("Server error")?;

    Ok(())
}
