use config::{Config as ConfigFile, Environment, File};
use serde::Deserialize;
use tenantauth_cache::CacheConfig;
use tenantauth_database::DatabaseConfig;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    /// Rate-limit counters live in process memory when unset.
    #[serde(default)]
    pub redis: Option<CacheConfig>,
    pub tenancy: TenancyConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    pub session: SessionConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Take the client IP from `X-Forwarded-For` / `X-Real-IP`. Only enable
    /// behind a reverse proxy that overwrites those headers.
    #[serde(default)]
    pub trust_forwarded_for: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            trust_forwarded_for: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TenancyConfig {
    pub central_domains: Vec<String>,
    #[serde(default = "default_true")]
    pub resolve_custom_domains: bool,
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_seconds: u64,
    #[serde(default)]
    pub trust_forwarded_host: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthConfig {
    /// Guard handed out to requests; `web` when unset.
    pub guard: Option<String>,
    /// Additional guard names besides `web`.
    #[serde(default)]
    pub guards: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub secret: String,
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    #[serde(default)]
    pub cookie_domain: String,
    #[serde(default = "default_max_age")]
    pub max_age_seconds: u64,
    #[serde(default)]
    pub secure: bool,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_true() -> bool {
    true
}

fn default_cache_ttl() -> u64 {
    300
}

fn default_cookie_name() -> String {
    "tenantauth_session".to_string()
}

fn default_max_age() -> u64 {
    7200
}

impl Config {
    /// Load `config/default.yaml` (optional) overlaid with `TENANTAUTH__*`
    /// environment variables, e.g. `TENANTAUTH__TENANCY__CENTRAL_DOMAINS=a.com,b.com`.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var("TENANTAUTH_CONFIG").unwrap_or_else(|_| "config/default".to_string());

        let settings = ConfigFile::builder()
            .add_source(File::with_name(&config_path).required(false))
            .add_source(
                Environment::with_prefix("TENANTAUTH")
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("tenancy.central_domains")
                    .with_list_parse_key("auth.guards")
                    .try_parsing(true),
            )
            .build()?;

        Self::from_settings(settings)
    }

    fn from_settings(settings: ConfigFile) -> Result<Self, ConfigError> {
        let config: Config = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.session.secret.len() < 16 {
            return Err(ConfigError::Invalid(
                "session.secret must be at least 16 characters".to_string(),
            ));
        }

        if self.tenancy.central_domains.is_empty() {
            tracing::warn!("tenancy.central_domains is empty; every named host is treated as a tenant domain");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    fn parse(yaml: &str) -> Result<Config, ConfigError> {
        let settings = ConfigFile::builder()
            .add_source(File::from_str(yaml, FileFormat::Yaml))
            .build()?;
        Config::from_settings(settings)
    }

    const MINIMAL: &str = r#"
database:
  url: postgresql://localhost/tenantauth
tenancy:
  central_domains: [example.com]
session:
  secret: 0123456789abcdef0123456789abcdef
"#;

    #[test]
    fn test_defaults() {
        let config = parse(MINIMAL).unwrap();

        assert_eq!(config.server.port, 3000);
        assert!(!config.server.trust_forwarded_for);
        assert_eq!(config.database.max_connections, 20);
        assert!(config.redis.is_none());
        assert!(config.tenancy.resolve_custom_domains);
        assert_eq!(config.tenancy.cache_ttl_seconds, 300);
        assert!(config.auth.guard.is_none());
        assert_eq!(config.session.cookie_name, "tenantauth_session");
    }

    #[test]
    fn test_short_secret_is_rejected() {
        let yaml = MINIMAL.replace("0123456789abcdef0123456789abcdef", "short");
        assert!(matches!(parse(&yaml), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_missing_central_domains_fails() {
        let yaml = r#"
database:
  url: postgresql://localhost/tenantauth
tenancy: {}
session:
  secret: 0123456789abcdef0123456789abcdef
"#;
        assert!(matches!(parse(yaml), Err(ConfigError::Load(_))));
    }

    #[test]
    fn test_full_config() {
        let yaml = r#"
server: { host: 127.0.0.1, port: 8080, trust_forwarded_for: true }
database: { url: "postgresql://db/tenantauth", max_connections: 4 }
redis: { url: "redis://cache:6379" }
tenancy:
  central_domains: [example.com, example.org]
  resolve_custom_domains: false
auth: { guard: admin, guards: [admin] }
session: { secret: 0123456789abcdef0123456789abcdef, secure: true }
"#;
        let config = parse(yaml).unwrap();

        assert_eq!(config.server.port, 8080);
        assert!(config.server.trust_forwarded_for);
        assert_eq!(config.redis.unwrap().url, "redis://cache:6379");
        assert_eq!(config.tenancy.central_domains.len(), 2);
        assert!(!config.tenancy.resolve_custom_domains);
        assert_eq!(config.auth.guard.as_deref(), Some("admin"));
        assert!(config.session.secure);
    }
}
