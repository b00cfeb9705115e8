use anyhow::Result;
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct BootstrapAdmin {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub jwt_secret: String,
    pub jwt_expiration_days: i64,
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub client_base_url: String,
    pub password_hash_cost: u32,
    pub department_cache_ttl_secs: u64,
    pub manager_cache_ttl_secs: u64,
    pub lookup_cache_capacity: u64,
    pub smtp: Option<SmtpConfig>,
    pub default_from_email: String,
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parsed_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

impl Config {
    pub fn from_env() -> Result<Self> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        Self::from_env_only()
    }

    /// Load configuration from environment variables only (without loading .env files)
    /// This is useful for testing where you want to control the environment directly
    pub fn from_env_only() -> Result<Self> {
        let smtp = non_empty("SMTP_HOST").map(|host| SmtpConfig {
            host,
            port: parsed_or("SMTP_PORT", 587),
            username: var_or("SMTP_USERNAME", ""),
            password: var_or("SMTP_PASSWORD", ""),
        });

        let bootstrap_admin = match (
            non_empty("BOOTSTRAP_ADMIN_USERNAME"),
            non_empty("BOOTSTRAP_ADMIN_EMAIL"),
            non_empty("BOOTSTRAP_ADMIN_PASSWORD"),
        ) {
            (Some(username), Some(email), Some(password)) => Some(BootstrapAdmin {
                username,
                email,
                password,
            }),
            _ => None,
        };

        Ok(Config {
            database_url: var_or("DATABASE_URL", "postgres://@localhost:5432/hrdesk"),
            database_max_connections: parsed_or("DATABASE_MAX_CONNECTIONS", 10),
            jwt_secret: var_or(
                "JWT_SECRET",
                "your-super-secret-jwt-key-change-this-in-production-12345",
            ),
            jwt_expiration_days: parsed_or("JWT_EXPIRATION_DAYS", 30),
            host: var_or("HOST", "127.0.0.1"),
            port: parsed_or("PORT", 8080),
            environment: var_or("ENVIRONMENT", "development"),
            client_base_url: var_or("BASE_URL", "http://localhost:3000"),
            password_hash_cost: parsed_or("PASSWORD_HASH_COST", bcrypt::DEFAULT_COST),
            department_cache_ttl_secs: parsed_or("DEPARTMENT_CACHE_TTL_SECS", 3600),
            manager_cache_ttl_secs: parsed_or("MANAGER_CACHE_TTL_SECS", 3600),
            lookup_cache_capacity: parsed_or("LOOKUP_CACHE_CAPACITY", 10_000),
            smtp,
            default_from_email: var_or("DEFAULT_FROM_EMAIL", "no-reply@hrdesk.local"),
            bootstrap_admin,
        })
    }

    /// Fixed configuration for tests; never touches the environment.
    pub fn test_config() -> Self {
        Config {
            database_url: "postgres://@localhost:5432/hrdesk_test".to_string(),
            database_max_connections: 1,
            jwt_secret: "test-jwt-secret-key-that-is-long-enough".to_string(),
            jwt_expiration_days: 1,
            host: "127.0.0.1".to_string(),
            port: 0,
            environment: "test".to_string(),
            client_base_url: "http://localhost:3000".to_string(),
            password_hash_cost: 4,
            department_cache_ttl_secs: 3600,
            manager_cache_ttl_secs: 3600,
            lookup_cache_capacity: 1_000,
            smtp: None,
            default_from_email: "no-reply@hrdesk.test".to_string(),
            bootstrap_admin: None,
        }
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn password_reset_url(&self) -> String {
        format!(
            "{}/reset-initial-password",
            self.client_base_url.trim_end_matches('/')
        )
    }
}
