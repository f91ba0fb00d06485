//! Application configuration structs
//!
//! Loads configuration from environment variables (and a `.env` file when present).

use std::env;
use std::str::FromStr;

use serde::Deserialize;

/// Shortest accepted HS256 signing secret, in bytes
pub const MIN_JWT_SECRET_LEN: usize = 32;

/// Longest accepted token retention before purge, in days
pub const MAX_RETENTION_DAYS: u32 = 36_500;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app: AppSettings,
    pub api: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub rate_limit: RateLimitConfig,
    pub cors: CorsConfig,
    pub token_cleanup: TokenCleanupConfig,
    pub bootstrap_admin: Option<BootstrapAdminConfig>,
}

/// General application settings
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default)]
    pub env: Environment,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Ok(Self::Production),
            "staging" => Ok(Self::Staging),
            "development" | "dev" => Ok(Self::Development),
            other => Err(ConfigError::InvalidValue("APP_ENV", other.to_string())),
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl ServerConfig {
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Database configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_migrations_dir")]
    pub migrations_dir: String,
}

/// JWT configuration
#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    #[serde(default = "default_issuer")]
    pub issuer: String,
    #[serde(default = "default_access_token_expiry")]
    pub access_token_expiry: i64,
    #[serde(default = "default_refresh_token_expiry")]
    pub refresh_token_expiry: i64,
}

/// Rate limiting configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u32,
    #[serde(default = "default_burst")]
    pub burst: u32,
}

/// CORS configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CorsConfig {
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

/// Expired-token purge settings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenCleanupConfig {
    /// Rows are kept this many days past refresh expiry
    #[serde(default)]
    pub retention_days: u32,
    /// In-process scheduler period; 0 leaves cleanup to an external trigger
    #[serde(default)]
    pub interval_secs: u64,
}

impl TokenCleanupConfig {
    #[must_use]
    pub fn scheduler_enabled(&self) -> bool {
        self.interval_secs > 0
    }
}

/// Administrator account created at startup when missing
#[derive(Clone, Deserialize)]
pub struct BootstrapAdminConfig {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for BootstrapAdminConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BootstrapAdminConfig")
            .field("username", &self.username)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

// Default value functions
fn default_app_name() -> String {
    "yishan-api".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_max_connections() -> u32 {
    20
}

fn default_min_connections() -> u32 {
    5
}

fn default_migrations_dir() -> String {
    "./migrations".to_string()
}

fn default_issuer() -> String {
    "yishan-api".to_string()
}

fn default_access_token_expiry() -> i64 {
    900 // 15 minutes
}

fn default_refresh_token_expiry() -> i64 {
    604_800 // 7 days
}

fn default_requests_per_second() -> u32 {
    10
}

fn default_burst() -> u32 {
    50
}

/// Parse an optional variable, falling back to `default` when unset or blank
fn parse_or<T, F>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key, raw)),
        _ => Ok(default),
    }
}

fn required<F>(lookup: &F, key: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .filter(|v| !v.trim().is_empty())
        .ok_or(ConfigError::MissingVar(key))
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if required environment variables are missing or a value is invalid
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_source(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    ///
    /// # Errors
    /// Returns an error if required keys are missing or a value is invalid
    pub fn from_source<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = match lookup("APP_ENV") {
            Some(raw) if !raw.trim().is_empty() => raw.trim().parse()?,
            _ => Environment::default(),
        };

        let bootstrap_admin = match (
            lookup("ADMIN_USERNAME"),
            lookup("ADMIN_EMAIL"),
            lookup("ADMIN_PASSWORD"),
        ) {
            (Some(username), Some(email), Some(password)) => Some(BootstrapAdminConfig {
                username,
                email,
                password,
            }),
            (None, None, None) => None,
            _ => {
                return Err(ConfigError::InvalidValue(
                    "ADMIN_USERNAME",
                    "ADMIN_USERNAME, ADMIN_EMAIL and ADMIN_PASSWORD must be set together".to_string(),
                ))
            }
        };

        let config = Self {
            app: AppSettings {
                name: lookup("APP_NAME").unwrap_or_else(default_app_name),
                env,
            },
            api: ServerConfig {
                host: lookup("API_HOST").unwrap_or_else(default_host),
                port: parse_or(&lookup, "API_PORT", default_port())?,
            },
            database: DatabaseConfig {
                url: required(&lookup, "DATABASE_URL")?,
                max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", default_max_connections())?,
                min_connections: parse_or(&lookup, "DATABASE_MIN_CONNECTIONS", default_min_connections())?,
                migrations_dir: lookup("DATABASE_MIGRATIONS_DIR").unwrap_or_else(default_migrations_dir),
            },
            jwt: JwtConfig {
                secret: required(&lookup, "JWT_SECRET")?,
                issuer: lookup("JWT_ISSUER").unwrap_or_else(default_issuer),
                access_token_expiry: parse_or(&lookup, "JWT_ACCESS_TOKEN_EXPIRY", default_access_token_expiry())?,
                refresh_token_expiry: parse_or(&lookup, "JWT_REFRESH_TOKEN_EXPIRY", default_refresh_token_expiry())?,
            },
            rate_limit: RateLimitConfig {
                requests_per_second: parse_or(&lookup, "RATE_LIMIT_REQUESTS_PER_SECOND", default_requests_per_second())?,
                burst: parse_or(&lookup, "RATE_LIMIT_BURST", default_burst())?,
            },
            cors: CorsConfig {
                allowed_origins: lookup("CORS_ALLOWED_ORIGINS")
                    .map(|s| {
                        s.split(',')
                            .map(str::trim)
                            .filter(|o| !o.is_empty())
                            .map(String::from)
                            .collect()
                    })
                    .unwrap_or_default(),
            },
            token_cleanup: TokenCleanupConfig {
                retention_days: parse_or(&lookup, "TOKEN_CLEANUP_RETENTION_DAYS", 0)?,
                interval_secs: parse_or(&lookup, "TOKEN_CLEANUP_INTERVAL_SECS", 0)?,
            },
            bootstrap_admin,
        };

        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints
    ///
    /// # Errors
    /// Returns `InvalidValue` naming the first offending key
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt.secret.len() < MIN_JWT_SECRET_LEN {
            return Err(ConfigError::InvalidValue(
                "JWT_SECRET",
                format!("must be at least {MIN_JWT_SECRET_LEN} bytes"),
            ));
        }
        if self.jwt.access_token_expiry <= 0 {
            return Err(ConfigError::InvalidValue(
                "JWT_ACCESS_TOKEN_EXPIRY",
                "must be positive".to_string(),
            ));
        }
        if self.jwt.refresh_token_expiry <= self.jwt.access_token_expiry {
            return Err(ConfigError::InvalidValue(
                "JWT_REFRESH_TOKEN_EXPIRY",
                "must be greater than JWT_ACCESS_TOKEN_EXPIRY".to_string(),
            ));
        }
        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigError::InvalidValue(
                "DATABASE_MIN_CONNECTIONS",
                "must not exceed DATABASE_MAX_CONNECTIONS".to_string(),
            ));
        }
        if self.rate_limit.requests_per_second == 0 || self.rate_limit.burst == 0 {
            return Err(ConfigError::InvalidValue(
                "RATE_LIMIT_REQUESTS_PER_SECOND",
                "rate limit values must be positive".to_string(),
            ));
        }
        if self.token_cleanup.retention_days > MAX_RETENTION_DAYS {
            return Err(ConfigError::InvalidValue(
                "TOKEN_CLEANUP_RETENTION_DAYS",
                format!("must not exceed {MAX_RETENTION_DAYS}"),
            ));
        }
        Ok(())
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn load(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        AppConfig::from_source(|key| vars.get(key).cloned())
    }

    fn minimal() -> Vec<(&'static str, &'static str)> {
        vec![("DATABASE_URL", "postgres://localhost/yishan"), ("JWT_SECRET", SECRET)]
    }

    #[test]
    fn test_environment_is_production() {
        assert!(!Environment::Development.is_production());
        assert!(!Environment::Staging.is_production());
        assert!(Environment::Production.is_production());
    }

    #[test]
    fn test_environment_is_development() {
        assert!(Environment::Development.is_development());
        assert!(!Environment::Staging.is_development());
        assert!(!Environment::Production.is_development());
    }

    #[test]
    fn test_server_address() {
        let config = ServerConfig {
            host: "0.0.0.0".to_string(),
            port: 8080,
        };
        assert_eq!(config.address(), "0.0.0.0:8080");
    }

    #[test]
    fn test_defaults() {
        let config = load(&minimal()).unwrap();

        assert_eq!(config.app.name, "yishan-api");
        assert_eq!(config.app.env, Environment::Development);
        assert_eq!(config.api.address(), "0.0.0.0:3000");
        assert_eq!(config.database.max_connections, 20);
        assert_eq!(config.database.min_connections, 5);
        assert_eq!(config.database.migrations_dir, "./migrations");
        assert_eq!(config.jwt.issuer, "yishan-api");
        assert_eq!(config.jwt.access_token_expiry, 900);
        assert_eq!(config.jwt.refresh_token_expiry, 604_800);
        assert_eq!(config.rate_limit.requests_per_second, 10);
        assert_eq!(config.rate_limit.burst, 50);
        assert!(config.cors.allowed_origins.is_empty());
        assert!(!config.token_cleanup.scheduler_enabled());
        assert!(config.bootstrap_admin.is_none());
    }

    #[test]
    fn test_missing_required() {
        let err = load(&[("JWT_SECRET", SECRET)]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar("DATABASE_URL")));

        let err = load(&[("DATABASE_URL", "postgres://x")]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar("JWT_SECRET")));
    }

    #[test]
    fn test_short_secret_rejected() {
        let err = load(&[("DATABASE_URL", "postgres://x"), ("JWT_SECRET", "short")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue("JWT_SECRET", _)));
    }

    #[test]
    fn test_refresh_must_outlive_access() {
        let mut vars = minimal();
        vars.push(("JWT_ACCESS_TOKEN_EXPIRY", "3600"));
        vars.push(("JWT_REFRESH_TOKEN_EXPIRY", "3600"));
        let err = load(&vars).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue("JWT_REFRESH_TOKEN_EXPIRY", _)));
    }

    #[test]
    fn test_unparseable_number() {
        let mut vars = minimal();
        vars.push(("API_PORT", "eighty"));
        let err = load(&vars).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue("API_PORT", _)));
    }

    #[test]
    fn test_overrides() {
        let mut vars = minimal();
        vars.extend([
            ("APP_ENV", "production"),
            ("CORS_ALLOWED_ORIGINS", "https://a.example, https://b.example,"),
            ("TOKEN_CLEANUP_RETENTION_DAYS", "3"),
            ("TOKEN_CLEANUP_INTERVAL_SECS", "600"),
        ]);
        let config = load(&vars).unwrap();

        assert!(config.app.env.is_production());
        assert_eq!(
            config.cors.allowed_origins,
            vec!["https://a.example".to_string(), "https://b.example".to_string()]
        );
        assert_eq!(config.token_cleanup.retention_days, 3);
        assert!(config.token_cleanup.scheduler_enabled());
    }

    #[test]
    fn test_retention_bounded() {
        let mut vars = minimal();
        vars.push(("TOKEN_CLEANUP_RETENTION_DAYS", "200000000"));
        let err = load(&vars).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue("TOKEN_CLEANUP_RETENTION_DAYS", _)));
    }

    #[test]
    fn test_bootstrap_admin_all_or_nothing() {
        let mut vars = minimal();
        vars.push(("ADMIN_USERNAME", "root"));
        assert!(load(&vars).is_err());

        vars.push(("ADMIN_EMAIL", "root@example.com"));
        vars.push(("ADMIN_PASSWORD", "Admin1234"));
        let admin = load(&vars).unwrap().bootstrap_admin.unwrap();
        assert_eq!(admin.username, "root");
        assert!(!format!("{admin:?}").contains("Admin1234"));
    }
}
