//! Configuration structs

mod app_config;

pub use app_config::{
    AppConfig, AppSettings, BootstrapAdminConfig, ConfigError, CorsConfig, DatabaseConfig,
    Environment, JwtConfig, RateLimitConfig, ServerConfig, TokenCleanupConfig, MAX_RETENTION_DAYS,
    MIN_JWT_SECRET_LEN,
};
