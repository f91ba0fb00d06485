//! # yishan-common
//!
//! Shared utilities: configuration, error handling, business codes, the
//! response envelope, authentication primitives, and telemetry.

pub mod auth;
pub mod codes;
pub mod config;
pub mod error;
pub mod response;
pub mod telemetry;

// Re-export commonly used types at crate root
pub use auth::{
    hash_password, validate_password_strength, verify_password, Claims, IssuedTokens, JwtService,
    PasswordService, TokenType,
};
pub use codes::{resolve, BusinessCode, CodeInfo, CodeModule};
pub use config::{
    AppConfig, AppSettings, BootstrapAdminConfig, ConfigError, CorsConfig, DatabaseConfig,
    Environment, JwtConfig, RateLimitConfig, ServerConfig, TokenCleanupConfig,
};
pub use error::{AppError, AppResult};
pub use response::{current_request_id, with_request_id, ApiResponse, PaginationMeta};
pub use telemetry::{try_init_tracing, try_init_tracing_with_config, TracingConfig, TracingError};
