//! Application error types
//!
//! Unified error handling for the entire application. Every variant maps to
//! exactly one business code, which in turn decides the HTTP status.

use std::fmt;

use yishan_core::DomainError;

use crate::codes::BusinessCode;

/// Application-wide error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Authentication errors
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    TokenExpired,

    #[error("Token revoked")]
    TokenRevoked,

    #[error("Missing authentication")]
    MissingAuth,

    #[error("Account disabled")]
    AccountDisabled,

    #[error("Account locked")]
    AccountLocked,

    #[error("Insufficient permissions")]
    InsufficientPermissions,

    // Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Weak password: {0}")]
    WeakPassword(String),

    // User errors
    #[error("User not found")]
    UserNotFound,

    #[error("Current password is incorrect")]
    PasswordMismatch,

    // Resource errors
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Resource already exists: {0}")]
    AlreadyExists(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Operation not allowed: {0}")]
    OperationNotAllowed(String),

    // Rate limiting
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    // Database errors
    #[error("Database error: {0}")]
    Database(String),

    // Internal errors
    #[error("Internal server error")]
    Internal(#[source] anyhow::Error),

    // Domain errors
    #[error(transparent)]
    Domain(#[from] DomainError),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppError {
    /// Business code for this error
    #[must_use]
    pub fn business_code(&self) -> BusinessCode {
        match self {
            Self::InvalidCredentials => BusinessCode::InvalidCredentials,
            Self::InvalidToken => BusinessCode::TokenInvalid,
            Self::TokenExpired => BusinessCode::TokenExpired,
            Self::TokenRevoked => BusinessCode::TokenRevoked,
            Self::MissingAuth => BusinessCode::Unauthorized,
            Self::AccountDisabled => BusinessCode::AccountDisabled,
            Self::AccountLocked => BusinessCode::AccountLocked,
            Self::InsufficientPermissions => BusinessCode::Forbidden,

            Self::Validation(_) => BusinessCode::ValidationError,
            Self::InvalidInput(_) => BusinessCode::InvalidParameter,
            Self::WeakPassword(_) => BusinessCode::WeakPassword,

            Self::UserNotFound => BusinessCode::UserNotFound,
            Self::PasswordMismatch => BusinessCode::PasswordMismatch,

            Self::NotFound(_) => BusinessCode::ResourceNotFound,
            Self::AlreadyExists(_) | Self::Conflict(_) => BusinessCode::ResourceConflict,
            Self::OperationNotAllowed(_) => BusinessCode::OperationNotAllowed,

            Self::RateLimitExceeded => BusinessCode::RateLimited,
            Self::ServiceUnavailable(_) => BusinessCode::ServiceUnavailable,
            Self::Database(_) => BusinessCode::DatabaseError,
            Self::Internal(_) => BusinessCode::SystemError,
            Self::Config(_) => BusinessCode::ConfigError,

            Self::Domain(e) => Self::domain_code(e),
        }
    }

    /// Business code for a domain error
    #[must_use]
    pub fn domain_code(err: &DomainError) -> BusinessCode {
        match err {
            DomainError::UserNotFound(_) => BusinessCode::UserNotFound,
            DomainError::TokenNotFound(_) => BusinessCode::ResourceNotFound,
            DomainError::ValidationError(_) => BusinessCode::ValidationError,
            DomainError::WeakPassword(_) => BusinessCode::WeakPassword,
            DomainError::UsernameAlreadyExists | DomainError::EmailAlreadyExists => {
                BusinessCode::UserAlreadyExists
            }
            DomainError::TokenConflict => BusinessCode::ResourceConflict,
            DomainError::DatabaseError(_) => BusinessCode::DatabaseError,
            DomainError::InternalError(_) => BusinessCode::SystemError,
        }
    }

    /// Get HTTP status code for this error
    #[must_use]
    pub fn status_code(&self) -> u16 {
        self.business_code().http_status()
    }

    /// Get symbolic error code for API responses
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        self.business_code().name()
    }

    /// Message safe to show a client.
    ///
    /// System-band errors only ever expose the registry message; the detail
    /// stays in the logs.
    #[must_use]
    pub fn client_message(&self) -> String {
        let code = self.business_code();
        match self {
            Self::Validation(msg)
            | Self::InvalidInput(msg)
            | Self::WeakPassword(msg)
            | Self::NotFound(msg)
            | Self::AlreadyExists(msg)
            | Self::Conflict(msg)
            | Self::OperationNotAllowed(msg) => msg.clone(),
            Self::Domain(e) if e.is_validation() => e.to_string(),
            _ => code.message().to_string(),
        }
    }

    /// Check if this is a client error (4xx)
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        let status = self.status_code();
        (400..500).contains(&status)
    }

    /// Check if this is a server error (5xx)
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        let status = self.status_code();
        (500..600).contains(&status)
    }

    /// Create a not found error for a resource type
    #[must_use]
    pub fn not_found(resource: impl fmt::Display) -> Self {
        Self::NotFound(resource.to_string())
    }

    /// Create a validation error
    #[must_use]
    pub fn validation(msg: impl fmt::Display) -> Self {
        Self::Validation(msg.to_string())
    }

    /// Create an internal error from any error
    pub fn internal(err: impl Into<anyhow::Error>) -> Self {
        Self::Internal(err.into())
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
