//! Business code registry
//!
//! Application-level status codes, independent of HTTP status. A code's
//! numeric band decides its module:
//!
//! | Band          | Module     | HTTP (default) |
//! |---------------|------------|----------------|
//! | 0             | success    | 200            |
//! | 20000..=20999 | system     | 500            |
//! | 21000..=21999 | validation | 400            |
//! | 22000..=22999 | auth       | 401            |
//! | 30000..=30999 | user       | 200            |
//! | 31000..=31999 | resource   | 200            |
//! | 32000..=33999 | business   | 200            |
//!
//! User, resource, and business failures are "soft" errors: HTTP 200 with a
//! failure code in the envelope.

use std::fmt;

/// Message used for codes outside every band
pub const UNKNOWN_ERROR_MESSAGE: &str = "Unknown error";

/// Registered business codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum BusinessCode {
    Success = 0,

    // System
    SystemError = 20000,
    DatabaseError = 20001,
    ServiceUnavailable = 20002,
    ConfigError = 20003,
    RateLimited = 20004,

    // Validation
    ValidationError = 21000,
    MissingParameter = 21001,
    InvalidParameter = 21002,
    WeakPassword = 21003,

    // Auth
    Unauthorized = 22000,
    InvalidCredentials = 22001,
    TokenInvalid = 22002,
    TokenExpired = 22003,
    TokenRevoked = 22004,
    AccountDisabled = 22005,
    AccountLocked = 22006,
    Forbidden = 22007,

    // User
    UserNotFound = 30000,
    UserAlreadyExists = 30001,
    PasswordMismatch = 30002,

    // Resource
    ResourceNotFound = 31000,
    ResourceConflict = 31001,

    // Business
    BusinessError = 32000,
    OperationNotAllowed = 32001,
}

impl BusinessCode {
    /// Every registered code
    pub const ALL: &'static [BusinessCode] = &[
        Self::Success,
        Self::SystemError,
        Self::DatabaseError,
        Self::ServiceUnavailable,
        Self::ConfigError,
        Self::RateLimited,
        Self::ValidationError,
        Self::MissingParameter,
        Self::InvalidParameter,
        Self::WeakPassword,
        Self::Unauthorized,
        Self::InvalidCredentials,
        Self::TokenInvalid,
        Self::TokenExpired,
        Self::TokenRevoked,
        Self::AccountDisabled,
        Self::AccountLocked,
        Self::Forbidden,
        Self::UserNotFound,
        Self::UserAlreadyExists,
        Self::PasswordMismatch,
        Self::ResourceNotFound,
        Self::ResourceConflict,
        Self::BusinessError,
        Self::OperationNotAllowed,
    ];

    /// Numeric value
    #[inline]
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Look up a registered code
    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.code() == code)
    }

    /// Fixed user-facing message
    pub fn message(self) -> &'static str {
        match self {
            Self::Success => "Success",
            Self::SystemError => "Internal server error",
            Self::DatabaseError => "Database error",
            Self::ServiceUnavailable => "Service temporarily unavailable",
            Self::ConfigError => "Server configuration error",
            Self::RateLimited => "Too many requests, please try again later",
            Self::ValidationError => "Request validation failed",
            Self::MissingParameter => "Required parameter is missing",
            Self::InvalidParameter => "Invalid parameter",
            Self::WeakPassword => "Password does not meet strength requirements",
            Self::Unauthorized => "Authentication required",
            Self::InvalidCredentials => "Invalid username or password",
            Self::TokenInvalid => "Invalid token",
            Self::TokenExpired => "Token has expired",
            Self::TokenRevoked => "Token has been revoked",
            Self::AccountDisabled => "Account is disabled",
            Self::AccountLocked => "Account is locked",
            Self::Forbidden => "Insufficient permissions",
            Self::UserNotFound => "User not found",
            Self::UserAlreadyExists => "User already exists",
            Self::PasswordMismatch => "Current password is incorrect",
            Self::ResourceNotFound => "Resource not found",
            Self::ResourceConflict => "Resource already exists",
            Self::BusinessError => "Business rule violation",
            Self::OperationNotAllowed => "Operation not allowed",
        }
    }

    /// Symbolic name, sent as `sub_code`
    pub fn name(self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::SystemError => "SYSTEM_ERROR",
            Self::DatabaseError => "DATABASE_ERROR",
            Self::ServiceUnavailable => "SERVICE_UNAVAILABLE",
            Self::ConfigError => "CONFIG_ERROR",
            Self::RateLimited => "RATE_LIMITED",
            Self::ValidationError => "VALIDATION_ERROR",
            Self::MissingParameter => "MISSING_PARAMETER",
            Self::InvalidParameter => "INVALID_PARAMETER",
            Self::WeakPassword => "WEAK_PASSWORD",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::TokenInvalid => "TOKEN_INVALID",
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::TokenRevoked => "TOKEN_REVOKED",
            Self::AccountDisabled => "ACCOUNT_DISABLED",
            Self::AccountLocked => "ACCOUNT_LOCKED",
            Self::Forbidden => "FORBIDDEN",
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::UserAlreadyExists => "USER_ALREADY_EXISTS",
            Self::PasswordMismatch => "PASSWORD_MISMATCH",
            Self::ResourceNotFound => "RESOURCE_NOT_FOUND",
            Self::ResourceConflict => "RESOURCE_CONFLICT",
            Self::BusinessError => "BUSINESS_ERROR",
            Self::OperationNotAllowed => "OPERATION_NOT_ALLOWED",
        }
    }

    /// HTTP status that overrides the band default
    fn explicit_status(self) -> Option<u16> {
        match self {
            Self::ServiceUnavailable => Some(503),
            Self::RateLimited => Some(429),
            Self::Forbidden => Some(403),
            _ => None,
        }
    }

    /// Resolved HTTP status
    pub fn http_status(self) -> u16 {
        self.explicit_status()
            .unwrap_or_else(|| CodeModule::of(self.code()).default_status())
    }

    /// Module this code belongs to
    pub fn module(self) -> CodeModule {
        CodeModule::of(self.code())
    }

    #[inline]
    pub fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }
}

impl fmt::Display for BusinessCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.code())
    }
}

/// Functional module a code belongs to, by numeric band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodeModule {
    Success,
    System,
    Validation,
    Auth,
    User,
    Resource,
    Business,
    Unknown,
}

impl CodeModule {
    /// Classify any integer
    pub fn of(code: i32) -> Self {
        match code {
            0 => Self::Success,
            20000..=20999 => Self::System,
            21000..=21999 => Self::Validation,
            22000..=22999 => Self::Auth,
            30000..=30999 => Self::User,
            31000..=31999 => Self::Resource,
            32000..=33999 => Self::Business,
            _ => Self::Unknown,
        }
    }

    /// HTTP status for codes in this band without an explicit mapping
    pub fn default_status(self) -> u16 {
        match self {
            Self::Success | Self::User | Self::Resource | Self::Business => 200,
            Self::Validation => 400,
            Self::Auth => 401,
            Self::System | Self::Unknown => 500,
        }
    }

    /// Message for unregistered codes inside this band
    pub fn default_message(self) -> &'static str {
        match self {
            Self::Success => "Success",
            Self::System => "Internal server error",
            Self::Validation => "Request validation failed",
            Self::Auth => "Authentication failed",
            Self::User => "User operation failed",
            Self::Resource => "Resource operation failed",
            Self::Business => "Business rule violation",
            Self::Unknown => UNKNOWN_ERROR_MESSAGE,
        }
    }
}

/// Message and HTTP status for a code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeInfo {
    pub message: &'static str,
    pub http_status: u16,
}

/// Resolve any integer to a message and HTTP status. Never fails.
pub fn resolve(code: i32) -> CodeInfo {
    if let Some(known) = BusinessCode::from_code(code) {
        return CodeInfo {
            message: known.message(),
            http_status: known.http_status(),
        };
    }

    let module = CodeModule::of(code);
    CodeInfo {
        message: module.default_message(),
        http_status: module.default_status(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registered_codes_round_trip() {
        for &code in BusinessCode::ALL {
            assert_eq!(BusinessCode::from_code(code.code()), Some(code));
        }
    }

    #[test]
    fn test_registered_codes_are_in_their_band() {
        for &code in BusinessCode::ALL {
            assert_ne!(code.module(), CodeModule::Unknown, "{code} has no band");
        }
    }

    #[test]
    fn test_band_statuses() {
        assert_eq!(resolve(20001).http_status, 500);
        assert_eq!(resolve(21002).http_status, 400);
        assert_eq!(resolve(22003).http_status, 401);
        assert_eq!(resolve(30000).http_status, 200);
        assert_eq!(resolve(31000).http_status, 200);
        assert_eq!(resolve(32001).http_status, 200);
    }

    #[test]
    fn test_explicit_statuses_override_band() {
        assert_eq!(BusinessCode::Forbidden.http_status(), 403);
        assert_eq!(BusinessCode::RateLimited.http_status(), 429);
        assert_eq!(BusinessCode::ServiceUnavailable.http_status(), 503);
    }

    #[test]
    fn test_unregistered_code_in_band() {
        let info = resolve(22999);
        assert_eq!(info.http_status, 401);
        assert_eq!(info.message, "Authentication failed");

        let info = resolve(33500);
        assert_eq!(info.http_status, 200);
    }

    #[test]
    fn test_resolve_is_total() {
        for code in [i32::MIN, -1, 1, 200, 404, 19999, 29999, 34000, 99999, i32::MAX] {
            let info = resolve(code);
            assert_eq!(info.http_status, 500, "code {code}");
            assert_eq!(info.message, UNKNOWN_ERROR_MESSAGE);
        }
        assert_eq!(resolve(0).http_status, 200);
    }

    #[test]
    fn test_display() {
        assert_eq!(BusinessCode::TokenExpired.to_string(), "TOKEN_EXPIRED (22003)");
    }
}
