//! Domain errors - error types for the domain layer

use thiserror::Error;

/// Domain layer errors
#[derive(Debug, Error)]
pub enum DomainError {
    // =========================================================================
    // Not Found Errors
    // =========================================================================
    #[error("User not found: {0}")]
    UserNotFound(i64),

    #[error("Token not found: {0}")]
    TokenNotFound(i64),

    // =========================================================================
    // Validation Errors
    // =========================================================================
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Password too weak: {0}")]
    WeakPassword(String),

    // =========================================================================
    // Conflict Errors
    // =========================================================================
    #[error("Username already in use")]
    UsernameAlreadyExists,

    #[error("Email already in use")]
    EmailAlreadyExists,

    #[error("Token string collision")]
    TokenConflict,

    // =========================================================================
    // Infrastructure Errors (wrapped)
    // =========================================================================
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl DomainError {
    /// Get an error code string for API responses
    pub fn code(&self) -> &'static str {
        match self {
            // Not Found
            Self::UserNotFound(_) => "UNKNOWN_USER",
            Self::TokenNotFound(_) => "UNKNOWN_TOKEN",

            // Validation
            Self::ValidationError(_) => "VALIDATION_ERROR",
            Self::WeakPassword(_) => "WEAK_PASSWORD",

            // Conflict
            Self::UsernameAlreadyExists => "USERNAME_ALREADY_EXISTS",
            Self::EmailAlreadyExists => "EMAIL_ALREADY_EXISTS",
            Self::TokenConflict => "TOKEN_CONFLICT",

            // Infrastructure
            Self::DatabaseError(_) => "DATABASE_ERROR",
            Self::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::UserNotFound(_) | Self::TokenNotFound(_))
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::ValidationError(_) | Self::WeakPassword(_))
    }

    /// Check if this is a conflict error
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::UsernameAlreadyExists | Self::EmailAlreadyExists | Self::TokenConflict
        )
    }

    /// Check if this is an infrastructure failure
    pub fn is_infrastructure(&self) -> bool {
        matches!(self, Self::DatabaseError(_) | Self::InternalError(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(DomainError::UserNotFound(1).code(), "UNKNOWN_USER");
        assert_eq!(DomainError::TokenConflict.code(), "TOKEN_CONFLICT");
    }

    #[test]
    fn test_is_not_found() {
        assert!(DomainError::UserNotFound(1).is_not_found());
        assert!(DomainError::TokenNotFound(1).is_not_found());
        assert!(!DomainError::EmailAlreadyExists.is_not_found());
    }

    #[test]
    fn test_is_conflict() {
        assert!(DomainError::TokenConflict.is_conflict());
        assert!(DomainError::UsernameAlreadyExists.is_conflict());
        assert!(!DomainError::DatabaseError("x".to_string()).is_conflict());
    }

    #[test]
    fn test_error_display() {
        let err = DomainError::UserNotFound(123);
        assert_eq!(err.to_string(), "User not found: 123");

        let err = DomainError::WeakPassword("too short".to_string());
        assert_eq!(err.to_string(), "Password too weak: too short");
    }
}
