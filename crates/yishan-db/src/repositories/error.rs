//! Error handling utilities for repositories

use sqlx::Error as SqlxError;
use yishan_core::error::DomainError;

/// Convert SQLx error to DomainError
pub fn map_db_error(e: SqlxError) -> DomainError {
    DomainError::DatabaseError(e.to_string())
}

/// Check for unique violation and return appropriate error or fallback.
/// `on_unique` receives the violated constraint name, if reported.
pub fn map_unique_violation<F>(e: SqlxError, on_unique: F) -> DomainError
where
    F: FnOnce(Option<&str>) -> DomainError,
{
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() {
            return on_unique(db_err.constraint());
        }
    }
    DomainError::DatabaseError(e.to_string())
}

/// Create a "user not found" error
pub fn user_not_found(id: i64) -> DomainError {
    DomainError::UserNotFound(id)
}

/// Map a users-table unique violation to the field that collided
pub fn user_conflict(constraint: Option<&str>) -> DomainError {
    match constraint {
        Some(name) if name.contains("email") => DomainError::EmailAlreadyExists,
        _ => DomainError::UsernameAlreadyExists,
    }
}

/// Convert a count or offset to a SQL BIGINT, saturating
pub fn to_bigint(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_conflict() {
        assert!(matches!(
            user_conflict(Some("users_email_key")),
            DomainError::EmailAlreadyExists
        ));
        assert!(matches!(
            user_conflict(Some("users_username_key")),
            DomainError::UsernameAlreadyExists
        ));
    }

    #[test]
    fn test_to_bigint_saturates() {
        assert_eq!(to_bigint(5), 5);
        assert_eq!(to_bigint(u64::MAX), i64::MAX);
    }
}
