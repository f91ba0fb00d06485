//! Issued access/refresh token pair - one authenticated session

use chrono::{DateTime, Utc};

use crate::error::DomainError;

/// A persisted token pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthToken {
    pub id: i64,
    pub user_id: i64,
    pub access_token: String,
    pub refresh_token: String,
    pub access_expires_at: DateTime<Utc>,
    pub refresh_expires_at: DateTime<Utc>,
    pub is_revoked: bool,
    pub revoked_at: Option<DateTime<Utc>>,
    /// Set only when the pair was consumed by a refresh
    pub rotated_at: Option<DateTime<Utc>>,
    pub client_ip: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AuthToken {
    /// Usable for authenticating requests
    #[inline]
    pub fn is_access_active(&self, now: DateTime<Utc>) -> bool {
        !self.is_revoked && now < self.access_expires_at
    }

    /// Usable for minting a new pair
    #[inline]
    pub fn is_refresh_active(&self, now: DateTime<Utc>) -> bool {
        !self.is_revoked && now < self.refresh_expires_at
    }

    /// Both halves of the pair have expired
    #[inline]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.refresh_expires_at
    }

    /// Mark revoked. Returns `false` when it already was; the first
    /// `revoked_at` is kept.
    pub fn revoke(&mut self, now: DateTime<Utc>) -> bool {
        if self.is_revoked {
            return false;
        }
        self.is_revoked = true;
        self.revoked_at = Some(now);
        self.updated_at = now;
        true
    }

    /// Revoke because a refresh consumed this pair. Returns `false` when
    /// the pair was already revoked for any reason.
    pub fn mark_rotated(&mut self, now: DateTime<Utc>) -> bool {
        if !self.revoke(now) {
            return false;
        }
        self.rotated_at = Some(now);
        true
    }

    /// The refresh token was already exchanged for a newer pair
    #[inline]
    pub fn was_rotated(&self) -> bool {
        self.rotated_at.is_some()
    }

    /// Seconds until the access token expires (never negative)
    pub fn access_expires_in(&self, now: DateTime<Utc>) -> i64 {
        (self.access_expires_at - now).num_seconds().max(0)
    }

    /// Seconds until the refresh token expires (never negative)
    pub fn refresh_expires_in(&self, now: DateTime<Utc>) -> i64 {
        (self.refresh_expires_at - now).num_seconds().max(0)
    }
}

/// Values for inserting a new token pair
#[derive(Debug, Clone)]
pub struct NewAuthToken {
    pub user_id: i64,
    pub access_token: String,
    pub refresh_token: String,
    pub access_expires_at: DateTime<Utc>,
    pub refresh_expires_at: DateTime<Utc>,
    pub client_ip: Option<String>,
    pub user_agent: Option<String>,
}

impl NewAuthToken {
    /// Enforce that the access token expires strictly before the refresh token
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.access_expires_at >= self.refresh_expires_at {
            return Err(DomainError::ValidationError(
                "access token must expire before refresh token".to_string(),
            ));
        }
        if self.access_token == self.refresh_token {
            return Err(DomainError::TokenConflict);
        }
        Ok(())
    }

    /// Materialize into a stored row
    pub fn into_token(self, id: i64, now: DateTime<Utc>) -> AuthToken {
        AuthToken {
            id,
            user_id: self.user_id,
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            access_expires_at: self.access_expires_at,
            refresh_expires_at: self.refresh_expires_at,
            is_revoked: false,
            revoked_at: None,
            rotated_at: None,
            client_ip: self.client_ip,
            user_agent: self.user_agent,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Result of rotating a refresh token
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RotateOutcome {
    /// Old pair revoked, new pair stored
    Rotated(AuthToken),
    /// The old pair had already been revoked (replay or lost race); nothing stored
    AlreadyRevoked,
}

/// Token counts, globally or for one user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TokenStats {
    pub total: i64,
    pub active: i64,
    pub expired: i64,
    pub revoked: i64,
}

impl TokenStats {
    /// Classify a row into the counters
    pub fn tally(&mut self, token: &AuthToken, now: DateTime<Utc>) {
        self.total += 1;
        if token.is_revoked {
            self.revoked += 1;
        } else if token.is_expired(now) {
            self.expired += 1;
        } else {
            self.active += 1;
        }
    }
}
