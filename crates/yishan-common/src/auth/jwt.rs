//! JWT utilities for authentication
//!
//! Access and refresh tokens are signed with the same HS256 key and told apart
//! by the `type` claim. Expiry is checked against a caller-supplied instant.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

/// Token type discriminator embedded in the payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issuer
    pub iss: String,
    /// Unique token ID
    pub jti: String,
    #[serde(rename = "type")]
    pub token_type: TokenType,
}

impl Claims {
    /// Get the user ID
    ///
    /// # Errors
    /// Returns an error if the subject is not a numeric ID
    pub fn user_id(&self) -> Result<i64, AppError> {
        self.sub.parse::<i64>().map_err(|_| AppError::InvalidToken)
    }

    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.exp
    }

    #[must_use]
    pub fn is_access_token(&self) -> bool {
        self.token_type == TokenType::Access
    }

    #[must_use]
    pub fn is_refresh_token(&self) -> bool {
        self.token_type == TokenType::Refresh
    }
}

/// Freshly minted token pair, not yet persisted
#[derive(Debug, Clone)]
pub struct IssuedTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub access_expires_at: DateTime<Utc>,
    pub refresh_expires_at: DateTime<Utc>,
}

/// JWT service for encoding and decoding tokens
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    access_token_expiry: i64,
    refresh_token_expiry: i64,
}

impl JwtService {
    /// Create a new JWT service with the given secret, issuer and expiry times (seconds)
    #[must_use]
    pub fn new(
        secret: &str,
        issuer: impl Into<String>,
        access_token_expiry: i64,
        refresh_token_expiry: i64,
    ) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            issuer: issuer.into(),
            access_token_expiry,
            refresh_token_expiry,
        }
    }

    /// Access token lifetime in seconds
    #[must_use]
    pub fn access_token_expiry(&self) -> i64 {
        self.access_token_expiry
    }

    /// Refresh token lifetime in seconds
    #[must_use]
    pub fn refresh_token_expiry(&self) -> i64 {
        self.refresh_token_expiry
    }

    /// Generate an access/refresh pair for a user, issued at `now`
    ///
    /// # Errors
    /// Returns an error if token encoding fails
    pub fn generate_token_pair(&self, user_id: i64, now: DateTime<Utc>) -> Result<IssuedTokens, AppError> {
        let (access_token, access_expires_at) = self.encode_token(user_id, TokenType::Access, now)?;
        let (refresh_token, refresh_expires_at) =
            self.encode_token(user_id, TokenType::Refresh, now)?;

        Ok(IssuedTokens {
            access_token,
            refresh_token,
            access_expires_at,
            refresh_expires_at,
        })
    }

    fn encode_token(
        &self,
        user_id: i64,
        token_type: TokenType,
        now: DateTime<Utc>,
    ) -> Result<(String, DateTime<Utc>), AppError> {
        let expiry = match token_type {
            TokenType::Access => self.access_token_expiry,
            TokenType::Refresh => self.refresh_token_expiry,
        };
        let expires_at = now + Duration::seconds(expiry);

        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            iss: self.issuer.clone(),
            jti: Uuid::new_v4().to_string(),
            token_type,
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to encode JWT: {e}")))?;
        Ok((token, expires_at))
    }

    /// Decode a token, verify its signature and issuer, and check expiry against `now`
    ///
    /// # Errors
    /// Returns `TokenExpired` for an expired token and `InvalidToken` for anything else
    pub fn decode_token(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_issuer(&[&self.issuer]);
        validation.set_required_spec_claims(&["exp", "sub", "iss"]);

        let claims = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|_| AppError::InvalidToken)?
            .claims;

        if claims.is_expired_at(now) {
            return Err(AppError::TokenExpired);
        }

        Ok(claims)
    }

    /// Validate an access token and return the claims
    ///
    /// # Errors
    /// Returns an error if the token is invalid, expired, or not an access token
    pub fn validate_access_token(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, AppError> {
        let claims = self.decode_token(token, now)?;

        if !claims.is_access_token() {
            return Err(AppError::InvalidToken);
        }

        Ok(claims)
    }

    /// Validate a refresh token and return the claims
    ///
    /// # Errors
    /// Returns an error if the token is invalid, expired, or not a refresh token
    pub fn validate_refresh_token(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, AppError> {
        let claims = self.decode_token(token, now)?;

        if !claims.is_refresh_token() {
            return Err(AppError::InvalidToken);
        }

        Ok(claims)
    }
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("issuer", &self.issuer)
            .field("access_token_expiry", &self.access_token_expiry)
            .field("refresh_token_expiry", &self.refresh_token_expiry)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_service() -> JwtService {
        JwtService::new("test-secret-key-that-is-long-enough-for-hs256", "yishan-test", 900, 604_800)
    }

    #[test]
    fn test_generate_token_pair() {
        let service = create_test_service();
        let now = Utc::now();

        let pair = service.generate_token_pair(42, now).unwrap();

        assert!(!pair.access_token.is_empty());
        assert_ne!(pair.access_token, pair.refresh_token);
        assert_eq!(pair.access_expires_at, now + Duration::seconds(900));
        assert!(pair.access_expires_at < pair.refresh_expires_at);
    }

    #[test]
    fn test_same_second_pairs_differ() {
        let service = create_test_service();
        let now = Utc::now();

        let a = service.generate_token_pair(42, now).unwrap();
        let b = service.generate_token_pair(42, now).unwrap();
        assert_ne!(a.access_token, b.access_token);
        assert_ne!(a.refresh_token, b.refresh_token);
    }

    #[test]
    fn test_validate_access_token() {
        let service = create_test_service();
        let now = Utc::now();
        let pair = service.generate_token_pair(42, now).unwrap();

        let claims = service.validate_access_token(&pair.access_token, now).unwrap();
        assert_eq!(claims.user_id().unwrap(), 42);
        assert_eq!(claims.iss, "yishan-test");

        // Refresh token is rejected where an access token is expected
        let result = service.validate_access_token(&pair.refresh_token, now);
        assert!(matches!(result, Err(AppError::InvalidToken)));
    }

    #[test]
    fn test_validate_refresh_token() {
        let service = create_test_service();
        let now = Utc::now();
        let pair = service.generate_token_pair(42, now).unwrap();

        let claims = service.validate_refresh_token(&pair.refresh_token, now).unwrap();
        assert!(claims.is_refresh_token());

        let result = service.validate_refresh_token(&pair.access_token, now);
        assert!(matches!(result, Err(AppError::InvalidToken)));
    }

    #[test]
    fn test_expiry_uses_supplied_time() {
        let service = create_test_service();
        let now = Utc::now();
        let pair = service.generate_token_pair(42, now).unwrap();

        let later = now + Duration::seconds(901);
        assert!(matches!(
            service.validate_access_token(&pair.access_token, later),
            Err(AppError::TokenExpired)
        ));
        assert!(service.validate_refresh_token(&pair.refresh_token, later).is_ok());
    }

    #[test]
    fn test_invalid_token() {
        let service = create_test_service();
        let result = service.decode_token("invalid.token.here", Utc::now());
        assert!(matches!(result, Err(AppError::InvalidToken)));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let service = create_test_service();
        let other = JwtService::new("another-secret-key-that-is-long-enough!!", "yishan-test", 900, 604_800);
        let now = Utc::now();
        let pair = other.generate_token_pair(42, now).unwrap();

        assert!(matches!(
            service.validate_access_token(&pair.access_token, now),
            Err(AppError::InvalidToken)
        ));
    }

    #[test]
    fn test_wrong_issuer_rejected() {
        let service = create_test_service();
        let other = JwtService::new(
            "test-secret-key-that-is-long-enough-for-hs256",
            "someone-else",
            900,
            604_800,
        );
        let now = Utc::now();
        let pair = other.generate_token_pair(42, now).unwrap();

        assert!(service.decode_token(&pair.access_token, now).is_err());
    }

    #[test]
    fn test_claims_type_field_name() {
        let claims = Claims {
            sub: "1".to_string(),
            iat: 0,
            exp: 10,
            iss: "yishan".to_string(),
            jti: "x".to_string(),
            token_type: TokenType::Access,
        };
        let value = serde_json::to_value(&claims).unwrap();
        assert_eq!(value["type"], "access");
    }
}
