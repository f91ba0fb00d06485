//! Password hashing and verification utilities
//!
//! Uses scrypt (N = 2^14, r = 8, p = 1, 64-byte key) with a random 16-byte salt.
//! Stored form is `hex(salt) + "." + hex(key)`.

use std::sync::OnceLock;

use rand::{rngs::OsRng, RngCore};
use scrypt::{scrypt, Params};

use crate::error::AppError;

const SCRYPT_LOG_N: u8 = 14;
const SCRYPT_R: u32 = 8;
const SCRYPT_P: u32 = 1;
const KEY_LEN: usize = 64;
const SALT_LEN: usize = 16;

/// Salt of the throwaway hash used to equalize timing for unknown accounts
const DUMMY_SALT: [u8; SALT_LEN] = *b"yishan-dummy-slt";

fn derive_key(password: &[u8], salt: &[u8]) -> Result<[u8; KEY_LEN], AppError> {
    let params = Params::new(SCRYPT_LOG_N, SCRYPT_R, SCRYPT_P, KEY_LEN)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Invalid scrypt parameters: {e}")))?;

    let mut key = [0u8; KEY_LEN];
    scrypt(password, salt, &params, &mut key)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Password hashing failed: {e}")))?;
    Ok(key)
}

/// Constant-time comparison to prevent timing attacks
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

/// Hash a password using scrypt with a fresh random salt
///
/// # Errors
/// Returns an error if key derivation fails
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);

    let key = derive_key(password.as_bytes(), &salt)?;
    Ok(format!("{}.{}", hex::encode(salt), hex::encode(key)))
}

/// Verify a password against a stored hash.
///
/// Malformed stored hashes verify as `false`.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Some((salt_hex, key_hex)) = stored.split_once('.') else {
        return false;
    };
    let (Ok(salt), Ok(expected)) = (hex::decode(salt_hex), hex::decode(key_hex)) else {
        return false;
    };
    if salt.is_empty() || expected.len() != KEY_LEN {
        return false;
    }

    match derive_key(password.as_bytes(), &salt) {
        Ok(derived) => constant_time_eq(&derived, &expected),
        Err(e) => {
            tracing::error!(error = %e, "Password verification failed to derive key");
            false
        }
    }
}

fn dummy_hash() -> &'static str {
    static DUMMY: OnceLock<String> = OnceLock::new();
    DUMMY.get_or_init(|| format!("{}.{}", hex::encode(DUMMY_SALT), hex::encode([0u8; KEY_LEN])))
}

/// Password service for dependency injection
///
/// The `*_blocking` variants run scrypt on tokio's blocking pool so request
/// tasks are not stalled by KDF work.
#[derive(Debug, Clone, Default)]
pub struct PasswordService;

impl PasswordService {
    /// Create a new password service
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Hash a password
    pub fn hash(&self, password: &str) -> Result<String, AppError> {
        hash_password(password)
    }

    /// Verify a password against a hash
    pub fn verify(&self, password: &str, hash: &str) -> bool {
        verify_password(password, hash)
    }

    /// Run one full verification against a fixed hash and discard the result
    pub fn verify_dummy(&self, password: &str) {
        let _ = verify_password(password, dummy_hash());
    }

    /// Hash on the blocking pool
    pub async fn hash_blocking(&self, password: String) -> Result<String, AppError> {
        tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Password hashing task failed: {e}")))?
    }

    /// Verify on the blocking pool
    pub async fn verify_blocking(&self, password: String, hash: String) -> Result<bool, AppError> {
        tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Password verification task failed: {e}")))
    }

    /// Dummy verification on the blocking pool
    pub async fn verify_dummy_blocking(&self, password: String) -> Result<(), AppError> {
        tokio::task::spawn_blocking(move || {
            let _ = verify_password(&password, dummy_hash());
        })
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Password verification task failed: {e}")))
    }
}

/// Validate password strength
///
/// Returns `Ok(())` if the password meets requirements:
/// - At least 8 characters
/// - Contains at least one uppercase letter
/// - Contains at least one lowercase letter
/// - Contains at least one digit
///
/// # Errors
/// Returns `AppError::WeakPassword` if the password doesn't meet requirements
pub fn validate_password_strength(password: &str) -> Result<(), AppError> {
    if password.chars().count() < 8 {
        return Err(AppError::WeakPassword(
            "Password must be at least 8 characters long".to_string(),
        ));
    }

    if !password.chars().any(char::is_uppercase) {
        return Err(AppError::WeakPassword(
            "Password must contain at least one uppercase letter".to_string(),
        ));
    }

    if !password.chars().any(char::is_lowercase) {
        return Err(AppError::WeakPassword(
            "Password must contain at least one lowercase letter".to_string(),
        ));
    }

    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(AppError::WeakPassword(
            "Password must contain at least one digit".to_string(),
        ));
    }

    Ok(())
}
