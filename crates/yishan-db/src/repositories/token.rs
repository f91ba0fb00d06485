//! PostgreSQL implementation of TokenRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{debug, instrument};

use yishan_core::entities::{AuthToken, NewAuthToken, RotateOutcome, TokenStats};
use yishan_core::error::DomainError;
use yishan_core::traits::{purge_cutoff, RepoResult, TokenRepository};

use crate::models::{AuthTokenModel, TokenStatsModel};

use super::error::{map_db_error, map_unique_violation, to_bigint};

const TOKEN_COLUMNS: &str = "id, user_id, access_token, refresh_token, access_expires_at, refresh_expires_at, \
                             is_revoked, revoked_at, rotated_at, client_ip, user_agent, created_at, updated_at";

/// PostgreSQL implementation of TokenRepository
#[derive(Clone)]
pub struct PgTokenRepository {
    pool: PgPool,
}

impl PgTokenRepository {
    /// Create a new PgTokenRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn insert(
        tx: &mut Transaction<'_, Postgres>,
        token: &NewAuthToken,
        now: DateTime<Utc>,
    ) -> RepoResult<AuthToken> {
        let model = sqlx::query_as::<_, AuthTokenModel>(&format!(
            r"
            INSERT INTO auth_tokens (user_id, access_token, refresh_token, access_expires_at,
                                     refresh_expires_at, client_ip, user_agent, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
            RETURNING {TOKEN_COLUMNS}
            "
        ))
        .bind(token.user_id)
        .bind(&token.access_token)
        .bind(&token.refresh_token)
        .bind(token.access_expires_at)
        .bind(token.refresh_expires_at)
        .bind(&token.client_ip)
        .bind(&token.user_agent)
        .bind(now)
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| map_unique_violation(e, |_| DomainError::TokenConflict))?;

        Ok(AuthToken::from(model))
    }
}

#[async_trait]
impl TokenRepository for PgTokenRepository {
    #[instrument(skip(self, token), fields(user_id = token.user_id))]
    async fn create(&self, token: NewAuthToken, now: DateTime<Utc>) -> RepoResult<AuthToken> {
        token.validate()?;

        let mut tx = self.pool.begin().await.map_err(map_db_error)?;
        let created = Self::insert(&mut tx, &token, now).await?;
        tx.commit().await.map_err(map_db_error)?;

        Ok(created)
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: i64) -> RepoResult<Option<AuthToken>> {
        let result = sqlx::query_as::<_, AuthTokenModel>(&format!(
            "SELECT {TOKEN_COLUMNS} FROM auth_tokens WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(AuthToken::from))
    }

    #[instrument(skip(self, token))]
    async fn find_active_by_access_token(&self, token: &str, now: DateTime<Utc>) -> RepoResult<Option<AuthToken>> {
        let result = sqlx::query_as::<_, AuthTokenModel>(&format!(
            r"
            SELECT {TOKEN_COLUMNS}
            FROM auth_tokens
            WHERE access_token = $1 AND NOT is_revoked AND access_expires_at > $2
            "
        ))
        .bind(token)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(AuthToken::from))
    }

    #[instrument(skip(self, token))]
    async fn find_active_by_refresh_token(&self, token: &str, now: DateTime<Utc>) -> RepoResult<Option<AuthToken>> {
        let result = sqlx::query_as::<_, AuthTokenModel>(&format!(
            r"
            SELECT {TOKEN_COLUMNS}
            FROM auth_tokens
            WHERE refresh_token = $1 AND NOT is_revoked AND refresh_expires_at > $2
            "
        ))
        .bind(token)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(AuthToken::from))
    }

    #[instrument(skip(self, token))]
    async fn find_by_refresh_token(&self, token: &str) -> RepoResult<Option<AuthToken>> {
        let result = sqlx::query_as::<_, AuthTokenModel>(&format!(
            "SELECT {TOKEN_COLUMNS} FROM auth_tokens WHERE refresh_token = $1"
        ))
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(AuthToken::from))
    }

    #[instrument(skip(self))]
    async fn revoke(&self, id: i64, now: DateTime<Utc>) -> RepoResult<bool> {
        // The NOT is_revoked guard keeps the first revoked_at
        let result = sqlx::query(
            r"
            UPDATE auth_tokens
            SET is_revoked = TRUE, revoked_at = $2, updated_at = $2
            WHERE id = $1 AND NOT is_revoked
            ",
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self))]
    async fn revoke_all_for_user(&self, user_id: i64, now: DateTime<Utc>) -> RepoResult<u64> {
        let result = sqlx::query(
            r"
            UPDATE auth_tokens
            SET is_revoked = TRUE, revoked_at = $2, updated_at = $2
            WHERE user_id = $1 AND NOT is_revoked
            ",
        )
        .bind(user_id)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.rows_affected())
    }

    #[instrument(skip(self, new_token))]
    async fn rotate(&self, old_id: i64, new_token: NewAuthToken, now: DateTime<Utc>) -> RepoResult<RotateOutcome> {
        new_token.validate()?;

        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        // Row lock: a concurrent rotation of the same pair blocks here and then
        // sees is_revoked = TRUE.
        let revoked = sqlx::query(
            r"
            UPDATE auth_tokens
            SET is_revoked = TRUE, revoked_at = $2, rotated_at = $2, updated_at = $2
            WHERE id = $1 AND NOT is_revoked
            ",
        )
        .bind(old_id)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(map_db_error)?;

        if revoked.rows_affected() == 0 {
            tx.rollback().await.map_err(map_db_error)?;
            debug!(old_id, "Rotation lost: pair already revoked");
            return Ok(RotateOutcome::AlreadyRevoked);
        }

        let created = Self::insert(&mut tx, &new_token, now).await?;
        tx.commit().await.map_err(map_db_error)?;

        Ok(RotateOutcome::Rotated(created))
    }

    #[instrument(skip(self))]
    async fn list_active_for_user(
        &self,
        user_id: i64,
        now: DateTime<Utc>,
        offset: u64,
        limit: u64,
    ) -> RepoResult<(Vec<AuthToken>, u64)> {
        let total = sqlx::query_scalar::<_, i64>(
            r"
            SELECT COUNT(*) FROM auth_tokens
            WHERE user_id = $1 AND NOT is_revoked AND refresh_expires_at > $2
            ",
        )
        .bind(user_id)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;

        let rows = sqlx::query_as::<_, AuthTokenModel>(&format!(
            r"
            SELECT {TOKEN_COLUMNS}
            FROM auth_tokens
            WHERE user_id = $1 AND NOT is_revoked AND refresh_expires_at > $2
            ORDER BY created_at DESC, id DESC
            LIMIT $3 OFFSET $4
            "
        ))
        .bind(user_id)
        .bind(now)
        .bind(to_bigint(limit))
        .bind(to_bigint(offset))
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok((
            rows.into_iter().map(AuthToken::from).collect(),
            u64::try_from(total).unwrap_or(0),
        ))
    }

    #[instrument(skip(self))]
    async fn purge_expired(&self, retention_days: u32, now: DateTime<Utc>) -> RepoResult<u64> {
        let Some(cutoff) = purge_cutoff(retention_days, now) else {
            return Ok(0);
        };

        let result = sqlx::query(
            r"
            DELETE FROM auth_tokens WHERE refresh_expires_at < $1
            ",
        )
        .bind(cutoff)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.rows_affected())
    }

    #[instrument(skip(self))]
    async fn stats(&self, user_id: Option<i64>, now: DateTime<Utc>) -> RepoResult<TokenStats> {
        let model = sqlx::query_as::<_, TokenStatsModel>(
            r"
            SELECT
                COUNT(*) AS total,
                COUNT(*) FILTER (WHERE NOT is_revoked AND refresh_expires_at > $1) AS active,
                COUNT(*) FILTER (WHERE NOT is_revoked AND refresh_expires_at <= $1) AS expired,
                COUNT(*) FILTER (WHERE is_revoked) AS revoked
            FROM auth_tokens
            WHERE ($2::BIGINT IS NULL OR user_id = $2)
            ",
        )
        .bind(now)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(TokenStats::from(model))
    }

    #[instrument(skip(self))]
    async fn ping(&self) -> RepoResult<()> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(map_db_error)?;
        Ok(())
    }
}
