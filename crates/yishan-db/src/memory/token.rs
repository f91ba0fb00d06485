use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use yishan_core::entities::{AuthToken, NewAuthToken, RotateOutcome, TokenStats};
use yishan_core::error::DomainError;
use yishan_core::traits::{purge_cutoff, RepoResult, TokenRepository};

struct TokenData {
    tokens: HashMap<i64, AuthToken>,
    next_id: i64,
}

impl TokenData {
    fn insert(&mut self, token: NewAuthToken, now: DateTime<Utc>) -> RepoResult<AuthToken> {
        token.validate()?;

        let collides = self.tokens.values().any(|t| {
            t.access_token == token.access_token
                || t.refresh_token == token.refresh_token
                || t.access_token == token.refresh_token
                || t.refresh_token == token.access_token
        });
        if collides {
            return Err(DomainError::TokenConflict);
        }

        let id = self.next_id;
        self.next_id += 1;

        let stored = token.into_token(id, now);
        self.tokens.insert(id, stored.clone());
        Ok(stored)
    }
}

/// In-memory token repository
pub struct MemoryTokenRepository {
    data: Mutex<TokenData>,
}

impl MemoryTokenRepository {
    pub fn new() -> Self {
        Self {
            data: Mutex::new(TokenData {
                tokens: HashMap::new(),
                next_id: 1,
            }),
        }
    }

    /// Number of stored rows in any state
    pub fn len(&self) -> usize {
        self.data.lock().tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryTokenRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TokenRepository for MemoryTokenRepository {
    async fn create(&self, token: NewAuthToken, now: DateTime<Utc>) -> RepoResult<AuthToken> {
        self.data.lock().insert(token, now)
    }

    async fn find_by_id(&self, id: i64) -> RepoResult<Option<AuthToken>> {
        Ok(self.data.lock().tokens.get(&id).cloned())
    }

    async fn find_active_by_access_token(&self, token: &str, now: DateTime<Utc>) -> RepoResult<Option<AuthToken>> {
        let data = self.data.lock();
        Ok(data
            .tokens
            .values()
            .find(|t| t.access_token == token && t.is_access_active(now))
            .cloned())
    }

    async fn find_active_by_refresh_token(&self, token: &str, now: DateTime<Utc>) -> RepoResult<Option<AuthToken>> {
        let data = self.data.lock();
        Ok(data
            .tokens
            .values()
            .find(|t| t.refresh_token == token && t.is_refresh_active(now))
            .cloned())
    }

    async fn find_by_refresh_token(&self, token: &str) -> RepoResult<Option<AuthToken>> {
        let data = self.data.lock();
        Ok(data.tokens.values().find(|t| t.refresh_token == token).cloned())
    }

    async fn revoke(&self, id: i64, now: DateTime<Utc>) -> RepoResult<bool> {
        let mut data = self.data.lock();
        Ok(data.tokens.get_mut(&id).is_some_and(|t| t.revoke(now)))
    }

    async fn revoke_all_for_user(&self, user_id: i64, now: DateTime<Utc>) -> RepoResult<u64> {
        let mut data = self.data.lock();
        let revoked = data
            .tokens
            .values_mut()
            .filter(|t| t.user_id == user_id)
            .map(|t| t.revoke(now))
            .filter(|&changed| changed)
            .count();
        Ok(revoked as u64)
    }

    async fn rotate(&self, old_id: i64, new_token: NewAuthToken, now: DateTime<Utc>) -> RepoResult<RotateOutcome> {
        new_token.validate()?;

        // Check-and-revoke and the insert happen under one lock
        let mut data = self.data.lock();
        let revoked = data.tokens.get_mut(&old_id).is_some_and(|t| t.mark_rotated(now));
        if !revoked {
            return Ok(RotateOutcome::AlreadyRevoked);
        }

        match data.insert(new_token, now) {
            Ok(created) => Ok(RotateOutcome::Rotated(created)),
            Err(e) => {
                // Undo the revocation so the operation stays all-or-nothing
                if let Some(old) = data.tokens.get_mut(&old_id) {
                    old.is_revoked = false;
                    old.revoked_at = None;
                    old.rotated_at = None;
                }
                Err(e)
            }
        }
    }

    async fn list_active_for_user(
        &self,
        user_id: i64,
        now: DateTime<Utc>,
        offset: u64,
        limit: u64,
    ) -> RepoResult<(Vec<AuthToken>, u64)> {
        let data = self.data.lock();
        let mut active: Vec<&AuthToken> = data
            .tokens
            .values()
            .filter(|t| t.user_id == user_id && t.is_refresh_active(now))
            .collect();
        active.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let total = active.len() as u64;
        let page = active
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(usize::MAX))
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .cloned()
            .collect();

        Ok((page, total))
    }

    async fn purge_expired(&self, retention_days: u32, now: DateTime<Utc>) -> RepoResult<u64> {
        let Some(cutoff) = purge_cutoff(retention_days, now) else {
            return Ok(0);
        };
        let mut data = self.data.lock();
        let before = data.tokens.len();
        data.tokens.retain(|_, t| t.refresh_expires_at >= cutoff);
        Ok((before - data.tokens.len()) as u64)
    }

    async fn stats(&self, user_id: Option<i64>, now: DateTime<Utc>) -> RepoResult<TokenStats> {
        let data = self.data.lock();
        let mut stats = TokenStats::default();
        for token in data
            .tokens
            .values()
            .filter(|t| user_id.map_or(true, |id| t.user_id == id))
        {
            stats.tally(token, now);
        }
        Ok(stats)
    }

    async fn ping(&self) -> RepoResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn pair(user_id: i64, tag: &str, now: DateTime<Utc>) -> NewAuthToken {
        NewAuthToken {
            user_id,
            access_token: format!("access-{tag}"),
            refresh_token: format!("refresh-{tag}"),
            access_expires_at: now + Duration::minutes(15),
            refresh_expires_at: now + Duration::days(7),
            client_ip: None,
            user_agent: None,
        }
    }

    #[tokio::test]
    async fn test_inactive_tokens_are_invisible() {
        let repo = MemoryTokenRepository::new();
        let now = Utc::now();
        let created = repo.create(pair(1, "a", now), now).await.unwrap();

        assert!(repo
            .find_active_by_access_token("access-a", now)
            .await
            .unwrap()
            .is_some());

        // Access window over, row still present
        let later = now + Duration::minutes(16);
        assert!(repo
            .find_active_by_access_token("access-a", later)
            .await
            .unwrap()
            .is_none());
        assert!(repo.find_by_id(created.id).await.unwrap().is_some());
        assert!(repo
            .find_active_by_refresh_token("refresh-a", later)
            .await
            .unwrap()
            .is_some());

        // Revoked pairs are invisible to both lookups
        repo.revoke(created.id, now).await.unwrap();
        assert!(repo
            .find_active_by_access_token("access-a", now)
            .await
            .unwrap()
            .is_none());
        assert!(repo
            .find_active_by_refresh_token("refresh-a", now)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_revoke_idempotent() {
        let repo = MemoryTokenRepository::new();
        let now = Utc::now();
        let created = repo.create(pair(1, "a", now), now).await.unwrap();

        assert!(repo.revoke(created.id, now).await.unwrap());
        assert!(!repo.revoke(created.id, now + Duration::seconds(5)).await.unwrap());

        let stored = repo.find_by_id(created.id).await.unwrap().unwrap();
        assert!(stored.is_revoked);
        assert_eq!(stored.revoked_at, Some(now));

        // Unknown ids are a no-op too
        assert!(!repo.revoke(999, now).await.unwrap());
    }

    #[tokio::test]
    async fn test_collision_is_conflict() {
        let repo = MemoryTokenRepository::new();
        let now = Utc::now();
        repo.create(pair(1, "a", now), now).await.unwrap();

        assert!(matches!(
            repo.create(pair(2, "a", now), now).await,
            Err(DomainError::TokenConflict)
        ));
    }

    #[tokio::test]
    async fn test_rotate_once() {
        let repo = MemoryTokenRepository::new();
        let now = Utc::now();
        let old = repo.create(pair(1, "a", now), now).await.unwrap();

        let outcome = repo.rotate(old.id, pair(1, "b", now), now).await.unwrap();
        assert!(matches!(outcome, RotateOutcome::Rotated(ref t) if t.refresh_token == "refresh-b"));

        let again = repo.rotate(old.id, pair(1, "c", now), now).await.unwrap();
        assert_eq!(again, RotateOutcome::AlreadyRevoked);
        assert_eq!(repo.len(), 2);

        assert!(repo.find_by_id(old.id).await.unwrap().unwrap().was_rotated());
    }

    #[tokio::test]
    async fn test_plain_revoke_is_not_rotation() {
        let repo = MemoryTokenRepository::new();
        let now = Utc::now();
        let session = repo.create(pair(1, "a", now), now).await.unwrap();

        repo.revoke(session.id, now).await.unwrap();
        assert_eq!(
            repo.rotate(session.id, pair(1, "b", now), now).await.unwrap(),
            RotateOutcome::AlreadyRevoked
        );

        let stored = repo.find_by_id(session.id).await.unwrap().unwrap();
        assert!(stored.is_revoked);
        assert!(!stored.was_rotated());
    }

    #[tokio::test]
    async fn test_revoke_all_for_user() {
        let repo = MemoryTokenRepository::new();
        let now = Utc::now();
        for tag in ["a", "b", "c"] {
            repo.create(pair(1, tag, now), now).await.unwrap();
        }
        repo.create(pair(2, "d", now), now).await.unwrap();

        assert_eq!(repo.revoke_all_for_user(1, now).await.unwrap(), 3);
        assert_eq!(repo.revoke_all_for_user(1, now).await.unwrap(), 0);

        let stats = repo.stats(Some(2), now).await.unwrap();
        assert_eq!(stats.active, 1);
    }

    #[tokio::test]
    async fn test_purge_and_stats() {
        let repo = MemoryTokenRepository::new();
        let now = Utc::now();
        let past = now - Duration::days(10);
        for tag in ["x", "y", "z"] {
            repo.create(pair(1, tag, past), past).await.unwrap();
        }
        repo.create(pair(1, "live", now), now).await.unwrap();

        let stats = repo.stats(None, now).await.unwrap();
        assert_eq!(stats.expired, 3);
        assert_eq!(stats.active, 1);

        assert_eq!(repo.purge_expired(0, now).await.unwrap(), 3);
        let stats = repo.stats(None, now).await.unwrap();
        assert_eq!(stats.expired, 0);
        assert_eq!(stats.total, 1);
    }

    #[tokio::test]
    async fn test_purge_respects_retention() {
        let repo = MemoryTokenRepository::new();
        let now = Utc::now();
        // Refresh expired two days ago
        let issued = now - Duration::days(9);
        repo.create(pair(1, "old", issued), issued).await.unwrap();

        assert_eq!(repo.purge_expired(3, now).await.unwrap(), 0);
        assert_eq!(repo.purge_expired(u32::MAX, now).await.unwrap(), 0);
        assert_eq!(repo.purge_expired(1, now).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_list_active_paginates_newest_first() {
        let repo = MemoryTokenRepository::new();
        let start = Utc::now();
        for i in 0..7 {
            let at = start + Duration::seconds(i);
            repo.create(pair(1, &i.to_string(), at), at).await.unwrap();
        }
        let now = start + Duration::seconds(10);

        let (page, total) = repo.list_active_for_user(1, now, 0, 3).await.unwrap();
        assert_eq!(total, 7);
        assert_eq!(page.len(), 3);
        assert_eq!(page[0].access_token, "access-6");

        let (page, _) = repo.list_active_for_user(1, now, 6, 3).await.unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].access_token, "access-0");
    }
}
