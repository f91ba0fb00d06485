use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use yishan_core::entities::{NewUser, User, UserStatus};
use yishan_core::error::DomainError;
use yishan_core::traits::{RepoResult, UserRepository};

struct UserData {
    users: HashMap<i64, User>,
    password_hashes: HashMap<i64, String>,
    next_id: i64,
}

/// In-memory user repository
pub struct MemoryUserRepository {
    data: Mutex<UserData>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self {
            data: Mutex::new(UserData {
                users: HashMap::new(),
                password_hashes: HashMap::new(),
                next_id: 1,
            }),
        }
    }

    /// Number of stored users
    pub fn len(&self) -> usize {
        self.data.lock().users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryUserRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn find_by_id(&self, id: i64) -> RepoResult<Option<User>> {
        Ok(self.data.lock().users.get(&id).cloned())
    }

    async fn find_by_identifier(&self, identifier: &str) -> RepoResult<Option<User>> {
        let data = self.data.lock();
        let by_username = data.users.values().find(|u| u.username == identifier);
        let found = by_username.or_else(|| data.users.values().find(|u| u.email == identifier));
        Ok(found.cloned())
    }

    async fn create(&self, user: &NewUser, password_hash: &str, now: DateTime<Utc>) -> RepoResult<User> {
        let mut data = self.data.lock();

        if data.users.values().any(|u| u.username == user.username) {
            return Err(DomainError::UsernameAlreadyExists);
        }
        if data.users.values().any(|u| u.email == user.email) {
            return Err(DomainError::EmailAlreadyExists);
        }

        let id = data.next_id;
        data.next_id += 1;

        let created = User {
            id,
            username: user.username.clone(),
            email: user.email.clone(),
            nickname: user.nickname.clone(),
            status: user.status,
            role: user.role,
            last_login_at: None,
            last_login_ip: None,
            login_count: 0,
            password_changed_at: Some(now),
            created_at: now,
            updated_at: now,
        };
        data.users.insert(id, created.clone());
        data.password_hashes.insert(id, password_hash.to_string());

        Ok(created)
    }

    async fn get_password_hash(&self, id: i64) -> RepoResult<Option<String>> {
        Ok(self.data.lock().password_hashes.get(&id).cloned())
    }

    async fn update_password(&self, id: i64, password_hash: &str, now: DateTime<Utc>) -> RepoResult<()> {
        let mut data = self.data.lock();
        let user = data.users.get_mut(&id).ok_or(DomainError::UserNotFound(id))?;
        user.password_changed_at = Some(now);
        user.updated_at = now;
        data.password_hashes.insert(id, password_hash.to_string());
        Ok(())
    }

    async fn record_login(&self, id: i64, at: DateTime<Utc>, ip: Option<&str>) -> RepoResult<()> {
        let mut data = self.data.lock();
        let user = data.users.get_mut(&id).ok_or(DomainError::UserNotFound(id))?;
        user.record_login(at, ip.map(str::to_string));
        Ok(())
    }

    async fn set_status(&self, id: i64, status: UserStatus, now: DateTime<Utc>) -> RepoResult<()> {
        let mut data = self.data.lock();
        let user = data.users.get_mut(&id).ok_or(DomainError::UserNotFound(id))?;
        user.status = status;
        user.updated_at = now;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_and_lookup() {
        let repo = MemoryUserRepository::new();
        let now = Utc::now();
        let user = repo
            .create(&NewUser::new("alice", "alice@example.com"), "hash", now)
            .await
            .unwrap();

        assert_eq!(repo.find_by_identifier("alice").await.unwrap().unwrap().id, user.id);
        assert_eq!(
            repo.find_by_identifier("alice@example.com").await.unwrap().unwrap().id,
            user.id
        );
        assert!(repo.find_by_identifier("bob").await.unwrap().is_none());
        assert_eq!(repo.get_password_hash(user.id).await.unwrap().as_deref(), Some("hash"));
    }

    #[tokio::test]
    async fn test_duplicates_rejected() {
        let repo = MemoryUserRepository::new();
        let now = Utc::now();
        repo.create(&NewUser::new("alice", "alice@example.com"), "h", now)
            .await
            .unwrap();

        assert!(matches!(
            repo.create(&NewUser::new("alice", "other@example.com"), "h", now).await,
            Err(DomainError::UsernameAlreadyExists)
        ));
        assert!(matches!(
            repo.create(&NewUser::new("alice2", "alice@example.com"), "h", now).await,
            Err(DomainError::EmailAlreadyExists)
        ));
        assert_eq!(repo.len(), 1);
    }

    #[tokio::test]
    async fn test_record_login_and_status() {
        let repo = MemoryUserRepository::new();
        let now = Utc::now();
        let user = repo
            .create(&NewUser::new("alice", "alice@example.com"), "h", now)
            .await
            .unwrap();

        repo.record_login(user.id, now, Some("10.0.0.1")).await.unwrap();
        repo.set_status(user.id, UserStatus::Disabled, now).await.unwrap();

        let stored = repo.find_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(stored.login_count, 1);
        assert_eq!(stored.last_login_ip.as_deref(), Some("10.0.0.1"));
        assert_eq!(stored.status, UserStatus::Disabled);

        assert!(matches!(
            repo.record_login(999, now, None).await,
            Err(DomainError::UserNotFound(999))
        ));
    }
}
