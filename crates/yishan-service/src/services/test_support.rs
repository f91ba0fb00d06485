//! Shared fixture for service tests: in-memory repositories, a manual clock,
//! and one enabled user `alice` with password `Secret123!`.

use std::sync::Arc;

use yishan_common::auth::{hash_password, JwtService};
use yishan_core::entities::{NewUser, User};
use yishan_core::traits::UserRepository;
use yishan_core::{Clock, ManualClock};
use yishan_db::{MemoryTokenRepository, MemoryUserRepository};

use super::context::{ServiceContext, ServiceContextBuilder};

pub(crate) const TEST_SECRET: &str = "test-secret-key-that-is-long-enough-for-hs256";

pub(crate) struct Fixture {
    pub ctx: ServiceContext,
    pub users: Arc<MemoryUserRepository>,
    pub tokens: Arc<MemoryTokenRepository>,
    pub clock: Arc<ManualClock>,
    pub alice: User,
}

pub(crate) async fn fixture() -> Fixture {
    let users = Arc::new(MemoryUserRepository::new());
    let tokens = Arc::new(MemoryTokenRepository::new());
    let clock = Arc::new(ManualClock::starting_now());

    let alice = users
        .create(
            &NewUser::new("alice", "alice@example.com"),
            &hash_password("Secret123!").unwrap(),
            clock.now(),
        )
        .await
        .unwrap();

    let ctx = ServiceContextBuilder::new()
        .user_repo(users.clone())
        .token_repo(tokens.clone())
        .jwt_service(Arc::new(JwtService::new(TEST_SECRET, "yishan-test", 900, 604_800)))
        .clock(clock.clone())
        .build()
        .unwrap();

    Fixture {
        ctx,
        users,
        tokens,
        clock,
        alice,
    }
}
