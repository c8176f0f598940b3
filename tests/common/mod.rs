#![allow(dead_code)]

use std::sync::Arc;
use tandem::application_impl::FakeAccessGuard;
use tandem::domain_model::*;
use tandem::infra_memory::MemoryStore;
use tandem::server::Server;

pub struct TestApp {
    pub store: MemoryStore,
    pub server: Arc<Server>,
}

impl TestApp {
    pub fn new() -> Self {
        let store = MemoryStore::new();
        let server = Arc::new(Server::in_memory(&store));
        TestApp { store, server }
    }

    pub async fn user(&self, name: &str, onboarded: bool) -> UserId {
        let profile = Profile {
            full_name: name.to_string(),
            native_language: "english".to_string(),
            learning_language: "portuguese".to_string(),
            ..Profile::default()
        };
        let account = Account::new(UserId::new_v4(), profile, onboarded);
        let id = account.user_id;
        self.store.insert_account(account).await;
        id
    }

    pub async fn friends_of(&self, user: UserId) -> Vec<UserId> {
        let state = self.store.snapshot().await;
        state
            .account(user)
            .map(|a| a.friends.iter().copied().collect())
            .unwrap_or_default()
    }

    pub async fn pending_between(&self, a: UserId, b: UserId) -> usize {
        let pair = UserPair::new(a, b);
        self.store
            .snapshot()
            .await
            .requests()
            .filter(|r| r.is_pending() && pair.contains(r.sender) && pair.contains(r.recipient))
            .count()
    }
}

pub fn bearer(user: UserId) -> String {
    format!("Bearer {}", FakeAccessGuard::token_for(user))
}
