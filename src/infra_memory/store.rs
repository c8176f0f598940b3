use crate::domain_model::*;
use crate::domain_port::{StorageTx, TxManager};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard, OwnedMutexGuard};

#[derive(Debug, Clone, Default)]
pub struct MemoryState {
    pub(crate) accounts: HashMap<UserId, Account>,
    pub(crate) requests: BTreeMap<FriendRequestId, FriendRequest>,
}

impl MemoryState {
    pub fn account(&self, user_id: UserId) -> Option<&Account> {
        self.accounts.get(&user_id)
    }

    pub fn requests(&self) -> impl Iterator<Item = &FriendRequest> {
        self.requests.values()
    }

    pub(crate) fn active_between(&self, a: UserId, b: UserId) -> Option<&FriendRequest> {
        let pair = UserPair::new(a, b);
        self.requests
            .values()
            .find(|r| r.is_pending() && pair.contains(r.sender) && pair.contains(r.recipient))
    }
}

/// Process-local storage. Every transaction holds the single lock for its whole
/// lifetime, so transactions are fully serialized.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

#[derive(Debug, Deserialize)]
struct SeedAccount {
    user_id: UserId,
    #[serde(default)]
    onboarded: bool,
    #[serde(flatten)]
    profile: Profile,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_account(&self, account: Account) {
        self.lock().await.accounts.insert(account.user_id, account);
    }

    /// Loads a JSON array of accounts, returning how many were inserted.
    pub async fn load_seed(&self, path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("read seed file {}", path.display()))?;
        let seeds: Vec<SeedAccount> =
            serde_json::from_str(&raw).with_context(|| format!("parse seed file {}", path.display()))?;

        let mut state = self.lock().await;
        let count = seeds.len();
        for seed in seeds {
            let account = Account::new(seed.user_id, seed.profile, seed.onboarded);
            state.accounts.insert(account.user_id, account);
        }
        Ok(count)
    }

    /// Copy of the committed state.
    pub async fn snapshot(&self) -> MemoryState {
        self.lock().await.clone()
    }

    pub(crate) async fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().await
    }
}

pub struct MemoryTxManager {
    store: MemoryStore,
}

impl MemoryTxManager {
    pub fn new(store: MemoryStore) -> Self {
        MemoryTxManager { store }
    }
}

#[async_trait::async_trait]
impl TxManager for MemoryTxManager {
    async fn begin<'t>(&'t self) -> Result<Box<dyn StorageTx<'t> + 't>> {
        let guard = self.store.state.clone().lock_owned().await;
        let backup = guard.clone();
        Ok(Box::new(MemoryTx {
            guard,
            backup: Some(backup),
        }))
    }
}

pub struct MemoryTx {
    guard: OwnedMutexGuard<MemoryState>,
    // restored on drop unless the transaction commits
    backup: Option<MemoryState>,
}

impl MemoryTx {
    pub(crate) fn state(&mut self) -> &mut MemoryState {
        &mut self.guard
    }
}

impl Drop for MemoryTx {
    fn drop(&mut self) {
        if let Some(backup) = self.backup.take() {
            *self.guard = backup;
        }
    }
}

#[async_trait::async_trait]
impl<'t> StorageTx<'t> for MemoryTx {
    async fn commit(mut self: Box<Self>) -> Result<()> {
        self.backup = None;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        drop(self);
        Ok(())
    }
}

pub(crate) fn downcast<'a, 't>(tx: &'a mut dyn StorageTx<'t>) -> &'a mut MemoryTx {
    // SAFETY: memory repos are only wired together with `MemoryTxManager`, which
    // never hands out anything but `MemoryTx`.
    unsafe {
        let p = tx as *mut dyn StorageTx<'t>;
        let p = p as *mut MemoryTx;
        &mut *p
    }
}
