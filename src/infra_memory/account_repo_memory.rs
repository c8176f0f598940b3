use super::store::{MemoryStore, downcast};
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use std::collections::BTreeSet;

pub struct MemoryAccountRepo {
    store: MemoryStore,
}

impl MemoryAccountRepo {
    pub fn new(store: MemoryStore) -> Self {
        MemoryAccountRepo { store }
    }
}

#[async_trait::async_trait]
impl AccountRepo for MemoryAccountRepo {
    async fn find_by_id(&self, user_id: UserId) -> Result<Option<Account>, AccountError> {
        Ok(self.store.lock().await.accounts.get(&user_id).cloned())
    }

    async fn find_by_id_in_tx<'t>(
        &self,
        tx: &mut dyn StorageTx<'t>,
        user_id: UserId,
    ) -> Result<Option<Account>, AccountError> {
        let tx = downcast(tx);
        Ok(tx.state().accounts.get(&user_id).cloned())
    }

    async fn lock_pair_in_tx<'t>(
        &self,
        _tx: &mut dyn StorageTx<'t>,
        _pair: UserPair,
    ) -> Result<(), AccountError> {
        // a memory transaction already holds the whole store
        Ok(())
    }

    async fn list_discoverable(
        &self,
        exclude: UserId,
        exclude_set: &BTreeSet<UserId>,
    ) -> Result<Vec<PublicProfile>, AccountError> {
        let state = self.store.lock().await;
        let mut candidates: Vec<&Account> = state
            .accounts
            .values()
            .filter(|a| a.onboarded && a.user_id != exclude && !exclude_set.contains(&a.user_id))
            .collect();
        candidates.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.user_id.cmp(&b.user_id))
        });

        Ok(candidates.into_iter().map(Account::public_profile).collect())
    }

    async fn list_cards(&self, ids: &BTreeSet<UserId>) -> Result<Vec<ProfileCard>, AccountError> {
        let state = self.store.lock().await;
        let mut cards: Vec<ProfileCard> = ids
            .iter()
            .filter_map(|id| state.accounts.get(id))
            .map(Account::card)
            .collect();
        cards.sort_by(|a, b| {
            a.full_name
                .cmp(&b.full_name)
                .then_with(|| a.user_id.cmp(&b.user_id))
        });

        Ok(cards)
    }

    async fn add_friend_in_tx<'t>(
        &self,
        tx: &mut dyn StorageTx<'t>,
        owner: UserId,
        friend: UserId,
    ) -> Result<(), AccountError> {
        let tx = downcast(tx);
        let account = tx
            .state()
            .accounts
            .get_mut(&owner)
            .ok_or(AccountError::UserNotFound)?;
        account.friends.insert(friend);
        Ok(())
    }

    async fn update_profile_in_tx<'t>(
        &self,
        tx: &mut dyn StorageTx<'t>,
        user_id: UserId,
        profile: &Profile,
        onboarded: bool,
    ) -> Result<(), AccountError> {
        let tx = downcast(tx);
        let account = tx
            .state()
            .accounts
            .get_mut(&user_id)
            .ok_or(AccountError::UserNotFound)?;
        account.profile = profile.clone();
        account.onboarded = onboarded;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra_memory::MemoryTxManager;

    #[tokio::test]
    async fn add_friend_to_missing_owner_is_not_found() {
        let store = MemoryStore::new();
        let repo = MemoryAccountRepo::new(store.clone());
        let manager = MemoryTxManager::new(store.clone());

        let mut tx = manager.begin().await.unwrap();
        let err = repo
            .add_friend_in_tx(&mut *tx, UserId::new_v4(), UserId::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, AccountError::UserNotFound));
    }
}
