use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::repo_tx::StorageTx;
use std::collections::BTreeSet;

/// The account directory: profiles plus each account's materialized friend set.
#[async_trait::async_trait]
pub trait AccountRepo: Send + Sync {
    async fn find_by_id(&self, user_id: UserId) -> Result<Option<Account>, AccountError>;

    async fn find_by_id_in_tx<'t>(
        &self,
        tx: &mut dyn StorageTx<'t>,
        user_id: UserId,
    ) -> Result<Option<Account>, AccountError>;

    /// Locks both accounts of `pair` until the transaction ends, always in
    /// `min`, `max` order. Proposals and acceptances for the same pair serialize here.
    async fn lock_pair_in_tx<'t>(
        &self,
        tx: &mut dyn StorageTx<'t>,
        pair: UserPair,
    ) -> Result<(), AccountError>;

    /// Onboarded accounts other than `exclude` and anyone in `exclude_set`.
    async fn list_discoverable(
        &self,
        exclude: UserId,
        exclude_set: &BTreeSet<UserId>,
    ) -> Result<Vec<PublicProfile>, AccountError>;

    async fn list_cards(&self, ids: &BTreeSet<UserId>) -> Result<Vec<ProfileCard>, AccountError>;

    /// Adds `friend` to `owner`'s friend set. Adding an existing member is a no-op.
    async fn add_friend_in_tx<'t>(
        &self,
        tx: &mut dyn StorageTx<'t>,
        owner: UserId,
        friend: UserId,
    ) -> Result<(), AccountError>;

    async fn update_profile_in_tx<'t>(
        &self,
        tx: &mut dyn StorageTx<'t>,
        user_id: UserId,
        profile: &Profile,
        onboarded: bool,
    ) -> Result<(), AccountError>;
}
