use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::repo_tx::StorageTx;

/// The relationship ledger. Holds one record per directed request and guarantees
/// at most one pending record per unordered pair.
#[async_trait::async_trait]
pub trait FriendRequestRepo: Send + Sync {
    async fn find_active_between_in_tx<'t>(
        &self,
        tx: &mut dyn StorageTx<'t>,
        a: UserId,
        b: UserId,
    ) -> Result<Option<FriendRequest>, RelationError>;

    /// Inserts a pending request. Fails with `FriendRequestExists` when the pair
    /// already has an active request, including one created concurrently.
    async fn create_in_tx<'t>(
        &self,
        tx: &mut dyn StorageTx<'t>,
        sender: UserId,
        recipient: UserId,
    ) -> Result<FriendRequest, RelationError>;

    /// Plain read, takes no lock.
    async fn find_by_id_in_tx<'t>(
        &self,
        tx: &mut dyn StorageTx<'t>,
        request_id: FriendRequestId,
    ) -> Result<Option<FriendRequest>, RelationError>;

    /// Reads a request and locks it for the rest of the transaction.
    async fn get_for_update_in_tx<'t>(
        &self,
        tx: &mut dyn StorageTx<'t>,
        request_id: FriendRequestId,
    ) -> Result<Option<FriendRequest>, RelationError>;

    async fn set_accepted_in_tx<'t>(
        &self,
        tx: &mut dyn StorageTx<'t>,
        request_id: FriendRequestId,
    ) -> Result<(), RelationError>;

    /// Deletes the pending request sent by `sender` to `recipient`, never the reverse
    /// direction and never an accepted one.
    async fn delete_pending_in_tx<'t>(
        &self,
        tx: &mut dyn StorageTx<'t>,
        sender: UserId,
        recipient: UserId,
    ) -> Result<FriendRequestId, RelationError>;

    async fn list_incoming(
        &self,
        recipient: UserId,
        status: FriendRequestStatus,
        page_size: PageSize,
        after: Option<RequestCursor>,
    ) -> Result<Vec<FriendRequestView>, RelationError>;

    async fn list_outgoing(
        &self,
        sender: UserId,
        status: FriendRequestStatus,
        page_size: PageSize,
        after: Option<RequestCursor>,
    ) -> Result<Vec<FriendRequestView>, RelationError>;
}
