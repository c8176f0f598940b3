use super::store::{MemoryState, MemoryStore, downcast};
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::Utc;

pub struct MemoryFriendRequestRepo {
    store: MemoryStore,
}

impl MemoryFriendRequestRepo {
    pub fn new(store: MemoryStore) -> Self {
        MemoryFriendRequestRepo { store }
    }
}

fn page_of<F>(
    state: &MemoryState,
    viewer: UserId,
    page_size: PageSize,
    after: Option<RequestCursor>,
    matches: F,
) -> Vec<FriendRequestView>
where
    F: Fn(&FriendRequest) -> bool,
{
    let mut requests: Vec<&FriendRequest> = state
        .requests
        .values()
        .filter(|r| matches(r))
        .filter(|r| after.map_or(true, |cur| cur.admits(r)))
        .collect();
    requests.sort_by(|a, b| b.cursor().cmp(&a.cursor()));

    // inner join: a request whose counterpart vanished is not listed
    requests
        .into_iter()
        .filter_map(|r| {
            let counterpart = state.accounts.get(&r.counterpart_of(viewer))?;
            Some(FriendRequestView {
                request: r.clone(),
                counterpart: counterpart.card(),
            })
        })
        .take(page_size.clamped().as_usize())
        .collect()
}

#[async_trait::async_trait]
impl FriendRequestRepo for MemoryFriendRequestRepo {
    async fn find_active_between_in_tx<'t>(
        &self,
        tx: &mut dyn StorageTx<'t>,
        a: UserId,
        b: UserId,
    ) -> Result<Option<FriendRequest>, RelationError> {
        let tx = downcast(tx);
        Ok(tx.state().active_between(a, b).cloned())
    }

    async fn create_in_tx<'t>(
        &self,
        tx: &mut dyn StorageTx<'t>,
        sender: UserId,
        recipient: UserId,
    ) -> Result<FriendRequest, RelationError> {
        if sender == recipient {
            return Err(RelationError::SelfTarget);
        }

        let state = downcast(tx).state();
        if state.active_between(sender, recipient).is_some() {
            return Err(RelationError::FriendRequestExists);
        }

        let request = FriendRequest {
            request_id: FriendRequestId::new_v4(),
            sender,
            recipient,
            status: FriendRequestStatus::Pending,
            created_at: Utc::now(),
        };
        state.requests.insert(request.request_id, request.clone());
        Ok(request)
    }

    async fn find_by_id_in_tx<'t>(
        &self,
        tx: &mut dyn StorageTx<'t>,
        request_id: FriendRequestId,
    ) -> Result<Option<FriendRequest>, RelationError> {
        let tx = downcast(tx);
        Ok(tx.state().requests.get(&request_id).cloned())
    }

    async fn get_for_update_in_tx<'t>(
        &self,
        tx: &mut dyn StorageTx<'t>,
        request_id: FriendRequestId,
    ) -> Result<Option<FriendRequest>, RelationError> {
        let tx = downcast(tx);
        Ok(tx.state().requests.get(&request_id).cloned())
    }

    async fn set_accepted_in_tx<'t>(
        &self,
        tx: &mut dyn StorageTx<'t>,
        request_id: FriendRequestId,
    ) -> Result<(), RelationError> {
        let tx = downcast(tx);
        let request = tx
            .state()
            .requests
            .get_mut(&request_id)
            .ok_or(RelationError::RequestNotFound)?;
        if !request.is_pending() {
            return Err(RelationError::NotPending);
        }
        request.status = FriendRequestStatus::Accepted;
        Ok(())
    }

    async fn delete_pending_in_tx<'t>(
        &self,
        tx: &mut dyn StorageTx<'t>,
        sender: UserId,
        recipient: UserId,
    ) -> Result<FriendRequestId, RelationError> {
        let state = downcast(tx).state();
        let request_id = state
            .requests
            .values()
            .find(|r| r.is_pending() && r.sender == sender && r.recipient == recipient)
            .map(|r| r.request_id)
            .ok_or(RelationError::PendingRequestNotFound)?;
        state.requests.remove(&request_id);
        Ok(request_id)
    }

    async fn list_incoming(
        &self,
        recipient: UserId,
        status: FriendRequestStatus,
        page_size: PageSize,
        after: Option<RequestCursor>,
    ) -> Result<Vec<FriendRequestView>, RelationError> {
        let state = self.store.lock().await;
        Ok(page_of(&state, recipient, page_size, after, |r| {
            r.recipient == recipient && r.status == status
        }))
    }

    async fn list_outgoing(
        &self,
        sender: UserId,
        status: FriendRequestStatus,
        page_size: PageSize,
        after: Option<RequestCursor>,
    ) -> Result<Vec<FriendRequestView>, RelationError> {
        let state = self.store.lock().await;
        Ok(page_of(&state, sender, page_size, after, |r| {
            r.sender == sender && r.status == status
        }))
    }
}
