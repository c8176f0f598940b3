use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use crate::logger::*;
use futures_util::future::try_join;
use std::sync::Arc;

pub struct RealRelationshipService {
    account_repo: Arc<dyn AccountRepo>,
    friend_request_repo: Arc<dyn FriendRequestRepo>,
    tx_manager: Arc<dyn TxManager>,
}

impl RealRelationshipService {
    pub fn new(
        account_repo: Arc<dyn AccountRepo>,
        friend_request_repo: Arc<dyn FriendRequestRepo>,
        tx_manager: Arc<dyn TxManager>,
    ) -> Self {
        Self {
            account_repo,
            friend_request_repo,
            tx_manager,
        }
    }

    async fn begin(&self) -> Result<Box<dyn StorageTx<'_> + '_>, RelationError> {
        self.tx_manager
            .begin()
            .await
            .map_err(|e| RelationError::Store(e.to_string()))
    }

    async fn load_account(&self, user_id: UserId) -> Result<Account, RelationError> {
        self.account_repo
            .find_by_id(user_id)
            .await?
            .ok_or(RelationError::UserNotFound)
    }
}

async fn commit(tx: Box<dyn StorageTx<'_> + '_>) -> Result<(), RelationError> {
    tx.commit()
        .await
        .map_err(|e| RelationError::Store(e.to_string()))
}

#[async_trait::async_trait]
impl RelationshipService for RealRelationshipService {
    async fn propose(&self, me: UserId, target: UserId) -> Result<FriendRequestId, RelationError> {
        if me == target {
            return Err(RelationError::SelfTarget);
        }

        let mut tx = self.begin().await?;

        // lock before reading so the friendship check sees a concurrent accept
        self.account_repo
            .lock_pair_in_tx(&mut *tx, UserPair::new(me, target))
            .await?;

        let recipient = self
            .account_repo
            .find_by_id_in_tx(&mut *tx, target)
            .await?
            .ok_or(RelationError::UserNotFound)?;
        if !recipient.onboarded {
            return Err(RelationError::NotOnboarded);
        }

        let sender = self
            .account_repo
            .find_by_id_in_tx(&mut *tx, me)
            .await?
            .ok_or(RelationError::UserNotFound)?;
        if !sender.onboarded {
            return Err(RelationError::ActorNotOnboarded);
        }

        if recipient.is_friend_of(me) {
            return Err(RelationError::AlreadyFriends);
        }

        if let Some(existing) = self
            .friend_request_repo
            .find_active_between_in_tx(&mut *tx, me, target)
            .await?
        {
            debug!(request_id = %existing.request_id, "active friend request already present");
            return Err(RelationError::FriendRequestExists);
        }

        // the ledger re-checks uniqueness at insert time, a concurrent crossing
        // proposal surfaces here as FriendRequestExists
        let request = self
            .friend_request_repo
            .create_in_tx(&mut *tx, me, target)
            .await?;

        commit(tx).await?;

        info!(request_id = %request.request_id, sender = %me, recipient = %target, "friend request created");
        Ok(request.request_id)
    }

    async fn accept(&self, me: UserId, request_id: FriendRequestId) -> Result<(), RelationError> {
        let mut tx = self.begin().await?;

        // take the pair lock before the request lock, in the same order as propose
        let peeked = self
            .friend_request_repo
            .find_by_id_in_tx(&mut *tx, request_id)
            .await?
            .ok_or(RelationError::RequestNotFound)?;
        self.account_repo
            .lock_pair_in_tx(&mut *tx, UserPair::new(peeked.sender, peeked.recipient))
            .await?;

        let request = self
            .friend_request_repo
            .get_for_update_in_tx(&mut *tx, request_id)
            .await?
            .ok_or(RelationError::RequestNotFound)?;
        if request.recipient != me {
            return Err(RelationError::NotRecipient);
        }
        if !request.is_pending() {
            return Err(RelationError::NotPending);
        }

        // status transition and both friend-set insertions commit together
        self.friend_request_repo
            .set_accepted_in_tx(&mut *tx, request_id)
            .await?;
        self.account_repo
            .add_friend_in_tx(&mut *tx, request.sender, request.recipient)
            .await?;
        self.account_repo
            .add_friend_in_tx(&mut *tx, request.recipient, request.sender)
            .await?;

        commit(tx).await?;

        info!(%request_id, sender = %request.sender, recipient = %me, "friend request accepted");
        Ok(())
    }

    async fn withdraw(&self, me: UserId, target: UserId) -> Result<(), RelationError> {
        let mut tx = self.begin().await?;

        let request_id = self
            .friend_request_repo
            .delete_pending_in_tx(&mut *tx, me, target)
            .await?;

        commit(tx).await?;

        info!(%request_id, sender = %me, recipient = %target, "friend request withdrawn");
        Ok(())
    }

    async fn list_recommendations(&self, me: UserId) -> Result<Vec<PublicProfile>, RelationError> {
        let account = self.load_account(me).await?;
        Ok(self
            .account_repo
            .list_discoverable(me, &account.friends)
            .await?)
    }

    async fn list_friends(&self, me: UserId) -> Result<Vec<ProfileCard>, RelationError> {
        let account = self.load_account(me).await?;
        Ok(self.account_repo.list_cards(&account.friends).await?)
    }

    async fn list_incoming(
        &self,
        me: UserId,
        status: FriendRequestStatus,
        page_size: PageSize,
        after: Option<RequestCursor>,
    ) -> Result<Vec<FriendRequestView>, RelationError> {
        self.friend_request_repo
            .list_incoming(me, status, page_size, after)
            .await
    }

    async fn list_outgoing(
        &self,
        me: UserId,
        status: FriendRequestStatus,
        page_size: PageSize,
        after: Option<RequestCursor>,
    ) -> Result<Vec<FriendRequestView>, RelationError> {
        self.friend_request_repo
            .list_outgoing(me, status, page_size, after)
            .await
    }

    async fn overview(
        &self,
        me: UserId,
        page_size: PageSize,
    ) -> Result<FriendRequestOverview, RelationError> {
        let (incoming, accepted) = try_join(
            self.friend_request_repo
                .list_incoming(me, FriendRequestStatus::Pending, page_size, None),
            self.friend_request_repo
                .list_outgoing(me, FriendRequestStatus::Accepted, page_size, None),
        )
        .await?;

        Ok(FriendRequestOverview { incoming, accepted })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra_memory::*;

    struct Fixture {
        store: MemoryStore,
        service: RealRelationshipService,
    }

    impl Fixture {
        fn new() -> Self {
            let store = MemoryStore::new();
            let service = RealRelationshipService::new(
                Arc::new(MemoryAccountRepo::new(store.clone())),
                Arc::new(MemoryFriendRequestRepo::new(store.clone())),
                Arc::new(MemoryTxManager::new(store.clone())),
            );
            Fixture { store, service }
        }

        async fn account(&self, name: &str, onboarded: bool) -> UserId {
            let profile = Profile {
                full_name: name.to_string(),
                ..Profile::default()
            };
            let account = Account::new(UserId::new_v4(), profile, onboarded);
            let id = account.user_id;
            self.store.insert_account(account).await;
            id
        }
    }

    /// Delegates to the memory repo and records the order of transactional calls.
    struct RecordingAccountRepo {
        inner: MemoryAccountRepo,
        calls: std::sync::Mutex<Vec<&'static str>>,
    }

    impl RecordingAccountRepo {
        fn record(&self, call: &'static str) {
            self.calls.lock().unwrap().push(call);
        }

        fn take(&self) -> Vec<&'static str> {
            std::mem::take(&mut *self.calls.lock().unwrap())
        }
    }

    #[async_trait::async_trait]
    impl AccountRepo for RecordingAccountRepo {
        async fn find_by_id(&self, user_id: UserId) -> Result<Option<Account>, AccountError> {
            self.inner.find_by_id(user_id).await
        }

        async fn find_by_id_in_tx<'t>(
            &self,
            tx: &mut dyn StorageTx<'t>,
            user_id: UserId,
        ) -> Result<Option<Account>, AccountError> {
            self.record("find");
            self.inner.find_by_id_in_tx(tx, user_id).await
        }

        async fn lock_pair_in_tx<'t>(
            &self,
            tx: &mut dyn StorageTx<'t>,
            pair: UserPair,
        ) -> Result<(), AccountError> {
            self.record("lock_pair");
            self.inner.lock_pair_in_tx(tx, pair).await
        }

        async fn list_discoverable(
            &self,
            exclude: UserId,
            exclude_set: &std::collections::BTreeSet<UserId>,
        ) -> Result<Vec<PublicProfile>, AccountError> {
            self.inner.list_discoverable(exclude, exclude_set).await
        }

        async fn list_cards(
            &self,
            ids: &std::collections::BTreeSet<UserId>,
        ) -> Result<Vec<ProfileCard>, AccountError> {
            self.inner.list_cards(ids).await
        }

        async fn add_friend_in_tx<'t>(
            &self,
            tx: &mut dyn StorageTx<'t>,
            owner: UserId,
            friend: UserId,
        ) -> Result<(), AccountError> {
            self.record("add_friend");
            self.inner.add_friend_in_tx(tx, owner, friend).await
        }

        async fn update_profile_in_tx<'t>(
            &self,
            tx: &mut dyn StorageTx<'t>,
            user_id: UserId,
            profile: &Profile,
            onboarded: bool,
        ) -> Result<(), AccountError> {
            self.inner
                .update_profile_in_tx(tx, user_id, profile, onboarded)
                .await
        }
    }

    #[tokio::test]
    async fn pair_is_locked_before_accounts_are_read_or_linked() {
        let store = MemoryStore::new();
        let repo = Arc::new(RecordingAccountRepo {
            inner: MemoryAccountRepo::new(store.clone()),
            calls: std::sync::Mutex::new(Vec::new()),
        });
        let service = RealRelationshipService::new(
            repo.clone(),
            Arc::new(MemoryFriendRequestRepo::new(store.clone())),
            Arc::new(MemoryTxManager::new(store.clone())),
        );
        let (a, b) = (UserId::new_v4(), UserId::new_v4());
        for id in [a, b] {
            store
                .insert_account(Account::new(id, Profile::default(), true))
                .await;
        }

        let id = service.propose(a, b).await.unwrap();
        assert_eq!(repo.take(), vec!["lock_pair", "find", "find"]);

        service.accept(b, id).await.unwrap();
        assert_eq!(repo.take(), vec!["lock_pair", "add_friend", "add_friend"]);
    }

    #[tokio::test]
    async fn propose_to_self_is_invalid() {
        let f = Fixture::new();
        let a = f.account("a", true).await;

        let err = f.service.propose(a, a).await.unwrap_err();
        assert!(matches!(err, RelationError::SelfTarget));
        assert_eq!(f.store.snapshot().await.requests().count(), 0);
    }

    #[tokio::test]
    async fn propose_to_unknown_user_is_not_found() {
        let f = Fixture::new();
        let a = f.account("a", true).await;

        let err = f.service.propose(a, UserId::new_v4()).await.unwrap_err();
        assert!(matches!(err, RelationError::UserNotFound));
    }

    #[tokio::test]
    async fn propose_requires_both_sides_onboarded() {
        let f = Fixture::new();
        let a = f.account("a", true).await;
        let fresh = f.account("fresh", false).await;

        let err = f.service.propose(a, fresh).await.unwrap_err();
        assert!(matches!(err, RelationError::NotOnboarded));

        let err = f.service.propose(fresh, a).await.unwrap_err();
        assert!(matches!(err, RelationError::ActorNotOnboarded));

        assert_eq!(f.store.snapshot().await.requests().count(), 0);
    }

    #[tokio::test]
    async fn crossing_proposals_conflict() {
        let f = Fixture::new();
        let a = f.account("a", true).await;
        let b = f.account("b", true).await;

        f.service.propose(a, b).await.unwrap();
        let err = f.service.propose(b, a).await.unwrap_err();
        assert!(matches!(err, RelationError::FriendRequestExists));

        let err = f.service.propose(a, b).await.unwrap_err();
        assert!(matches!(err, RelationError::FriendRequestExists));

        assert_eq!(f.store.snapshot().await.requests().count(), 1);
    }

    #[tokio::test]
    async fn accept_links_both_friend_sets() {
        let f = Fixture::new();
        let a = f.account("a", true).await;
        let b = f.account("b", true).await;

        let id = f.service.propose(a, b).await.unwrap();
        f.service.accept(b, id).await.unwrap();

        let state = f.store.snapshot().await;
        assert!(state.account(a).unwrap().is_friend_of(b));
        assert!(state.account(b).unwrap().is_friend_of(a));
        let request = state.requests().next().unwrap();
        assert_eq!(request.status, FriendRequestStatus::Accepted);
    }

    #[tokio::test]
    async fn only_the_recipient_may_accept() {
        let f = Fixture::new();
        let a = f.account("a", true).await;
        let b = f.account("b", true).await;
        let c = f.account("c", true).await;

        let id = f.service.propose(a, b).await.unwrap();

        let err = f.service.accept(a, id).await.unwrap_err();
        assert!(matches!(err, RelationError::NotRecipient));
        let err = f.service.accept(c, id).await.unwrap_err();
        assert!(matches!(err, RelationError::NotRecipient));

        let state = f.store.snapshot().await;
        assert!(state.account(a).unwrap().friends.is_empty());
        assert!(state.account(b).unwrap().friends.is_empty());
    }

    #[tokio::test]
    async fn accept_twice_is_invalid_state() {
        let f = Fixture::new();
        let a = f.account("a", true).await;
        let b = f.account("b", true).await;

        let id = f.service.propose(a, b).await.unwrap();
        f.service.accept(b, id).await.unwrap();

        let err = f.service.accept(b, id).await.unwrap_err();
        assert!(matches!(err, RelationError::NotPending));
    }

    #[tokio::test]
    async fn accept_unknown_request_is_not_found() {
        let f = Fixture::new();
        let a = f.account("a", true).await;

        let err = f
            .service
            .accept(a, FriendRequestId::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, RelationError::RequestNotFound));
    }

    #[tokio::test]
    async fn accept_failing_midway_leaves_no_partial_edge() {
        let f = Fixture::new();
        let a = f.account("a", true).await;
        let b = f.account("b", true).await;
        let id = f.service.propose(a, b).await.unwrap();

        // drop the recipient's account so the second friend-set insert fails
        f.store.lock().await.accounts.remove(&b);

        let err = f.service.accept(b, id).await.unwrap_err();
        assert!(matches!(err, RelationError::UserNotFound));

        let state = f.store.snapshot().await;
        assert!(state.account(a).unwrap().friends.is_empty());
        assert!(state.requests().all(FriendRequest::is_pending));
    }

    #[tokio::test]
    async fn already_friends_cannot_propose_again() {
        let f = Fixture::new();
        let a = f.account("a", true).await;
        let b = f.account("b", true).await;

        let id = f.service.propose(a, b).await.unwrap();
        f.service.accept(b, id).await.unwrap();

        let err = f.service.propose(a, b).await.unwrap_err();
        assert!(matches!(err, RelationError::AlreadyFriends));
        let err = f.service.propose(b, a).await.unwrap_err();
        assert!(matches!(err, RelationError::AlreadyFriends));

        assert_eq!(f.store.snapshot().await.requests().count(), 1);
    }

    #[tokio::test]
    async fn withdraw_respects_direction_and_status() {
        let f = Fixture::new();
        let a = f.account("a", true).await;
        let b = f.account("b", true).await;

        let id = f.service.propose(a, b).await.unwrap();

        let err = f.service.withdraw(b, a).await.unwrap_err();
        assert!(matches!(err, RelationError::PendingRequestNotFound));

        f.service.accept(b, id).await.unwrap();
        let err = f.service.withdraw(a, b).await.unwrap_err();
        assert!(matches!(err, RelationError::PendingRequestNotFound));
        assert_eq!(f.store.snapshot().await.requests().count(), 1);
    }

    #[tokio::test]
    async fn withdraw_then_propose_again() {
        let f = Fixture::new();
        let a = f.account("a", true).await;
        let b = f.account("b", true).await;

        f.service.propose(a, b).await.unwrap();
        f.service.withdraw(a, b).await.unwrap();

        let incoming = f
            .service
            .list_incoming(b, FriendRequestStatus::Pending, PageSize::DEFAULT, None)
            .await
            .unwrap();
        assert!(incoming.is_empty());

        f.service.propose(a, b).await.unwrap();
    }

    #[tokio::test]
    async fn recommendations_skip_self_friends_and_unonboarded() {
        let f = Fixture::new();
        let a = f.account("a", true).await;
        let b = f.account("b", true).await;
        let c = f.account("c", true).await;
        let _fresh = f.account("fresh", false).await;

        let id = f.service.propose(a, b).await.unwrap();
        f.service.accept(b, id).await.unwrap();

        let ids: Vec<UserId> = f
            .service
            .list_recommendations(a)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.user_id)
            .collect();
        assert_eq!(ids, vec![c]);
    }

    #[tokio::test]
    async fn overview_shows_incoming_and_accepted_outgoing() {
        let f = Fixture::new();
        let a = f.account("a", true).await;
        let b = f.account("b", true).await;
        let c = f.account("c", true).await;

        let ab = f.service.propose(a, b).await.unwrap();
        f.service.accept(b, ab).await.unwrap();
        f.service.propose(c, a).await.unwrap();

        let overview = f.service.overview(a, PageSize::DEFAULT).await.unwrap();
        assert_eq!(overview.incoming.len(), 1);
        assert_eq!(overview.incoming[0].counterpart.user_id, c);
        assert_eq!(overview.accepted.len(), 1);
        assert_eq!(overview.accepted[0].counterpart.user_id, b);
    }
}
