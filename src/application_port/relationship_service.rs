use crate::application_port::AccountError;
use crate::domain_model::*;

#[derive(Debug, thiserror::Error)]
pub enum RelationError {
    #[error("cannot friend yourself")]
    SelfTarget,
    #[error("user not found")]
    UserNotFound,
    #[error("user has not completed onboarding")]
    NotOnboarded,
    #[error("complete onboarding before sending friend requests")]
    ActorNotOnboarded,
    #[error("already friends")]
    AlreadyFriends,
    #[error("friend request already exists")]
    FriendRequestExists,
    #[error("friend request not found")]
    RequestNotFound,
    #[error("no pending friend request found to cancel")]
    PendingRequestNotFound,
    #[error("only the recipient may accept this friend request")]
    NotRecipient,
    #[error("friend request is not pending")]
    NotPending,
    #[error("store error: {0}")]
    Store(String),
}

impl From<AccountError> for RelationError {
    fn from(error: AccountError) -> Self {
        match error {
            AccountError::UserNotFound => RelationError::UserNotFound,
            AccountError::Chat(e) => RelationError::Store(e.to_string()),
            AccountError::Store(e) => RelationError::Store(e),
        }
    }
}

#[async_trait::async_trait]
pub trait RelationshipService: Send + Sync {
    /// Sends a friend request from `me` to `target`.
    async fn propose(&self, me: UserId, target: UserId) -> Result<FriendRequestId, RelationError>;

    /// Accepts a pending request addressed to `me` and links both friend sets.
    async fn accept(&self, me: UserId, request_id: FriendRequestId) -> Result<(), RelationError>;

    /// Cancels the pending request `me` sent to `target`.
    async fn withdraw(&self, me: UserId, target: UserId) -> Result<(), RelationError>;

    async fn list_recommendations(&self, me: UserId) -> Result<Vec<PublicProfile>, RelationError>;

    async fn list_friends(&self, me: UserId) -> Result<Vec<ProfileCard>, RelationError>;

    async fn list_incoming(
        &self,
        me: UserId,
        status: FriendRequestStatus,
        page_size: PageSize,
        after: Option<RequestCursor>,
    ) -> Result<Vec<FriendRequestView>, RelationError>;

    async fn list_outgoing(
        &self,
        me: UserId,
        status: FriendRequestStatus,
        page_size: PageSize,
        after: Option<RequestCursor>,
    ) -> Result<Vec<FriendRequestView>, RelationError>;

    /// Incoming pending requests plus outgoing requests the other side accepted.
    async fn overview(
        &self,
        me: UserId,
        page_size: PageSize,
    ) -> Result<FriendRequestOverview, RelationError>;
}
