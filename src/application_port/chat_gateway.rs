use crate::domain_model::{ChatIdentity, ChatToken, UserId};

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("issue chat token: {0}")]
    Token(String),
    #[error("upsert chat identity: {0}")]
    Identity(String),
}

/// The third-party chat/video provider, narrowed to what the service layer needs.
#[async_trait::async_trait]
pub trait ChatGateway: Send + Sync {
    async fn issue_token(&self, user_id: UserId) -> Result<ChatToken, ChatError>;
    async fn upsert_identity(&self, identity: &ChatIdentity) -> Result<(), ChatError>;
}
