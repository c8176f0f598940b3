use crate::application_port::ChatError;
use crate::domain_model::{AccountView, ChatToken, Profile, UserId};

#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("user not found")]
    UserNotFound,
    #[error("chat provider error: {0}")]
    Chat(#[from] ChatError),
    #[error("store error: {0}")]
    Store(String),
}

#[async_trait::async_trait]
pub trait AccountService: Send + Sync {
    async fn profile(&self, me: UserId) -> Result<AccountView, AccountError>;

    /// Stores the profile and marks the account onboarded.
    async fn complete_onboarding(
        &self,
        me: UserId,
        profile: Profile,
    ) -> Result<AccountView, AccountError>;

    async fn chat_token(&self, me: UserId) -> Result<ChatToken, AccountError>;
}
