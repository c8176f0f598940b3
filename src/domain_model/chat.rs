use crate::domain_model::{Account, UserId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatToken {
    pub user_id: UserId,
    pub api_key: String,
    pub token: String,
}

/// The subset of an account the chat provider keeps about a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatIdentity {
    pub id: UserId,
    pub name: String,
    pub image: String,
}

impl From<&Account> for ChatIdentity {
    fn from(account: &Account) -> Self {
        ChatIdentity {
            id: account.user_id,
            name: account.profile.full_name.clone(),
            image: account.profile.profile_pic.clone(),
        }
    }
}
