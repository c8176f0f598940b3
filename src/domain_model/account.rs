use crate::domain_model::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Owner-editable profile fields. Only displayed, never interpreted by the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub full_name: String,
    pub bio: String,
    pub profile_pic: String,
    pub native_language: String,
    pub learning_language: String,
    pub location: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub user_id: UserId,
    pub profile: Profile,
    pub onboarded: bool,
    pub friends: BTreeSet<UserId>,
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn new(user_id: UserId, profile: Profile, onboarded: bool) -> Self {
        Self {
            user_id,
            profile,
            onboarded,
            friends: BTreeSet::new(),
            created_at: Utc::now(),
        }
    }

    pub fn is_friend_of(&self, other: UserId) -> bool {
        self.friends.contains(&other)
    }

    pub fn card(&self) -> ProfileCard {
        ProfileCard {
            user_id: self.user_id,
            full_name: self.profile.full_name.clone(),
            profile_pic: self.profile.profile_pic.clone(),
            native_language: self.profile.native_language.clone(),
            learning_language: self.profile.learning_language.clone(),
        }
    }

    pub fn public_profile(&self) -> PublicProfile {
        PublicProfile {
            user_id: self.user_id,
            profile: self.profile.clone(),
        }
    }
}

/// What the listings show about the other side of a friendship or request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProfileCard {
    pub user_id: UserId,
    pub full_name: String,
    pub profile_pic: String,
    pub native_language: String,
    pub learning_language: String,
}

/// Discovery view, the card plus bio and location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublicProfile {
    pub user_id: UserId,
    #[serde(flatten)]
    pub profile: Profile,
}

#[derive(Debug, Clone, Serialize)]
pub struct AccountView {
    pub user_id: UserId,
    #[serde(flatten)]
    pub profile: Profile,
    pub onboarded: bool,
    pub friend_count: usize,
    pub created_at: DateTime<Utc>,
}

impl From<&Account> for AccountView {
    fn from(account: &Account) -> Self {
        AccountView {
            user_id: account.user_id,
            profile: account.profile.clone(),
            onboarded: account.onboarded,
            friend_count: account.friends.len(),
            created_at: account.created_at,
        }
    }
}
