use crate::application_port::*;
use crate::domain_model::*;
use dashmap::DashMap;
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct ChatClaims<'a> {
    user_id: &'a str,
}

/// Mints chat-provider user tokens signed with the shared API secret and keeps
/// the identities the provider has been told about.
pub struct JwtChatGateway {
    api_key: String,
    key: EncodingKey,
    identities: DashMap<UserId, ChatIdentity>,
}

impl JwtChatGateway {
    pub fn new(api_key: impl Into<String>, secret: impl AsRef<[u8]>) -> Self {
        JwtChatGateway {
            api_key: api_key.into(),
            key: EncodingKey::from_secret(secret.as_ref()),
            identities: DashMap::new(),
        }
    }

    pub fn identity(&self, user_id: UserId) -> Option<ChatIdentity> {
        self.identities.get(&user_id).map(|e| e.value().clone())
    }
}

#[async_trait::async_trait]
impl ChatGateway for JwtChatGateway {
    async fn issue_token(&self, user_id: UserId) -> Result<ChatToken, ChatError> {
        let id = user_id.to_string();
        let token = encode(
            &Header::new(Algorithm::HS256),
            &ChatClaims { user_id: &id },
            &self.key,
        )
        .map_err(|e| ChatError::Token(e.to_string()))?;
        Ok(ChatToken {
            user_id,
            api_key: self.api_key.clone(),
            token,
        })
    }

    async fn upsert_identity(&self, identity: &ChatIdentity) -> Result<(), ChatError> {
        self.identities.insert(identity.id, identity.clone());
        Ok(())
    }
}
