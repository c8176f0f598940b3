use crate::application_impl::*;
use crate::application_port::*;
use crate::domain_port::*;
use crate::infra_memory::*;
use crate::infra_mysql::*;
use crate::logger::*;
use crate::settings::Settings;
use nanoid::nanoid;
use sqlx::MySqlPool;
use std::sync::Arc;

const DEV_CHAT_SECRET: &str = "tandem-dev-chat-secret";

pub struct Server {
    pub relationship_service: Arc<dyn RelationshipService>,
    pub account_service: Arc<dyn AccountService>,
    pub access_guard: Arc<dyn AccessGuard>,
    pool: Option<MySqlPool>,
}

/// The three storage seams every service is built from.
pub struct Storage {
    pub account_repo: Arc<dyn AccountRepo>,
    pub friend_request_repo: Arc<dyn FriendRequestRepo>,
    pub tx_manager: Arc<dyn TxManager>,
}

impl Storage {
    pub fn memory(store: &MemoryStore) -> Storage {
        Storage {
            account_repo: Arc::new(MemoryAccountRepo::new(store.clone())),
            friend_request_repo: Arc::new(MemoryFriendRequestRepo::new(store.clone())),
            tx_manager: Arc::new(MemoryTxManager::new(store.clone())),
        }
    }

    pub fn mysql(pool: &MySqlPool) -> Storage {
        Storage {
            account_repo: Arc::new(MySqlAccountRepo::new(pool.clone())),
            friend_request_repo: Arc::new(MySqlFriendRequestRepo::new(pool.clone())),
            tx_manager: Arc::new(MySqlTxManager::new(pool.clone())),
        }
    }
}

/// Real credentials require a real chat secret, only the fake backend may fall
/// back to the development one.
fn chat_secret(auth_backend: &str, configured: Option<String>) -> anyhow::Result<String> {
    match configured {
        Some(secret) if !secret.is_empty() => Ok(secret),
        _ if auth_backend == "jwt" => Err(anyhow::anyhow!(
            "CHAT_API_SECRET must be set for the jwt backend"
        )),
        _ => {
            warn!("CHAT_API_SECRET not set, using the development secret");
            Ok(DEV_CHAT_SECRET.to_string())
        }
    }
}

impl Server {
    pub async fn try_new(settings: &Settings) -> anyhow::Result<Self> {
        let alphabet: [char; 16] = [
            '1', '2', '3', '4', '5', '6', '7', '8', '9', '0', 'a', 'b', 'c', 'd', 'e', 'f',
        ];
        let run_id = nanoid!(10, &alphabet);

        let (storage, pool) = match settings.storage.backend.as_str() {
            "memory" => {
                let store = MemoryStore::new();
                if let Some(path) = &settings.storage.seed_path {
                    let count = store.load_seed(path).await?;
                    info!(count, path = %path, "seeded memory store");
                }
                (Storage::memory(&store), None)
            }
            "mysql" => {
                let pool =
                    connect_pool(&settings.storage.dsn, settings.storage.max_connections).await?;
                (Storage::mysql(&pool), Some(pool))
            }
            other => return Err(anyhow::anyhow!("Unknown storage backend: {}", other)),
        };

        let access_guard: Arc<dyn AccessGuard> = match settings.auth.backend.as_str() {
            "fake" => {
                warn!("fake access guard enabled, bearer tokens are trusted verbatim");
                Arc::new(FakeAccessGuard::new())
            }
            "jwt" => {
                let key = std::env::var("JWT_SIGNING_KEY")
                    .map_err(|_| anyhow::anyhow!("JWT_SIGNING_KEY must be set for the jwt backend"))?
                    .into_bytes();
                Arc::new(JwtAccessGuard::new(&JwtConfig {
                    issuer: settings.auth.issuer.clone(),
                    audience: settings.auth.audience.clone(),
                    signing_key: key,
                }))
            }
            other => return Err(anyhow::anyhow!("Unknown auth backend: {}", other)),
        };

        let chat_secret = chat_secret(
            &settings.auth.backend,
            std::env::var("CHAT_API_SECRET").ok(),
        )?;
        let chat_gateway: Arc<dyn ChatGateway> =
            Arc::new(JwtChatGateway::new(settings.chat.api_key.clone(), chat_secret));

        let mut server = Server::assemble(storage, access_guard, chat_gateway);
        server.pool = pool;

        info!(%run_id, storage = %settings.storage.backend, "server started");
        Ok(server)
    }

    pub fn assemble(
        storage: Storage,
        access_guard: Arc<dyn AccessGuard>,
        chat_gateway: Arc<dyn ChatGateway>,
    ) -> Self {
        let relationship_service: Arc<dyn RelationshipService> =
            Arc::new(RealRelationshipService::new(
                storage.account_repo.clone(),
                storage.friend_request_repo,
                storage.tx_manager.clone(),
            ));
        let account_service: Arc<dyn AccountService> = Arc::new(RealAccountService::new(
            storage.account_repo,
            chat_gateway,
            storage.tx_manager,
        ));

        Self {
            relationship_service,
            account_service,
            access_guard,
            pool: None,
        }
    }

    /// Memory storage, the fake access guard and a local chat gateway.
    pub fn in_memory(store: &MemoryStore) -> Self {
        Server::assemble(
            Storage::memory(store),
            Arc::new(FakeAccessGuard::new()),
            Arc::new(JwtChatGateway::new("local", DEV_CHAT_SECRET)),
        )
    }

    pub async fn shutdown(&self) {
        info!("server shutting down...");

        if let Some(pool) = &self.pool {
            pool.close().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jwt_backend_requires_chat_secret() {
        assert!(chat_secret("jwt", None).is_err());
        assert!(chat_secret("jwt", Some(String::new())).is_err());
        assert_eq!(
            chat_secret("jwt", Some("s3cret".to_string())).unwrap(),
            "s3cret"
        );
    }

    #[test]
    fn fake_backend_falls_back_to_development_secret() {
        assert_eq!(chat_secret("fake", None).unwrap(), DEV_CHAT_SECRET);
        assert_eq!(
            chat_secret("fake", Some("s3cret".to_string())).unwrap(),
            "s3cret"
        );
    }
}
