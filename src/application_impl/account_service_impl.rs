use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use crate::logger::*;
use std::sync::Arc;

pub struct RealAccountService {
    account_repo: Arc<dyn AccountRepo>,
    chat_gateway: Arc<dyn ChatGateway>,
    tx_manager: Arc<dyn TxManager>,
}

impl RealAccountService {
    pub fn new(
        account_repo: Arc<dyn AccountRepo>,
        chat_gateway: Arc<dyn ChatGateway>,
        tx_manager: Arc<dyn TxManager>,
    ) -> RealAccountService {
        RealAccountService {
            account_repo,
            chat_gateway,
            tx_manager,
        }
    }
}

#[async_trait::async_trait]
impl AccountService for RealAccountService {
    async fn profile(&self, me: UserId) -> Result<AccountView, AccountError> {
        let account = self
            .account_repo
            .find_by_id(me)
            .await?
            .ok_or(AccountError::UserNotFound)?;
        Ok(AccountView::from(&account))
    }

    async fn complete_onboarding(
        &self,
        me: UserId,
        profile: Profile,
    ) -> Result<AccountView, AccountError> {
        let mut tx = self
            .tx_manager
            .begin()
            .await
            .map_err(|e| AccountError::Store(e.to_string()))?;

        self.account_repo
            .update_profile_in_tx(&mut *tx, me, &profile, true)
            .await?;
        let account = self
            .account_repo
            .find_by_id_in_tx(&mut *tx, me)
            .await?
            .ok_or(AccountError::UserNotFound)?;

        tx.commit()
            .await
            .map_err(|e| AccountError::Store(e.to_string()))?;

        info!(user_id = %me, "account onboarded");

        // best-effort: the account is onboarded even if the chat provider is down
        if let Err(e) = self
            .chat_gateway
            .upsert_identity(&ChatIdentity::from(&account))
            .await
        {
            warn!(user_id = %me, "upsert chat identity: {e}");
        }

        Ok(AccountView::from(&account))
    }

    async fn chat_token(&self, me: UserId) -> Result<ChatToken, AccountError> {
        // tokens are only minted for accounts the directory knows about
        self.account_repo
            .find_by_id(me)
            .await?
            .ok_or(AccountError::UserNotFound)?;
        Ok(self.chat_gateway.issue_token(me).await?)
    }
}
