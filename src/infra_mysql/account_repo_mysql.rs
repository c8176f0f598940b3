use super::util::{ER_NO_REFERENCED_ROW_2, downcast, error_number};
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use sqlx::{MySql, MySqlConnection, MySqlPool, QueryBuilder};
use std::collections::BTreeSet;

pub struct MySqlAccountRepo {
    pool: MySqlPool,
}

impl MySqlAccountRepo {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlAccountRepo { pool }
    }
}

#[derive(sqlx::FromRow)]
struct AccountRow {
    user_id: UserId,
    full_name: String,
    bio: String,
    profile_pic: String,
    native_language: String,
    learning_language: String,
    location: String,
    is_onboarded: bool,
    created_at: DateTime<Utc>,
}

impl AccountRow {
    fn into_profile(self) -> (UserId, Profile, bool, DateTime<Utc>) {
        let profile = Profile {
            full_name: self.full_name,
            bio: self.bio,
            profile_pic: self.profile_pic,
            native_language: self.native_language,
            learning_language: self.learning_language,
            location: self.location,
        };
        (self.user_id, profile, self.is_onboarded, self.created_at)
    }
}

/// A friend edge whose owner row is gone fails the foreign key, which is a
/// missing account rather than a storage fault.
fn add_friend_error(number: Option<u16>, detail: impl std::fmt::Display) -> AccountError {
    match number {
        Some(ER_NO_REFERENCED_ROW_2) => AccountError::UserNotFound,
        _ => AccountError::Store(format!("insert friend edge: {detail}")),
    }
}

const ACCOUNT_COLUMNS: &str = "user_id, full_name, bio, profile_pic, native_language, \
     learning_language, location, is_onboarded, created_at";

async fn load_account(
    conn: &mut MySqlConnection,
    user_id: UserId,
) -> Result<Option<Account>, AccountError> {
    let row: Option<AccountRow> = sqlx::query_as(&format!(
        "SELECT {ACCOUNT_COLUMNS} FROM account WHERE user_id = ?"
    ))
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await
    .map_err(|e| AccountError::Store(format!("query account: {e}")))?;

    let Some(row) = row else {
        return Ok(None);
    };

    let friends: Vec<UserId> =
        sqlx::query_scalar("SELECT friend_id FROM account_friend WHERE user_id = ?")
            .bind(user_id)
            .fetch_all(&mut *conn)
            .await
            .map_err(|e| AccountError::Store(format!("query friend set: {e}")))?;

    let (user_id, profile, onboarded, created_at) = row.into_profile();
    Ok(Some(Account {
        user_id,
        profile,
        onboarded,
        friends: friends.into_iter().collect(),
        created_at,
    }))
}

#[async_trait::async_trait]
impl AccountRepo for MySqlAccountRepo {
    async fn find_by_id(&self, user_id: UserId) -> Result<Option<Account>, AccountError> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| AccountError::Store(format!("acquire connection: {e}")))?;
        load_account(&mut conn, user_id).await
    }

    async fn find_by_id_in_tx<'t>(
        &self,
        tx: &mut dyn StorageTx<'t>,
        user_id: UserId,
    ) -> Result<Option<Account>, AccountError> {
        let tx = downcast(tx);
        load_account(tx.conn(), user_id).await
    }

    async fn lock_pair_in_tx<'t>(
        &self,
        tx: &mut dyn StorageTx<'t>,
        pair: UserPair,
    ) -> Result<(), AccountError> {
        let tx = downcast(tx);

        // a locking read opens no snapshot, so plain reads after it see every
        // commit made before the locks were granted
        sqlx::query(
            r#"
SELECT user_id
FROM account
WHERE user_id IN (?, ?)
ORDER BY user_id
FOR UPDATE
"#,
        )
        .bind(pair.min())
        .bind(pair.max())
        .fetch_all(tx.conn())
        .await
        .map_err(|e| AccountError::Store(format!("lock account pair: {e}")))?;

        Ok(())
    }

    async fn list_discoverable(
        &self,
        exclude: UserId,
        exclude_set: &BTreeSet<UserId>,
    ) -> Result<Vec<PublicProfile>, AccountError> {
        let mut qb: QueryBuilder<MySql> = QueryBuilder::new(format!(
            "SELECT {ACCOUNT_COLUMNS} FROM account WHERE is_onboarded = TRUE AND user_id <> "
        ));
        qb.push_bind(exclude);
        if !exclude_set.is_empty() {
            qb.push(" AND user_id NOT IN (");
            let mut separated = qb.separated(", ");
            for id in exclude_set {
                separated.push_bind(*id);
            }
            separated.push_unseparated(")");
        }
        qb.push(" ORDER BY created_at DESC, user_id ASC");

        let rows: Vec<AccountRow> = qb
            .build_query_as::<AccountRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AccountError::Store(format!("list discoverable accounts: {e}")))?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let (user_id, profile, _, _) = row.into_profile();
                PublicProfile { user_id, profile }
            })
            .collect())
    }

    async fn list_cards(&self, ids: &BTreeSet<UserId>) -> Result<Vec<ProfileCard>, AccountError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb: QueryBuilder<MySql> = QueryBuilder::new(
            "SELECT user_id, full_name, profile_pic, native_language, learning_language \
             FROM account WHERE user_id IN (",
        );
        let mut separated = qb.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");
        qb.push(" ORDER BY full_name ASC, user_id ASC");

        qb.build_query_as::<ProfileCard>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AccountError::Store(format!("list profile cards: {e}")))
    }

    async fn add_friend_in_tx<'t>(
        &self,
        tx: &mut dyn StorageTx<'t>,
        owner: UserId,
        friend: UserId,
    ) -> Result<(), AccountError> {
        let tx = downcast(tx);

        // the primary key makes this a set, re-adding is a no-op
        sqlx::query(
            r#"
INSERT INTO account_friend (user_id, friend_id)
VALUES (?, ?)
ON DUPLICATE KEY UPDATE user_id = user_id
"#,
        )
        .bind(owner)
        .bind(friend)
        .execute(tx.conn())
        .await
        .map_err(|e| add_friend_error(error_number(&e), e))?;

        Ok(())
    }

    async fn update_profile_in_tx<'t>(
        &self,
        tx: &mut dyn StorageTx<'t>,
        user_id: UserId,
        profile: &Profile,
        onboarded: bool,
    ) -> Result<(), AccountError> {
        let tx = downcast(tx);

        let result = sqlx::query(
            r#"
UPDATE account
SET full_name = ?, bio = ?, profile_pic = ?, native_language = ?,
    learning_language = ?, location = ?, is_onboarded = ?
WHERE user_id = ?
"#,
        )
        .bind(&profile.full_name)
        .bind(&profile.bio)
        .bind(&profile.profile_pic)
        .bind(&profile.native_language)
        .bind(&profile.learning_language)
        .bind(&profile.location)
        .bind(onboarded)
        .bind(user_id)
        .execute(tx.conn())
        .await
        .map_err(|e| AccountError::Store(format!("update profile: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(AccountError::UserNotFound);
        }

        Ok(())
    }
}
