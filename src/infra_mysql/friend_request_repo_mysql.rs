use super::util::{db_now, downcast, is_dup_key};
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use sqlx::{MySql, MySqlPool, QueryBuilder};

pub struct MySqlFriendRequestRepo {
    pool: MySqlPool,
}

impl MySqlFriendRequestRepo {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct RequestRow {
    request_id: FriendRequestId,
    sender_id: UserId,
    recipient_id: UserId,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<RequestRow> for FriendRequest {
    type Error = RelationError;

    fn try_from(row: RequestRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<FriendRequestStatus>()
            .map_err(RelationError::Store)?;
        Ok(FriendRequest {
            request_id: row.request_id,
            sender: row.sender_id,
            recipient: row.recipient_id,
            status,
            created_at: row.created_at,
        })
    }
}

// Mapped from the listing join
#[derive(sqlx::FromRow)]
struct RequestViewRow {
    #[sqlx(flatten)]
    request: RequestRow,
    counterpart_id: UserId,
    full_name: String,
    profile_pic: String,
    native_language: String,
    learning_language: String,
}

const REQUEST_COLUMNS: &str = "request_id, sender_id, recipient_id, status, created_at";

/// Which side of the request the viewer is on.
#[derive(Clone, Copy)]
enum Side {
    Incoming,
    Outgoing,
}

impl Side {
    // (column matching the viewer, column holding the counterpart)
    fn columns(self) -> (&'static str, &'static str) {
        match self {
            Side::Incoming => ("recipient_id", "sender_id"),
            Side::Outgoing => ("sender_id", "recipient_id"),
        }
    }
}

impl MySqlFriendRequestRepo {
    async fn list_page(
        &self,
        side: Side,
        viewer: UserId,
        status: FriendRequestStatus,
        page_size: PageSize,
        after: Option<RequestCursor>,
    ) -> Result<Vec<FriendRequestView>, RelationError> {
        let (viewer_col, counterpart_col) = side.columns();

        let mut qb: QueryBuilder<MySql> = QueryBuilder::new(format!(
            r#"
SELECT
    fr.request_id, fr.sender_id, fr.recipient_id, fr.status, fr.created_at,
    a.user_id AS counterpart_id, a.full_name, a.profile_pic,
    a.native_language, a.learning_language
FROM friend_request fr
JOIN account a ON a.user_id = fr.{counterpart_col}
WHERE fr.{viewer_col} = "#
        ));
        qb.push_bind(viewer);
        qb.push(" AND fr.status = ");
        qb.push_bind(status.as_str());
        if let Some(cur) = after {
            qb.push(" AND (fr.created_at < ");
            qb.push_bind(cur.created_at);
            qb.push(" OR (fr.created_at = ");
            qb.push_bind(cur.created_at);
            qb.push(" AND fr.request_id < ");
            qb.push_bind(cur.request_id);
            qb.push("))");
        }
        qb.push(" ORDER BY fr.created_at DESC, fr.request_id DESC LIMIT ");
        qb.push_bind(page_size.clamped().0 as i64);

        let rows: Vec<RequestViewRow> = qb
            .build_query_as::<RequestViewRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RelationError::Store(format!("list friend requests: {e}")))?;

        rows.into_iter()
            .map(|row| {
                let counterpart = ProfileCard {
                    user_id: row.counterpart_id,
                    full_name: row.full_name,
                    profile_pic: row.profile_pic,
                    native_language: row.native_language,
                    learning_language: row.learning_language,
                };
                Ok(FriendRequestView {
                    request: FriendRequest::try_from(row.request)?,
                    counterpart,
                })
            })
            .collect()
    }
}

#[async_trait::async_trait]
impl FriendRequestRepo for MySqlFriendRequestRepo {
    async fn find_active_between_in_tx<'t>(
        &self,
        tx: &mut dyn StorageTx<'t>,
        a: UserId,
        b: UserId,
    ) -> Result<Option<FriendRequest>, RelationError> {
        let pair = UserPair::new(a, b);
        let tx = downcast(tx);

        let row: Option<RequestRow> = sqlx::query_as(&format!(
            r#"
SELECT {REQUEST_COLUMNS}
FROM friend_request
WHERE user_min = ? AND user_max = ? AND status = 'pending'
LIMIT 1
"#
        ))
        .bind(pair.min())
        .bind(pair.max())
        .fetch_optional(tx.conn())
        .await
        .map_err(|e| RelationError::Store(format!("query active request: {e}")))?;

        row.map(FriendRequest::try_from).transpose()
    }

    async fn create_in_tx<'t>(
        &self,
        tx: &mut dyn StorageTx<'t>,
        sender: UserId,
        recipient: UserId,
    ) -> Result<FriendRequest, RelationError> {
        if sender == recipient {
            return Err(RelationError::SelfTarget);
        }

        let pair = UserPair::new(sender, recipient);
        let request = FriendRequest {
            request_id: FriendRequestId::new_v4(),
            sender,
            recipient,
            status: FriendRequestStatus::Pending,
            created_at: db_now(),
        };

        let tx = downcast(tx);

        // uq_friend_request_active_pair closes the race between two crossing proposals
        let res = sqlx::query(
            r#"
INSERT INTO friend_request
    (request_id, sender_id, recipient_id, user_min, user_max, status, created_at)
VALUES (?, ?, ?, ?, ?, 'pending', ?)
"#,
        )
        .bind(request.request_id)
        .bind(sender)
        .bind(recipient)
        .bind(pair.min())
        .bind(pair.max())
        .bind(request.created_at)
        .execute(tx.conn())
        .await;

        match res {
            Ok(_) => Ok(request),
            Err(e) if is_dup_key(&e) => Err(RelationError::FriendRequestExists),
            Err(e) => Err(RelationError::Store(format!("insert friend request: {e}"))),
        }
    }

    async fn find_by_id_in_tx<'t>(
        &self,
        tx: &mut dyn StorageTx<'t>,
        request_id: FriendRequestId,
    ) -> Result<Option<FriendRequest>, RelationError> {
        let tx = downcast(tx);

        let row: Option<RequestRow> = sqlx::query_as(&format!(
            "SELECT {REQUEST_COLUMNS} FROM friend_request WHERE request_id = ?"
        ))
        .bind(request_id)
        .fetch_optional(tx.conn())
        .await
        .map_err(|e| RelationError::Store(format!("query friend request: {e}")))?;

        row.map(FriendRequest::try_from).transpose()
    }

    async fn get_for_update_in_tx<'t>(
        &self,
        tx: &mut dyn StorageTx<'t>,
        request_id: FriendRequestId,
    ) -> Result<Option<FriendRequest>, RelationError> {
        let tx = downcast(tx);

        let row: Option<RequestRow> = sqlx::query_as(&format!(
            "SELECT {REQUEST_COLUMNS} FROM friend_request WHERE request_id = ? FOR UPDATE"
        ))
        .bind(request_id)
        .fetch_optional(tx.conn())
        .await
        .map_err(|e| RelationError::Store(format!("lock friend request: {e}")))?;

        row.map(FriendRequest::try_from).transpose()
    }

    async fn set_accepted_in_tx<'t>(
        &self,
        tx: &mut dyn StorageTx<'t>,
        request_id: FriendRequestId,
    ) -> Result<(), RelationError> {
        let tx = downcast(tx);

        let result = sqlx::query(
            r#"
UPDATE friend_request
SET status = 'accepted', updated_at = ?
WHERE request_id = ? AND status = 'pending'
"#,
        )
        .bind(db_now())
        .bind(request_id)
        .execute(tx.conn())
        .await
        .map_err(|e| RelationError::Store(format!("accept friend request: {e}")))?;

        if result.rows_affected() == 1 {
            return Ok(());
        }

        let exists: Option<String> =
            sqlx::query_scalar("SELECT status FROM friend_request WHERE request_id = ?")
                .bind(request_id)
                .fetch_optional(tx.conn())
                .await
                .map_err(|e| RelationError::Store(format!("query request status: {e}")))?;

        match exists {
            Some(_) => Err(RelationError::NotPending),
            None => Err(RelationError::RequestNotFound),
        }
    }

    async fn delete_pending_in_tx<'t>(
        &self,
        tx: &mut dyn StorageTx<'t>,
        sender: UserId,
        recipient: UserId,
    ) -> Result<FriendRequestId, RelationError> {
        let tx = downcast(tx);

        let request_id: FriendRequestId = sqlx::query_scalar(
            r#"
SELECT request_id
FROM friend_request
WHERE sender_id = ? AND recipient_id = ? AND status = 'pending'
FOR UPDATE
"#,
        )
        .bind(sender)
        .bind(recipient)
        .fetch_optional(tx.conn())
        .await
        .map_err(|e| RelationError::Store(format!("query pending request: {e}")))?
        .ok_or(RelationError::PendingRequestNotFound)?;

        sqlx::query("DELETE FROM friend_request WHERE request_id = ? AND status = 'pending'")
            .bind(request_id)
            .execute(tx.conn())
            .await
            .map_err(|e| RelationError::Store(format!("delete friend request: {e}")))?;

        Ok(request_id)
    }

    async fn list_incoming(
        &self,
        recipient: UserId,
        status: FriendRequestStatus,
        page_size: PageSize,
        after: Option<RequestCursor>,
    ) -> Result<Vec<FriendRequestView>, RelationError> {
        self.list_page(Side::Incoming, recipient, status, page_size, after)
            .await
    }

    async fn list_outgoing(
        &self,
        sender: UserId,
        status: FriendRequestStatus,
        page_size: PageSize,
        after: Option<RequestCursor>,
    ) -> Result<Vec<FriendRequestView>, RelationError> {
        self.list_page(Side::Outgoing, sender, status, page_size, after)
            .await
    }
}
