use crate::domain_model::{ProfileCard, UserId};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(
    Debug, Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(transparent)]
pub struct FriendRequestId(pub uuid::Uuid);

impl FriendRequestId {
    pub fn new_v4() -> Self {
        FriendRequestId(uuid::Uuid::new_v4())
    }
}

impl fmt::Display for FriendRequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for FriendRequestId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        uuid::Uuid::from_str(s).map(FriendRequestId)
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FriendRequestStatus {
    Pending,
    Accepted,
}

impl FriendRequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FriendRequestStatus::Pending => "pending",
            FriendRequestStatus::Accepted => "accepted",
        }
    }
}

impl FromStr for FriendRequestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(FriendRequestStatus::Pending),
            "accepted" => Ok(FriendRequestStatus::Accepted),
            other => Err(format!("unknown friend request status: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FriendRequest {
    pub request_id: FriendRequestId,
    pub sender: UserId,
    pub recipient: UserId,
    pub status: FriendRequestStatus,
    pub created_at: DateTime<Utc>,
}

impl FriendRequest {
    pub fn is_pending(&self) -> bool {
        self.status == FriendRequestStatus::Pending
    }

    pub fn counterpart_of(&self, user: UserId) -> UserId {
        if self.sender == user {
            self.recipient
        } else {
            self.sender
        }
    }

    pub fn cursor(&self) -> RequestCursor {
        RequestCursor {
            created_at: self.created_at,
            request_id: self.request_id,
        }
    }
}

/// A request joined with the display card of the account on the other side.
#[derive(Debug, Clone, Serialize)]
pub struct FriendRequestView {
    #[serde(flatten)]
    pub request: FriendRequest,
    pub counterpart: ProfileCard,
}

#[derive(Debug, Clone, Serialize)]
pub struct FriendRequestOverview {
    pub incoming: Vec<FriendRequestView>,
    pub accepted: Vec<FriendRequestView>,
}

/// Keyset cursor for request listings, ordered newest first.
#[derive(Debug, Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Hash)]
pub struct RequestCursor {
    pub created_at: DateTime<Utc>,
    pub request_id: FriendRequestId, // tiebreaker
}

impl RequestCursor {
    /// True when `request` sorts strictly after this cursor in newest-first order.
    pub fn admits(&self, request: &FriendRequest) -> bool {
        request.created_at < self.created_at
            || (request.created_at == self.created_at && request.request_id < self.request_id)
    }
}

impl fmt::Display for RequestCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}~{}",
            self.created_at.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            self.request_id
        )
    }
}

impl FromStr for RequestCursor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (date_str, id_str) = s.split_once('~').ok_or("invalid cursor format")?;

        let created_at = date_str
            .parse::<DateTime<Utc>>()
            .map_err(|e| e.to_string())?;

        let request_id = id_str
            .parse::<FriendRequestId>()
            .map_err(|e| e.to_string())?;

        Ok(RequestCursor {
            created_at,
            request_id,
        })
    }
}
