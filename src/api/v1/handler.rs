use super::error::*;
use crate::application_port::*;
use crate::domain_model::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use warp::http::StatusCode;
use warp::{self, reject};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<ApiErrorCode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        ApiResponse {
            success: true,
            data: Some(data),
            code: None,
            message: None,
        }
    }

    pub fn err(code: ApiErrorCode, message: impl Into<String>) -> Self {
        ApiResponse {
            success: false,
            data: None,
            code: Some(code),
            message: Some(message.into()),
        }
    }
}

fn reply_ok<T: Serialize>(data: T, status: StatusCode) -> impl warp::Reply {
    warp::reply::with_status(warp::reply::json(&ApiResponse::ok(data)), status)
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub page_size: Option<PageSize>,
    pub after: Option<String>,
    pub status: Option<FriendRequestStatus>,
}

impl ListQuery {
    fn page_size(&self) -> PageSize {
        self.page_size.unwrap_or_default().clamped()
    }

    fn cursor(&self) -> Result<Option<RequestCursor>, ApiError> {
        self.after
            .as_deref()
            .map(|s| {
                s.parse::<RequestCursor>().map_err(|_| {
                    ApiError::new(ApiErrorCode::InvalidOperation, "malformed `after` cursor")
                })
            })
            .transpose()
    }
}

#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Present when the page is full; pass it back as `after` for the next page.
    pub next_after: Option<String>,
}

impl Page<FriendRequestView> {
    fn new(items: Vec<FriendRequestView>, page_size: PageSize) -> Self {
        let next_after = match items.last() {
            Some(last) if items.len() == page_size.as_usize() => {
                Some(last.request.cursor().to_string())
            }
            _ => None,
        };
        Page { items, next_after }
    }
}

#[derive(Debug, Serialize)]
pub struct RequestIdResponse {
    pub request_id: FriendRequestId,
}

#[derive(Debug, Serialize)]
pub struct WithdrawResponse {
    pub target_id: UserId,
}

pub async fn list_recommendations(
    user_id: UserId,
    relationship_service: Arc<dyn RelationshipService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let users = relationship_service
        .list_recommendations(user_id)
        .await
        .map_err(ApiError::from)
        .map_err(reject::custom)?;
    Ok(reply_ok(users, StatusCode::OK))
}

pub async fn list_friends(
    user_id: UserId,
    relationship_service: Arc<dyn RelationshipService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let friends = relationship_service
        .list_friends(user_id)
        .await
        .map_err(ApiError::from)
        .map_err(reject::custom)?;
    Ok(reply_ok(friends, StatusCode::OK))
}

pub async fn propose(
    target_id: UserId,
    user_id: UserId,
    relationship_service: Arc<dyn RelationshipService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let request_id = relationship_service
        .propose(user_id, target_id)
        .await
        .map_err(ApiError::from)
        .map_err(reject::custom)?;
    Ok(reply_ok(RequestIdResponse { request_id }, StatusCode::CREATED))
}

pub async fn accept(
    request_id: FriendRequestId,
    user_id: UserId,
    relationship_service: Arc<dyn RelationshipService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    relationship_service
        .accept(user_id, request_id)
        .await
        .map_err(ApiError::from)
        .map_err(reject::custom)?;
    Ok(reply_ok(RequestIdResponse { request_id }, StatusCode::CREATED))
}

pub async fn withdraw(
    target_id: UserId,
    user_id: UserId,
    relationship_service: Arc<dyn RelationshipService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    relationship_service
        .withdraw(user_id, target_id)
        .await
        .map_err(ApiError::from)
        .map_err(reject::custom)?;
    Ok(reply_ok(WithdrawResponse { target_id }, StatusCode::OK))
}

pub async fn request_overview(
    query: ListQuery,
    user_id: UserId,
    relationship_service: Arc<dyn RelationshipService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let overview = relationship_service
        .overview(user_id, query.page_size())
        .await
        .map_err(ApiError::from)
        .map_err(reject::custom)?;
    Ok(reply_ok(overview, StatusCode::OK))
}

pub async fn list_incoming(
    query: ListQuery,
    user_id: UserId,
    relationship_service: Arc<dyn RelationshipService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let page_size = query.page_size();
    let after = query.cursor().map_err(reject::custom)?;
    let status = query.status.unwrap_or(FriendRequestStatus::Pending);

    let items = relationship_service
        .list_incoming(user_id, status, page_size, after)
        .await
        .map_err(ApiError::from)
        .map_err(reject::custom)?;
    Ok(reply_ok(Page::new(items, page_size), StatusCode::OK))
}

pub async fn list_outgoing(
    query: ListQuery,
    user_id: UserId,
    relationship_service: Arc<dyn RelationshipService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let page_size = query.page_size();
    let after = query.cursor().map_err(reject::custom)?;
    let status = query.status.unwrap_or(FriendRequestStatus::Pending);

    let items = relationship_service
        .list_outgoing(user_id, status, page_size, after)
        .await
        .map_err(ApiError::from)
        .map_err(reject::custom)?;
    Ok(reply_ok(Page::new(items, page_size), StatusCode::OK))
}

pub async fn profile(
    user_id: UserId,
    account_service: Arc<dyn AccountService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let view = account_service
        .profile(user_id)
        .await
        .map_err(ApiError::from)
        .map_err(reject::custom)?;
    Ok(reply_ok(view, StatusCode::OK))
}

pub async fn complete_onboarding(
    user_id: UserId,
    body: Profile,
    account_service: Arc<dyn AccountService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let view = account_service
        .complete_onboarding(user_id, body)
        .await
        .map_err(ApiError::from)
        .map_err(reject::custom)?;
    Ok(reply_ok(view, StatusCode::OK))
}

pub async fn chat_token(
    user_id: UserId,
    account_service: Arc<dyn AccountService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let token = account_service
        .chat_token(user_id)
        .await
        .map_err(ApiError::from)
        .map_err(reject::custom)?;
    Ok(reply_ok(token, StatusCode::OK))
}
