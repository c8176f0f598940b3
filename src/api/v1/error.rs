use crate::api::v1::handler::ApiResponse;
use crate::application_port::*;
use serde::Serialize;
use std::convert::Infallible;
use tracing::warn;
use warp::http::StatusCode;
use warp::{Rejection, reject};

pub async fn recover_error(err: Rejection) -> Result<impl warp::Reply, Infallible> {
    let (status, code, message) = if let Some(e) = err.find::<ApiError>() {
        (e.code.status(), e.code, e.message.clone())
    } else if err.is_not_found() {
        (
            StatusCode::NOT_FOUND,
            ApiErrorCode::NotFound,
            "route not found".to_string(),
        )
    } else if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        (
            StatusCode::BAD_REQUEST,
            ApiErrorCode::InvalidOperation,
            e.to_string(),
        )
    } else if let Some(e) = err.find::<reject::InvalidQuery>() {
        (
            StatusCode::BAD_REQUEST,
            ApiErrorCode::InvalidOperation,
            e.to_string(),
        )
    } else if let Some(e) = err.find::<reject::InvalidHeader>() {
        (
            StatusCode::BAD_REQUEST,
            ApiErrorCode::InvalidOperation,
            e.to_string(),
        )
    } else if let Some(e) = err.find::<reject::UnsupportedMediaType>() {
        (
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ApiErrorCode::InvalidOperation,
            e.to_string(),
        )
    } else if let Some(e) = err.find::<reject::MethodNotAllowed>() {
        (
            StatusCode::METHOD_NOT_ALLOWED,
            ApiErrorCode::InvalidOperation,
            e.to_string(),
        )
    } else {
        warn!("unhandled rejection: {:?}", err);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            ApiErrorCode::InternalError,
            "internal error".to_string(),
        )
    };

    let json = warp::reply::json(&ApiResponse::<()>::err(code, message));
    Ok(warp::reply::with_status(json, status))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ApiErrorCode {
    Unauthorized,
    Forbidden,
    NotFound,
    InvalidOperation,
    Conflict,
    InvalidState,
    InternalError,
}

impl ApiErrorCode {
    pub fn status(self) -> StatusCode {
        match self {
            ApiErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ApiErrorCode::NotFound => StatusCode::NOT_FOUND,
            ApiErrorCode::InvalidOperation => StatusCode::BAD_REQUEST,
            ApiErrorCode::Conflict | ApiErrorCode::InvalidState => StatusCode::CONFLICT,
            ApiErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug)]
pub struct ApiError {
    pub code: ApiErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ApiErrorCode, message: impl Into<String>) -> ApiError {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// Logs the cause and hides it from the client.
    pub fn internal<E: std::fmt::Display>(error: E) -> ApiError {
        warn!("internal error: {}", error);
        ApiError::new(ApiErrorCode::InternalError, "internal error")
    }
}

impl reject::Reject for ApiError {}

impl From<RelationError> for ApiError {
    fn from(error: RelationError) -> Self {
        let code = match &error {
            RelationError::SelfTarget
            | RelationError::NotOnboarded
            | RelationError::ActorNotOnboarded => ApiErrorCode::InvalidOperation,
            RelationError::UserNotFound
            | RelationError::RequestNotFound
            | RelationError::PendingRequestNotFound => ApiErrorCode::NotFound,
            RelationError::AlreadyFriends | RelationError::FriendRequestExists => {
                ApiErrorCode::Conflict
            }
            RelationError::NotRecipient => ApiErrorCode::Forbidden,
            RelationError::NotPending => ApiErrorCode::InvalidState,
            RelationError::Store(e) => return ApiError::internal(e),
        };
        ApiError::new(code, error.to_string())
    }
}

impl From<AccountError> for ApiError {
    fn from(error: AccountError) -> Self {
        match error {
            e @ AccountError::UserNotFound => ApiError::new(ApiErrorCode::NotFound, e.to_string()),
            AccountError::Chat(e) => ApiError::internal(e),
            AccountError::Store(e) => ApiError::internal(e),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(error: AuthError) -> Self {
        match error {
            e @ (AuthError::TokenMissing | AuthError::TokenInvalid | AuthError::TokenExpired) => {
                ApiError::new(ApiErrorCode::Unauthorized, e.to_string())
            }
            AuthError::InternalError(e) => ApiError::internal(e),
        }
    }
}
