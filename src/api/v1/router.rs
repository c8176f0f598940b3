use super::error::*;
use super::handler;
use super::handler::ListQuery;
use crate::application_port::*;
use crate::domain_model::{FriendRequestId, UserId};
use crate::server::Server;
use std::convert::Infallible;
use std::sync::Arc;
use warp::{Filter, reject};

pub fn routes(
    server: Arc<Server>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    // method filters go after the path so an unknown route is a 404 rather than a 405
    let recommendations = warp::path("users")
        .and(warp::path::end())
        .and(warp::get())
        .and(with_verification(server.access_guard.clone()))
        .and(with(server.relationship_service.clone()))
        .and_then(handler::list_recommendations);

    let friends = warp::path!("users" / "friends")
        .and(warp::get())
        .and(with_verification(server.access_guard.clone()))
        .and(with(server.relationship_service.clone()))
        .and_then(handler::list_friends);

    let propose = warp::path!("users" / "friend-request" / UserId)
        .and(warp::post())
        .and(with_verification(server.access_guard.clone()))
        .and(with(server.relationship_service.clone()))
        .and_then(handler::propose);

    let accept = warp::path!("users" / "friend-request" / FriendRequestId / "accept")
        .and(warp::put())
        .and(with_verification(server.access_guard.clone()))
        .and(with(server.relationship_service.clone()))
        .and_then(handler::accept);

    let withdraw = warp::path!("users" / "cancel-friend-request" / UserId / "cancel")
        .and(warp::post())
        .and(with_verification(server.access_guard.clone()))
        .and(with(server.relationship_service.clone()))
        .and_then(handler::withdraw);

    let overview = warp::path!("users" / "friend-requests")
        .and(warp::get())
        .and(warp::query::<ListQuery>())
        .and(with_verification(server.access_guard.clone()))
        .and(with(server.relationship_service.clone()))
        .and_then(handler::request_overview);

    let incoming = warp::path!("users" / "incoming-friend-requests")
        .and(warp::get())
        .and(warp::query::<ListQuery>())
        .and(with_verification(server.access_guard.clone()))
        .and(with(server.relationship_service.clone()))
        .and_then(handler::list_incoming);

    let outgoing = warp::path!("users" / "outgoing-friend-requests")
        .and(warp::get())
        .and(warp::query::<ListQuery>())
        .and(with_verification(server.access_guard.clone()))
        .and(with(server.relationship_service.clone()))
        .and_then(handler::list_outgoing);

    let me = warp::path!("users" / "me")
        .and(warp::get())
        .and(with_verification(server.access_guard.clone()))
        .and(with(server.account_service.clone()))
        .and_then(handler::profile);

    let onboarding = warp::path!("users" / "onboarding")
        .and(warp::post())
        .and(with_verification(server.access_guard.clone()))
        .and(warp::body::content_length_limit(16 * 1024))
        .and(warp::body::json())
        .and(with(server.account_service.clone()))
        .and_then(handler::complete_onboarding);

    let chat_token = warp::path!("chat" / "token")
        .and(warp::get())
        .and(with_verification(server.access_guard.clone()))
        .and(with(server.account_service.clone()))
        .and_then(handler::chat_token);

    recommendations
        .or(friends)
        .or(propose)
        .or(accept)
        .or(withdraw)
        .or(overview)
        .or(incoming)
        .or(outgoing)
        .or(me)
        .or(onboarding)
        .or(chat_token)
}

fn with<ServiceType>(
    service: Arc<ServiceType>,
) -> impl Filter<Extract = (Arc<ServiceType>,), Error = Infallible> + Clone
where
    ServiceType: Send + Sync + ?Sized,
{
    warp::any().map(move || service.clone())
}

fn with_verification(
    access_guard: Arc<dyn AccessGuard>,
) -> impl Filter<Extract = (UserId,), Error = warp::Rejection> + Clone {
    warp::header::optional::<String>("authorization").and_then(
        move |header: Option<String>| {
            let access_guard = access_guard.clone();
            async move {
                let token = match header.as_deref() {
                    None => Err(AuthError::TokenMissing),
                    Some(value) => value.strip_prefix("Bearer ").ok_or(AuthError::TokenInvalid),
                }
                .map_err(ApiError::from)
                .map_err(reject::custom)?;

                let user_id = access_guard
                    .verify_token(token)
                    .await
                    .map_err(ApiError::from)
                    .map_err(reject::custom)?;
                Ok::<UserId, warp::Rejection>(user_id)
            }
        },
    )
}
