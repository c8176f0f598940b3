mod error;
mod handler;
mod router;

pub use error::*;
pub use handler::{ApiResponse, ListQuery, Page};
pub use router::routes;

use crate::server::Server;
use std::convert::Infallible;
use std::sync::Arc;
use warp::Filter;

/// The full `/api/v1` tree with rejections rendered as JSON envelopes.
pub fn api(
    server: Arc<Server>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = Infallible> + Clone {
    warp::path("api")
        .and(warp::path("v1"))
        .and(routes(server))
        .recover(recover_error)
}
