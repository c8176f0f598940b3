mod access_guard_fake;
mod access_guard_jwt;
mod account_service_impl;
mod chat_gateway_jwt;
mod relationship_service_impl;

pub use access_guard_fake::*;
pub use access_guard_jwt::*;
pub use account_service_impl::*;
pub use chat_gateway_jwt::*;
pub use relationship_service_impl::*;
