mod access_guard;
mod account_service;
mod chat_gateway;
mod relationship_service;

pub use access_guard::*;
pub use account_service::*;
pub use chat_gateway::*;
pub use relationship_service::*;
