// repo

mod account_repo;
mod friend_request_repo;

mod repo_tx;

pub use account_repo::*;
pub use friend_request_repo::*;

pub use repo_tx::*;
