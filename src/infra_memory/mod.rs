mod account_repo_memory;
mod friend_request_repo_memory;

pub use account_repo_memory::*;
pub use friend_request_repo_memory::*;

mod store;

pub use store::{MemoryState, MemoryStore, MemoryTx, MemoryTxManager};
