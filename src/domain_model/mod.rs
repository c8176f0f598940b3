mod account;
mod chat;
mod friend;
mod unit;
mod user;

pub use account::*;
pub use chat::*;
pub use friend::*;
pub use unit::*;
pub use user::*;
