pub mod chats;
pub mod database;
pub mod error;
pub mod schema;

pub use chats::{ChatRepo, ChatRow, ChatSummary};
pub use database::Database;
pub use error::StoreError;
