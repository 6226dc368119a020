//! Domain entities for the chat system.

pub mod chat;
pub mod message;
pub mod user;

pub use chat::Chat;
pub use message::{Message, MessagesByChat};
pub use user::{User, UserTable, BROADCAST_ID};
