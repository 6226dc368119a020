//! # Chatline Chats Crate
//!
//! Chat entities and the [`ChatDataAccess`] façade the front-end talks to.
//!
//! ## Architecture
//!
//! - **Entities**: `User`, `Chat`, `Message` and the keyed `UserTable` / `MessagesByChat`
//! - **Access**: create, send, update and subscribe over a [`BackendClient`]
//! - **Identity**: the signed-in user, injected rather than global
//! - **Ids**: record id generation
//! - **Predicates**: who may see which rows
//! - **Types**: errors
//!
//! ## Usage
//!
//! ```rust
//! use chatline_backend::InMemoryBackend;
//! use chatline_chats::{ChatDataAccess, SessionIdentity, User};
//!
//! # let rt = tokio::runtime::Runtime::new().unwrap();
//! # rt.block_on(async {
//! let identity = SessionIdentity::signed_in(User::new("u1", "Ada"));
//! let access = ChatDataAccess::with_defaults(InMemoryBackend::new(), identity);
//!
//! let chat = access.create_chat("u2").await.unwrap();
//! access.send_message(&chat.id, "hello").await.unwrap();
//! # });
//! ```
//!
//! [`BackendClient`]: chatline_backend::BackendClient

pub mod access;
pub mod entities;
pub mod identity;
pub mod ids;
pub mod predicates;
pub mod types;

// Re-export main types for convenience
pub use access::ChatDataAccess;
pub use entities::{Chat, Message, MessagesByChat, User, UserTable, BROADCAST_ID};
pub use identity::{IdentityProvider, SessionIdentity};
pub use ids::{Cuid2Generator, IdGenerator, SequentialIdGenerator, UuidGenerator};
pub use types::{ChatError, ChatResult};
