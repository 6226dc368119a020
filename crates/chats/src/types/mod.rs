//! Shared types for the chats crate.

pub mod errors;

pub use errors::{ChatError, ChatResult};
