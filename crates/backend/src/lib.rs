//! # Chatline Backend Crate
//!
//! Contracts and clients for the backend-as-a-service that stores users,
//! chats and messages.
//!
//! ## Architecture
//!
//! - **Predicate**: OR-composable equality/inequality filters
//! - **Client**: the `insert` / `update_where` / `query_where` / `subscribe` primitives
//! - **Subscription**: caller-owned live stream of change events
//! - **Memory**: in-process backend used for tests and local development
//! - **Http**: REST + WebSocket client for a hosted backend
//!
//! ## Usage
//!
//! ```rust
//! use chatline_backend::{field, or, BackendClient, InMemoryBackend};
//! use serde_json::json;
//!
//! # tokio_test();
//! # fn tokio_test() {
//! # let rt = tokio::runtime::Runtime::new().unwrap();
//! # rt.block_on(async {
//! let backend = InMemoryBackend::new();
//! backend.insert("chats", json!({"id": "c1", "from": "u1", "to": "ALL"})).await.unwrap();
//!
//! let visible = or([field("from").eq("u1"), field("to").eq("ALL")]);
//! let response = backend.query_where("chats", &visible).await.unwrap();
//! assert_eq!(response.result_records().unwrap().len(), 1);
//! # });
//! # }
//! ```

pub mod client;
pub mod error;
pub mod events;
pub mod http;
pub mod memory;
pub mod predicate;
pub mod response;
pub mod subscription;

// Re-export main types for convenience
pub use client::BackendClient;
pub use error::{BackendError, BackendResult};
pub use events::{ChangeEvent, ChangeKind};
pub use http::HttpBackendClient;
pub use memory::{InMemoryBackend, RecordedCall};
pub use predicate::{field, or, Condition, Field, Operator, Predicate};
pub use response::BackendResponse;
pub use subscription::Subscription;
