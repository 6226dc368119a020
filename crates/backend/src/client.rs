//! The four primitives every backend exposes.

use serde_json::Value;

use crate::error::BackendResult;
use crate::predicate::Predicate;
use crate::response::BackendResponse;
use crate::subscription::Subscription;

/// Trait for backend-as-a-service clients to allow generic usage
///
/// A non-success status is reported through [`BackendResponse::status`];
/// only transport and decode failures surface as errors.
#[allow(async_fn_in_trait)]
pub trait BackendClient {
    /// Insert `record` into `collection`.
    async fn insert(&self, collection: &str, record: Value) -> BackendResult<BackendResponse>;

    /// Apply `patch` to every record of `collection` matching `predicate`.
    async fn update_where(
        &self,
        collection: &str,
        predicate: &Predicate,
        patch: Value,
    ) -> BackendResult<BackendResponse>;

    /// Fetch every record of `collection` matching `predicate` as `data.result`.
    async fn query_where(
        &self,
        collection: &str,
        predicate: &Predicate,
    ) -> BackendResult<BackendResponse>;

    /// Open a live stream of changes to `collection`, optionally filtered.
    async fn subscribe(
        &self,
        collection: &str,
        predicate: Option<Predicate>,
    ) -> BackendResult<Subscription>;
}
