//! In-process backend with the same contract as the network client.
//!
//! Records are kept per collection in insertion order and every write is
//! fanned out to the subscribers whose predicate matches the record. The
//! next call can be forced to fail, which is how the façade's error paths
//! are exercised without a server.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::{mpsc, Mutex, RwLock};
use tracing::{debug, warn};

use crate::client::BackendClient;
use crate::error::{BackendError, BackendResult};
use crate::events::{ChangeEvent, ChangeKind};
use crate::predicate::Predicate;
use crate::response::BackendResponse;
use crate::subscription::{Subscription, SUBSCRIPTION_BUFFER};

struct Subscriber {
    collection: String,
    predicate: Option<Predicate>,
    tx: mpsc::Sender<ChangeEvent>,
}

impl Subscriber {
    fn wants(&self, collection: &str, record: &Value) -> bool {
        self.collection == collection
            && self
                .predicate
                .as_ref()
                .map_or(true, |predicate| predicate.matches(record))
    }
}

#[derive(Debug, Clone)]
enum InjectedFailure {
    Status(u16),
    Transport(String),
}

/// Call recorded by the in-memory backend
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCall {
    Insert {
        collection: String,
        record: Value,
    },
    UpdateWhere {
        collection: String,
        predicate: Predicate,
        patch: Value,
    },
    QueryWhere {
        collection: String,
        predicate: Predicate,
    },
    Subscribe {
        collection: String,
        predicate: Option<Predicate>,
    },
}

/// Backend held entirely in memory
#[derive(Clone, Default)]
pub struct InMemoryBackend {
    collections: Arc<RwLock<HashMap<String, Vec<Value>>>>,
    subscribers: Arc<Mutex<Vec<Subscriber>>>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    next_failure: Arc<Mutex<Option<InjectedFailure>>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store records without notifying subscribers or recording a call.
    pub async fn seed<I>(&self, collection: &str, records: I)
    where
        I: IntoIterator<Item = Value>,
    {
        let mut collections = self.collections.write().await;
        collections
            .entry(collection.to_string())
            .or_default()
            .extend(records);
    }

    /// Snapshot of a collection in insertion order.
    pub async fn records(&self, collection: &str) -> Vec<Value> {
        let collections = self.collections.read().await;
        collections.get(collection).cloned().unwrap_or_default()
    }

    /// Every call received so far.
    pub async fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().await.clone()
    }

    /// Number of live subscribers, after pruning released ones.
    pub async fn subscriber_count(&self) -> usize {
        let mut subscribers = self.subscribers.lock().await;
        subscribers.retain(|subscriber| !subscriber.tx.is_closed());
        subscribers.len()
    }

    /// Make the next call answer with `status` and leave the data untouched.
    pub async fn fail_next_with_status(&self, status: u16) {
        *self.next_failure.lock().await = Some(InjectedFailure::Status(status));
    }

    /// Make the next call fail as if the connection dropped.
    pub async fn fail_next_with_transport(&self, message: impl Into<String>) {
        *self.next_failure.lock().await = Some(InjectedFailure::Transport(message.into()));
    }

    async fn record(&self, call: RecordedCall) {
        self.calls.lock().await.push(call);
    }

    /// Consume an injected failure, if any.
    async fn injected(&self) -> BackendResult<Option<BackendResponse>> {
        match self.next_failure.lock().await.take() {
            Some(InjectedFailure::Status(status)) => Ok(Some(BackendResponse::new(status, None))),
            Some(InjectedFailure::Transport(message)) => Err(BackendError::transport(message)),
            None => Ok(None),
        }
    }

    async fn publish(&self, kind: ChangeKind, collection: &str, record: &Value) {
        let mut subscribers = self.subscribers.lock().await;
        subscribers.retain(|subscriber| !subscriber.tx.is_closed());

        for subscriber in subscribers.iter().filter(|s| s.wants(collection, record)) {
            let event = ChangeEvent::new(kind, collection, record.clone());
            if let Err(error) = subscriber.tx.try_send(event) {
                warn!(collection, %error, "dropping change event for slow subscriber");
            }
        }
    }
}

impl BackendClient for InMemoryBackend {
    async fn insert(&self, collection: &str, record: Value) -> BackendResult<BackendResponse> {
        self.record(RecordedCall::Insert {
            collection: collection.to_string(),
            record: record.clone(),
        })
        .await;

        if let Some(response) = self.injected().await? {
            return Ok(response);
        }

        {
            let mut collections = self.collections.write().await;
            collections
                .entry(collection.to_string())
                .or_default()
                .push(record.clone());
        }

        self.publish(ChangeKind::Created, collection, &record).await;
        Ok(BackendResponse::ok(record))
    }

    async fn update_where(
        &self,
        collection: &str,
        predicate: &Predicate,
        patch: Value,
    ) -> BackendResult<BackendResponse> {
        self.record(RecordedCall::UpdateWhere {
            collection: collection.to_string(),
            predicate: predicate.clone(),
            patch: patch.clone(),
        })
        .await;

        if let Some(response) = self.injected().await? {
            return Ok(response);
        }

        let updated: Vec<Value> = {
            let mut collections = self.collections.write().await;
            let rows = collections.entry(collection.to_string()).or_default();
            rows.iter_mut()
                .filter(|row| predicate.matches(row))
                .map(|row| {
                    merge_patch(row, &patch);
                    row.clone()
                })
                .collect()
        };

        for record in &updated {
            self.publish(ChangeKind::Updated, collection, record).await;
        }

        Ok(BackendResponse::ok(
            serde_json::json!({ "updated": updated.len() }),
        ))
    }

    async fn query_where(
        &self,
        collection: &str,
        predicate: &Predicate,
    ) -> BackendResult<BackendResponse> {
        self.record(RecordedCall::QueryWhere {
            collection: collection.to_string(),
            predicate: predicate.clone(),
        })
        .await;

        if let Some(response) = self.injected().await? {
            return Ok(response);
        }

        let collections = self.collections.read().await;
        let result: Vec<Value> = collections
            .get(collection)
            .map(|rows| {
                rows.iter()
                    .filter(|row| predicate.matches(row))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        Ok(BackendResponse::with_result(result))
    }

    async fn subscribe(
        &self,
        collection: &str,
        predicate: Option<Predicate>,
    ) -> BackendResult<Subscription> {
        self.record(RecordedCall::Subscribe {
            collection: collection.to_string(),
            predicate: predicate.clone(),
        })
        .await;

        if let Some(response) = self.injected().await? {
            return Err(BackendError::status(
                response.status,
                format!("subscribe to {}", collection),
            ));
        }

        let (tx, rx) = mpsc::channel(SUBSCRIPTION_BUFFER);
        self.subscribers.lock().await.push(Subscriber {
            collection: collection.to_string(),
            predicate: predicate.clone(),
            tx,
        });

        debug!(collection, "registered in-memory subscription");
        Ok(Subscription::new(collection, predicate, rx))
    }
}

/// Shallow merge of `patch` into `target` when both are objects.
fn merge_patch(target: &mut Value, patch: &Value) {
    match (target.as_object_mut(), patch.as_object()) {
        (Some(target), Some(patch)) => {
            for (key, value) in patch {
                target.insert(key.clone(), value.clone());
            }
        }
        _ => *target = patch.clone(),
    }
}
