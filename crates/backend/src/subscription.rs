//! Caller-owned handle for a realtime subscription.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures_util::stream::Stream;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;
use uuid::Uuid;

use crate::events::ChangeEvent;
use crate::predicate::Predicate;

/// Buffer size of the per-subscription event channel
pub const SUBSCRIPTION_BUFFER: usize = 100;

/// Live stream of change events for one collection.
///
/// The handle owns the receiving end of the event channel and, for network
/// backends, the task that reads from the socket. Dropping the handle or
/// calling [`Subscription::unsubscribe`] releases both.
#[derive(Debug)]
pub struct Subscription {
    id: String,
    collection: String,
    predicate: Option<Predicate>,
    events: mpsc::Receiver<ChangeEvent>,
    reader: Option<JoinHandle<()>>,
}

impl Subscription {
    pub fn new(
        collection: impl Into<String>,
        predicate: Option<Predicate>,
        events: mpsc::Receiver<ChangeEvent>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            collection: collection.into(),
            predicate,
            events,
            reader: None,
        }
    }

    /// Attach the task feeding this subscription so it is aborted on release.
    pub fn with_reader(mut self, reader: JoinHandle<()>) -> Self {
        self.reader = Some(reader);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn predicate(&self) -> Option<&Predicate> {
        self.predicate.as_ref()
    }

    /// Whether a record would be delivered on this subscription.
    pub fn matches(&self, record: &Value) -> bool {
        self.predicate
            .as_ref()
            .map_or(true, |predicate| predicate.matches(record))
    }

    /// Wait for the next change event. `None` once the backend side closed.
    pub async fn recv(&mut self) -> Option<ChangeEvent> {
        self.events.recv().await
    }

    /// Next buffered event without waiting.
    pub fn try_recv(&mut self) -> Option<ChangeEvent> {
        self.events.try_recv().ok()
    }

    /// Stop receiving events and release the subscription.
    pub fn unsubscribe(self) {
        debug!(subscription_id = %self.id, collection = %self.collection, "unsubscribing");
    }
}

impl Stream for Subscription {
    type Item = ChangeEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.events.poll_recv(cx)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.events.close();
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
    }
}
