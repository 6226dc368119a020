//! Change events pushed by realtime subscriptions.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::BackendResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Created,
    Updated,
    Deleted,
}

/// A single change to a record of a subscribed collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub collection: String,
    pub record: Value,
}

impl ChangeEvent {
    pub fn new(kind: ChangeKind, collection: impl Into<String>, record: Value) -> Self {
        Self {
            kind,
            collection: collection.into(),
            record,
        }
    }

    /// Decode the changed record into a typed entity.
    pub fn decode<T: DeserializeOwned>(&self) -> BackendResult<T> {
        Ok(serde_json::from_value(self.record.clone())?)
    }
}
