use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::user::BROADCAST_ID;

/// A conversation between the creator and a partner, or everyone
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    pub id: String,
    /// User who opened the chat
    pub from: String,
    /// Partner user id, or `"ALL"` for a broadcast chat
    pub to: String,
    pub created_at: DateTime<Utc>,
}

impl Chat {
    /// Create a new chat stamped with the current time
    pub fn new(id: impl Into<String>, from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            from: from.into(),
            to: to.into(),
            created_at: Utc::now(),
        }
    }

    pub fn is_broadcast(&self) -> bool {
        self.to == BROADCAST_ID
    }
}
