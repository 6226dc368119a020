use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::user::BROADCAST_ID;

/// A message posted into a chat
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub chat_id: String,
    /// Sender user id
    pub from: String,
    /// Recipient user id, when the backend records one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    pub text: String,
    /// Set by the recipient's acknowledgement, never cleared
    #[serde(default)]
    pub read: bool,
    pub sent_at: DateTime<Utc>,
}

impl Message {
    /// Create an unread message stamped with the current time
    pub fn new(
        id: impl Into<String>,
        chat_id: impl Into<String>,
        from: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            chat_id: chat_id.into(),
            from: from.into(),
            to: None,
            text: text.into(),
            read: false,
            sent_at: Utc::now(),
        }
    }

    pub fn with_recipient(mut self, to: impl Into<String>) -> Self {
        self.to = Some(to.into());
        self
    }

    /// Copy of this message with the read flag set
    pub fn acknowledged(&self) -> Self {
        Self {
            read: true,
            ..self.clone()
        }
    }
}

/// Messages grouped by chat id, in the order they were received.
/// The `"ALL"` key always maps to an empty group.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct MessagesByChat(HashMap<String, Vec<Message>>);

impl MessagesByChat {
    pub fn from_messages<I>(messages: I) -> Self
    where
        I: IntoIterator<Item = Message>,
    {
        let mut groups: HashMap<String, Vec<Message>> = HashMap::new();
        for message in messages {
            groups.entry(message.chat_id.clone()).or_default().push(message);
        }
        groups.insert(BROADCAST_ID.to_string(), Vec::new());
        Self(groups)
    }

    pub fn get(&self, chat_id: &str) -> Option<&[Message]> {
        self.0.get(chat_id).map(Vec::as_slice)
    }

    pub fn chat_ids(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Total number of messages over every chat
    pub fn message_count(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }

    pub fn into_inner(self) -> HashMap<String, Vec<Message>> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_message_is_unread() {
        let message = Message::new("m1", "c1", "u1", "hello");
        assert!(!message.read);
        assert_eq!(message.to, None);
    }

    #[test]
    fn test_message_wire_shape() {
        let value = serde_json::to_value(Message::new("m1", "c1", "u1", "hello")).unwrap();

        assert_eq!(value["chatId"], "c1");
        assert_eq!(value["read"], false);
        assert!(value["sentAt"].is_string());
        assert!(value.get("to").is_none());
    }

    #[test]
    fn test_message_parses_without_optional_fields() {
        let message: Message = serde_json::from_value(json!({
            "id": "m2",
            "chatId": "c1",
            "from": "u2",
            "text": "hi",
            "sentAt": "2024-05-01T10:15:00Z"
        }))
        .unwrap();

        assert!(!message.read);
        assert_eq!(message.from, "u2");
        assert_eq!(message.to, None);
    }

    #[test]
    fn test_acknowledged_sets_read_only() {
        let message = Message::new("m1", "c1", "u1", "hello").with_recipient("u2");
        let read = message.acknowledged();

        assert!(read.read);
        assert_eq!(read.text, message.text);
        assert_eq!(read.sent_at, message.sent_at);
        assert_eq!(read.to.as_deref(), Some("u2"));
    }

    #[test]
    fn test_grouping_keeps_order_and_broadcast_key() {
        let grouped = MessagesByChat::from_messages(vec![
            Message::new("m1", "c1", "u1", "one"),
            Message::new("m2", "c2", "u2", "two"),
            Message::new("m3", "c1", "u2", "three"),
            Message::new("m4", BROADCAST_ID, "u2", "hi all"),
        ]);

        assert_eq!(grouped.len(), 3);
        let ids: Vec<&str> = grouped.get("c1").unwrap().iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["m1", "m3"]);
        assert_eq!(grouped.get(BROADCAST_ID), Some(&[][..]));
        assert_eq!(grouped.message_count(), 3);
    }

    #[test]
    fn test_empty_grouping_has_broadcast_only() {
        let grouped = MessagesByChat::from_messages(Vec::new());
        assert_eq!(grouped.chat_ids().collect::<Vec<_>>(), vec![BROADCAST_ID]);
        assert!(grouped.get(BROADCAST_ID).unwrap().is_empty());
    }
}
