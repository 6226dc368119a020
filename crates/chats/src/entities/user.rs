use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Recipient id that addresses every user at once
pub const BROADCAST_ID: &str = "ALL";

/// A user as stored in the `users` collection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Any further profile fields, kept as-is
    #[serde(flatten)]
    pub profile: Map<String, Value>,
}

impl User {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            profile: Map::new(),
        }
    }

    /// The synthetic broadcast recipient. Never stored on the backend.
    pub fn broadcast() -> Self {
        Self::new(BROADCAST_ID, BROADCAST_ID)
    }

    pub fn is_broadcast(&self) -> bool {
        self.id == BROADCAST_ID
    }

    pub fn with_profile_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.profile.insert(key.into(), value.into());
        self
    }
}

/// Users keyed by id. Always holds the broadcast entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct UserTable(HashMap<String, User>);

impl UserTable {
    /// Key each user by id, then add the broadcast entry, replacing any
    /// user that claimed the `"ALL"` id.
    pub fn from_users<I>(users: I) -> Self
    where
        I: IntoIterator<Item = User>,
    {
        let mut table: HashMap<String, User> = users
            .into_iter()
            .map(|user| (user.id.clone(), user))
            .collect();
        table.insert(BROADCAST_ID.to_string(), User::broadcast());
        Self(table)
    }

    pub fn get(&self, user_id: &str) -> Option<&User> {
        self.0.get(user_id)
    }

    pub fn contains(&self, user_id: &str) -> bool {
        self.0.contains_key(user_id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Never true in practice since the broadcast entry is always present
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &User)> {
        self.0.iter().map(|(id, user)| (id.as_str(), user))
    }

    pub fn into_inner(self) -> HashMap<String, User> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_profile_fields_survive_round_trip() {
        let raw = json!({"id": "u1", "name": "Ada", "avatar": "ada.png", "online": true});
        let user: User = serde_json::from_value(raw.clone()).unwrap();

        assert_eq!(user.id, "u1");
        assert_eq!(user.profile["avatar"], "ada.png");
        assert_eq!(serde_json::to_value(&user).unwrap(), raw);
    }

    #[test]
    fn test_missing_name_defaults_to_empty() {
        let user: User = serde_json::from_value(json!({"id": "u9"})).unwrap();
        assert_eq!(user.name, "");
        assert!(user.profile.is_empty());
    }

    #[test]
    fn test_empty_table_holds_only_broadcast() {
        let table = UserTable::from_users(Vec::new());

        assert_eq!(table.len(), 1);
        assert_eq!(table.get(BROADCAST_ID), Some(&User::broadcast()));
    }

    #[test]
    fn test_table_keys_users_by_id() {
        let ada = User::new("u1", "A");
        let bob = User::new("u2", "B").with_profile_field("status", "away");
        let table = UserTable::from_users(vec![ada.clone(), bob.clone()]);

        let mut ids: Vec<&str> = table.ids().collect();
        ids.sort_unstable();
        assert_eq!(ids, vec!["ALL", "u1", "u2"]);
        assert_eq!(table.get("u1"), Some(&ada));
        assert_eq!(table.get("u2"), Some(&bob));
    }

    #[test]
    fn test_broadcast_entry_overrides_impostor() {
        let impostor = User::new(BROADCAST_ID, "Mallory");
        let table = UserTable::from_users(vec![impostor]);

        assert_eq!(table.len(), 1);
        assert_eq!(table.get(BROADCAST_ID).unwrap().name, BROADCAST_ID);
        assert!(table.get(BROADCAST_ID).unwrap().is_broadcast());
    }
}
