//! Data-access façade over the backend collections.

use chatline_backend::{
    field, BackendClient, BackendError, BackendResponse, Predicate, Subscription,
};
use chatline_config::CollectionConfig;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::entities::{Chat, Message, MessagesByChat, User, UserTable};
use crate::identity::IdentityProvider;
use crate::ids::{Cuid2Generator, IdGenerator};
use crate::predicates;
use crate::types::{ChatError, ChatResult};

/// Chat operations for the signed-in user.
///
/// Holds no session state of its own: the current user is read from the
/// identity provider on every call.
pub struct ChatDataAccess<B, I, G = Cuid2Generator> {
    backend: B,
    identity: I,
    ids: G,
    collections: CollectionConfig,
}

impl<B, I> ChatDataAccess<B, I, Cuid2Generator>
where
    B: BackendClient,
    I: IdentityProvider,
{
    /// Façade with cuid2 ids and the default collection names
    pub fn with_defaults(backend: B, identity: I) -> Self {
        Self::new(backend, identity, Cuid2Generator, CollectionConfig::default())
    }
}

impl<B, I, G> ChatDataAccess<B, I, G>
where
    B: BackendClient,
    I: IdentityProvider,
    G: IdGenerator,
{
    pub fn new(backend: B, identity: I, ids: G, collections: CollectionConfig) -> Self {
        Self {
            backend,
            identity,
            ids,
            collections,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn identity(&self) -> &I {
        &self.identity
    }

    pub fn collections(&self) -> &CollectionConfig {
        &self.collections
    }

    /// Key users by id and add the `"ALL"` broadcast entry
    pub fn convert_users_to_table<U>(&self, raw_users: U) -> UserTable
    where
        U: IntoIterator<Item = User>,
    {
        UserTable::from_users(raw_users)
    }

    /// Open a chat from the current user to `partner_id`.
    ///
    /// Resolves with the record that was sent, not the backend's echo.
    pub async fn create_chat(&self, partner_id: &str) -> ChatResult<Chat> {
        if partner_id.is_empty() {
            return Err(ChatError::validation("partner id must not be empty"));
        }
        let user = self.identity.current_user()?;

        let chat = Chat::new(self.ids.new_id(), user.id, partner_id);
        let collection = &self.collections.chats;
        let response = self
            .backend
            .insert(collection, serde_json::to_value(&chat)?)
            .await
            .inspect_err(|error| warn!(collection = %collection, %error, "chat insert failed"))?;

        if !response.is_success() {
            warn!(collection = %collection, status = response.status, "backend refused chat");
            return Err(BackendError::status(response.status, "create chat").into());
        }

        debug!(chat_id = %chat.id, to = %chat.to, "chat created");
        Ok(chat)
    }

    /// Post `text` into `chat_id` as the current user.
    ///
    /// A non-success status becomes [`ChatError::Permission`]; transport
    /// failures stay [`ChatError::Backend`].
    pub async fn send_message(&self, chat_id: &str, text: &str) -> ChatResult<BackendResponse> {
        if chat_id.is_empty() {
            return Err(ChatError::validation("chat id must not be empty"));
        }
        if text.is_empty() {
            return Err(ChatError::validation("message text must not be empty"));
        }
        let user = self.identity.current_user()?;

        let message = Message::new(self.ids.new_id(), chat_id, user.id, text);
        let collection = &self.collections.messages;
        let response = self
            .backend
            .insert(collection, serde_json::to_value(&message)?)
            .await
            .inspect_err(|error| {
                warn!(collection = %collection, chat_id, %error, "message insert failed")
            })?;

        if !response.is_success() {
            warn!(collection = %collection, chat_id, status = response.status, "backend refused message");
            return Err(ChatError::permission(format!(
                "backend refused the message (status {})",
                response.status
            )));
        }

        debug!(chat_id, message_id = %message.id, "message sent");
        Ok(response)
    }

    /// Write `message` over the stored record with the same id.
    ///
    /// The backend's answer is returned whatever its status.
    pub async fn update_message(&self, message: &Message) -> ChatResult<BackendResponse> {
        if message.id.is_empty() {
            return Err(ChatError::validation("message id must not be empty"));
        }

        let collection = &self.collections.messages;
        let predicate = field("id").eq(message.id.as_str());
        let response = self
            .backend
            .update_where(collection, &predicate, serde_json::to_value(message)?)
            .await
            .inspect_err(|error| {
                warn!(collection = %collection, message_id = %message.id, %error, "message update failed")
            })?;

        debug!(message_id = %message.id, status = response.status, "message updated");
        Ok(response)
    }

    /// Acknowledge `message` as read
    pub async fn mark_read(&self, message: &Message) -> ChatResult<BackendResponse> {
        self.update_message(&message.acknowledged()).await
    }

    /// Chats visible to the current user
    #[deprecated(note = "use start_chats_realtime for live chat lists")]
    pub async fn get_chats(&self) -> ChatResult<Vec<Chat>> {
        let user = self.identity.current_user()?;
        let rows = self
            .query(&self.collections.chats, &predicates::chats_visible_to(&user.id))
            .await?;
        decode_rows(rows)
    }

    /// Every other user, plus the broadcast entry
    #[deprecated(note = "use start_users_realtime for live user lists")]
    pub async fn get_users(&self) -> ChatResult<UserTable> {
        let user = self.identity.current_user()?;
        let rows = self
            .query(&self.collections.users, &predicates::users_other_than(&user.id))
            .await?;
        let users: Vec<User> = decode_rows(rows)?;
        Ok(self.convert_users_to_table(users))
    }

    /// Messages sent or received by the current user, grouped by chat
    #[deprecated(note = "use start_messages_realtime for live messages")]
    pub async fn get_messages(&self) -> ChatResult<MessagesByChat> {
        let user = self.identity.current_user()?;
        let rows = self
            .query(&self.collections.messages, &predicates::messages_involving(&user.id))
            .await?;
        let messages: Vec<Message> = decode_rows(rows)?;
        Ok(MessagesByChat::from_messages(messages))
    }

    /// Live stream of messages posted into `chat_id`
    pub async fn start_messages_realtime(&self, chat_id: &str) -> ChatResult<Subscription> {
        if chat_id.is_empty() {
            return Err(ChatError::validation("chat id must not be empty"));
        }
        self.subscribe(
            &self.collections.messages,
            Some(predicates::messages_in_chat(chat_id)),
        )
        .await
    }

    /// Live stream of every user change
    pub async fn start_users_realtime(&self) -> ChatResult<Subscription> {
        self.subscribe(&self.collections.users, None).await
    }

    /// Live stream of chats visible to the current user
    pub async fn start_chats_realtime(&self) -> ChatResult<Subscription> {
        let user = self.identity.current_user()?;
        self.subscribe(
            &self.collections.chats,
            Some(predicates::chats_visible_to(&user.id)),
        )
        .await
    }

    async fn query(&self, collection: &str, predicate: &Predicate) -> ChatResult<Vec<Value>> {
        let response = self
            .backend
            .query_where(collection, predicate)
            .await
            .inspect_err(|error| warn!(collection, %error, "query failed"))?;

        if !response.is_success() {
            warn!(collection, status = response.status, "query refused");
            return Err(BackendError::status(response.status, format!("query {}", collection)).into());
        }

        Ok(response.result_records()?)
    }

    async fn subscribe(
        &self,
        collection: &str,
        predicate: Option<Predicate>,
    ) -> ChatResult<Subscription> {
        let subscription = self
            .backend
            .subscribe(collection, predicate)
            .await
            .inspect_err(|error| warn!(collection, %error, "subscribe failed"))?;

        debug!(collection, subscription_id = subscription.id(), "subscription started");
        Ok(subscription)
    }
}

fn decode_rows<T: DeserializeOwned>(rows: Vec<Value>) -> ChatResult<Vec<T>> {
    rows.into_iter()
        .map(|row| serde_json::from_value(row).map_err(ChatError::from))
        .collect()
}
