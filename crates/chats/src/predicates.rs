//! Visibility filters for the three collections.

use chatline_backend::{field, or, Predicate};

use crate::entities::BROADCAST_ID;

/// Chats the user opened, was invited to, or that address everyone
pub fn chats_visible_to(user_id: &str) -> Predicate {
    or([
        field("to").eq(user_id),
        field("from").eq(user_id),
        field("to").eq(BROADCAST_ID),
    ])
}

/// Every user except the caller
pub fn users_other_than(user_id: &str) -> Predicate {
    field("id").ne(user_id)
}

/// Messages the user sent or received
pub fn messages_involving(user_id: &str) -> Predicate {
    or([field("to").eq(user_id), field("from").eq(user_id)])
}

pub fn messages_in_chat(chat_id: &str) -> Predicate {
    field("chatId").eq(chat_id)
}
