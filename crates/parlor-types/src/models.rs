use serde::{Deserialize, Serialize};

/// Identifier assigned by the table store on insert.
pub type UserId = i64;
pub type ChatId = i64;
pub type MessageId = i64;

/// The single shared room every message is posted to.
pub const GENERAL_CHAT_ID: ChatId = 0;
pub const GENERAL_CHAT_NAME: &str = "General chat";

pub mod tables {
    pub const USERS: &str = "users";
    pub const CHATS: &str = "chats";
    pub const MESSAGES: &str = "meseges";
}

/// Full `users` row, including the PHC-formatted password hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub user_id: UserId,
    pub username: String,
    pub password_hash: String,
}

/// Projection of `users` without credentials, used for listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub user_id: UserId,
    pub username: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewUser<'a> {
    pub username: &'a str,
    pub password_hash: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chat {
    pub chat_id: ChatId,
    pub name: String,
}

/// Row of the `meseges` table. Column names follow the hosted schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub meseg_id: MessageId,
    pub sender: UserId,
    pub chat_id: ChatId,
    pub meseg: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewMessage<'a> {
    pub sender: UserId,
    pub chat_id: ChatId,
    pub meseg: &'a str,
}
