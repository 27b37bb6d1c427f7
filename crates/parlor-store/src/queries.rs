use parlor_types::models::{
    Chat, ChatId, Message, NewMessage, NewUser, User, UserSummary, tables,
};
use tracing::{info, warn};

use crate::error::Result;
use crate::table::{Order, Select};
use crate::Store;

impl Store {
    // -- Users --

    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let users: Vec<User> = self
            .fetch(&Select::from(tables::USERS).eq("username", username))
            .await?;
        Ok(users.into_iter().next())
    }

    pub async fn create_user(&self, username: &str, password_hash: &str) -> Result<()> {
        self.insert(tables::USERS, &NewUser { username, password_hash })
            .await?;
        Ok(())
    }

    /// Every user without credentials, in store order.
    pub async fn list_users(&self) -> Result<Vec<UserSummary>> {
        self.fetch(&Select::from(tables::USERS).columns("user_id, username"))
            .await
    }

    // -- Chats --

    pub async fn get_chat(&self, chat_id: ChatId) -> Result<Option<Chat>> {
        let chats: Vec<Chat> = self
            .fetch(&Select::from(tables::CHATS).eq("chat_id", chat_id))
            .await?;
        Ok(chats.into_iter().next())
    }

    /// Create the chat row if it is missing.
    ///
    /// Read-then-insert: two callers can both see it missing. The loser's
    /// insert is accepted as success when the store reports a conflict.
    pub async fn ensure_chat(&self, chat_id: ChatId, name: &str) -> Result<()> {
        if self.get_chat(chat_id).await?.is_some() {
            return Ok(());
        }

        let chat = Chat {
            chat_id,
            name: name.to_string(),
        };
        match self.insert(tables::CHATS, &chat).await {
            Ok(_) => {
                info!("Created chat {} ({})", chat_id, name);
                Ok(())
            }
            Err(e) if e.is_conflict() => {
                warn!("Chat {} was created concurrently", chat_id);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    // -- Messages --

    pub async fn insert_message(&self, message: &NewMessage<'_>) -> Result<()> {
        self.insert(tables::MESSAGES, message).await?;
        Ok(())
    }

    /// All messages of a chat, oldest first.
    pub async fn get_messages(&self, chat_id: ChatId) -> Result<Vec<Message>> {
        self.fetch(
            &Select::from(tables::MESSAGES)
                .eq("chat_id", chat_id)
                .order("meseg_id", Order::Ascending),
        )
        .await
    }
}
