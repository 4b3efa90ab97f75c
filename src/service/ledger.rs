// service/ledger.rs
use std::sync::Arc;

use uuid::Uuid;

use crate::db::Store;
use crate::models::chatmodel::{MediaType, Message};
use crate::service::error::ServiceError;
use crate::service::feed::{MessageEvent, MessageFeed};

/// Append-only message ledger plus the unread accounting derived from it.
/// Messages are never deleted and a read flag never reverts; the only
/// mutation is `mark_chat_read` flipping inbound unread messages to read.
pub struct MessageLedger<S> {
    store: Arc<S>,
    feed: Arc<MessageFeed>,
}

impl<S: Store> MessageLedger<S> {
    pub fn new(store: Arc<S>, feed: Arc<MessageFeed>) -> Self {
        Self { store, feed }
    }

    /// Append a message to a chat. Content may be empty only when a media
    /// reference is attached. A human sender must be a chat participant;
    /// `None` marks a system-generated message.
    pub async fn append(
        &self,
        chat_id: Uuid,
        sender_id: Option<Uuid>,
        content: String,
        media: Option<(String, MediaType)>,
    ) -> Result<Message, ServiceError> {
        if content.trim().is_empty() && media.is_none() {
            return Err(ServiceError::EmptyMessage);
        }

        let chat = self
            .store
            .get_chat_by_id(chat_id)
            .await?
            .ok_or(ServiceError::ChatNotFound(chat_id))?;

        if let Some(sender) = sender_id {
            if !chat.involves(sender) {
                return Err(ServiceError::NotParticipant(sender, chat_id));
            }
        }

        let (media_url, media_type) = match media {
            Some((url, kind)) => (Some(url), Some(kind)),
            None => (None, None),
        };

        let message = self
            .store
            .insert_message(chat_id, sender_id, sender_id.is_none(), content, media_url, media_type)
            .await?;

        self.feed.publish(MessageEvent::Inserted {
            chat_id,
            message_id: message.id,
        });

        Ok(message)
    }

    /// Flip every unread message in the chat not sent by `reader_id` to read
    /// and report how many changed. Idempotent: a second call in a row
    /// returns 0 and publishes nothing.
    pub async fn mark_chat_read(
        &self,
        chat_id: Uuid,
        reader_id: Uuid,
    ) -> Result<u64, ServiceError> {
        let chat = self
            .store
            .get_chat_by_id(chat_id)
            .await?
            .ok_or(ServiceError::ChatNotFound(chat_id))?;

        if !chat.involves(reader_id) {
            return Err(ServiceError::NotParticipant(reader_id, chat_id));
        }

        let changed = self.store.mark_messages_read(chat_id, reader_id).await?;
        if changed > 0 {
            self.feed.publish(MessageEvent::Updated { chat_id });
        }

        Ok(changed)
    }

    /// Unread messages across every chat the user participates in. A user
    /// with no chats gets 0.
    pub async fn unread_count_for(&self, user_id: Uuid) -> Result<i64, ServiceError> {
        Ok(self.store.unread_count(user_id).await?)
    }

    pub async fn chat_unread_count(
        &self,
        chat_id: Uuid,
        user_id: Uuid,
    ) -> Result<i64, ServiceError> {
        Ok(self.store.chat_unread_count(chat_id, user_id).await?)
    }

    pub async fn history(
        &self,
        chat_id: Uuid,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Message>, ServiceError> {
        let chat = self
            .store
            .get_chat_by_id(chat_id)
            .await?
            .ok_or(ServiceError::ChatNotFound(chat_id))?;

        if !chat.involves(user_id) {
            return Err(ServiceError::NotParticipant(user_id, chat_id));
        }

        Ok(self.store.get_chat_messages(chat_id, limit, offset).await?)
    }
}
