//! # Message Service
//!
//! Reading a conversation's history and the send pipeline.
//!
//! ## Send Pipeline
//!
//! ```text
//! validate content → membership check → append user message (tx 1)
//!                                     → assistant reply, if the assistant is a
//!                                       member and not the author (tx 2)
//! ```
//!
//! The user message is committed before the reply is composed. A failure in
//! the reply stage is logged and the send still succeeds with one message.

use lib_core::model::assistant::{find_assistant_user, ASSISTANT_REPLY};
use lib_core::model::store::models::MessageWithAuthor;
use lib_core::model::store::{ConversationRepository, MessageRepository, UserRepository};
use lib_core::{AppError, DbPool};
use lib_utils::{validate_max_length, validate_not_empty};
use tracing::{debug, error, instrument};

/// Largest accepted message body, in bytes.
pub const MAX_MESSAGE_BYTES: usize = 10_000;

pub struct MessageService {
    db: DbPool,
}

impl MessageService {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    /// Non-members get the same answer as for a conversation that does not exist.
    async fn require_participant(
        &self,
        conversation_id: &str,
        user_id: &str,
    ) -> Result<(), AppError> {
        if ConversationRepository::is_participant(&self.db, conversation_id, user_id).await? {
            Ok(())
        } else {
            debug!("[MESSAGES] User {} is not a member of {}", user_id, conversation_id);
            Err(AppError::NotFound("Conversation not found".to_string()))
        }
    }

    /// History of a conversation, oldest first.
    #[instrument(skip(self))]
    pub async fn list_messages(
        &self,
        conversation_id: &str,
        requesting_user_id: &str,
    ) -> Result<Vec<MessageWithAuthor>, AppError> {
        self.require_participant(conversation_id, requesting_user_id).await?;

        let messages = MessageRepository::list_for_conversation(&self.db, conversation_id).await?;
        Ok(messages)
    }

    /// Post `content` as `author_id` and return the messages created, in commit order.
    #[instrument(skip(self, content), fields(content_len = content.len()))]
    pub async fn send_message(
        &self,
        conversation_id: &str,
        author_id: &str,
        content: &str,
    ) -> Result<Vec<MessageWithAuthor>, AppError> {
        validate_not_empty(content, "Content").map_err(AppError::InvalidInput)?;
        validate_max_length(content, MAX_MESSAGE_BYTES, "Content").map_err(AppError::InvalidInput)?;

        self.require_participant(conversation_id, author_id).await?;

        let author = UserRepository::find_by_id(&self.db, author_id)
            .await?
            .ok_or_else(|| AppError::Unauthenticated("Authentication required".to_string()))?;

        let message =
            MessageRepository::append(&self.db, conversation_id, author_id, content).await?;
        debug!("[MESSAGES] Stored message {} in {}", message.s_id, conversation_id);

        let mut created = vec![MessageWithAuthor {
            message,
            author: Some(author.profile()),
        }];

        match self.post_assistant_reply(conversation_id, author_id).await {
            Ok(Some(reply)) => created.push(reply),
            Ok(None) => {}
            Err(e) => error!(
                "[ASSISTANT] Reply in conversation {} failed after the user message was stored: {}",
                conversation_id, e
            ),
        }

        Ok(created)
    }

    async fn post_assistant_reply(
        &self,
        conversation_id: &str,
        author_id: &str,
    ) -> Result<Option<MessageWithAuthor>, AppError> {
        let Some(assistant) = find_assistant_user(&self.db).await? else {
            return Ok(None);
        };

        if assistant.id == author_id {
            return Ok(None);
        }
        let assistant_is_member =
            ConversationRepository::is_participant(&self.db, conversation_id, &assistant.id).await?;
        if !assistant_is_member {
            return Ok(None);
        }

        let reply =
            MessageRepository::append(&self.db, conversation_id, &assistant.id, ASSISTANT_REPLY)
                .await?;
        debug!("[ASSISTANT] Replied with {} in {}", reply.s_id, conversation_id);

        Ok(Some(MessageWithAuthor {
            message: reply,
            author: Some(assistant.profile()),
        }))
    }
}
