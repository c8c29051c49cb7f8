//! # Conversation Service
//!
//! Access layer over conversations: the per-user assistant conversation,
//! two-party conversations and the invitation flow behind
//! `POST /api/conversations`.
//!
//! Every conversation created here includes the assistant as a silent
//! participant, so a conversation always gets scripted replies.

use lib_core::model::assistant::{ensure_assistant_user, is_assistant_email};
use lib_core::model::store::models::{ConversationWithParticipants, User};
use lib_core::model::store::{ConversationRepository, UserRepository};
use lib_core::{AppError, DbPool};
use lib_utils::normalize_email;
use tracing::{debug, info, instrument};

/// Service for conversation lookup and creation.
pub struct ConversationService {
    db: DbPool,
}

impl ConversationService {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    /// Guarantee that `user_id` shares a conversation with the assistant.
    ///
    /// Any existing conversation that includes both is reused, most recently
    /// active first. Otherwise a new one with just the two of them is created.
    /// Concurrent first calls for the same user end up with one conversation.
    #[instrument(skip(self))]
    pub async fn ensure_assistant_conversation(
        &self,
        user_id: &str,
    ) -> Result<ConversationWithParticipants, AppError> {
        let assistant = ensure_assistant_user(&self.db).await?;

        let (conversation, created) = ConversationRepository::find_or_create_shared(
            &self.db,
            user_id,
            &assistant.id,
            &[user_id, &assistant.id],
        )
        .await?;

        if created {
            info!("[CONVERSATIONS] Created assistant conversation for user {}", user_id);
        }

        Ok(conversation)
    }

    /// Conversation shared by `user_a` and `user_b`, created if they have none.
    ///
    /// Calling it twice with the same pair returns the same conversation.
    #[instrument(skip(self))]
    pub async fn find_or_create_direct_conversation(
        &self,
        user_a: &str,
        user_b: &str,
    ) -> Result<ConversationWithParticipants, AppError> {
        let assistant = ensure_assistant_user(&self.db).await?;
        self.find_or_create_with_assistant(user_a, user_b, &assistant).await
    }

    async fn find_or_create_with_assistant(
        &self,
        user_a: &str,
        user_b: &str,
        assistant: &User,
    ) -> Result<ConversationWithParticipants, AppError> {
        let (conversation, created) = ConversationRepository::find_or_create_shared(
            &self.db,
            user_a,
            user_b,
            &[user_a, user_b, &assistant.id],
        )
        .await?;

        if created {
            info!("[CONVERSATIONS] Created conversation between {} and {}", user_a, user_b);
        } else {
            debug!("[CONVERSATIONS] Reusing conversation {}", conversation.id());
        }

        Ok(conversation)
    }

    /// Every conversation `user_id` belongs to, most recently active first.
    ///
    /// The assistant conversation is created on the fly if needed and is
    /// always part of the result.
    #[instrument(skip(self))]
    pub async fn list_conversations_for_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<ConversationWithParticipants>, AppError> {
        let assistant_conversation = self.ensure_assistant_conversation(user_id).await?;

        let mut conversations = ConversationRepository::list_for_user(&self.db, user_id).await?;

        if !conversations.iter().any(|c| c.id() == assistant_conversation.id()) {
            conversations.insert(0, assistant_conversation);
        }

        debug!("[CONVERSATIONS] {} conversations for user {}", conversations.len(), user_id);
        Ok(conversations)
    }

    /// Invitation flow: open (or reopen) a conversation with the user behind
    /// `participant_email`.
    ///
    /// The email is trimmed and lower-cased. The reserved assistant email
    /// resolves to the assistant itself.
    #[instrument(skip(self))]
    pub async fn start_conversation(
        &self,
        user_id: &str,
        participant_email: Option<&str>,
    ) -> Result<ConversationWithParticipants, AppError> {
        let participant_email = participant_email
            .ok_or_else(|| {
                AppError::InvalidInput("participantEmail must be provided".to_string())
            })?;

        let email = normalize_email(participant_email);
        if email.is_empty() {
            return Err(AppError::InvalidInput("participantEmail must not be empty".to_string()));
        }

        let assistant = ensure_assistant_user(&self.db).await?;

        let other = if is_assistant_email(Some(&email)) {
            assistant.clone()
        } else {
            UserRepository::find_by_email(&self.db, &email)
                .await?
                .ok_or_else(|| AppError::NotFound("User not found".to_string()))?
        };

        if other.id == user_id {
            return Err(AppError::InvalidInput(
                "Cannot create a conversation with yourself".to_string(),
            ));
        }

        self.find_or_create_with_assistant(user_id, &other.id, &assistant).await
    }
}
