use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::model::assistant::is_assistant_email;

/// Title used when a conversation has no explicit title and no other participant.
pub const DEFAULT_CONVERSATION_TITLE: &str = "Conversation";

/// User entity representing a complete user record from the database.
///
/// The assistant is an ordinary row in the same table, recognised only by its
/// reserved email (see [`User::is_assistant`]).
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub image_url: Option<String>,
    pub provider: String,
    pub provider_account_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Whether this row is the reserved assistant identity.
    pub fn is_assistant(&self) -> bool {
        is_assistant_email(Some(&self.email))
    }

    /// Public profile fields.
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id.clone(),
            email: self.email.clone(),
            name: self.name.clone(),
            image_url: self.image_url.clone(),
        }
    }
}

/// Identity attributes reported by the external provider at sign-in.
#[derive(Debug, Clone)]
pub struct UserForUpsert {
    pub email: String,
    pub name: Option<String>,
    pub image_url: Option<String>,
    pub provider: String,
    pub provider_account_id: String,
}

impl UserForUpsert {
    /// Create a new `UserForUpsert` with the mandatory fields.
    pub fn new(
        email: impl Into<String>,
        provider: impl Into<String>,
        provider_account_id: impl Into<String>,
    ) -> Self {
        Self {
            email: email.into(),
            name: None,
            image_url: None,
            provider: provider.into(),
            provider_account_id: provider_account_id.into(),
        }
    }

    /// Set the display name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the avatar URL.
    pub fn image_url(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = Some(image_url.into());
        self
    }
}

/// Profile fields of a user, as shown next to conversations and messages.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub image_url: Option<String>,
}

impl UserProfile {
    pub fn is_assistant(&self) -> bool {
        is_assistant_email(Some(&self.email))
    }
}

/// Conversation row.
#[derive(Debug, Clone, FromRow)]
pub struct Conversation {
    pub id: String,
    pub title: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Bumped on every appended message; the "most recently active" key.
    pub updated_at: DateTime<Utc>,
}

/// Membership row linking one conversation to one user.
#[derive(Debug, Clone, FromRow)]
pub struct ConversationParticipant {
    pub id: i64,
    pub conversation_id: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A conversation with its participants resolved to profiles, in join order.
#[derive(Debug, Clone)]
pub struct ConversationWithParticipants {
    pub conversation: Conversation,
    pub participants: Vec<UserProfile>,
}

impl ConversationWithParticipants {
    pub fn id(&self) -> &str {
        &self.conversation.id
    }

    pub fn has_participant(&self, user_id: &str) -> bool {
        self.participants.iter().any(|p| p.id == user_id)
    }

    /// Title as seen by `viewer_id`.
    ///
    /// An explicit title wins. Otherwise the first participant who is neither
    /// the viewer nor the assistant names the conversation, by name and then by
    /// email, and [`DEFAULT_CONVERSATION_TITLE`] is the last resort.
    pub fn display_title(&self, viewer_id: &str) -> String {
        if let Some(title) = self.conversation.title.as_deref().filter(|t| !t.is_empty()) {
            return title.to_string();
        }

        self.participants
            .iter()
            .find(|p| p.id != viewer_id && !p.is_assistant())
            .map(|other| {
                other
                    .name
                    .as_deref()
                    .filter(|name| !name.is_empty())
                    .unwrap_or(&other.email)
                    .to_string()
            })
            .unwrap_or_else(|| DEFAULT_CONVERSATION_TITLE.to_string())
    }
}

/// Message row. `id` is internal; clients only ever see `s_id`.
#[derive(Debug, Clone, FromRow)]
pub struct Message {
    pub id: i64,
    pub s_id: String,
    pub content: String,
    pub author_id: String,
    pub conversation_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A message together with its author's profile.
///
/// `author` is `None` only when the author row could not be joined.
#[derive(Debug, Clone)]
pub struct MessageWithAuthor {
    pub message: Message,
    pub author: Option<UserProfile>,
}
