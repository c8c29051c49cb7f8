//! # Messaging Data Transfer Objects
//!
//! Request and response structures for conversations and messages.
//!
//! - `GET /api/conversations` -> [`ConversationsResponse`]
//! - `POST /api/conversations` - [`CreateConversationRequest`] -> [`ConversationInfo`]
//! - `GET /api/messages?conversationId=...` - [`MessagesQuery`] -> [`MessagesResponse`]
//! - `POST /api/messages` - [`SendMessageRequest`] -> [`MessagesResponse`]
//!
//! Timestamps are RFC 3339 strings in UTC with millisecond precision.

use serde::{Deserialize, Serialize};

use super::auth::UserInfo;
use crate::model::store::models::{ConversationWithParticipants, MessageWithAuthor};
use lib_utils::format_time;

/// A conversation as seen by one viewer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ConversationInfo {
    pub id: String,
    /// Explicit title, or one computed from the other participants.
    pub title: String,
    pub participants: Vec<UserInfo>,
    pub updated_at: String,
}

impl ConversationInfo {
    pub fn from_model(conversation: &ConversationWithParticipants, viewer_id: &str) -> Self {
        Self {
            id: conversation.conversation.id.clone(),
            title: conversation.display_title(viewer_id),
            participants: conversation
                .participants
                .iter()
                .cloned()
                .map(UserInfo::from)
                .collect(),
            updated_at: format_time(conversation.conversation.updated_at),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConversationsResponse {
    pub conversations: Vec<ConversationInfo>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CreateConversationRequest {
    pub participant_email: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MessagesQuery {
    pub conversation_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    pub content: Option<String>,
    pub conversation_id: Option<String>,
}

/// A message as sent to clients. `id` is the external identifier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageInfo {
    pub id: String,
    pub content: String,
    pub timestamp: String,
    pub author: Option<UserInfo>,
}

impl From<MessageWithAuthor> for MessageInfo {
    fn from(value: MessageWithAuthor) -> Self {
        Self {
            id: value.message.s_id,
            content: value.message.content,
            timestamp: format_time(value.message.created_at),
            author: value.author.map(UserInfo::from),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessagesResponse {
    pub messages: Vec<MessageInfo>,
}
