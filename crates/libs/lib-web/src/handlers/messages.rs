//! # Message Handlers
//!
//! - `GET /api/messages?conversationId=...` - [`list_messages`]
//! - `POST /api/messages` - [`send_message`]
//!
//! Both answer 404 to callers who are not members of the conversation.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Extension, Query, State,
    },
    http::StatusCode,
    Json,
};
use lib_core::dto::{MessageInfo, MessagesQuery, MessagesResponse, SendMessageRequest};
use lib_core::{AppError, DbPool};
use tracing::{info, instrument};

use super::{json_body, query_params};
use crate::middleware::SessionUser;
use crate::services::MessageService;

fn required_conversation_id(conversation_id: Option<String>) -> Result<String, AppError> {
    conversation_id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::InvalidInput("conversationId is required".to_string()))
}

#[instrument(skip_all, fields(user_id = %session.id))]
pub async fn list_messages(
    State(pool): State<DbPool>,
    Extension(session): Extension<SessionUser>,
    query: Result<Query<MessagesQuery>, QueryRejection>,
) -> Result<Json<MessagesResponse>, AppError> {
    let query = query_params(query)?;
    let conversation_id = required_conversation_id(query.conversation_id)?;

    let messages = MessageService::new(pool)
        .list_messages(&conversation_id, &session.id)
        .await?
        .into_iter()
        .map(MessageInfo::from)
        .collect();

    Ok(Json(MessagesResponse { messages }))
}

/// Send a message. The response lists every message created by the send:
/// the caller's, then the assistant's reply when there is one.
#[instrument(skip_all, fields(user_id = %session.id))]
pub async fn send_message(
    State(pool): State<DbPool>,
    Extension(session): Extension<SessionUser>,
    payload: Result<Json<SendMessageRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<MessagesResponse>), AppError> {
    let req = json_body(payload)?;
    let conversation_id = required_conversation_id(req.conversation_id)?;
    let content = req.content.unwrap_or_default();

    let created = MessageService::new(pool)
        .send_message(&conversation_id, &session.id, &content)
        .await?;

    info!("[MESSAGES] {} message(s) created in {}", created.len(), conversation_id);

    let messages = created.into_iter().map(MessageInfo::from).collect();
    Ok((StatusCode::CREATED, Json(MessagesResponse { messages })))
}
