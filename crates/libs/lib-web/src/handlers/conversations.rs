//! # Conversation Handlers
//!
//! - `GET /api/conversations` - [`list_conversations`]
//! - `POST /api/conversations` - [`create_conversation`]

use axum::{
    extract::{rejection::JsonRejection, Extension, State},
    http::StatusCode,
    Json,
};
use lib_core::dto::{ConversationInfo, ConversationsResponse, CreateConversationRequest};
use lib_core::{AppError, DbPool};
use tracing::instrument;

use super::json_body;
use crate::middleware::SessionUser;
use crate::services::ConversationService;

#[instrument(skip_all, fields(user_id = %session.id))]
pub async fn list_conversations(
    State(pool): State<DbPool>,
    Extension(session): Extension<SessionUser>,
) -> Result<Json<ConversationsResponse>, AppError> {
    let conversations = ConversationService::new(pool)
        .list_conversations_for_user(&session.id)
        .await?
        .iter()
        .map(|c| ConversationInfo::from_model(c, &session.id))
        .collect();

    Ok(Json(ConversationsResponse { conversations }))
}

/// Open a conversation with the user behind `participantEmail`, or return
/// the one the two already share.
#[instrument(skip_all, fields(user_id = %session.id))]
pub async fn create_conversation(
    State(pool): State<DbPool>,
    Extension(session): Extension<SessionUser>,
    payload: Result<Json<CreateConversationRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ConversationInfo>), AppError> {
    let req = json_body(payload)?;

    let conversation = ConversationService::new(pool)
        .start_conversation(&session.id, req.participant_email.as_deref())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ConversationInfo::from_model(&conversation, &session.id)),
    ))
}
