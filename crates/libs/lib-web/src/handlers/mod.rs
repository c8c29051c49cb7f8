//! # HTTP Request Handlers
//!
//! Axum handlers organised by feature. Handlers stay thin: they extract,
//! delegate to [`crate::services`] or a repository, and shape the response.
//!
//! ## Handler Modules
//!
//! - **[`auth`]**: sign-in callback and current session
//!   - `POST /api/auth/callback` - identity gateway reports a signed-in user
//!   - `GET /api/auth/session` - user behind the presented token
//!
//! - **[`conversations`]**
//!   - `GET /api/conversations` - caller's conversations, most recent first
//!   - `POST /api/conversations` - open a conversation with another user
//!
//! - **[`messages`]**
//!   - `GET /api/messages?conversationId=...` - history, oldest first
//!   - `POST /api/messages` - send, returns one or two messages
//!
//! ## Errors
//!
//! Every handler returns `Result<_, AppError>`; the error renders itself as
//! `{ "error": ..., "code": ... }` with the matching status code. Malformed
//! JSON bodies and query strings are turned into the same shape through
//! [`json_body`] and [`query_params`].

pub mod auth;
pub mod conversations;
pub mod messages;

#[cfg(test)]
mod tests;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query,
    },
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use lib_core::AppError;
use serde_json::json;
use tracing::debug;

/// Unwrap a JSON body, mapping the framework's rejection to a 400 `AppError`.
pub fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload.map(|Json(body)| body).map_err(|rejection| {
        debug!("[REQUEST] Rejected body: {}", rejection.body_text());
        AppError::InvalidInput("Invalid JSON body".to_string())
    })
}

/// Unwrap query parameters, mapping the framework's rejection to a 400 `AppError`.
pub fn query_params<T>(query: Result<Query<T>, QueryRejection>) -> Result<T, AppError> {
    query.map(|Query(params)| params).map_err(|rejection| {
        debug!("[REQUEST] Rejected query: {}", rejection.body_text());
        AppError::InvalidInput("Invalid query string".to_string())
    })
}

/// Methods other than GET and POST on the resource routes.
pub async fn method_not_allowed() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        [(header::ALLOW, "GET, POST")],
        Json(json!({ "error": "Method not allowed" })),
    )
        .into_response()
}

/// Unmatched routes.
pub async fn not_found() -> Response {
    debug!("[404 HANDLER] Unmatched route");
    AppError::NotFound("Route not found".to_string()).into_response()
}
