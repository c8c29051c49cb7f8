//! # Authentication Handlers
//!
//! The OAuth exchange happens in the identity gateway. Once it has verified a
//! user, it calls [`sign_in`] with the shared gateway secret. The user row is
//! upserted by email and a session token is issued for later requests.
//!
//! ```text
//! gateway ──POST /api/auth/callback (x-identity-secret)──► upsert user ──► { token, user }
//! client  ──GET  /api/auth/session  (Bearer / cookie)────► { user }
//! ```

use axum::{
    extract::{rejection::JsonRejection, Extension, State},
    http::HeaderMap,
    Json,
};
use lib_auth::{encode_session_token, identity::IDENTITY_SECRET_HEADER, verify_identity_secret};
use lib_core::dto::{CurrentSessionResponse, SessionResponse, SignInRequest};
use lib_core::model::assistant::is_assistant_email;
use lib_core::model::store::models::UserForUpsert;
use lib_core::model::store::UserRepository;
use lib_core::{AppError, Config, DbPool};
use lib_utils::{validate_email, validate_not_empty};
use tracing::{info, instrument, warn};

use super::json_body;
use crate::middleware::SessionUser;

fn required(value: Option<String>, field: &str) -> Result<String, AppError> {
    let value = value.ok_or_else(|| AppError::InvalidInput(format!("{field} is required")))?;
    validate_not_empty(&value, field).map_err(AppError::InvalidInput)?;
    Ok(value.trim().to_string())
}

/// Sign-in callback: upsert the user reported by the gateway and issue a session.
#[instrument(skip_all)]
pub async fn sign_in(
    State(pool): State<DbPool>,
    State(config): State<Config>,
    headers: HeaderMap,
    payload: Result<Json<SignInRequest>, JsonRejection>,
) -> Result<Json<SessionResponse>, AppError> {
    let presented = headers.get(IDENTITY_SECRET_HEADER).and_then(|v| v.to_str().ok());
    verify_identity_secret(presented, &config.identity_secret).map_err(|e| {
        warn!("[AUTH] Sign-in callback refused: {}", e);
        AppError::Unauthenticated("Invalid identity gateway credentials".to_string())
    })?;

    let req = json_body(payload)?;

    let email = required(req.email, "email")?;
    validate_email(&email).map_err(AppError::InvalidInput)?;
    if is_assistant_email(Some(&email)) {
        warn!("[AUTH] Sign-in attempted with the reserved assistant email");
        return Err(AppError::InvalidInput("email is reserved".to_string()));
    }
    let provider = required(req.provider, "provider")?;
    let provider_account_id = required(req.provider_account_id, "providerAccountId")?;

    let mut identity = UserForUpsert::new(email, provider, provider_account_id);
    identity.name = req.name.filter(|n| !n.trim().is_empty());
    identity.image_url = req.image.filter(|i| !i.trim().is_empty());

    let user = UserRepository::upsert(&pool, &identity).await?;

    let token = encode_session_token(
        &user.id,
        &user.email,
        user.name.as_deref(),
        &config.session_secret,
        config.session_expiration_hours,
    )
    .map_err(|e| AppError::Internal(e.to_string()))?;

    info!("[AUTH] Signed in user {} via {}", user.id, user.provider);

    Ok(Json(SessionResponse {
        token,
        user: user.into(),
    }))
}

/// The user behind the presented session token.
///
/// A valid token whose user row no longer exists is treated as no session.
#[instrument(skip_all, fields(user_id = %session.id))]
pub async fn session(
    State(pool): State<DbPool>,
    Extension(session): Extension<SessionUser>,
) -> Result<Json<CurrentSessionResponse>, AppError> {
    let user = UserRepository::find_by_id(&pool, &session.id)
        .await?
        .ok_or_else(|| AppError::Unauthenticated("Authentication required".to_string()))?;

    Ok(Json(CurrentSessionResponse { user: user.into() }))
}
