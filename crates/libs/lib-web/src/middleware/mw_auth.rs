//! # Authentication Middleware
//!
//! Validates the session token and hands handlers an opaque [`SessionUser`].
//!
//! The token is read from the `Authorization: Bearer <token>` header and, when
//! that is absent, from the [`SESSION_COOKIE`] cookie.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use axum::{middleware, routing::get, Router};
//! use lib_web::middleware::require_auth;
//!
//! let app = Router::new()
//!     .route("/api/conversations", get(list_conversations))
//!     .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
//!     .with_state(state);
//! ```
//!
//! Handlers then extract `Extension<SessionUser>`.

use axum::{
    extract::{Request, State},
    http::header::{AUTHORIZATION, COOKIE},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use lib_auth::decode_session_token;
use lib_core::{AppError, Config};
use tracing::{debug, warn};

/// Cookie carrying the session token for browser clients.
pub const SESSION_COOKIE: &str = "cracouchat_session";

/// The authenticated caller, as far as the core needs to know.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
    pub id: String,
    pub email: String,
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

fn cookie_token(headers: &HeaderMap) -> Option<&str> {
    let prefix = format!("{SESSION_COOKIE}=");

    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .flat_map(|h| h.split(';'))
        .find_map(|cookie| cookie.trim().strip_prefix(prefix.as_str()))
        .filter(|t| !t.is_empty())
}

/// Session token presented with the request, bearer header first.
pub fn extract_session_token(headers: &HeaderMap) -> Option<&str> {
    bearer_token(headers).or_else(|| cookie_token(headers))
}

/// Reject the request with 401 unless it carries a valid session token.
pub async fn require_auth(
    State(config): State<Config>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_session_token(req.headers()).ok_or_else(|| {
        debug!("[AUTH] No session token presented");
        AppError::Unauthenticated("Authentication required".to_string())
    })?;

    let claims = decode_session_token(token, &config.session_secret).map_err(|e| {
        warn!("[AUTH] Session token rejected: {}", e);
        AppError::Unauthenticated("Authentication required".to_string())
    })?;

    debug!("[AUTH] Authenticated user: {} (id: {})", claims.email, claims.sub);

    req.extensions_mut().insert(SessionUser {
        id: claims.sub,
        email: claims.email,
    });

    Ok(next.run(req).await)
}
