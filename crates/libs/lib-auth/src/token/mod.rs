//! # Session Tokens
//!
//! HS256 session tokens issued after a successful sign-in.
//!
//! The token is the session: the service keeps no server-side session table,
//! every request is authenticated by verifying the signature and expiry.

use chrono::Duration;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use lib_utils::now_utc;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Session token claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id (UUID string).
    pub sub: String,
    /// Email at sign-in time.
    pub email: String,
    /// Display name at sign-in time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub exp: i64,
    pub iat: i64,
}

/// Issue a session token for a signed-in user.
pub fn encode_session_token(
    user_id: &str,
    email: &str,
    name: Option<&str>,
    secret: &str,
    expiration_hours: i64,
) -> Result<String> {
    let now = now_utc();
    let exp = now + Duration::hours(expiration_hours);

    let claims = Claims {
        sub: user_id.to_string(),
        email: email.to_string(),
        name: name.map(str::to_string),
        exp: exp.timestamp(),
        iat: now.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| Error::TokenEncode(e.to_string()))
}

/// Verify signature and expiry, returning the claims.
pub fn decode_session_token(token: &str, secret: &str) -> Result<Claims> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| Error::TokenDecode(e.to_string()))?;

    Ok(token_data.claims)
}
