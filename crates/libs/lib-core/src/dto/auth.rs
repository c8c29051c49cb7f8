//! # Authentication Data Transfer Objects
//!
//! Request and response structures for the sign-in surface.
//!
//! ## Endpoints Using These DTOs
//!
//! - `POST /api/auth/callback` - [`SignInRequest`] -> [`SessionResponse`]
//! - `GET /api/auth/session` - [`CurrentSessionResponse`]
//!
//! ## Wire Format
//!
//! All DTOs use **camelCase** field names in JSON. Optional profile fields are
//! serialized as `null` rather than omitted, so clients always see the same keys.
//!
//! ```text
//! POST /api/auth/callback
//! x-identity-secret: <IDENTITY_SECRET>
//! Content-Type: application/json
//!
//! {
//!   "email": "alice@example.com",
//!   "name": "Alice",
//!   "image": "https://avatars.example.com/alice.png",
//!   "provider": "github",
//!   "providerAccountId": "12345"
//! }
//! ```
//!
//! Response:
//! ```text
//! {
//!   "token": "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...",
//!   "user": {
//!     "id": "0b7f...",
//!     "email": "alice@example.com",
//!     "name": "Alice",
//!     "imageUrl": "https://avatars.example.com/alice.png"
//!   }
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::model::store::models::{User, UserProfile};

/// Identity reported by the gateway after a successful external sign-in.
///
/// Every field is optional at the serde level so that a missing field
/// surfaces as a validation error with a useful message instead of a
/// generic body rejection.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SignInRequest {
    pub email: Option<String>,
    pub name: Option<String>,
    /// Avatar URL as the provider reports it.
    pub image: Option<String>,
    pub provider: Option<String>,
    pub provider_account_id: Option<String>,
}

/// Public user information.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub image_url: Option<String>,
}

impl From<UserProfile> for UserInfo {
    fn from(profile: UserProfile) -> Self {
        Self {
            id: profile.id,
            email: profile.email,
            name: profile.name,
            image_url: profile.image_url,
        }
    }
}

impl From<User> for UserInfo {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            image_url: user.image_url,
        }
    }
}

/// Session issued at sign-in.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionResponse {
    pub token: String,
    pub user: UserInfo,
}

/// The user behind the presented session token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CurrentSessionResponse {
    pub user: UserInfo,
}

/// Error body rendered by `AppError`.
///
/// `error` is stable and safe to show. `code` names the error kind and
/// `message` carries a diagnostic for storage failures only.
///
/// ```json
/// { "error": "Conversation not found", "code": "NotFound" }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
