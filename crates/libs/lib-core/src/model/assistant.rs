//! # Assistant Identity
//!
//! The assistant is a reserved user row, created lazily on first use and
//! recognised only by its email. Its replies are fixed text.
//!
//! There is no process-local cache of the row: the unique index on
//! `users.email` is the only guard against two requests creating it at once.

use super::store::models::{User, UserForUpsert};
use super::store::{DbPool, UserRepository};
use tracing::debug;

pub const ASSISTANT_EMAIL: &str = "assistant@cracouchat.local";
pub const ASSISTANT_PROVIDER: &str = "system";
pub const ASSISTANT_PROVIDER_ID: &str = "cracoufrat-assistant";
pub const ASSISTANT_DISPLAY_NAME: &str = "Cracoufrat Assistant";

/// Scripted reply posted after every human message in a conversation the assistant is part of.
pub const ASSISTANT_REPLY: &str = "Cracoufrat!";

/// Case-insensitive check against the reserved assistant email. `None` is never the assistant.
pub fn is_assistant_email(email: Option<&str>) -> bool {
    email.is_some_and(|e| e.eq_ignore_ascii_case(ASSISTANT_EMAIL))
}

fn assistant_identity() -> UserForUpsert {
    UserForUpsert::new(ASSISTANT_EMAIL, ASSISTANT_PROVIDER, ASSISTANT_PROVIDER_ID)
        .name(ASSISTANT_DISPLAY_NAME)
}

/// Look up the assistant row without creating it.
pub async fn find_assistant_user(pool: &DbPool) -> Result<Option<User>, sqlx::Error> {
    UserRepository::find_by_email(pool, ASSISTANT_EMAIL).await
}

/// Find or create the assistant row.
///
/// When two callers race, the loser's insert hits the unique email index and
/// it re-reads the winner's row, so every caller returns the same user.
pub async fn ensure_assistant_user(pool: &DbPool) -> Result<User, sqlx::Error> {
    if let Some(assistant) = find_assistant_user(pool).await? {
        return Ok(assistant);
    }

    match UserRepository::insert(pool, &assistant_identity()).await {
        Ok(assistant) => {
            debug!("[ASSISTANT] Created assistant user {}", assistant.id);
            Ok(assistant)
        }
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
            debug!("[ASSISTANT] Assistant created concurrently, re-fetching");
            find_assistant_user(pool).await?.ok_or(sqlx::Error::RowNotFound)
        }
        Err(e) => Err(e),
    }
}
