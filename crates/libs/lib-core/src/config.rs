//! # Application Configuration
//!
//! This module manages application configuration loaded from environment variables.
//! All configuration is validated on startup to fail fast if misconfigured.
//!
//! The configuration is passed around as part of the router state; there is no
//! global instance.

use lib_utils::{get_env, get_env_or, get_env_parse_or};

/// Application configuration loaded from environment variables.
#[derive(Clone)]
pub struct Config {
    /// SQLite database connection URL
    pub database_url: String,

    /// Secret key for session token signing and verification
    ///
    /// **Must be at least 32 characters long**.
    pub session_secret: String,

    /// Session token validity period in hours
    ///
    /// Valid range: 1-720 hours (1 hour to 30 days)
    pub session_expiration_hours: i64,

    /// Shared secret the identity gateway presents on the sign-in callback
    ///
    /// **Must be at least 16 characters long**.
    pub identity_secret: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, String> {
        let database_url = get_env_or("DATABASE_URL", "sqlite:data/cracouchat.db");

        let session_secret = get_env("SESSION_SECRET").map_err(|e| e.to_string())?;

        let session_expiration_hours =
            get_env_parse_or("SESSION_EXPIRATION_HOURS", 24).map_err(|e| e.to_string())?;

        let identity_secret = get_env("IDENTITY_SECRET").map_err(|e| e.to_string())?;

        Ok(Self {
            database_url,
            session_secret,
            session_expiration_hours,
            identity_secret,
        })
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.session_secret.len() < 32 {
            return Err("SESSION_SECRET must be at least 32 characters long".to_string());
        }

        if self.session_expiration_hours < 1 || self.session_expiration_hours > 720 {
            return Err("SESSION_EXPIRATION_HOURS must be between 1 and 720 (30 days)".to_string());
        }

        if self.identity_secret.len() < 16 {
            return Err("IDENTITY_SECRET must be at least 16 characters long".to_string());
        }

        Ok(())
    }
}

// Secrets stay out of logs.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("database_url", &self.database_url)
            .field("session_secret", &"***")
            .field("session_expiration_hours", &self.session_expiration_hours)
            .field("identity_secret", &"***")
            .finish()
    }
}
