//! Errors raised while issuing session tokens or checking the gateway secret.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to encode session token: {0}")]
    TokenEncode(String),

    #[error("Failed to decode session token: {0}")]
    TokenDecode(String),

    #[error("Identity secret missing")]
    IdentitySecretMissing,

    #[error("Identity secret mismatch")]
    IdentitySecretMismatch,
}
