//! # Authentication Library
//!
//! Session token management and identity gateway verification.
//!
//! The OAuth exchange itself happens outside this service. Once the identity
//! gateway has verified a user it calls the sign-in callback (authenticated
//! with a shared secret, see [`identity`]) and the user receives a signed
//! session token (see [`token`]) used on every later request.

pub mod error;
pub mod identity;
pub mod token;

// Re-export commonly used types
pub use error::{Error, Result};
pub use identity::verify_identity_secret;
pub use token::{Claims, decode_session_token, encode_session_token};
