//! # Identity Gateway Verification
//!
//! The sign-in callback is only callable by the trusted identity gateway,
//! which proves itself with a pre-shared secret header.

use subtle::ConstantTimeEq;

use crate::error::{Error, Result};

/// Header carrying the identity gateway secret.
pub const IDENTITY_SECRET_HEADER: &str = "x-identity-secret";

/// Compare the presented secret with the configured one in constant time.
pub fn verify_identity_secret(presented: Option<&str>, expected: &str) -> Result<()> {
    let presented = presented.ok_or(Error::IdentitySecretMissing)?;

    if bool::from(presented.as_bytes().ct_eq(expected.as_bytes())) {
        Ok(())
    } else {
        Err(Error::IdentitySecretMismatch)
    }
}
