use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use shopdesk_core::UserId;

use crate::Role;

/// The authenticated subject, as carried by a verified token.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    pub id: UserId,
    pub role: Role,
}

/// Token claims model.
///
/// Access and refresh tokens carry the same claims; they differ only in
/// lifetime and in the cookie slot they travel in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject user id.
    pub id: UserId,

    /// Role at issuance time. A role change takes effect at next login.
    pub role: Role,

    /// Issued-at (unix seconds).
    pub iat: i64,

    /// Expiry (unix seconds).
    pub exp: i64,
}

impl Claims {
    pub fn new(identity: Identity, issued_at: DateTime<Utc>, expires_at: DateTime<Utc>) -> Self {
        Self {
            id: identity.id,
            role: identity.role,
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        }
    }

    pub fn identity(&self) -> Identity {
        Identity {
            id: self.id,
            role: self.role,
        }
    }
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    /// Signature is intact but the expiry has passed.
    #[error("token has expired")]
    Expired,

    /// Signature mismatch, malformed input, or a nonsensical time window.
    #[error("token is invalid")]
    Invalid,
}

/// Validate the time window of already signature-checked claims.
///
/// A token is live while `now < exp`; the second `exp` is reached it is expired.
pub fn validate_claims(claims: &Claims, now: DateTime<Utc>) -> Result<(), TokenError> {
    if claims.exp <= claims.iat {
        return Err(TokenError::Invalid);
    }
    if now.timestamp() >= claims.exp {
        return Err(TokenError::Expired);
    }
    Ok(())
}
