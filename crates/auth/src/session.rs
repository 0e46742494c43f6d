//! Session protocol: login, authenticate, refresh and logout.
//!
//! The server keeps no session table. A session is the (access, refresh)
//! token pair the client holds; this module is the only place that mints or
//! verifies either of them.
//!
//! ```text
//! Anonymous ──login──▶ ActiveAccess ──access expiry──▶ ExpiredAccessValidRefresh
//!     ▲                    │  ▲                               │        │
//!     └──────logout────────┘  └──────── silent refresh ───────┘        │
//!                                                  refresh expiry/invalid
//!                                                                      ▼
//!                                          Expired (re-login required)
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info, warn};

use shopdesk_core::UserId;

use crate::claims::{Claims, Identity, TokenError};
use crate::codec::{IssuedToken, TokenCodec};
use crate::password::verify_password;
use crate::Role;

// ─────────────────────────────────────────────────────────────────────────────
// Credential store boundary
// ─────────────────────────────────────────────────────────────────────────────

/// Stored login material for one account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialRecord {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub role: Role,
    /// `None` for accounts provisioned without a password.
    pub password_hash: Option<String>,
}

impl CredentialRecord {
    pub fn profile(&self) -> Profile {
        Profile {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            role: self.role,
            created_at: None,
        }
    }
}

/// Public view of an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("credential store failure: {0}")]
pub struct CredentialStoreError(pub String);

/// Read-only access to user records, as needed by the session protocol.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_credentials(
        &self,
        email: &str,
    ) -> Result<Option<CredentialRecord>, CredentialStoreError>;

    async fn find_profile(&self, id: UserId) -> Result<Option<Profile>, CredentialStoreError>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Errors and outcomes
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Access token missing. Please log in.")]
    NoToken,

    /// Recoverable through a refresh on endpoints that support it.
    #[error("Access token expired")]
    TokenExpired,

    #[error("Invalid token")]
    InvalidToken,

    /// No refresh token was presented; the client must log in again.
    #[error("Session expired, please log in again")]
    SessionExpired,

    #[error("Invalid or expired refresh token")]
    InvalidRefresh,

    #[error("User not found")]
    NotFound,

    #[error("Invalid password")]
    InvalidCredentials,

    /// The account exists but cannot authenticate (no usable password hash).
    #[error("User has no password set. Contact admin.")]
    Misconfigured,

    #[error(transparent)]
    Store(#[from] CredentialStoreError),

    #[error("internal authentication failure: {0}")]
    Internal(String),
}

/// Which cookie slot a token travels in.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum TokenSlot {
    Access,
    Refresh,
}

impl TokenSlot {
    pub fn cookie_name(&self) -> &'static str {
        match self {
            TokenSlot::Access => "accessToken",
            TokenSlot::Refresh => "refreshToken",
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TokenLifetimes {
    pub access: Duration,
    pub refresh: Duration,
}

impl Default for TokenLifetimes {
    fn default() -> Self {
        Self {
            access: Duration::minutes(15),
            refresh: Duration::days(7),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access: IssuedToken,
    pub refresh: IssuedToken,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginOutcome {
    pub tokens: TokenPair,
    pub profile: Profile,
}

/// Result of a silent refresh. The refresh token is reused as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshOutcome {
    pub access: IssuedToken,
    pub profile: Profile,
}

// ─────────────────────────────────────────────────────────────────────────────
// Session manager
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct SessionManager {
    codec: TokenCodec,
    store: Arc<dyn CredentialStore>,
    lifetimes: TokenLifetimes,
}

impl core::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SessionManager")
            .field("codec", &self.codec)
            .field("lifetimes", &self.lifetimes)
            .finish_non_exhaustive()
    }
}

impl SessionManager {
    pub fn new(codec: TokenCodec, store: Arc<dyn CredentialStore>, lifetimes: TokenLifetimes) -> Self {
        Self {
            codec,
            store,
            lifetimes,
        }
    }

    pub fn lifetimes(&self) -> TokenLifetimes {
        self.lifetimes
    }

    /// Check credentials and mint a fresh (access, refresh) pair.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<LoginOutcome, AuthError> {
        let record = self.store.find_credentials(email).await?.ok_or_else(|| {
            warn!(email, "login for unknown email");
            AuthError::NotFound
        })?;

        let Some(hash) = record.password_hash.clone().filter(|h| !h.is_empty()) else {
            warn!(user_id = %record.id, "login for account without password hash");
            return Err(AuthError::Misconfigured);
        };

        let supplied = password.to_owned();
        let matches = tokio::task::spawn_blocking(move || verify_password(&hash, &supplied))
            .await
            .map_err(|e| AuthError::Internal(format!("password verification task failed: {e}")))?
            .map_err(|e| {
                error!(user_id = %record.id, error = %e, "stored password hash is unusable");
                AuthError::Misconfigured
            })?;

        if !matches {
            warn!(user_id = %record.id, "login with wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        let identity = Identity {
            id: record.id,
            role: record.role,
        };
        let tokens = TokenPair {
            access: self.issue(identity, self.lifetimes.access, now)?,
            refresh: self.issue(identity, self.lifetimes.refresh, now)?,
        };

        info!(user_id = %record.id, role = %record.role, "login succeeded");
        Ok(LoginOutcome {
            tokens,
            profile: record.profile(),
        })
    }

    /// Resolve the identity behind an access token.
    pub fn authenticate(&self, access: Option<&str>, now: DateTime<Utc>) -> Result<Identity, AuthError> {
        let token = access
            .filter(|t| !t.trim().is_empty())
            .ok_or(AuthError::NoToken)?;

        match self.codec.verify(token, now) {
            Ok(claims) => Ok(claims.identity()),
            Err(TokenError::Expired) => Err(AuthError::TokenExpired),
            Err(TokenError::Invalid) => {
                warn!("access token failed verification");
                Err(AuthError::InvalidToken)
            }
        }
    }

    /// Recover from an expired access token using the refresh token, and
    /// re-fetch the profile of the refresh token's subject.
    pub async fn silent_refresh(
        &self,
        refresh: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<RefreshOutcome, AuthError> {
        let claims = self.verify_refresh(refresh, now)?;
        let access = self.issue(claims.identity(), self.lifetimes.access, now)?;
        let profile = self.profile(claims.id).await?;

        info!(user_id = %claims.id, "access token silently refreshed");
        Ok(RefreshOutcome { access, profile })
    }

    /// Mint a new access token from a refresh token, with no profile lookup.
    pub fn refresh_access_token(
        &self,
        refresh: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, AuthError> {
        let claims = self.verify_refresh(refresh, now)?;
        let access = self.issue(claims.identity(), self.lifetimes.access, now)?;

        info!(user_id = %claims.id, "access token refreshed");
        Ok(access)
    }

    /// Token slots to clear. Stateless, so this always succeeds.
    pub fn logout(&self) -> [TokenSlot; 2] {
        info!("session cleared");
        [TokenSlot::Access, TokenSlot::Refresh]
    }

    pub async fn profile(&self, id: UserId) -> Result<Profile, AuthError> {
        self.store.find_profile(id).await?.ok_or(AuthError::NotFound)
    }

    fn verify_refresh(&self, refresh: Option<&str>, now: DateTime<Utc>) -> Result<Claims, AuthError> {
        let token = refresh
            .filter(|t| !t.trim().is_empty())
            .ok_or(AuthError::SessionExpired)?;

        self.codec.verify(token, now).map_err(|e| {
            warn!(reason = %e, "refresh token rejected");
            AuthError::InvalidRefresh
        })
    }

    fn issue(&self, identity: Identity, ttl: Duration, now: DateTime<Utc>) -> Result<IssuedToken, AuthError> {
        self.codec
            .issue(identity, ttl, now)
            .map_err(|e| AuthError::Internal(e.to_string()))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
