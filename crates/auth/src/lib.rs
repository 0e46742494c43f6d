//! Authentication and authorization core.
//!
//! Token issuance/verification, password hashing, the session protocol
//! (login, authenticate, refresh, logout) and the role gate. This crate is
//! decoupled from HTTP; storage is reached only through [`CredentialStore`].

pub mod authorize;
pub mod claims;
pub mod codec;
pub mod password;
pub mod roles;
pub mod session;

pub use authorize::{authorize, AuthzError};
pub use claims::{validate_claims, Claims, Identity, TokenError};
pub use codec::{CodecError, IssuedToken, TokenCodec};
pub use password::{hash_password, verify_password, PasswordError};
pub use roles::{ParseRoleError, Role};
pub use session::{
    AuthError, CredentialRecord, CredentialStore, CredentialStoreError, LoginOutcome, Profile,
    RefreshOutcome, SessionManager, TokenLifetimes, TokenPair, TokenSlot,
};
