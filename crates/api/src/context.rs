use shopdesk_auth::{Identity, Role};
use shopdesk_core::UserId;

/// Authenticated caller of a protected request.
///
/// Inserted into request extensions by the authentication middleware; handlers
/// behind it can rely on its presence.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct IdentityContext {
    identity: Identity,
}

impl IdentityContext {
    pub fn new(identity: Identity) -> Self {
        Self { identity }
    }

    pub fn identity(&self) -> Identity {
        self.identity
    }

    pub fn user_id(&self) -> UserId {
        self.identity.id
    }

    pub fn role(&self) -> Role {
        self.identity.role
    }
}
