use thiserror::Error;

use crate::{Identity, Role};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    /// Authenticated, but the role is outside the route's allowed set.
    #[error("Access denied. Insufficient privileges.")]
    Forbidden { role: Role },
}

/// Authorize an authenticated identity against a route's allowed roles.
///
/// - No IO
/// - No panics
/// - Pure set membership on `identity.role`
pub fn authorize(identity: &Identity, allowed: &[Role]) -> Result<(), AuthzError> {
    if allowed.contains(&identity.role) {
        Ok(())
    } else {
        Err(AuthzError::Forbidden {
            role: identity.role,
        })
    }
}
