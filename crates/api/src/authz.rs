//! Per-route role gating, checked inside each handler before the store is touched.

use tracing::warn;

use shopdesk_auth::{authorize, Role};

use crate::app::errors::ApiError;
use crate::context::IdentityContext;

pub const EVERYONE: &[Role] = &Role::ALL;
pub const EDITORS: &[Role] = &[Role::Admin, Role::Editor];
pub const ADMINS: &[Role] = &[Role::Admin];

pub fn require(caller: &IdentityContext, allowed: &[Role]) -> Result<(), ApiError> {
    authorize(&caller.identity(), allowed).map_err(|e| {
        warn!(user_id = %caller.user_id(), role = %caller.role(), "role not permitted");
        ApiError::from(e)
    })
}
