use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use chrono::Utc;

use shopdesk_auth::{SessionManager, TokenSlot};

use crate::app::errors::ApiError;
use crate::context::IdentityContext;
use crate::cookies::read_cookie;

#[derive(Clone, Debug)]
pub struct AuthState {
    pub sessions: SessionManager,
}

/// Resolve the access-token cookie into an [`IdentityContext`], or reject the
/// request before any handler runs.
pub async fn authenticate(
    State(state): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = read_cookie(req.headers(), TokenSlot::Access.cookie_name());

    let identity = state.sessions.authenticate(token.as_deref(), Utc::now())?;

    req.extensions_mut().insert(IdentityContext::new(identity));

    Ok(next.run(req).await)
}
