use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::{debug, error};

use shopdesk_auth::{AuthError, AuthzError};
use shopdesk_core::DomainError;
use shopdesk_infra::StoreError;

/// Everything a handler can fail with. Rendered as `{"error": message, "code": code}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Forbidden(#[from] AuthzError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// A resource addressed by id does not exist. Carries the resource name.
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error(transparent)]
    InvalidBody(#[from] JsonRejection),

    #[error("{message}")]
    BadRequest { code: &'static str, message: String },

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::BadRequest {
            code,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Auth(e) => auth_error_to_response(e),
            ApiError::Forbidden(e) => json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string()),
            ApiError::Domain(e) => domain_error_to_response(e),
            ApiError::Store(e) => store_error_to_response(e),
            ApiError::NotFound(resource) => json_error(
                StatusCode::NOT_FOUND,
                "not_found",
                format!("{resource} not found"),
            ),
            ApiError::InvalidBody(rejection) => {
                debug!(status = %rejection.status(), reason = %rejection.body_text(), "request body rejected");
                json_error(StatusCode::BAD_REQUEST, "invalid_body", rejection.body_text())
            }
            ApiError::BadRequest { code, message } => json_error(StatusCode::BAD_REQUEST, code, message),
            ApiError::Internal(detail) => {
                error!(error = %detail, "request failed");
                json_error(StatusCode::INTERNAL_SERVER_ERROR, "server_error", "Server error")
            }
        }
    }
}

fn auth_error_to_response(err: AuthError) -> Response {
    let (status, code) = match &err {
        AuthError::NoToken => (StatusCode::UNAUTHORIZED, "no_token"),
        AuthError::TokenExpired => (StatusCode::UNAUTHORIZED, "token_expired"),
        AuthError::SessionExpired => (StatusCode::UNAUTHORIZED, "session_expired"),
        AuthError::InvalidToken => (StatusCode::FORBIDDEN, "invalid_token"),
        AuthError::InvalidRefresh => (StatusCode::FORBIDDEN, "invalid_refresh_token"),
        AuthError::NotFound => (StatusCode::NOT_FOUND, "user_not_found"),
        AuthError::InvalidCredentials => (StatusCode::BAD_REQUEST, "invalid_credentials"),
        AuthError::Misconfigured => (StatusCode::INTERNAL_SERVER_ERROR, "account_misconfigured"),
        AuthError::Store(_) | AuthError::Internal(_) => {
            error!(error = %err, "authentication backend failure");
            return json_error(StatusCode::INTERNAL_SERVER_ERROR, "server_error", "Server error");
        }
    };
    json_error(status, code, err.to_string())
}

fn domain_error_to_response(err: DomainError) -> Response {
    match err {
        DomainError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        e @ DomainError::MissingFields(_) => {
            debug!(fields = ?e.missing_fields(), "required fields absent");
            json_error(StatusCode::BAD_REQUEST, "missing_fields", e.to_string())
        }
        e @ DomainError::InvalidId(_) => json_error(StatusCode::BAD_REQUEST, "invalid_id", e.to_string()),
    }
}

fn store_error_to_response(err: StoreError) -> Response {
    match err {
        StoreError::Conflict(detail) => {
            error!(error = %detail, "write rejected by a constraint");
            json_error(
                StatusCode::CONFLICT,
                "conflict",
                "Request conflicts with existing data",
            )
        }
        StoreError::MissingReference(what) => json_error(
            StatusCode::BAD_REQUEST,
            "missing_reference",
            format!("Referenced {what} does not exist"),
        ),
        e => {
            error!(error = %e, "store failure");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", "Database error")
        }
    }
}

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        axum::Json(json!({
            "error": message.into(),
            "code": code,
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use shopdesk_auth::Role;

    fn status_of(err: impl Into<ApiError>) -> StatusCode {
        err.into().into_response().status()
    }

    #[test]
    fn auth_failures_map_to_401_or_403() {
        assert_eq!(status_of(AuthError::NoToken), StatusCode::UNAUTHORIZED);
        assert_eq!(status_of(AuthError::TokenExpired), StatusCode::UNAUTHORIZED);
        assert_eq!(status_of(AuthError::SessionExpired), StatusCode::UNAUTHORIZED);
        assert_eq!(status_of(AuthError::InvalidToken), StatusCode::FORBIDDEN);
        assert_eq!(status_of(AuthError::InvalidRefresh), StatusCode::FORBIDDEN);
        assert_eq!(status_of(AuthError::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(status_of(AuthError::InvalidCredentials), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(AuthError::Misconfigured), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn authorization_and_validation_statuses() {
        assert_eq!(
            status_of(AuthzError::Forbidden { role: Role::Viewer }),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_of(DomainError::MissingFields(vec!["name"])),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status_of(DomainError::invalid_id("x")), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(ApiError::NotFound("Customer")), StatusCode::NOT_FOUND);
    }

    #[test]
    fn store_failures_hide_detail() {
        assert_eq!(status_of(StoreError::Poisoned), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            status_of(StoreError::MissingReference("category")),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(StoreError::Conflict("email taken".into())),
            StatusCode::CONFLICT
        );
    }
}
