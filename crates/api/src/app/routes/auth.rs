use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension},
    http::{header::SET_COOKIE, HeaderMap, StatusCode},
    response::{AppendHeaders, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde_json::json;
use tracing::info;

use shopdesk_auth::{hash_password, AuthError, Role, TokenSlot};
use shopdesk_infra::store::NewUser;

use crate::app::dto;
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::cookies::read_cookie;

pub fn router() -> Router {
    Router::new()
        .route("/login", post(login))
        .route("/register", post(register))
        .route("/profile", get(profile))
        .route("/refresh", post(refresh))
        .route("/logout", post(logout))
}

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    body: dto::Body<dto::LoginRequest>,
) -> Result<Response, ApiError> {
    let body = body_or_default(body)?;
    let email = body.email.as_deref().map(str::trim).unwrap_or_default();
    let password = body.password.as_deref().unwrap_or_default();
    if email.is_empty() || password.is_empty() {
        return Err(ApiError::bad_request(
            "missing_credentials",
            "Email and password are required",
        ));
    }

    // An unknown email is a bad request here, not a missing resource.
    let outcome = services
        .sessions
        .login(email, password, Utc::now())
        .await
        .map_err(|e| match e {
            AuthError::NotFound => ApiError::bad_request("user_not_found", e.to_string()),
            other => other.into(),
        })?;

    let cookies = services.cookies;
    Ok((
        AppendHeaders([
            (SET_COOKIE, cookies.token_cookie(TokenSlot::Access, &outcome.tokens.access)),
            (SET_COOKIE, cookies.token_cookie(TokenSlot::Refresh, &outcome.tokens.refresh)),
        ]),
        Json(json!({
            "message": "Login successful",
            "user": outcome.profile,
        })),
    )
        .into_response())
}

pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    body: dto::Body<dto::RegisterRequest>,
) -> Result<Response, ApiError> {
    let registration = body_or_default(body)?.validate()?;

    if services.users.email_taken(&registration.email).await? {
        return Err(ApiError::bad_request("email_taken", "Email already registered"));
    }

    let password_hash = hash_blocking(registration.password).await?;
    let user = services
        .users
        .create_user(NewUser {
            username: registration.username,
            email: registration.email,
            password_hash,
            role: Role::Viewer,
        })
        .await?;

    info!(user_id = %user.id, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "User registered successfully",
            "user": user,
        })),
    )
        .into_response())
}

/// A request sent without a JSON body is treated as one with every field
/// absent, so it fails with the usual missing-field message.
fn body_or_default<T: Default>(body: dto::Body<T>) -> Result<T, ApiError> {
    match body {
        Ok(Json(body)) => Ok(body),
        Err(JsonRejection::MissingJsonContentType(_)) => Ok(T::default()),
        Err(rejection) => Err(rejection.into()),
    }
}

/// Profile of the caller. An expired access token is renewed from the refresh
/// cookie once; the new access token comes back as a cookie.
pub async fn profile(
    Extension(services): Extension<Arc<AppServices>>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let now = Utc::now();
    let access = read_cookie(&headers, TokenSlot::Access.cookie_name());

    match services.sessions.authenticate(access.as_deref(), now) {
        Ok(identity) => {
            let profile = services.sessions.profile(identity.id).await?;
            Ok(Json(profile).into_response())
        }
        Err(AuthError::TokenExpired) => {
            let refresh = read_cookie(&headers, TokenSlot::Refresh.cookie_name());
            let outcome = services.sessions.silent_refresh(refresh.as_deref(), now).await?;
            Ok((
                AppendHeaders([(
                    SET_COOKIE,
                    services.cookies.token_cookie(TokenSlot::Access, &outcome.access),
                )]),
                Json(outcome.profile),
            )
                .into_response())
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn refresh(
    Extension(services): Extension<Arc<AppServices>>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let refresh = read_cookie(&headers, TokenSlot::Refresh.cookie_name());
    let access = services
        .sessions
        .refresh_access_token(refresh.as_deref(), Utc::now())?;

    Ok((
        AppendHeaders([(
            SET_COOKIE,
            services.cookies.token_cookie(TokenSlot::Access, &access),
        )]),
        Json(json!({ "message": "Token refreshed" })),
    )
        .into_response())
}

pub async fn logout(Extension(services): Extension<Arc<AppServices>>) -> Response {
    let cleared = services
        .sessions
        .logout()
        .map(|slot| (SET_COOKIE, services.cookies.clear_cookie(slot)));

    (
        AppendHeaders(cleared),
        Json(json!({ "message": "Logged out successfully" })),
    )
        .into_response()
}

/// Argon2 hashing off the async workers.
pub(crate) async fn hash_blocking(password: String) -> Result<String, ApiError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| ApiError::Internal(format!("password hashing task failed: {e}")))?
        .map_err(|e| ApiError::Internal(e.to_string()))
}
