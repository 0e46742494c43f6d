//! User administration. Every endpoint is admin-only.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, put},
    Json, Router,
};
use serde_json::json;
use tracing::info;

use shopdesk_core::UserId;
use shopdesk_infra::store::NewUser;

use crate::app::dto;
use crate::app::errors::ApiError;
use crate::app::routes::auth::hash_blocking;
use crate::app::services::AppServices;
use crate::authz::{self, ADMINS};
use crate::context::IdentityContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/:id", put(update_user).delete(delete_user))
}

pub async fn list_users(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<IdentityContext>,
    Query(query): Query<dto::ListQuery>,
) -> Result<Response, ApiError> {
    authz::require(&caller, ADMINS)?;

    let users = services.users.list_users(&query.user_filter()?).await?;
    Ok(Json(users).into_response())
}

pub async fn create_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<IdentityContext>,
    body: dto::Body<dto::CreateUserRequest>,
) -> Result<Response, ApiError> {
    authz::require(&caller, ADMINS)?;
    let Json(body) = body?;
    let account = body.validate()?;

    let password_hash = hash_blocking(account.password).await?;
    let user = services
        .users
        .create_user(NewUser {
            username: account.username,
            email: account.email,
            password_hash,
            role: account.role,
        })
        .await?;

    info!(user_id = %user.id, role = %user.role, by = %caller.user_id(), "user created");
    Ok((StatusCode::CREATED, Json(user)).into_response())
}

pub async fn update_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<IdentityContext>,
    Path(id): Path<String>,
    body: dto::Body<dto::UpdateUserRequest>,
) -> Result<Response, ApiError> {
    authz::require(&caller, ADMINS)?;
    let Json(body) = body?;
    let id: UserId = id.parse()?;

    let user = services
        .users
        .update_user(id, body.validate()?)
        .await?
        .ok_or(ApiError::NotFound("User"))?;
    Ok(Json(user).into_response())
}

pub async fn delete_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<IdentityContext>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    authz::require(&caller, ADMINS)?;
    let id: UserId = id.parse()?;

    if !services.users.delete_user(id).await? {
        return Err(ApiError::NotFound("User"));
    }

    info!(user_id = %id, by = %caller.user_id(), "user deleted");
    Ok(Json(json!({ "message": "User deleted successfully" })).into_response())
}
