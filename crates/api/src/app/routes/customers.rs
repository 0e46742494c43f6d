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

use shopdesk_core::CustomerId;

use crate::app::dto;
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::authz::{self, ADMINS, EDITORS, EVERYONE};
use crate::context::IdentityContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_customers).post(create_customer))
        .route("/:id", put(update_customer).delete(delete_customer))
}

pub async fn list_customers(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<IdentityContext>,
    Query(query): Query<dto::ListQuery>,
) -> Result<Response, ApiError> {
    authz::require(&caller, EVERYONE)?;

    let customers = services.customers.list_customers(&query.customer_filter()).await?;
    Ok(Json(customers).into_response())
}

pub async fn create_customer(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<IdentityContext>,
    body: dto::Body<dto::CustomerRequest>,
) -> Result<Response, ApiError> {
    authz::require(&caller, EDITORS)?;
    let Json(body) = body?;

    let customer = services.customers.create_customer(body.validate()?).await?;
    info!(customer_id = %customer.id, by = %caller.user_id(), "customer created");
    Ok((StatusCode::CREATED, Json(customer)).into_response())
}

pub async fn update_customer(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<IdentityContext>,
    Path(id): Path<String>,
    body: dto::Body<dto::CustomerRequest>,
) -> Result<Response, ApiError> {
    authz::require(&caller, ADMINS)?;
    let Json(body) = body?;
    let id: CustomerId = id.parse()?;

    let customer = services
        .customers
        .update_customer(id, body.validate()?)
        .await?
        .ok_or(ApiError::NotFound("Customer"))?;
    Ok(Json(customer).into_response())
}

pub async fn delete_customer(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<IdentityContext>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    authz::require(&caller, ADMINS)?;
    let id: CustomerId = id.parse()?;

    let customer = services
        .customers
        .delete_customer(id)
        .await?
        .ok_or(ApiError::NotFound("Customer"))?;

    info!(customer_id = %id, by = %caller.user_id(), "customer deleted");
    Ok(Json(json!({
        "message": "Customer deleted successfully",
        "customer": customer,
    }))
    .into_response())
}
