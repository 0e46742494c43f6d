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

use shopdesk_core::OrderId;

use crate::app::dto;
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::authz::{self, ADMINS, EDITORS, EVERYONE};
use crate::context::IdentityContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_orders).post(create_order))
        .route("/:id", put(update_order).delete(delete_order))
}

/// Newest first, with totals summed over line items.
pub async fn list_orders(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<IdentityContext>,
    Query(query): Query<dto::ListQuery>,
) -> Result<Response, ApiError> {
    authz::require(&caller, EVERYONE)?;

    let orders = services.orders.list_orders(&query.order_filter()).await?;
    Ok(Json(orders).into_response())
}

pub async fn create_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<IdentityContext>,
    body: dto::Body<dto::CreateOrderRequest>,
) -> Result<Response, ApiError> {
    authz::require(&caller, EDITORS)?;
    let Json(body) = body?;

    let order = services.orders.create_order(body.validate()?).await?;
    info!(order_id = %order.order_id, by = %caller.user_id(), "order created");
    Ok((StatusCode::CREATED, Json(order)).into_response())
}

pub async fn update_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<IdentityContext>,
    Path(id): Path<String>,
    body: dto::Body<dto::UpdateOrderRequest>,
) -> Result<Response, ApiError> {
    authz::require(&caller, EDITORS)?;
    let Json(body) = body?;
    let id: OrderId = id.parse()?;

    let order = services
        .orders
        .update_order(id, body.validate()?)
        .await?
        .ok_or(ApiError::NotFound("Order"))?;
    Ok(Json(order).into_response())
}

pub async fn delete_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<IdentityContext>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    authz::require(&caller, ADMINS)?;
    let id: OrderId = id.parse()?;

    let order = services
        .orders
        .delete_order(id)
        .await?
        .ok_or(ApiError::NotFound("Order"))?;

    info!(order_id = %id, by = %caller.user_id(), "order deleted");
    Ok(Json(json!({
        "message": "Order deleted successfully",
        "order": order,
    }))
    .into_response())
}
