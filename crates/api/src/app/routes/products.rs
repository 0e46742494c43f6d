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

use shopdesk_core::ProductId;

use crate::app::dto;
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::authz::{self, ADMINS, EDITORS, EVERYONE};
use crate::context::IdentityContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route("/categories", get(list_categories))
        .route("/:id", put(update_product).delete(delete_product))
}

pub async fn list_products(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<IdentityContext>,
    Query(query): Query<dto::ListQuery>,
) -> Result<Response, ApiError> {
    authz::require(&caller, EVERYONE)?;

    let products = services.catalog.list_products(&query.product_filter()?).await?;
    Ok(Json(products).into_response())
}

pub async fn list_categories(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<IdentityContext>,
) -> Result<Response, ApiError> {
    authz::require(&caller, EVERYONE)?;

    let categories = services.catalog.list_categories().await?;
    Ok(Json(categories).into_response())
}

pub async fn create_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<IdentityContext>,
    body: dto::Body<dto::ProductRequest>,
) -> Result<Response, ApiError> {
    authz::require(&caller, EDITORS)?;
    let Json(body) = body?;

    let product = services.catalog.create_product(body.validate()?).await?;
    info!(product_id = %product.id, by = %caller.user_id(), "product created");
    Ok((StatusCode::CREATED, Json(product)).into_response())
}

/// Omitting `image_url` keeps the stored image.
pub async fn update_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<IdentityContext>,
    Path(id): Path<String>,
    body: dto::Body<dto::ProductRequest>,
) -> Result<Response, ApiError> {
    authz::require(&caller, EDITORS)?;
    let Json(body) = body?;
    let id: ProductId = id.parse()?;

    let product = services
        .catalog
        .update_product(id, body.validate()?)
        .await?
        .ok_or(ApiError::NotFound("Product"))?;
    Ok(Json(product).into_response())
}

pub async fn delete_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<IdentityContext>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    authz::require(&caller, ADMINS)?;
    let id: ProductId = id.parse()?;

    let product = services
        .catalog
        .delete_product(id)
        .await?
        .ok_or(ApiError::NotFound("Product"))?;

    info!(product_id = %id, by = %caller.user_id(), "product deleted");
    Ok(Json(json!({
        "message": "Product deleted successfully",
        "product": product,
    }))
    .into_response())
}
