use axum::Router;

pub mod auth;
pub mod customers;
pub mod orders;
pub mod products;
pub mod system;
pub mod users;

/// Endpoints reachable without an access token (`/api/auth/...`).
///
/// `/auth/profile` is here too: it authenticates itself so it can recover
/// from an expired access token.
pub fn public() -> Router {
    Router::new().nest("/auth", auth::router())
}

/// Router for all authenticated endpoints.
pub fn protected() -> Router {
    Router::new()
        .nest("/customers", customers::router())
        .nest("/orders", orders::router())
        .nest("/products", products::router())
        .nest("/users", users::router())
}
