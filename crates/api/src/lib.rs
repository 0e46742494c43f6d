//! HTTP API: routing, cookie-based authentication and request/response mapping.

pub mod app;
pub mod authz;
pub mod config;
pub mod context;
pub mod cookies;
pub mod middleware;
