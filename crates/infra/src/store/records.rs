//! Row types returned by the stores and the inputs they accept.
//!
//! User rows are represented by [`shopdesk_auth::Profile`], which is what
//! every user-facing endpoint returns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shopdesk_auth::Role;
use shopdesk_core::{CategoryId, CustomerId, OrderId, ProductId};

// -------------------------
// Users
// -------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserUpdate {
    pub username: String,
    pub email: String,
    pub role: Role,
}

// -------------------------
// Customers
// -------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerInput {
    pub name: String,
    pub email: String,
    pub phone: String,
}

// -------------------------
// Orders
// -------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: OrderId,
    pub customer_id: CustomerId,
    pub status: String,
    pub total: f64,
    pub created_at: DateTime<Utc>,
}

/// Listing row: an order joined with its customer, `total` summed over line items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderSummary {
    pub order_id: OrderId,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub customer_name: String,
    pub customer_email: String,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub customer_id: CustomerId,
    pub status: String,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderUpdate {
    pub status: String,
    pub total: f64,
}

// -------------------------
// Catalog
// -------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: f64,
    pub category_id: CategoryId,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Listing row: a product joined with its category name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductListing {
    pub id: ProductId,
    pub name: String,
    pub price: f64,
    pub image_url: Option<String>,
    pub category: String,
    pub created_at: DateTime<Utc>,
}

/// Create/update input. On update, `image_url: None` keeps the stored image.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductInput {
    pub name: String,
    pub price: f64,
    pub category_id: CategoryId,
    pub image_url: Option<String>,
}
