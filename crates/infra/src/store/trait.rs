use async_trait::async_trait;
use thiserror::Error;

use shopdesk_auth::Profile;
use shopdesk_core::{CustomerId, OrderId, ProductId, UserId};

use super::query::{CustomerFilter, OrderFilter, ProductFilter, UserFilter};
use super::records::{
    Category, Customer, CustomerInput, NewOrder, NewUser, Order, OrderSummary, OrderUpdate,
    Product, ProductInput, ProductListing, UserUpdate,
};

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A unique constraint rejected the write.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A foreign key pointed at a row that does not exist.
    #[error("referenced {0} does not exist")]
    MissingReference(&'static str),

    #[error("corrupt row: {0}")]
    Decode(String),

    #[error("store lock poisoned")]
    Poisoned,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn list_users(&self, filter: &UserFilter) -> StoreResult<Vec<Profile>>;
    async fn email_taken(&self, email: &str) -> StoreResult<bool>;
    async fn create_user(&self, user: NewUser) -> StoreResult<Profile>;
    async fn update_user(&self, id: UserId, update: UserUpdate) -> StoreResult<Option<Profile>>;
    /// Returns `false` when no row matched.
    async fn delete_user(&self, id: UserId) -> StoreResult<bool>;
}

#[async_trait]
pub trait CustomerStore: Send + Sync {
    async fn list_customers(&self, filter: &CustomerFilter) -> StoreResult<Vec<Customer>>;
    async fn create_customer(&self, input: CustomerInput) -> StoreResult<Customer>;
    async fn update_customer(&self, id: CustomerId, input: CustomerInput) -> StoreResult<Option<Customer>>;
    async fn delete_customer(&self, id: CustomerId) -> StoreResult<Option<Customer>>;
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn list_orders(&self, filter: &OrderFilter) -> StoreResult<Vec<OrderSummary>>;
    async fn create_order(&self, order: NewOrder) -> StoreResult<Order>;
    async fn update_order(&self, id: OrderId, update: OrderUpdate) -> StoreResult<Option<Order>>;
    async fn delete_order(&self, id: OrderId) -> StoreResult<Option<Order>>;
}

#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn list_products(&self, filter: &ProductFilter) -> StoreResult<Vec<ProductListing>>;
    async fn list_categories(&self) -> StoreResult<Vec<Category>>;
    async fn create_product(&self, input: ProductInput) -> StoreResult<Product>;
    async fn update_product(&self, id: ProductId, input: ProductInput) -> StoreResult<Option<Product>>;
    async fn delete_product(&self, id: ProductId) -> StoreResult<Option<Product>>;
}
