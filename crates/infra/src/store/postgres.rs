//! PostgreSQL-backed store.
//!
//! The schema is owned outside this crate. Expected shape: `BIGSERIAL` ids,
//! `TIMESTAMPTZ` timestamps, `NUMERIC` money columns (read back as `float8`),
//! and `users.email` unique.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError |
//! |------------|----------------------|------------|
//! | Database (unique violation) | `23505` | `Conflict` |
//! | Database (foreign key violation) on insert/update | `23503` | `MissingReference` |
//! | Database (foreign key violation) on delete | `23503` | `Conflict` |
//! | Anything else | N/A | `Database` |

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::instrument;

use shopdesk_auth::{CredentialRecord, CredentialStore, CredentialStoreError, Profile, Role};
use shopdesk_core::{CustomerId, OrderId, ProductId, UserId};

use super::query::{like_pattern, CustomerFilter, OrderFilter, ProductFilter, UserFilter};
use super::records::{
    Category, Customer, CustomerInput, NewOrder, NewUser, Order, OrderSummary, OrderUpdate,
    Product, ProductInput, ProductListing, UserUpdate,
};
use super::r#trait::{CatalogStore, CustomerStore, OrderStore, StoreError, StoreResult, UserStore};

/// PostgreSQL store for every resource.
///
/// `Send + Sync`; all access goes through the SQLx connection pool.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: Arc<PgPool>,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

const PROFILE_COLUMNS: &str = "id, username, email, role, created_at";
const ORDER_COLUMNS: &str = "order_id, customer_id, status, total::float8 AS total, created_at";
const PRODUCT_COLUMNS: &str =
    "id, name, price::float8 AS price, category_id, image_url, created_at";

// ─────────────────────────────────────────────────────────────────────────────
// Row mapping
// ─────────────────────────────────────────────────────────────────────────────

fn role_from_row(row: &PgRow) -> StoreResult<Role> {
    let raw: String = row.try_get("role")?;
    raw.parse::<Role>()
        .map_err(|e| StoreError::Decode(e.to_string()))
}

fn profile_from_row(row: &PgRow) -> StoreResult<Profile> {
    Ok(Profile {
        id: UserId::new(row.try_get("id")?),
        username: row.try_get("username")?,
        email: row.try_get("email")?,
        role: role_from_row(row)?,
        created_at: Some(row.try_get("created_at")?),
    })
}

fn customer_from_row(row: &PgRow) -> StoreResult<Customer> {
    Ok(Customer {
        id: CustomerId::new(row.try_get("id")?),
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        phone: row.try_get("phone")?,
        created_at: row.try_get("created_at")?,
    })
}

fn order_from_row(row: &PgRow) -> StoreResult<Order> {
    Ok(Order {
        order_id: OrderId::new(row.try_get("order_id")?),
        customer_id: CustomerId::new(row.try_get("customer_id")?),
        status: row.try_get("status")?,
        total: row.try_get("total")?,
        created_at: row.try_get("created_at")?,
    })
}

fn product_from_row(row: &PgRow) -> StoreResult<Product> {
    Ok(Product {
        id: ProductId::new(row.try_get("id")?),
        name: row.try_get("name")?,
        price: row.try_get("price")?,
        category_id: row.try_get::<i64, _>("category_id")?.into(),
        image_url: row.try_get("image_url")?,
        created_at: row.try_get("created_at")?,
    })
}

fn sqlstate(e: &sqlx::Error) -> Option<String> {
    e.as_database_error()
        .and_then(|db| db.code())
        .map(|code| code.into_owned())
}

fn map_write_error(e: sqlx::Error, reference: &'static str) -> StoreError {
    match sqlstate(&e).as_deref() {
        Some("23505") => StoreError::Conflict(e.to_string()),
        Some("23503") => StoreError::MissingReference(reference),
        _ => StoreError::Database(e),
    }
}

fn map_delete_error(e: sqlx::Error) -> StoreError {
    match sqlstate(&e).as_deref() {
        Some("23503") => StoreError::Conflict(format!("row is still referenced: {e}")),
        _ => StoreError::Database(e),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Credentials
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl CredentialStore for PostgresStore {
    #[instrument(skip(self), err)]
    async fn find_credentials(
        &self,
        email: &str,
    ) -> Result<Option<CredentialRecord>, CredentialStoreError> {
        let row = sqlx::query(
            "SELECT id, username, email, role, password_hash FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| CredentialStoreError(e.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let record = (|| -> StoreResult<CredentialRecord> {
            Ok(CredentialRecord {
                id: UserId::new(row.try_get("id")?),
                username: row.try_get("username")?,
                email: row.try_get("email")?,
                role: role_from_row(&row)?,
                password_hash: row.try_get("password_hash")?,
            })
        })()
        .map_err(|e| CredentialStoreError(e.to_string()))?;

        Ok(Some(record))
    }

    #[instrument(skip(self), err)]
    async fn find_profile(&self, id: UserId) -> Result<Option<Profile>, CredentialStoreError> {
        let row = sqlx::query(&format!("SELECT {PROFILE_COLUMNS} FROM users WHERE id = $1"))
            .bind(id.get())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| CredentialStoreError(e.to_string()))?;

        row.as_ref()
            .map(profile_from_row)
            .transpose()
            .map_err(|e| CredentialStoreError(e.to_string()))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Users
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl UserStore for PostgresStore {
    #[instrument(skip(self), err)]
    async fn list_users(&self, filter: &UserFilter) -> StoreResult<Vec<Profile>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {PROFILE_COLUMNS}
            FROM users
            WHERE (username ILIKE $1 OR email ILIKE $1)
              AND ($2::text IS NULL OR role = $2)
            ORDER BY id ASC
            "#
        ))
        .bind(like_pattern(&filter.search))
        .bind(filter.role.map(|r| r.as_str()))
        .fetch_all(&*self.pool)
        .await?;

        rows.iter().map(profile_from_row).collect()
    }

    #[instrument(skip(self), err)]
    async fn email_taken(&self, email: &str) -> StoreResult<bool> {
        let taken: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE email = $1)")
            .bind(email)
            .fetch_one(&*self.pool)
            .await?;
        Ok(taken)
    }

    #[instrument(skip(self, user), fields(email = %user.email, role = %user.role), err)]
    async fn create_user(&self, user: NewUser) -> StoreResult<Profile> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO users (username, email, password_hash, role)
            VALUES ($1, $2, $3, $4)
            RETURNING {PROFILE_COLUMNS}
            "#
        ))
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_write_error(e, "user"))?;

        profile_from_row(&row)
    }

    #[instrument(skip(self), err)]
    async fn update_user(&self, id: UserId, update: UserUpdate) -> StoreResult<Option<Profile>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE users SET username = $1, email = $2, role = $3
            WHERE id = $4
            RETURNING {PROFILE_COLUMNS}
            "#
        ))
        .bind(&update.username)
        .bind(&update.email)
        .bind(update.role.as_str())
        .bind(id.get())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_write_error(e, "user"))?;

        row.as_ref().map(profile_from_row).transpose()
    }

    #[instrument(skip(self), err)]
    async fn delete_user(&self, id: UserId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id.get())
            .execute(&*self.pool)
            .await
            .map_err(map_delete_error)?;
        Ok(result.rows_affected() > 0)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Customers
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl CustomerStore for PostgresStore {
    #[instrument(skip(self), err)]
    async fn list_customers(&self, filter: &CustomerFilter) -> StoreResult<Vec<Customer>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, email, phone, created_at
            FROM customers
            WHERE name ILIKE $1 OR email ILIKE $1
            ORDER BY id ASC
            "#,
        )
        .bind(like_pattern(&filter.search))
        .fetch_all(&*self.pool)
        .await?;

        rows.iter().map(customer_from_row).collect()
    }

    #[instrument(skip(self), err)]
    async fn create_customer(&self, input: CustomerInput) -> StoreResult<Customer> {
        let row = sqlx::query(
            r#"
            INSERT INTO customers (name, email, phone)
            VALUES ($1, $2, $3)
            RETURNING id, name, email, phone, created_at
            "#,
        )
        .bind(&input.name)
        .bind(&input.email)
        .bind(&input.phone)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_write_error(e, "customer"))?;

        customer_from_row(&row)
    }

    #[instrument(skip(self), err)]
    async fn update_customer(&self, id: CustomerId, input: CustomerInput) -> StoreResult<Option<Customer>> {
        let row = sqlx::query(
            r#"
            UPDATE customers SET name = $1, email = $2, phone = $3
            WHERE id = $4
            RETURNING id, name, email, phone, created_at
            "#,
        )
        .bind(&input.name)
        .bind(&input.email)
        .bind(&input.phone)
        .bind(id.get())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_write_error(e, "customer"))?;

        row.as_ref().map(customer_from_row).transpose()
    }

    #[instrument(skip(self), err)]
    async fn delete_customer(&self, id: CustomerId) -> StoreResult<Option<Customer>> {
        let row = sqlx::query(
            "DELETE FROM customers WHERE id = $1 RETURNING id, name, email, phone, created_at",
        )
        .bind(id.get())
        .fetch_optional(&*self.pool)
        .await
        .map_err(map_delete_error)?;

        row.as_ref().map(customer_from_row).transpose()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Orders
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl OrderStore for PostgresStore {
    #[instrument(skip(self), err)]
    async fn list_orders(&self, filter: &OrderFilter) -> StoreResult<Vec<OrderSummary>> {
        let rows = sqlx::query(
            r#"
            SELECT o.order_id, o.status, o.created_at,
                   c.name AS customer_name, c.email AS customer_email,
                   COALESCE(SUM(oi.quantity * oi.price), 0)::float8 AS total
            FROM orders o
            JOIN customers c ON o.customer_id = c.id
            LEFT JOIN order_items oi ON oi.order_id = o.order_id
            WHERE ($1::text = ''
                   OR CAST(o.order_id AS TEXT) ILIKE $2
                   OR c.name ILIKE $2
                   OR c.email ILIKE $2)
              AND ($3::text IS NULL OR o.status = $3)
            GROUP BY o.order_id, c.name, c.email
            ORDER BY o.created_at DESC
            "#,
        )
        .bind(&filter.search)
        .bind(like_pattern(&filter.search))
        .bind(filter.status.as_deref())
        .fetch_all(&*self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(OrderSummary {
                    order_id: OrderId::new(row.try_get("order_id")?),
                    status: row.try_get("status")?,
                    created_at: row.try_get("created_at")?,
                    customer_name: row.try_get("customer_name")?,
                    customer_email: row.try_get("customer_email")?,
                    total: row.try_get("total")?,
                })
            })
            .collect()
    }

    #[instrument(skip(self), err)]
    async fn create_order(&self, order: NewOrder) -> StoreResult<Order> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO orders (customer_id, status, total, created_at)
            VALUES ($1, $2, $3, NOW())
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(order.customer_id.get())
        .bind(&order.status)
        .bind(order.total)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_write_error(e, "customer"))?;

        order_from_row(&row)
    }

    #[instrument(skip(self), err)]
    async fn update_order(&self, id: OrderId, update: OrderUpdate) -> StoreResult<Option<Order>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE orders SET status = $1, total = $2
            WHERE order_id = $3
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(&update.status)
        .bind(update.total)
        .bind(id.get())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_write_error(e, "order"))?;

        row.as_ref().map(order_from_row).transpose()
    }

    #[instrument(skip(self), err)]
    async fn delete_order(&self, id: OrderId) -> StoreResult<Option<Order>> {
        let row = sqlx::query(&format!(
            "DELETE FROM orders WHERE order_id = $1 RETURNING {ORDER_COLUMNS}"
        ))
        .bind(id.get())
        .fetch_optional(&*self.pool)
        .await
        .map_err(map_delete_error)?;

        row.as_ref().map(order_from_row).transpose()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Catalog
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl CatalogStore for PostgresStore {
    #[instrument(skip(self), err)]
    async fn list_products(&self, filter: &ProductFilter) -> StoreResult<Vec<ProductListing>> {
        let rows = sqlx::query(
            r#"
            SELECT p.id, p.name, p.price::float8 AS price, p.image_url,
                   c.name AS category, p.created_at
            FROM products p
            JOIN categories c ON p.category_id = c.id
            WHERE p.name ILIKE $1
              AND ($2::bigint IS NULL OR p.category_id = $2)
            ORDER BY p.id ASC
            "#,
        )
        .bind(like_pattern(&filter.search))
        .bind(filter.category.map(|c| c.get()))
        .fetch_all(&*self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(ProductListing {
                    id: ProductId::new(row.try_get("id")?),
                    name: row.try_get("name")?,
                    price: row.try_get("price")?,
                    image_url: row.try_get("image_url")?,
                    category: row.try_get("category")?,
                    created_at: row.try_get("created_at")?,
                })
            })
            .collect()
    }

    #[instrument(skip(self), err)]
    async fn list_categories(&self) -> StoreResult<Vec<Category>> {
        let rows = sqlx::query("SELECT id, name FROM categories ORDER BY name ASC")
            .fetch_all(&*self.pool)
            .await?;

        rows.iter()
            .map(|row| {
                Ok(Category {
                    id: row.try_get::<i64, _>("id")?.into(),
                    name: row.try_get("name")?,
                })
            })
            .collect()
    }

    #[instrument(skip(self), err)]
    async fn create_product(&self, input: ProductInput) -> StoreResult<Product> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO products (name, price, category_id, image_url)
            VALUES ($1, $2, $3, $4)
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(&input.name)
        .bind(input.price)
        .bind(input.category_id.get())
        .bind(input.image_url.as_deref())
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_write_error(e, "category"))?;

        product_from_row(&row)
    }

    #[instrument(skip(self), err)]
    async fn update_product(&self, id: ProductId, input: ProductInput) -> StoreResult<Option<Product>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE products
            SET name = $1, price = $2, category_id = $3, image_url = COALESCE($4, image_url)
            WHERE id = $5
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(&input.name)
        .bind(input.price)
        .bind(input.category_id.get())
        .bind(input.image_url.as_deref())
        .bind(id.get())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_write_error(e, "category"))?;

        row.as_ref().map(product_from_row).transpose()
    }

    #[instrument(skip(self), err)]
    async fn delete_product(&self, id: ProductId) -> StoreResult<Option<Product>> {
        let row = sqlx::query(&format!(
            "DELETE FROM products WHERE id = $1 RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(id.get())
        .fetch_optional(&*self.pool)
        .await
        .map_err(map_delete_error)?;

        row.as_ref().map(product_from_row).transpose()
    }
}
