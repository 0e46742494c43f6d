use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;

use shopdesk_auth::{CredentialRecord, CredentialStore, CredentialStoreError, Profile, Role};
use shopdesk_core::{CategoryId, CustomerId, OrderId, ProductId, UserId};

use super::query::{contains_ci, CustomerFilter, OrderFilter, ProductFilter, UserFilter};
use super::records::{
    Category, Customer, CustomerInput, NewOrder, NewUser, Order, OrderSummary, OrderUpdate,
    Product, ProductInput, ProductListing, UserUpdate,
};
use super::r#trait::{CatalogStore, CustomerStore, OrderStore, StoreError, StoreResult, UserStore};

#[derive(Debug, Clone)]
struct UserRow {
    profile: Profile,
    password_hash: Option<String>,
}

#[derive(Debug, Clone, Copy)]
struct OrderItem {
    order_id: OrderId,
    quantity: i64,
    price: f64,
}

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<UserId, UserRow>,
    customers: BTreeMap<CustomerId, Customer>,
    orders: BTreeMap<OrderId, Order>,
    order_items: Vec<OrderItem>,
    categories: BTreeMap<CategoryId, Category>,
    products: BTreeMap<ProductId, Product>,
    last_id: i64,
}

impl Tables {
    /// Serial ids, shared across tables (uniqueness is all callers rely on).
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }
}

/// In-memory relational store.
///
/// Intended for tests/dev. Mirrors the PostgreSQL queries' filtering,
/// ordering and join semantics.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Tables>> {
        self.tables.read().map_err(|_| StoreError::Poisoned)
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Tables>> {
        self.tables.write().map_err(|_| StoreError::Poisoned)
    }

    /// Create a category (categories have no HTTP write path).
    pub fn insert_category(&self, name: impl Into<String>) -> StoreResult<Category> {
        let mut t = self.write()?;
        let category = Category {
            id: CategoryId::new(t.next_id()),
            name: name.into(),
        };
        t.categories.insert(category.id, category.clone());
        Ok(category)
    }

    /// Attach a line item to an order (line items have no HTTP write path).
    pub fn insert_order_item(&self, order_id: OrderId, quantity: i64, price: f64) -> StoreResult<()> {
        let mut t = self.write()?;
        if !t.orders.contains_key(&order_id) {
            return Err(StoreError::MissingReference("order"));
        }
        t.order_items.push(OrderItem {
            order_id,
            quantity,
            price,
        });
        Ok(())
    }

    /// Provision an account whose password hash is absent.
    pub fn insert_user_without_password(
        &self,
        username: &str,
        email: &str,
        role: Role,
    ) -> StoreResult<Profile> {
        let mut t = self.write()?;
        let profile = Profile {
            id: UserId::new(t.next_id()),
            username: username.to_string(),
            email: email.to_string(),
            role,
            created_at: Some(Utc::now()),
        };
        t.users.insert(
            profile.id,
            UserRow {
                profile: profile.clone(),
                password_hash: None,
            },
        );
        Ok(profile)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Credentials
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl CredentialStore for InMemoryStore {
    async fn find_credentials(
        &self,
        email: &str,
    ) -> Result<Option<CredentialRecord>, CredentialStoreError> {
        let t = self
            .read()
            .map_err(|e| CredentialStoreError(e.to_string()))?;

        Ok(t.users
            .values()
            .find(|row| row.profile.email == email)
            .map(|row| CredentialRecord {
                id: row.profile.id,
                username: row.profile.username.clone(),
                email: row.profile.email.clone(),
                role: row.profile.role,
                password_hash: row.password_hash.clone(),
            }))
    }

    async fn find_profile(&self, id: UserId) -> Result<Option<Profile>, CredentialStoreError> {
        let t = self
            .read()
            .map_err(|e| CredentialStoreError(e.to_string()))?;
        Ok(t.users.get(&id).map(|row| row.profile.clone()))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Users
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl UserStore for InMemoryStore {
    async fn list_users(&self, filter: &UserFilter) -> StoreResult<Vec<Profile>> {
        let t = self.read()?;
        Ok(t.users
            .values()
            .map(|row| &row.profile)
            .filter(|p| contains_ci(&p.username, &filter.search) || contains_ci(&p.email, &filter.search))
            .filter(|p| filter.role.is_none_or(|role| p.role == role))
            .cloned()
            .collect())
    }

    async fn email_taken(&self, email: &str) -> StoreResult<bool> {
        let t = self.read()?;
        Ok(t.users.values().any(|row| row.profile.email == email))
    }

    async fn create_user(&self, user: NewUser) -> StoreResult<Profile> {
        let mut t = self.write()?;
        if t.users.values().any(|row| row.profile.email == user.email) {
            return Err(StoreError::Conflict(format!("email {} already exists", user.email)));
        }

        let profile = Profile {
            id: UserId::new(t.next_id()),
            username: user.username,
            email: user.email,
            role: user.role,
            created_at: Some(Utc::now()),
        };
        t.users.insert(
            profile.id,
            UserRow {
                profile: profile.clone(),
                password_hash: Some(user.password_hash),
            },
        );
        Ok(profile)
    }

    async fn update_user(&self, id: UserId, update: UserUpdate) -> StoreResult<Option<Profile>> {
        let mut t = self.write()?;
        if t.users
            .values()
            .any(|row| row.profile.id != id && row.profile.email == update.email)
        {
            return Err(StoreError::Conflict(format!("email {} already exists", update.email)));
        }

        Ok(t.users.get_mut(&id).map(|row| {
            row.profile.username = update.username;
            row.profile.email = update.email;
            row.profile.role = update.role;
            row.profile.clone()
        }))
    }

    async fn delete_user(&self, id: UserId) -> StoreResult<bool> {
        let mut t = self.write()?;
        Ok(t.users.remove(&id).is_some())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Customers
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl CustomerStore for InMemoryStore {
    async fn list_customers(&self, filter: &CustomerFilter) -> StoreResult<Vec<Customer>> {
        let t = self.read()?;
        Ok(t.customers
            .values()
            .filter(|c| contains_ci(&c.name, &filter.search) || contains_ci(&c.email, &filter.search))
            .cloned()
            .collect())
    }

    async fn create_customer(&self, input: CustomerInput) -> StoreResult<Customer> {
        let mut t = self.write()?;
        let customer = Customer {
            id: CustomerId::new(t.next_id()),
            name: input.name,
            email: input.email,
            phone: input.phone,
            created_at: Utc::now(),
        };
        t.customers.insert(customer.id, customer.clone());
        Ok(customer)
    }

    async fn update_customer(&self, id: CustomerId, input: CustomerInput) -> StoreResult<Option<Customer>> {
        let mut t = self.write()?;
        Ok(t.customers.get_mut(&id).map(|c| {
            c.name = input.name;
            c.email = input.email;
            c.phone = input.phone;
            c.clone()
        }))
    }

    async fn delete_customer(&self, id: CustomerId) -> StoreResult<Option<Customer>> {
        let mut t = self.write()?;
        if t.orders.values().any(|o| o.customer_id == id) {
            return Err(StoreError::Conflict(format!("customer {id} still has orders")));
        }
        Ok(t.customers.remove(&id))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Orders
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl OrderStore for InMemoryStore {
    async fn list_orders(&self, filter: &OrderFilter) -> StoreResult<Vec<OrderSummary>> {
        let t = self.read()?;
        let mut rows: Vec<OrderSummary> = t
            .orders
            .values()
            .filter_map(|o| {
                let customer = t.customers.get(&o.customer_id)?;
                Some((o, customer))
            })
            .filter(|(o, c)| {
                contains_ci(&o.order_id.to_string(), &filter.search)
                    || contains_ci(&c.name, &filter.search)
                    || contains_ci(&c.email, &filter.search)
            })
            .filter(|(o, _)| filter.status.as_deref().is_none_or(|s| o.status == s))
            .map(|(o, c)| OrderSummary {
                order_id: o.order_id,
                status: o.status.clone(),
                created_at: o.created_at,
                customer_name: c.name.clone(),
                customer_email: c.email.clone(),
                total: t
                    .order_items
                    .iter()
                    .filter(|item| item.order_id == o.order_id)
                    .map(|item| item.quantity as f64 * item.price)
                    .sum(),
            })
            .collect();

        rows.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.order_id.cmp(&a.order_id))
        });
        Ok(rows)
    }

    async fn create_order(&self, order: NewOrder) -> StoreResult<Order> {
        let mut t = self.write()?;
        if !t.customers.contains_key(&order.customer_id) {
            return Err(StoreError::MissingReference("customer"));
        }

        let order = Order {
            order_id: OrderId::new(t.next_id()),
            customer_id: order.customer_id,
            status: order.status,
            total: order.total,
            created_at: Utc::now(),
        };
        t.orders.insert(order.order_id, order.clone());
        Ok(order)
    }

    async fn update_order(&self, id: OrderId, update: OrderUpdate) -> StoreResult<Option<Order>> {
        let mut t = self.write()?;
        Ok(t.orders.get_mut(&id).map(|o| {
            o.status = update.status;
            o.total = update.total;
            o.clone()
        }))
    }

    async fn delete_order(&self, id: OrderId) -> StoreResult<Option<Order>> {
        let mut t = self.write()?;
        let removed = t.orders.remove(&id);
        if removed.is_some() {
            t.order_items.retain(|item| item.order_id != id);
        }
        Ok(removed)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Catalog
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl CatalogStore for InMemoryStore {
    async fn list_products(&self, filter: &ProductFilter) -> StoreResult<Vec<ProductListing>> {
        let t = self.read()?;
        Ok(t.products
            .values()
            .filter(|p| contains_ci(&p.name, &filter.search))
            .filter(|p| filter.category.is_none_or(|c| p.category_id == c))
            .filter_map(|p| {
                let category = t.categories.get(&p.category_id)?;
                Some(ProductListing {
                    id: p.id,
                    name: p.name.clone(),
                    price: p.price,
                    image_url: p.image_url.clone(),
                    category: category.name.clone(),
                    created_at: p.created_at,
                })
            })
            .collect())
    }

    async fn list_categories(&self) -> StoreResult<Vec<Category>> {
        let t = self.read()?;
        let mut categories: Vec<Category> = t.categories.values().cloned().collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn create_product(&self, input: ProductInput) -> StoreResult<Product> {
        let mut t = self.write()?;
        if !t.categories.contains_key(&input.category_id) {
            return Err(StoreError::MissingReference("category"));
        }

        let product = Product {
            id: ProductId::new(t.next_id()),
            name: input.name,
            price: input.price,
            category_id: input.category_id,
            image_url: input.image_url,
            created_at: Utc::now(),
        };
        t.products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn update_product(&self, id: ProductId, input: ProductInput) -> StoreResult<Option<Product>> {
        let mut t = self.write()?;
        if !t.products.contains_key(&id) {
            return Ok(None);
        }
        if !t.categories.contains_key(&input.category_id) {
            return Err(StoreError::MissingReference("category"));
        }

        Ok(t.products.get_mut(&id).map(|p| {
            p.name = input.name;
            p.price = input.price;
            p.category_id = input.category_id;
            if input.image_url.is_some() {
                p.image_url = input.image_url;
            }
            p.clone()
        }))
    }

    async fn delete_product(&self, id: ProductId) -> StoreResult<Option<Product>> {
        let mut t = self.write()?;
        Ok(t.products.remove(&id))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
