//! Resource stores (users, customers, orders, catalog).

pub mod in_memory;
pub mod postgres;
pub mod query;
pub mod records;
pub mod r#trait;

pub use in_memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use query::{CustomerFilter, OrderFilter, ProductFilter, UserFilter};
pub use records::{
    Category, Customer, CustomerInput, NewOrder, NewUser, Order, OrderSummary, OrderUpdate,
    Product, ProductInput, ProductListing, UserUpdate,
};
pub use r#trait::{CatalogStore, CustomerStore, OrderStore, StoreError, StoreResult, UserStore};
