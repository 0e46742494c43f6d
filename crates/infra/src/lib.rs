//! Infrastructure layer: the relational data store behind the HTTP API.
//!
//! Every resource is reached through a trait in [`store`]; two backends
//! implement all of them (PostgreSQL for deployments, in-memory for tests
//! and local development).

pub mod db;
pub mod store;

pub use db::{connect, DatabaseConfig};
pub use store::{
    CatalogStore, CustomerStore, InMemoryStore, OrderStore, PostgresStore, StoreError,
    StoreResult, UserStore,
};
