//! `shopdesk-core`: ids and input validation shared across the workspace.
//!
//! No IO lives here.

pub mod error;
pub mod id;
pub mod validate;

pub use error::{DomainError, DomainResult};
pub use id::{CategoryId, CustomerId, OrderId, ProductId, UserId};
pub use validate::require_fields;
