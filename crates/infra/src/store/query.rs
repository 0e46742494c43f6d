//! List filters accepted by the stores.
//!
//! Searches are case-insensitive substring matches; an empty search matches
//! everything.

use shopdesk_auth::Role;
use shopdesk_core::CategoryId;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserFilter {
    /// Matched against username or email.
    pub search: String,
    pub role: Option<Role>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomerFilter {
    /// Matched against name or email.
    pub search: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderFilter {
    /// Matched against the order id text, customer name or customer email.
    pub search: String,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    /// Matched against the product name.
    pub search: String,
    pub category: Option<CategoryId>,
}

/// `ILIKE '%needle%'` equivalent for the in-memory backend.
pub(crate) fn contains_ci(haystack: &str, needle: &str) -> bool {
    needle.is_empty() || haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Bind value for an `ILIKE` search parameter.
pub(crate) fn like_pattern(search: &str) -> String {
    format!("%{}%", search)
}
