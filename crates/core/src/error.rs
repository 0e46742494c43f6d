//! Request-level validation errors shared by every layer above the store.

use thiserror::Error;

pub type DomainResult<T> = Result<T, DomainError>;

/// Input rejected before it reaches a store. Display strings are sent to
/// clients as-is.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("{0}")]
    Validation(String),

    /// Absent or blank fields, in request order.
    #[error("All fields are required")]
    MissingFields(Vec<&'static str>),

    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn missing_fields(&self) -> &[&'static str] {
        match self {
            Self::MissingFields(fields) => fields,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_client_facing() {
        assert_eq!(DomainError::validation("price must be positive").to_string(), "price must be positive");
        assert_eq!(
            DomainError::MissingFields(vec!["email"]).to_string(),
            "All fields are required"
        );
        assert_eq!(DomainError::MissingFields(vec!["email"]).missing_fields(), ["email"]);
        assert!(DomainError::invalid_id("x").missing_fields().is_empty());
    }
}
