use axum::extract::rejection::JsonRejection;
use axum::Json;
use serde::Deserialize;

use shopdesk_auth::Role;
use shopdesk_core::{require_fields, CategoryId, CustomerId, DomainError, DomainResult};
use shopdesk_infra::store::{
    CustomerFilter, CustomerInput, NewOrder, OrderFilter, OrderUpdate, ProductFilter,
    ProductInput, UserFilter, UserUpdate,
};

// Every request field is optional; `validate` reports absent and blank values
// alike as missing.

/// A JSON request body whose rejection is surfaced by the handler, after the
/// role check, as an `invalid_body` error.
pub type Body<T> = Result<Json<T>, JsonRejection>;

// -------------------------
// Auth
// -------------------------

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl RegisterRequest {
    pub fn validate(self) -> DomainResult<Registration> {
        require_fields([
            ("username", self.username.as_deref()),
            ("email", self.email.as_deref()),
            ("password", self.password.as_deref()),
        ])?;
        Ok(Registration {
            username: trimmed(self.username),
            email: trimmed(self.email),
            password: self.password.unwrap_or_default(),
        })
    }
}

// -------------------------
// Customers
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CustomerRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl CustomerRequest {
    pub fn validate(self) -> DomainResult<CustomerInput> {
        require_fields([
            ("name", self.name.as_deref()),
            ("email", self.email.as_deref()),
            ("phone", self.phone.as_deref()),
        ])?;
        Ok(CustomerInput {
            name: trimmed(self.name),
            email: trimmed(self.email),
            phone: trimmed(self.phone),
        })
    }
}

// -------------------------
// Orders
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub customer_id: Option<i64>,
    pub status: Option<String>,
    pub total: Option<f64>,
}

impl CreateOrderRequest {
    pub fn validate(self) -> DomainResult<NewOrder> {
        require_fields([("status", self.status.as_deref())])?;
        let customer_id = required("customer_id", self.customer_id)?;
        let total = amount("total", required("total", self.total)?)?;
        Ok(NewOrder {
            customer_id: CustomerId::new(customer_id),
            status: trimmed(self.status),
            total,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateOrderRequest {
    pub status: Option<String>,
    pub total: Option<f64>,
}

impl UpdateOrderRequest {
    pub fn validate(self) -> DomainResult<OrderUpdate> {
        require_fields([("status", self.status.as_deref())])?;
        let total = amount("total", required("total", self.total)?)?;
        Ok(OrderUpdate {
            status: trimmed(self.status),
            total,
        })
    }
}

// -------------------------
// Products
// -------------------------

#[derive(Debug, Deserialize)]
pub struct ProductRequest {
    pub name: Option<String>,
    pub price: Option<f64>,
    pub category_id: Option<i64>,
    pub image_url: Option<String>,
}

impl ProductRequest {
    pub fn validate(self) -> DomainResult<ProductInput> {
        require_fields([("name", self.name.as_deref())])?;
        let price = amount("price", required("price", self.price)?)?;
        let category_id = required("category_id", self.category_id)?;
        Ok(ProductInput {
            name: trimmed(self.name),
            price,
            category_id: CategoryId::new(category_id),
            image_url: self.image_url.filter(|u| !u.trim().is_empty()),
        })
    }
}

// -------------------------
// Users
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

impl CreateUserRequest {
    pub fn validate(self) -> DomainResult<NewAccount> {
        require_fields([
            ("username", self.username.as_deref()),
            ("email", self.email.as_deref()),
            ("password", self.password.as_deref()),
            ("role", self.role.as_deref()),
        ])?;
        Ok(NewAccount {
            role: parse_role(self.role.as_deref().unwrap_or_default())?,
            username: trimmed(self.username),
            email: trimmed(self.email),
            password: self.password.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
}

impl UpdateUserRequest {
    pub fn validate(self) -> DomainResult<UserUpdate> {
        require_fields([
            ("username", self.username.as_deref()),
            ("email", self.email.as_deref()),
            ("role", self.role.as_deref()),
        ])?;
        Ok(UserUpdate {
            role: parse_role(self.role.as_deref().unwrap_or_default())?,
            username: trimmed(self.username),
            email: trimmed(self.email),
        })
    }
}

// -------------------------
// List queries
// -------------------------

/// `?search=&status=&role=&category=`; each resource reads the keys it filters on.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub search: Option<String>,
    pub status: Option<String>,
    pub role: Option<String>,
    pub category: Option<String>,
}

impl ListQuery {
    fn search(&self) -> String {
        self.search.as_deref().map(str::trim).unwrap_or_default().to_string()
    }

    pub fn customer_filter(&self) -> CustomerFilter {
        CustomerFilter {
            search: self.search(),
        }
    }

    pub fn order_filter(&self) -> OrderFilter {
        OrderFilter {
            search: self.search(),
            status: non_blank(&self.status),
        }
    }

    pub fn product_filter(&self) -> DomainResult<ProductFilter> {
        let category = non_blank(&self.category)
            .map(|raw| raw.parse::<CategoryId>())
            .transpose()?;
        Ok(ProductFilter {
            search: self.search(),
            category,
        })
    }

    pub fn user_filter(&self) -> DomainResult<UserFilter> {
        let role = non_blank(&self.role).map(|raw| parse_role(&raw)).transpose()?;
        Ok(UserFilter {
            search: self.search(),
            role,
        })
    }
}

// -------------------------
// Helpers
// -------------------------

fn trimmed(value: Option<String>) -> String {
    value.map(|v| v.trim().to_string()).unwrap_or_default()
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

fn required<T>(field: &'static str, value: Option<T>) -> DomainResult<T> {
    value.ok_or_else(|| DomainError::MissingFields(vec![field]))
}

fn amount(field: &str, value: f64) -> DomainResult<f64> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(DomainError::validation(format!("{field} must be a non-negative number")))
    }
}

fn parse_role(raw: &str) -> DomainResult<Role> {
    raw.parse::<Role>()
        .map_err(|_| DomainError::validation("role must be one of: admin, editor, viewer"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn customer_request_requires_every_field() {
        let err = CustomerRequest {
            name: Some("Ada".into()),
            email: None,
            phone: Some(" ".into()),
        }
        .validate()
        .unwrap_err();
        assert_eq!(err, DomainError::MissingFields(vec!["email", "phone"]));
    }

    #[test]
    fn order_request_checks_numbers() {
        let missing = CreateOrderRequest {
            customer_id: None,
            status: Some("pending".into()),
            total: Some(10.0),
        }
        .validate()
        .unwrap_err();
        assert_eq!(missing.to_string(), "All fields are required");

        let negative = UpdateOrderRequest {
            status: Some("paid".into()),
            total: Some(-1.0),
        }
        .validate()
        .unwrap_err();
        assert!(matches!(negative, DomainError::Validation(_)));
    }

    #[test]
    fn product_request_drops_blank_image() {
        let input = ProductRequest {
            name: Some(" Lamp ".into()),
            price: Some(19.5),
            category_id: Some(2),
            image_url: Some("".into()),
        }
        .validate()
        .unwrap();
        assert_eq!(input.name, "Lamp");
        assert_eq!(input.category_id, CategoryId::new(2));
        assert_eq!(input.image_url, None);
    }

    #[test]
    fn user_requests_parse_roles() {
        let update = UpdateUserRequest {
            username: Some("bob".into()),
            email: Some("bob@example.com".into()),
            role: Some("Editor".into()),
        }
        .validate()
        .unwrap();
        assert_eq!(update.role, Role::Editor);

        let err = CreateUserRequest {
            username: Some("eve".into()),
            email: Some("eve@example.com".into()),
            password: Some("pw".into()),
            role: Some("root".into()),
        }
        .validate()
        .err()
        .unwrap();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn list_query_ignores_blank_filters() {
        let query = ListQuery {
            search: Some("  ada ".into()),
            status: Some("".into()),
            role: None,
            category: Some("3".into()),
        };
        assert_eq!(query.customer_filter().search, "ada");
        assert_eq!(query.order_filter().status, None);
        assert_eq!(query.product_filter().unwrap().category, Some(CategoryId::new(3)));

        let bad = ListQuery {
            category: Some("lamps".into()),
            ..ListQuery::default()
        };
        assert!(bad.product_filter().is_err());
    }
}
