//! Request field validation helpers.

use crate::error::{DomainError, DomainResult};

/// Check that every named field is present and not blank.
///
/// Returns `DomainError::MissingFields` listing the offending field names in
/// input order.
pub fn require_fields<'a, I>(fields: I) -> DomainResult<()>
where
    I: IntoIterator<Item = (&'static str, Option<&'a str>)>,
{
    let missing: Vec<&'static str> = fields
        .into_iter()
        .filter(|(_, value)| value.map(|v| v.trim().is_empty()).unwrap_or(true))
        .map(|(name, _)| name)
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(DomainError::MissingFields(missing))
    }
}
