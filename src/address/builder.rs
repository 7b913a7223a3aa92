//! Canonical address string composition

use crate::address::model::{AddressComponents, AddressField};
use crate::error::{validation_error, AppError};

pub const SEPARATOR: &str = ", ";

/// Every mandatory component is present unless listed in `ignore`
pub fn are_all_fields_present(data: &AddressComponents, ignore: &[AddressField]) -> bool {
    AddressField::CANONICAL_ORDER
        .into_iter()
        .filter(|f| f.is_mandatory() && !ignore.contains(f))
        .all(|f| data.get(f).is_some())
}

/// Components that block `are_all_fields_present`, in canonical order
pub fn missing_fields(data: &AddressComponents, ignore: &[AddressField]) -> Vec<AddressField> {
    AddressField::CANONICAL_ORDER
        .into_iter()
        .filter(|f| f.is_mandatory() && !ignore.contains(f) && data.get(*f).is_none())
        .collect()
}

/// Join the non-ignored, non-empty components in canonical order.
/// Performs no completeness check.
pub fn join_components(data: &AddressComponents, ignore: &[AddressField]) -> String {
    AddressField::CANONICAL_ORDER
        .into_iter()
        .filter(|f| !ignore.contains(f))
        .filter_map(|f| data.get(f))
        .collect::<Vec<_>>()
        .join(SEPARATOR)
}

/// Validation error naming the missing components, if any
pub fn ensure_complete(data: &AddressComponents, ignore: &[AddressField]) -> Result<(), AppError> {
    if are_all_fields_present(data, ignore) {
        return Ok(());
    }

    let names: Vec<&str> = missing_fields(data, ignore).iter().map(|f| f.name()).collect();
    Err(validation_error(format!(
        "address data incomplete (missing: {})",
        names.join(", ")
    )))
}

/// Compose the display/query string for an address.
///
/// Fails with a validation error, and returns nothing, when a mandatory
/// component outside `ignore` is missing.
pub fn build_full_address(data: &AddressComponents, ignore: &[AddressField]) -> Result<String, AppError> {
    ensure_complete(data, ignore)?;
    Ok(join_components(data, ignore))
}
