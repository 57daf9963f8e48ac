//! Input checks that run ahead of the repository.
//!
//! The repository stores whatever it is given; callers that want stricter
//! input opt in by running these first.

use crate::domain::product::{ActiveFlag, NewProduct, ProductId, ProductPatch};
use crate::errors::DomainError;

pub fn validate_new_product(product: &NewProduct) -> Result<(), DomainError> {
    validate_product_id(&product.product_id)?;
    validate_active_flag(&product.is_active)
}

pub fn validate_patch(patch: &ProductPatch) -> Result<(), DomainError> {
    if patch.is_empty() {
        return Err(DomainError::InvariantViolation("update carries no fields".to_string()));
    }
    if let Some(product_id) = &patch.product_id {
        validate_product_id(product_id)?;
    }
    if let Some(is_active) = &patch.is_active {
        validate_active_flag(is_active)?;
    }
    Ok(())
}

pub fn validate_product_id(product_id: &ProductId) -> Result<(), DomainError> {
    let raw = product_id.as_str();
    if raw.trim().is_empty() {
        return Err(DomainError::InvariantViolation("productId must not be empty".to_string()));
    }
    if raw.trim() != raw {
        return Err(DomainError::InvariantViolation(format!(
            "productId `{raw}` must not have leading or trailing whitespace"
        )));
    }
    Ok(())
}

fn validate_active_flag(is_active: &ActiveFlag) -> Result<(), DomainError> {
    if is_active.as_bool().is_none() {
        return Err(DomainError::InvariantViolation(format!(
            "isActive must be a boolean, got `{}`",
            is_active.as_value()
        )));
    }
    Ok(())
}
