//! Input validation helpers
//!
//! Centralized text length constants and validation functions. Requests are
//! validated before any storage access.

use shared::models::CustomerContact;

use crate::orders::manager::ManagerError;

// ── Text length limits ──────────────────────────────────────────────

/// Customer names, product titles
pub const MAX_NAME_LEN: usize = 200;

/// Short identifiers: phone, postal code, rider id, product id
pub const MAX_SHORT_TEXT_LEN: usize = 100;

/// Email addresses (RFC 5321)
pub const MAX_EMAIL_LEN: usize = 254;

/// URLs / image paths
pub const MAX_URL_LEN: usize = 2048;

/// Addresses
pub const MAX_ADDRESS_LEN: usize = 500;

/// Lines per order
pub const MAX_ORDER_LINES: usize = 100;

// ── Validation helpers (Order actions) ──────────────────────────────

/// Validate a required string for order actions (non-empty + max length).
pub fn validate_order_text(value: &str, field: &str, max_len: usize) -> Result<(), ManagerError> {
    check_required_text(value, field, max_len).map_err(ManagerError::Validation)
}

/// Validate a string for order actions that may be empty (max length).
pub fn validate_order_optional_text(
    value: &str,
    field: &str,
    max_len: usize,
) -> Result<(), ManagerError> {
    if value.len() > max_len {
        return Err(ManagerError::Validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            value.len()
        )));
    }
    Ok(())
}

/// Validate checkout contact fields
pub fn validate_contact(contact: &CustomerContact) -> Result<(), ManagerError> {
    validate_order_text(&contact.name, "name", MAX_NAME_LEN)?;
    validate_order_text(&contact.phone, "phone", MAX_SHORT_TEXT_LEN)?;
    validate_order_text(&contact.address, "address", MAX_ADDRESS_LEN)?;
    validate_order_text(&contact.postal_code, "postal_code", MAX_SHORT_TEXT_LEN)?;
    validate_order_text(&contact.email, "email", MAX_EMAIL_LEN)?;

    let email = contact.email.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(ManagerError::Validation(format!(
            "email is not a valid address: {email}"
        ))),
    }
}

fn check_required_text(value: &str, field: &str, max_len: usize) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{field} must not be empty"));
    }
    if value.len() > max_len {
        return Err(format!(
            "{field} is too long ({} chars, max {max_len})",
            value.len()
        ));
    }
    Ok(())
}
