//! Validation utilities for Production Planner
//!
//! Field-level checks shared by the API and the browser client.

use rust_decimal::Decimal;

use crate::models::{BomLine, MATERIAL_UNITS};

/// Longest accepted material or product name
pub const MAX_NAME_LENGTH: usize = 120;

// ============================================================================
// Inventory Validations
// ============================================================================

fn validate_name(name: &str, empty: &'static str, long: &'static str) -> Result<(), &'static str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(empty);
    }
    if trimmed.chars().count() > MAX_NAME_LENGTH {
        return Err(long);
    }
    Ok(())
}

/// Validate a material name (non-blank, bounded length)
pub fn validate_material_name(name: &str) -> Result<(), &'static str> {
    validate_name(
        name,
        "Material name is required",
        "Material name must be at most 120 characters",
    )
}

/// Validate a product name (non-blank, bounded length)
pub fn validate_product_name(name: &str) -> Result<(), &'static str> {
    validate_name(
        name,
        "Product name is required",
        "Product name must be at most 120 characters",
    )
}

/// Validate a unit against the supported unit list
pub fn validate_unit(unit: &str) -> Result<(), &'static str> {
    if MATERIAL_UNITS.contains(&unit) {
        Ok(())
    } else {
        Err("Unit must be one of pcs, gram, kg, ml, liter, pack")
    }
}

/// Stock on hand cannot be negative
pub fn validate_stock_quantity(quantity: Decimal) -> Result<(), &'static str> {
    if quantity < Decimal::ZERO {
        return Err("Stock quantity cannot be negative");
    }
    Ok(())
}

pub fn validate_low_stock_threshold(threshold: Decimal) -> Result<(), &'static str> {
    if threshold < Decimal::ZERO {
        return Err("Low stock threshold cannot be negative");
    }
    Ok(())
}

/// A BOM line must consume a positive amount per portion
pub fn validate_quantity_per_portion(quantity: Decimal) -> Result<(), &'static str> {
    if quantity <= Decimal::ZERO {
        return Err("Quantity per portion must be greater than zero");
    }
    Ok(())
}

/// Validate every line of a bill of materials
///
/// An empty BOM is accepted; a product may be created before its recipe.
pub fn validate_bom(lines: &[BomLine]) -> Result<(), &'static str> {
    for line in lines {
        validate_quantity_per_portion(line.quantity_per_portion)?;
    }
    let mut ids: Vec<_> = lines.iter().map(|l| l.material_id).collect();
    ids.sort_unstable();
    if ids.windows(2).any(|w| w[0] == w[1]) {
        return Err("A material may appear only once in a bill of materials");
    }
    Ok(())
}

/// Order quantities are whole positive portions
pub fn validate_order_quantity(quantity: i64) -> Result<(), &'static str> {
    if quantity <= 0 {
        return Err("Order quantity must be greater than zero");
    }
    Ok(())
}

// ============================================================================
// General Validations
// ============================================================================

/// Validate email format (basic check)
pub fn validate_email(email: &str) -> Result<(), &'static str> {
    if email.contains('@') && email.contains('.') && email.len() >= 5 {
        Ok(())
    } else {
        Err("Invalid email format")
    }
}

/// Validate password strength
pub fn validate_password(password: &str) -> Result<(), &'static str> {
    if password.len() < 8 {
        return Err("Password must be at least 8 characters");
    }
    Ok(())
}
