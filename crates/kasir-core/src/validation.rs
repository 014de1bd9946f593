//! # Validation Module
//!
//! Input validators used at the API boundary before business logic runs.
//! Database constraints (NOT NULL, UNIQUE, foreign keys) are the last
//! line of defense; these catch bad input with a usable message first.

use crate::error::ValidationError;
use crate::MAX_LINE_QUANTITY;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a product or category name: non-empty, at most 200 chars.
pub fn validate_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.len() > 200 {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates a barcode: digits only, 4 to 20 characters.
///
/// Covers EAN-8/EAN-13/UPC plus the in-house short codes on loose items.
pub fn validate_barcode(barcode: &str) -> ValidationResult<()> {
    let barcode = barcode.trim();

    if barcode.is_empty() {
        return Err(ValidationError::Required {
            field: "barcode".to_string(),
        });
    }

    if barcode.len() < 4 || barcode.len() > 20 || !barcode.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidFormat {
            field: "barcode".to_string(),
            reason: "must be 4-20 digits".to_string(),
        });
    }

    Ok(())
}

/// Validates a member code: "MBR" followed by digits.
pub fn validate_member_code(code: &str) -> ValidationResult<()> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "member code".to_string(),
        });
    }

    let digits = code.strip_prefix("MBR").unwrap_or("");
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidFormat {
            field: "member code".to_string(),
            reason: "must look like MBR001".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity: positive, at most [`MAX_LINE_QUANTITY`].
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_LINE_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a price amount: non-negative (zero allowed for giveaways).
pub fn validate_price(amount: i64) -> ValidationResult<()> {
    if amount < 0 {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a discount-rate fraction: within [0, 1].
pub fn validate_rate_fraction(field: &str, fraction: f64) -> ValidationResult<()> {
    if !fraction.is_finite() || !(0.0..=1.0).contains(&fraction) {
        return Err(ValidationError::InvalidRate {
            field: field.to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_name_rules() {
        assert!(validate_name("Pulpen Pilot G2").is_ok());
        assert!(validate_name("").is_err());
        assert!(validate_name("   ").is_err());
        assert!(validate_name(&"A".repeat(300)).is_err());
    }

    #[test]
    fn validate_barcode_rules() {
        assert!(validate_barcode("8991234567890").is_ok());
        assert!(validate_barcode("1001").is_ok());
        assert!(validate_barcode("").is_err());
        assert!(validate_barcode("123").is_err());
        assert!(validate_barcode("abc1234").is_err());
        assert!(validate_barcode(&"9".repeat(25)).is_err());
    }

    #[test]
    fn validate_member_code_rules() {
        assert!(validate_member_code("MBR001").is_ok());
        assert!(validate_member_code("MBR12345").is_ok());
        assert!(validate_member_code("").is_err());
        assert!(validate_member_code("MBR").is_err());
        assert!(validate_member_code("ABC001").is_err());
        assert!(validate_member_code("MBR00x").is_err());
    }

    #[test]
    fn validate_quantity_rules() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(1000).is_err());
    }

    #[test]
    fn validate_price_rules() {
        assert!(validate_price(0).is_ok());
        assert!(validate_price(5_500).is_ok());
        assert!(validate_price(-100).is_err());
    }

    #[test]
    fn validate_rate_fraction_rules() {
        assert!(validate_rate_fraction("tax_rate", 0.11).is_ok());
        assert!(validate_rate_fraction("tax_rate", 0.0).is_ok());
        assert!(validate_rate_fraction("tax_rate", 1.0).is_ok());
        assert!(validate_rate_fraction("tax_rate", 1.01).is_err());
        assert!(validate_rate_fraction("tax_rate", -0.1).is_err());
        assert!(validate_rate_fraction("tax_rate", f64::NAN).is_err());
    }
}
