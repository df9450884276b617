//! Validation utilities for AutoManager
//!
//! Pure checks shared by the backend services; no database access.

use rust_decimal::Decimal;

/// A mechanic cannot log more than this many hours across all work
/// orders on a single date.
pub const MAX_HOURS_PER_DAY: i64 = 24;

// ============================================================================
// Inventory and labor validations
// ============================================================================

/// Movement quantities are strictly positive
pub fn validate_quantity(quantity: i32) -> Result<(), &'static str> {
    if quantity <= 0 {
        return Err("Quantity must be positive");
    }
    Ok(())
}

/// Hours on a single labor entry: > 0 and at most a full day
pub fn validate_hours(hours: Decimal) -> Result<(), &'static str> {
    if hours <= Decimal::ZERO {
        return Err("Hours must be positive");
    }
    if hours > Decimal::from(MAX_HOURS_PER_DAY) {
        return Err("Hours cannot exceed 24 in a single entry");
    }
    Ok(())
}

/// Daily ceiling across entries: existing + new must stay within 24 hours
pub fn validate_daily_hours(existing: Decimal, new_hours: Decimal) -> Result<(), &'static str> {
    if existing + new_hours > Decimal::from(MAX_HOURS_PER_DAY) {
        return Err("Mechanic would exceed 24 logged hours for this date");
    }
    Ok(())
}

/// Monetary amounts (prices, payments) are strictly positive
pub fn validate_amount(amount: Decimal) -> Result<(), &'static str> {
    if amount <= Decimal::ZERO {
        return Err("Amount must be positive");
    }
    Ok(())
}

// ============================================================================
// General validations
// ============================================================================

/// Validate email format (basic check)
pub fn validate_email(email: &str) -> Result<(), &'static str> {
    if email.contains('@') && email.contains('.') && email.len() >= 5 {
        Ok(())
    } else {
        Err("Invalid email format")
    }
}

/// Validate part code format (3-20 uppercase alphanumeric plus dashes)
pub fn validate_part_code(code: &str) -> Result<(), &'static str> {
    if code.len() < 3 {
        return Err("Part code must be at least 3 characters");
    }
    if code.len() > 20 {
        return Err("Part code must be at most 20 characters");
    }
    if !code
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '-')
    {
        return Err("Part code must be uppercase alphanumeric with optional dashes");
    }
    Ok(())
}

/// Validate a license plate: 5-10 characters, letters/digits/dashes
pub fn validate_plate(plate: &str) -> Result<(), &'static str> {
    let normalized: String = plate.chars().filter(|c| *c != ' ').collect();
    if normalized.len() < 5 || normalized.len() > 10 {
        return Err("Plate must be 5-10 characters");
    }
    if !normalized
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-')
    {
        return Err("Plate may only contain letters, digits and dashes");
    }
    Ok(())
}

/// Validate password strength
pub fn validate_password(password: &str) -> Result<(), &'static str> {
    if password.len() < 8 {
        return Err("Password must be at least 8 characters");
    }
    Ok(())
}

/// Validate a phone number: 7-15 digits once separators are stripped
pub fn validate_phone(phone: &str) -> Result<(), &'static str> {
    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() < 7 || digits.len() > 15 {
        return Err("Phone number must contain 7-15 digits");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn quantity_must_be_positive() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-3).is_err());
    }

    #[test]
    fn hours_bounds() {
        assert!(validate_hours(dec("0.5")).is_ok());
        assert!(validate_hours(dec("24")).is_ok());
        assert!(validate_hours(dec("0")).is_err());
        assert!(validate_hours(dec("24.5")).is_err());
    }

    #[test]
    fn daily_ceiling_inclusive() {
        assert!(validate_daily_hours(dec("20"), dec("4")).is_ok());
        assert!(validate_daily_hours(dec("20"), dec("4.5")).is_err());
        assert!(validate_daily_hours(dec("0"), dec("24")).is_ok());
    }

    #[test]
    fn plate_validation() {
        assert!(validate_plate("ABC-1234").is_ok());
        assert!(validate_plate("AB 123 CD").is_ok());
        assert!(validate_plate("AB").is_err());
        assert!(validate_plate("ABC_1234").is_err());
    }

    #[test]
    fn part_code_validation() {
        assert!(validate_part_code("FIL-001").is_ok());
        assert!(validate_part_code("AB").is_err());
        assert!(validate_part_code("fil-001").is_err());
    }
}
