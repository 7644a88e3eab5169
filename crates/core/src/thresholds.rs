//! Shared numeric range helpers.
//!
//! Used by the store for structural input checks and by the validator
//! when describing out-of-range settings.

use crate::error::CoreError;

/// Upper bound on a base rate before the validator reports it as unusually high.
pub const HIGH_BASE_RATE: f64 = 5000.0;

/// Validate that a monetary or hour value is a finite number.
///
/// Returns a `CoreError::Validation` naming the field if it is NaN or infinite.
pub fn validate_finite(value: f64, name: &str) -> Result<(), CoreError> {
    if !value.is_finite() {
        return Err(CoreError::Validation(format!(
            "{name} must be a finite number, got {value}"
        )));
    }
    Ok(())
}

/// Returns `true` if a percentage lies within `[0.0, 100.0]`.
pub fn is_percent(value: f64) -> bool {
    (0.0..=100.0).contains(&value)
}

/// `validator` custom rule rejecting NaN and infinities.
pub(crate) fn finite_amount(value: f64) -> Result<(), validator::ValidationError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(validator::ValidationError::new("finite"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_finite_values() {
        assert!(validate_finite(0.0, "test").is_ok());
        assert!(validate_finite(-12.5, "test").is_ok());
        assert!(validate_finite(1e9, "test").is_ok());
    }

    #[test]
    fn rejects_nan_and_infinity() {
        assert!(validate_finite(f64::NAN, "test").is_err());
        assert!(validate_finite(f64::INFINITY, "test").is_err());
        assert!(validate_finite(f64::NEG_INFINITY, "test").is_err());
    }

    #[test]
    fn finite_amount_rule_takes_value() {
        assert!(finite_amount(42.0).is_ok());
        assert_eq!(finite_amount(f64::NAN).unwrap_err().code, "finite");
        assert!(finite_amount(f64::NEG_INFINITY).is_err());
    }

    #[test]
    fn percent_boundaries() {
        assert!(is_percent(0.0));
        assert!(is_percent(100.0));
        assert!(!is_percent(-0.01));
        assert!(!is_percent(100.01));
    }
}
