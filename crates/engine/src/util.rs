//! Internal helpers for argument validation and money rounding.
//!
//! These utilities are **not** part of the public API. They centralize
//! validation and rounding so the engine enforces consistent invariants.

use uuid::Uuid;

use crate::{EngineError, ResultEngine};

/// Decimal places kept while a computation is running.
pub(crate) const INTERNAL_DECIMALS: i32 = 3;
/// Decimal places money is rounded to at the API/persistence boundary.
pub(crate) const DISPLAY_DECIMALS: i32 = 2;

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

/// Rounds a money value for the caller or the store.
pub(crate) fn to_display(value: f64) -> f64 {
    round_to(value, DISPLAY_DECIMALS)
}

/// Rounds an intermediate cost to the precision computations carry.
pub(crate) fn to_internal(value: f64) -> f64 {
    round_to(value, INTERNAL_DECIMALS)
}

/// Reject nil ids; the orchestrator never reaches the gateway with one.
pub(crate) fn require_id(id: Uuid, label: &str) -> ResultEngine<()> {
    if id.is_nil() {
        return Err(EngineError::Validation(format!("{label} id is required")));
    }
    Ok(())
}

pub(crate) fn validate_margin(profit_margin_pct: f64) -> ResultEngine<()> {
    if !profit_margin_pct.is_finite() || !(0.0..=1000.0).contains(&profit_margin_pct) {
        return Err(EngineError::Validation(
            "profit margin must be between 0 and 1000".to_string(),
        ));
    }
    Ok(())
}

pub(crate) fn validate_prep_minutes(prep_minutes: f64) -> ResultEngine<()> {
    if !prep_minutes.is_finite() || prep_minutes < 0.0 {
        return Err(EngineError::Validation(
            "preparation time cannot be negative".to_string(),
        ));
    }
    Ok(())
}

/// Parse a UUID from storage and return a labeled error on failure.
pub(crate) fn parse_uuid(value: &str, label: &str) -> ResultEngine<Uuid> {
    Uuid::parse_str(value).map_err(|_| EngineError::InvalidId(format!("invalid {label} id")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_to_fixed_decimals() {
        assert_eq!(round_to(8.354166, DISPLAY_DECIMALS), 8.35);
        assert_eq!(round_to(5.5694, DISPLAY_DECIMALS), 5.57);
        assert_eq!(round_to(1.2344, INTERNAL_DECIMALS), 1.234);
        assert_eq!(round_to(1.2356, INTERNAL_DECIMALS), 1.236);
    }

    #[test]
    fn margin_bounds() {
        assert!(validate_margin(0.0).is_ok());
        assert!(validate_margin(1000.0).is_ok());
        assert!(validate_margin(-0.1).is_err());
        assert!(validate_margin(1000.1).is_err());
        assert!(validate_margin(f64::NAN).is_err());
    }

    #[test]
    fn prep_minutes_bounds() {
        assert!(validate_prep_minutes(0.0).is_ok());
        assert!(validate_prep_minutes(90.5).is_ok());
        assert!(validate_prep_minutes(-1.0).is_err());
        assert!(validate_prep_minutes(f64::INFINITY).is_err());
    }

    #[test]
    fn nil_ids_are_rejected() {
        assert!(require_id(Uuid::nil(), "recipe").is_err());
        assert!(require_id(Uuid::new_v4(), "recipe").is_ok());
    }
}
