//! Shared validation helpers.
//!
//! Clinical records implement [`Validate`]: a pure check of the full candidate record that
//! returns every violated rule. Validation never looks at previously stored state, so the result
//! does not depend on the order in which fields were edited.

use crate::error::{CareError, CareResult, FieldError};
use chrono::{DateTime, Utc};

/// A record that can be checked against its cross-field rules.
pub trait Validate {
    /// Returns every rule the record violates. An empty list means the record is valid.
    fn validate(&self) -> Vec<FieldError>;

    /// Converts the result of [`Validate::validate`] into a `CareResult`.
    ///
    /// # Errors
    ///
    /// Returns [`CareError::Validation`] carrying all field errors if any rule is violated.
    fn ensure_valid(&self) -> CareResult<()> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(CareError::Validation(errors))
        }
    }
}

/// Checks that a half-open window `[start, end)` is non-empty.
///
/// # Errors
///
/// Returns [`CareError::InvalidWindow`] if `end <= start`.
pub fn validate_window(start: DateTime<Utc>, end: DateTime<Utc>) -> CareResult<()> {
    if end <= start {
        return Err(CareError::InvalidWindow { start, end });
    }
    Ok(())
}

/// Checks that an optional end time falls strictly after the start time.
pub fn check_end_after_start(
    field: &'static str,
    start: DateTime<Utc>,
    end: Option<DateTime<Utc>>,
) -> Option<FieldError> {
    match end {
        Some(end) if end <= start => Some(FieldError::InvalidWindow { field, start, end }),
        _ => None,
    }
}

/// Checks that a quantity is a finite number greater than zero.
pub fn check_positive(field: &'static str, value: f64) -> Option<FieldError> {
    if value.is_finite() && value > 0.0 {
        None
    } else {
        Some(FieldError::NonPositiveAmount { field, value })
    }
}

/// Validates a latitude/longitude pair.
///
/// # Errors
///
/// Returns [`CareError::InvalidCoordinates`] if either value is non-finite or out of range.
pub fn validate_coordinates(latitude: f64, longitude: f64) -> CareResult<()> {
    let ok = latitude.is_finite()
        && longitude.is_finite()
        && (-90.0..=90.0).contains(&latitude)
        && (-180.0..=180.0).contains(&longitude);

    if !ok {
        return Err(CareError::InvalidCoordinates {
            latitude,
            longitude,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 10, h, m, 0).unwrap()
    }

    #[test]
    fn window_rejects_empty_and_reversed() {
        assert!(validate_window(at(9, 0), at(10, 0)).is_ok());
        assert!(matches!(
            validate_window(at(9, 0), at(9, 0)),
            Err(CareError::InvalidWindow { .. })
        ));
        assert!(matches!(
            validate_window(at(10, 0), at(9, 0)),
            Err(CareError::InvalidWindow { .. })
        ));
    }

    #[test]
    fn end_after_start_ignores_missing_end() {
        assert_eq!(check_end_after_start("end_time", at(9, 0), None), None);
        assert!(check_end_after_start("end_time", at(9, 0), Some(at(8, 59))).is_some());
    }

    #[test]
    fn positive_rejects_zero_and_nan() {
        assert!(check_positive("dose", 0.0).is_some());
        assert!(check_positive("dose", f64::NAN).is_some());
        assert!(check_positive("dose", 0.5).is_none());
    }

    #[test]
    fn coordinates_are_range_checked() {
        assert!(validate_coordinates(51.5, -0.12).is_ok());
        assert!(validate_coordinates(91.0, 0.0).is_err());
        assert!(validate_coordinates(0.0, -180.5).is_err());
        assert!(validate_coordinates(f64::NAN, 0.0).is_err());
    }
}
