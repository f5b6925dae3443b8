//! Input and configuration validation.
//!
//! Every assumption struct handed to the engine implements [`Validate`].
//! Implementations push each violation into a [`Violations`] collector so a
//! caller sees all problems of one struct at once instead of the first only.

use thiserror::Error;

/// Validation error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Value {value} for {field} is outside [{min}, {max}]")]
    OutOfRange {
        field: String,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Multiple validation errors: {0:?}")]
    Multiple(Vec<ValidationError>),
}

impl ValidationError {
    /// Field names touched by this error, flattened across `Multiple`.
    pub fn fields(&self) -> Vec<&str> {
        match self {
            Self::MissingField { field }
            | Self::InvalidValue { field, .. }
            | Self::OutOfRange { field, .. } => vec![field.as_str()],
            Self::Multiple(errors) => errors.iter().flat_map(|e| e.fields()).collect(),
        }
    }
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Trait for validatable inputs and configuration sections.
pub trait Validate {
    /// Validate this value.
    fn validate(&self) -> ValidationResult<()>;
}

impl<T: Validate> Validate for [T] {
    fn validate(&self) -> ValidationResult<()> {
        let mut violations = Violations::new();
        for item in self {
            violations.merge(item.validate());
        }
        violations.finish()
    }
}

/// Accumulates validation errors and folds them into one result.
#[derive(Debug, Default)]
pub struct Violations {
    errors: Vec<ValidationError>,
}

impl Violations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error.
    pub fn push(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    /// Merge the outcome of a nested validation, flattening `Multiple`.
    pub fn merge(&mut self, result: ValidationResult<()>) {
        match result {
            Ok(()) => {}
            Err(ValidationError::Multiple(errors)) => self.errors.extend(errors),
            Err(e) => self.errors.push(e),
        }
    }

    /// Require `value` to be finite and `>= 0`.
    pub fn non_negative(&mut self, field: &str, value: f64) {
        if !value.is_finite() {
            self.push(not_finite(field, value));
        } else if value < 0.0 {
            self.push(ValidationError::InvalidValue {
                field: field.into(),
                reason: format!("must be non-negative, got {value}"),
            });
        }
    }

    /// Require `value` to be finite and `> 0`.
    pub fn positive(&mut self, field: &str, value: f64) {
        if !value.is_finite() {
            self.push(not_finite(field, value));
        } else if value <= 0.0 {
            self.push(ValidationError::InvalidValue {
                field: field.into(),
                reason: format!("must be positive, got {value}"),
            });
        }
    }

    /// Require `value` to lie in `[0, 1]`.
    pub fn fraction(&mut self, field: &str, value: f64) {
        self.in_range(field, value, 0.0, 1.0);
    }

    /// Require `value` to lie in `[min, max]`.
    pub fn in_range(&mut self, field: &str, value: f64, min: f64, max: f64) {
        if !value.is_finite() {
            self.push(not_finite(field, value));
        } else if value < min || value > max {
            self.push(ValidationError::OutOfRange {
                field: field.into(),
                value,
                min,
                max,
            });
        }
    }

    /// Require `value` to be finite.
    pub fn finite(&mut self, field: &str, value: f64) {
        if !value.is_finite() {
            self.push(not_finite(field, value));
        }
    }

    /// Record an `InvalidValue` error when `condition` is false.
    pub fn ensure(&mut self, condition: bool, field: &str, reason: impl Into<String>) {
        if !condition {
            self.push(ValidationError::InvalidValue {
                field: field.into(),
                reason: reason.into(),
            });
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Fold the collected errors: none is `Ok`, one is returned as-is,
    /// several become `Multiple`.
    pub fn finish(mut self) -> ValidationResult<()> {
        match self.errors.len() {
            0 => Ok(()),
            1 => Err(self.errors.remove(0)),
            _ => Err(ValidationError::Multiple(self.errors)),
        }
    }
}

fn not_finite(field: &str, value: f64) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.into(),
        reason: format!("must be a finite number, got {value}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use test_case::test_case;

    struct Rate(f64);

    impl Validate for Rate {
        fn validate(&self) -> ValidationResult<()> {
            let mut v = Violations::new();
            v.fraction("rate", self.0);
            v.finish()
        }
    }

    #[test]
    fn test_empty_violations_is_ok() {
        assert!(Violations::new().finish().is_ok());
    }

    #[test]
    fn test_single_violation_is_unwrapped() {
        let mut v = Violations::new();
        v.non_negative("unit_price", -1.0);
        let err = v.finish().unwrap_err();
        assert!(matches!(
            err,
            ValidationError::InvalidValue { ref field, .. } if field == "unit_price"
        ));
    }

    #[test]
    fn test_multiple_violations_are_collected() {
        let mut v = Violations::new();
        v.non_negative("unit_price", -1.0);
        v.fraction("cogs_fraction", 1.2);
        v.positive("locations", 0.0);
        let err = v.finish().unwrap_err();
        assert_eq!(err.fields(), vec!["unit_price", "cogs_fraction", "locations"]);
    }

    #[test]
    fn test_slice_validation_flattens() {
        let rates = vec![Rate(0.5), Rate(-0.1), Rate(2.0)];
        let err = rates.as_slice().validate().unwrap_err();
        match err {
            ValidationError::Multiple(errors) => assert_eq!(errors.len(), 2),
            other => panic!("expected Multiple, got {other:?}"),
        }
    }

    #[test_case(0.0, true ; "lower bound")]
    #[test_case(1.0, true ; "upper bound")]
    #[test_case(-0.0001, false ; "below")]
    #[test_case(1.0001, false ; "above")]
    #[test_case(f64::NAN, false ; "nan")]
    fn test_fraction_bounds(value: f64, ok: bool) {
        assert_eq!(Rate(value).validate().is_ok(), ok);
    }

    proptest! {
        #[test]
        fn fraction_accepts_unit_interval(x in 0.0f64..=1.0) {
            prop_assert!(Rate(x).validate().is_ok());
        }

        #[test]
        fn non_negative_rejects_negatives(x in -1.0e9f64..-1.0e-9) {
            let mut v = Violations::new();
            v.non_negative("x", x);
            prop_assert!(v.finish().is_err());
        }
    }
}
