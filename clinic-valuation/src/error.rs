//! Fatal engine errors.
//!
//! Validation and denominator failures abort a computation immediately and
//! no partial result is returned. Non-fatal findings are
//! [`ValuationWarning`](crate::warning::ValuationWarning)s instead.

use clinic_common::ValidationError;
use thiserror::Error;

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, ValuationError>;

/// Fatal valuation error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValuationError {
    /// Malformed input, rejected before any computation starts
    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),

    /// Perpetuity capitalization with a WACC that is zero or negative
    #[error("Non-positive WACC ({wacc}): perpetuity value is undefined")]
    NonPositiveWacc { wacc: f64 },

    /// Any other denominator that must be strictly positive
    #[error("Non-positive denominator in {context} ({value})")]
    NonPositiveDenominator { context: &'static str, value: f64 },
}

impl ValuationError {
    /// Whether the error comes from caller input rather than the arithmetic.
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}
