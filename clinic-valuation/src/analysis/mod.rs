//! Sensitivity surface and cross-validation.

pub mod cross_check;
pub mod sensitivity;

pub use cross_check::{
    cross_validate, relative_difference, CrossCheck, CrossCheckContext, CrossValidationReport,
};
pub use sensitivity::{build_sensitivity, SensitivityGrid};
