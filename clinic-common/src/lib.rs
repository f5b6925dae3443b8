//! Clinic Common - Shared infrastructure for the clinic valuation workspace.
//!
//! This crate provides:
//! - Configuration locations, environment overrides, and modular file loading
//! - Input validation primitives
//! - Error types and handling utilities
//! - Logging setup and run correlation helpers

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod config;
pub mod config_loader;
pub mod error;
pub mod logging;
pub mod validation;

pub use config::ObservabilityConfig;
pub use error::{Error, Result};
pub use validation::{Validate, ValidationError, ValidationResult, Violations};

/// Re-export commonly used types for convenience
pub mod prelude {
    pub use crate::config::ObservabilityConfig;
    pub use crate::error::{Error, Result, ResultExt};
    pub use crate::logging::{generate_run_id, init_logging};
    pub use crate::validation::{Validate, ValidationError, ValidationResult, Violations};
}
