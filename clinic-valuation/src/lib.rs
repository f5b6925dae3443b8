//! Clinic Valuation Library
//!
//! A deterministic valuation engine for medical-aesthetics clinics and
//! multi-location groups. It turns operating assumptions into normalized
//! earnings, prices capital with a build-up CAPM, and values the business
//! by Earnings Power Value, DCF and market multiple, blended into a hybrid.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                    clinic-valuation (Rust Library)                   │
//! ├─────────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────┐     │
//! │  │  Operations     │  │  Capital        │  │  Valuation      │     │
//! │  │  capacity, P&L  │  │  CAPM, WACC     │  │  EPV/DCF/multi  │     │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────┘     │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────┐     │
//! │  │  Analysis       │  │  Simulation     │  │  LBO / Audit    │     │
//! │  │  grid, checks   │  │  Monte Carlo    │  │  debt, trail    │     │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────┘     │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Key Concepts
//!
//! ## Normalized earnings
//! - Demand is scaled to provider and room capacity
//! - Admin and marketing rates fall with each additional location
//! - Owner compensation and one-time items are added back to EBITDA
//!
//! ## Valuation methods
//! - **EPV**: sustainable earnings as a zero-growth perpetuity at the WACC
//! - **DCF**: decaying growth path plus a Gordon-growth terminal value
//! - **Multiple**: size-banded EV/EBITDA with location, quality and growth adjustments
//! - **Hybrid**: weighted blend chosen from the growth and synergy profile
//!
//! # Usage
//!
//! ```ignore
//! use clinic_valuation::{ValuationInputs, ValuationPipeline};
//!
//! let pipeline = ValuationPipeline::new();
//! let report = pipeline.run(&inputs)?;
//! println!("Hybrid EV: {:.0}", report.hybrid_enterprise_value());
//!
//! let mc = pipeline.simulate(&report, &pipeline.default_simulation(&report))?;
//! println!("P5-P95 equity: {:.0} - {:.0}", mc.equity.p5, mc.equity.p95);
//! ```

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod analysis;
pub mod assumptions;
pub mod audit;
pub mod capital;
pub mod config;
pub mod error;
pub mod forecast;
pub mod lbo;
pub mod operations;
pub mod pipeline;
pub mod simulation;
pub mod valuation;
pub mod warning;

pub use assumptions::ValuationInputs;
pub use audit::{AuditCategory, AuditStep, AuditTrail};
pub use config::{Calibration, EngineConfig};
pub use error::{Result, ValuationError};
pub use lbo::{LboAssumptions, LboResult};
pub use pipeline::{ValuationPipeline, ValuationReport};
pub use simulation::{MonteCarloConfig, MonteCarloResult};
pub use valuation::{MethodValuations, ValuationMethod, ValuationResult};
pub use warning::{Severity, ValuationWarning, WarningKind};
