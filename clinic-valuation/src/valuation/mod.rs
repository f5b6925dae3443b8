//! Valuation methods.
//!
//! Three independent methods value the normalized business, and a hybrid
//! blends them:
//!
//! 1. **EPV**: sustainable earnings capitalized as a zero-growth perpetuity
//! 2. **DCF**: explicit projection with decaying growth plus a Gordon-growth
//!    terminal value
//! 3. **Market multiple**: size-banded EV/EBITDA from industry benchmarks
//!
//! Every method bridges enterprise value to equity value with
//! `EV + non-operating cash − interest-bearing debt`.
//!
//! # Usage
//!
//! ```ignore
//! use clinic_valuation::valuation::ValuationEngine;
//!
//! let engine = ValuationEngine::new(&calibration);
//! let methods = engine.value_all(&inputs, &operations, &wacc, &growth)?;
//! println!("Hybrid EV: {:.0}", methods.hybrid.result.enterprise_value);
//! ```

pub mod dcf;
pub mod epv;
pub mod hybrid;
pub mod multiple;
pub mod types;

pub use dcf::{gordon_terminal_value, growth_path, value_dcf};
pub use epv::{perpetuity_value, value_epv, EpvDriver};
pub use hybrid::{select_weights, value_hybrid};
pub use multiple::value_multiple;
pub use types::*;

use serde::{Deserialize, Serialize};

use crate::assumptions::ValuationInputs;
use crate::capital::WaccBreakdown;
use crate::config::Calibration;
use crate::error::Result;
use crate::forecast::GrowthEstimate;
use crate::operations::OperatingResults;

/// All four method results for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodValuations {
    /// Base-case EPV inputs, reused by sensitivity, simulation and LBO
    pub driver: EpvDriver,
    pub epv: EpvValuation,
    pub dcf: DcfValuation,
    pub multiple: MultipleValuation,
    pub hybrid: HybridValuationResult,
}

impl MethodValuations {
    pub fn results(&self) -> [&ValuationResult; 4] {
        [
            &self.epv.result,
            &self.dcf.result,
            &self.multiple.result,
            &self.hybrid.result,
        ]
    }
}

/// Runs the valuation methods against one calibration.
pub struct ValuationEngine<'a> {
    calibration: &'a Calibration,
}

impl<'a> ValuationEngine<'a> {
    pub fn new(calibration: &'a Calibration) -> Self {
        Self { calibration }
    }

    /// DCF initial growth: caller-supplied or estimated, plus the scenario shift.
    pub fn initial_growth(&self, inputs: &ValuationInputs, growth: &GrowthEstimate) -> f64 {
        let base = inputs.dcf.initial_growth.unwrap_or(growth.growth_rate);
        base + self
            .calibration
            .scenarios
            .profile(inputs.capital.scenario)
            .growth_shift
    }

    /// Value the business under every method.
    pub fn value_all(
        &self,
        inputs: &ValuationInputs,
        operations: &OperatingResults,
        wacc: &WaccBreakdown,
        growth: &GrowthEstimate,
    ) -> Result<MethodValuations> {
        let earnings = &operations.earnings;
        let balance = inputs.balance_sheet;
        let revenue = earnings.revenue;
        let ebitda = earnings.normalized_ebitda();

        let driver = EpvDriver::from_earnings(
            earnings,
            inputs.earnings_basis,
            inputs.capital.risk_overlay.earnings_haircut,
            balance,
        );
        let epv = value_epv(&driver, wacc.scenario_wacc)?;
        tracing::debug!(
            enterprise_value = epv.result.enterprise_value,
            adjusted_earnings = epv.adjusted_earnings,
            wacc = wacc.scenario_wacc,
            "EPV computed"
        );

        let initial_growth = self.initial_growth(inputs, growth);
        let dcf = value_dcf(
            earnings,
            &inputs.dcf,
            inputs.operating.working_capital_rate,
            initial_growth,
            wacc.scenario_wacc,
            &balance,
        )?;
        tracing::debug!(
            enterprise_value = dcf.result.enterprise_value,
            initial_growth,
            terminal_value = dcf.terminal_value,
            "DCF computed"
        );

        let multiple = value_multiple(
            revenue,
            ebitda,
            inputs.operating.locations,
            &inputs.profile,
            &self.calibration.benchmarks,
            &balance,
        )?;
        tracing::debug!(
            enterprise_value = multiple.result.enterprise_value,
            multiple = multiple.selected_multiple,
            overridden = multiple.overridden,
            "Market multiple computed"
        );

        let hybrid = value_hybrid(
            &epv.result,
            &dcf.result,
            &multiple.result,
            &inputs.profile,
            &self.calibration.hybrid_weights,
            revenue,
            ebitda,
            &balance,
        );
        tracing::debug!(
            enterprise_value = hybrid.result.enterprise_value,
            methodology = %hybrid.methodology,
            "Hybrid computed"
        );

        Ok(MethodValuations {
            driver,
            epv,
            dcf,
            multiple,
            hybrid,
        })
    }
}
