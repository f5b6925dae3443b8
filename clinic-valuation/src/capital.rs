//! Cost of capital.
//!
//! CAPM cost of equity with size, industry, geographic and company-specific
//! premia, blended with after-tax cost of debt at the target capital
//! structure. The base WACC and the scenario WACC are clamped separately.

use serde::{Deserialize, Serialize};

use crate::assumptions::{BetaInput, CapitalAssumptions, Scenario};
use crate::config::{ScenarioProfiles, WaccBounds};

/// Every intermediate figure of the WACC build-up.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WaccBreakdown {
    pub beta: f64,
    pub cost_of_equity: f64,
    pub after_tax_cost_of_debt: f64,
    pub debt_weight: f64,
    /// WACC before the engine bounds
    pub unclamped_wacc: f64,
    /// WACC after the base bounds
    pub base_wacc: f64,
    pub scenario: Scenario,
    pub scenario_shift: f64,
    pub risk_premium: f64,
    /// Discount rate used by the valuation methods
    pub scenario_wacc: f64,
}

impl WaccBreakdown {
    pub fn equity_weight(&self) -> f64 {
        1.0 - self.debt_weight
    }

    pub fn is_base_clamped(&self) -> bool {
        self.unclamped_wacc != self.base_wacc
    }
}

/// `beta_unlevered × (1 + (1 − tax_rate) × D/E)`
pub fn relever_beta(unlevered: f64, tax_rate: f64, debt_to_equity: f64) -> f64 {
    unlevered * (1.0 + (1.0 - tax_rate) * debt_to_equity)
}

/// Effective levered beta for the supplied input.
pub fn effective_beta(beta: &BetaInput, tax_rate: f64) -> f64 {
    match *beta {
        BetaInput::Levered { beta } => beta,
        BetaInput::Unlevered {
            beta,
            target_debt_to_equity,
        } => relever_beta(beta, tax_rate, target_debt_to_equity),
    }
}

pub fn cost_of_equity(capital: &CapitalAssumptions, beta: f64) -> f64 {
    capital.risk_free_rate
        + beta * capital.equity_risk_premium
        + capital.size_premium
        + capital.industry_premium
        + capital.geographic_premium
        + capital.specific_premium
}

/// Compute base and scenario WACC.
pub fn compute_wacc(
    capital: &CapitalAssumptions,
    tax_rate: f64,
    bounds: &WaccBounds,
    scenarios: &ScenarioProfiles,
) -> WaccBreakdown {
    let beta = effective_beta(&capital.beta, tax_rate);
    let cost_of_equity = cost_of_equity(capital, beta);
    let after_tax_cost_of_debt = capital.cost_of_debt * (1.0 - tax_rate);

    let unclamped_wacc = capital.debt_weight * after_tax_cost_of_debt
        + (1.0 - capital.debt_weight) * cost_of_equity;
    let base_wacc = unclamped_wacc.clamp(bounds.base_floor, bounds.base_ceiling);

    let scenario_shift = scenarios.profile(capital.scenario).wacc_shift;
    let risk_premium = capital.risk_overlay.wacc_premium;
    let scenario_wacc = (base_wacc + scenario_shift + risk_premium)
        .clamp(bounds.scenario_floor, bounds.scenario_ceiling);

    WaccBreakdown {
        beta,
        cost_of_equity,
        after_tax_cost_of_debt,
        debt_weight: capital.debt_weight,
        unclamped_wacc,
        base_wacc,
        scenario: capital.scenario,
        scenario_shift,
        risk_premium,
        scenario_wacc,
    }
}
