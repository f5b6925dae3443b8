//! Valuation result types.

use serde::{Deserialize, Serialize};

use crate::assumptions::{BalanceSheet, EarningsBasis};
use crate::config::MultipleBand;

// ============================================================================
// Common Result
// ============================================================================

/// Valuation method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValuationMethod {
    /// Earnings power value (zero-growth perpetuity)
    Epv,
    /// Discounted cash flow with Gordon-growth terminal value
    Dcf,
    /// Size-banded EV/EBITDA multiple
    Multiple,
    /// Weighted blend of the other three
    Hybrid,
}

impl std::fmt::Display for ValuationMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Epv => write!(f, "EPV"),
            Self::Dcf => write!(f, "DCF"),
            Self::Multiple => write!(f, "Market Multiple"),
            Self::Hybrid => write!(f, "Hybrid"),
        }
    }
}

/// Enterprise and equity value under one method.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValuationResult {
    pub method: ValuationMethod,
    pub enterprise_value: f64,
    pub equity_value: f64,
    /// EV / revenue; `None` when revenue is not positive
    pub implied_ev_revenue: Option<f64>,
    /// EV / normalized EBITDA; `None` when EBITDA is not positive
    pub implied_ev_ebitda: Option<f64>,
}

impl ValuationResult {
    pub fn new(
        method: ValuationMethod,
        enterprise_value: f64,
        revenue: f64,
        ebitda: f64,
        balance: &BalanceSheet,
    ) -> Self {
        Self {
            method,
            enterprise_value,
            equity_value: balance.equity_value(enterprise_value),
            implied_ev_revenue: ratio(enterprise_value, revenue),
            implied_ev_ebitda: ratio(enterprise_value, ebitda),
        }
    }
}

fn ratio(numerator: f64, denominator: f64) -> Option<f64> {
    (denominator > 0.0).then(|| numerator / denominator)
}

// ============================================================================
// Method Details
// ============================================================================

/// EPV result with its capitalization inputs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpvValuation {
    pub result: ValuationResult,
    pub basis: EarningsBasis,
    /// Earnings before the risk haircut
    pub base_earnings: f64,
    pub risk_haircut: f64,
    /// `base_earnings × (1 − risk_haircut)`
    pub adjusted_earnings: f64,
    pub wacc: f64,
}

/// One explicit-period year of the DCF.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DcfYear {
    pub year: u32,
    pub growth: f64,
    pub revenue: f64,
    pub ebit: f64,
    pub nopat: f64,
    pub da: f64,
    pub capex: f64,
    pub working_capital_change: f64,
    pub free_cash_flow: f64,
    pub discount_factor: f64,
    pub present_value: f64,
}

/// DCF result with the projection and terminal value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DcfValuation {
    pub result: ValuationResult,
    pub initial_growth: f64,
    pub terminal_growth: f64,
    pub wacc: f64,
    pub years: Vec<DcfYear>,
    pub pv_explicit: f64,
    pub terminal_fcf: f64,
    pub terminal_value: f64,
    pub pv_terminal: f64,
}

impl DcfValuation {
    /// Share of enterprise value coming from the terminal value.
    pub fn terminal_value_share(&self) -> Option<f64> {
        (self.result.enterprise_value > 0.0)
            .then(|| self.pv_terminal / self.result.enterprise_value)
    }
}

/// Market multiple result with the selection path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MultipleValuation {
    pub result: ValuationResult,
    pub band: MultipleBand,
    pub location_factor: f64,
    pub data_quality_factor: f64,
    pub growth_factor: f64,
    /// Multiple applied to normalized EBITDA
    pub selected_multiple: f64,
    /// The caller supplied the multiple directly
    pub overridden: bool,
}

// ============================================================================
// Hybrid
// ============================================================================

/// Weights of the three methods in the hybrid blend.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MethodWeights {
    pub epv: f64,
    pub dcf: f64,
    pub multiple: f64,
}

impl MethodWeights {
    pub const fn new(epv: f64, dcf: f64, multiple: f64) -> Self {
        Self { epv, dcf, multiple }
    }

    pub fn sum(&self) -> f64 {
        self.epv + self.dcf + self.multiple
    }

    /// Non-negative and summing to 1 within 1e-9.
    pub fn is_normalized(&self) -> bool {
        self.epv >= 0.0
            && self.dcf >= 0.0
            && self.multiple >= 0.0
            && (self.sum() - 1.0).abs() <= 1e-9
    }
}

/// Which weight set the rule table selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Methodology {
    GrowthBiased,
    Balanced,
    Conservative,
}

impl std::fmt::Display for Methodology {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::GrowthBiased => write!(f, "Growth-biased (DCF-weighted)"),
            Self::Balanced => write!(f, "Balanced"),
            Self::Conservative => write!(f, "Conservative (EPV-weighted)"),
        }
    }
}

/// Weighted blend of EPV, DCF and market multiple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HybridValuationResult {
    pub result: ValuationResult,
    pub weights: MethodWeights,
    pub methodology: Methodology,
    /// EPV, DCF and multiple results in that order
    pub components: [ValuationResult; 3],
}

impl HybridValuationResult {
    /// Human-readable methodology label.
    pub fn label(&self) -> String {
        format!(
            "{} hybrid: {:.0}% EPV / {:.0}% DCF / {:.0}% multiple",
            self.methodology,
            self.weights.epv * 100.0,
            self.weights.dcf * 100.0,
            self.weights.multiple * 100.0
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_ratios() {
        let bs = BalanceSheet {
            non_operating_cash: 100_000.0,
            interest_bearing_debt: 300_000.0,
            tangible_asset_value: 0.0,
        };
        let r = ValuationResult::new(
            ValuationMethod::Epv,
            5_000_000.0,
            4_000_000.0,
            1_000_000.0,
            &bs,
        );
        assert_eq!(r.equity_value, 4_800_000.0);
        assert_eq!(r.implied_ev_revenue, Some(1.25));
        assert_eq!(r.implied_ev_ebitda, Some(5.0));

        let r = ValuationResult::new(ValuationMethod::Epv, 5_000_000.0, 0.0, -10.0, &bs);
        assert!(r.implied_ev_revenue.is_none());
        assert!(r.implied_ev_ebitda.is_none());
    }

    #[test]
    fn test_weights_normalized() {
        assert!(MethodWeights::new(0.4, 0.3, 0.3).is_normalized());
        assert!(!MethodWeights::new(0.5, 0.3, 0.3).is_normalized());
        assert!(!MethodWeights::new(1.2, -0.1, -0.1).is_normalized());
    }
}
