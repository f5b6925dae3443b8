//! Operating model.
//!
//! Capacity → revenue and direct cost → multi-location synergies →
//! normalized earnings. Every stage is a pure function of its inputs.

pub mod capacity;
pub mod earnings;
pub mod revenue;
pub mod synergy;

pub use capacity::{analyze_capacity, CapacityAnalysis};
pub use earnings::{
    build_opex, maintenance_capex, normalize_earnings, EarningsBridge, NormalizedEarnings,
    OpexBreakdown,
};
pub use revenue::{build_revenue, effective_labor_rate, LineRevenue, RevenueBreakdown};
pub use synergy::{
    effective_cost_rates, rollup_synergy, EffectiveCostRates, RollupAssumptions, RollupSynergy,
    SynergySource, SynergyYear,
};

use serde::{Deserialize, Serialize};

use crate::assumptions::ValuationInputs;
use crate::config::Calibration;

/// Output of the operating stages for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperatingResults {
    pub capacity: CapacityAnalysis,
    pub revenue: RevenueBreakdown,
    pub cost_rates: EffectiveCostRates,
    pub earnings: NormalizedEarnings,
}

/// Run capacity, revenue, synergy and earnings in order.
pub fn run_operations(inputs: &ValuationInputs, calibration: &Calibration) -> OperatingResults {
    let capacity = analyze_capacity(&inputs.capacity, &inputs.service_lines);
    tracing::debug!(
        demand = capacity.demand,
        effective_capacity = capacity.effective_capacity,
        scale_factor = capacity.scale_factor,
        "Capacity analyzed"
    );

    let revenue = build_revenue(
        &inputs.service_lines,
        capacity.scale_factor,
        &inputs.operating,
        calibration.labor_rate_cap,
    );
    tracing::debug!(
        total_revenue = revenue.total_revenue,
        gross_profit = revenue.gross_profit,
        gross_margin = revenue.gross_margin().unwrap_or(0.0),
        labor_rate = revenue.effective_labor_rate,
        "Revenue built"
    );

    let cost_rates = effective_cost_rates(&inputs.operating, &calibration.synergy);
    let earnings = normalize_earnings(&revenue, &cost_rates, &inputs.operating);
    tracing::debug!(
        reported_ebitda = earnings.bridge.reported_ebitda,
        normalized_ebitda = earnings.normalized_ebitda(),
        owner_earnings = earnings.owner_earnings,
        "Earnings normalized"
    );

    OperatingResults {
        capacity,
        revenue,
        cost_rates,
        earnings,
    }
}
