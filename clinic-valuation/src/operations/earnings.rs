//! EBITDA bridge and normalized earnings.
//!
//! Reported EBITDA is built bottom-up from gross profit and operating
//! expense, then normalized with owner and one-time add-backs. EBIT, NOPAT
//! and owner earnings are derived from the normalized figure.

use serde::{Deserialize, Serialize};

use super::revenue::RevenueBreakdown;
use super::synergy::EffectiveCostRates;
use crate::assumptions::{CostItem, EarningsBasis, MaintenanceCapex, OperatingAssumptions};

// ============================================================================
// Operating Expense
// ============================================================================

/// Operating expense below gross profit, across all locations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OpexBreakdown {
    pub marketing: f64,
    pub admin: f64,
    pub mso_fee: f64,
    pub compliance: f64,
    pub fixed_costs: f64,
    pub other_opex: f64,
    pub total: f64,
}

pub fn build_opex(
    revenue: f64,
    rates: &EffectiveCostRates,
    operating: &OperatingAssumptions,
) -> OpexBreakdown {
    let locations = f64::from(operating.locations);
    let marketing = rates.marketing_rate * revenue;
    let admin = rates.admin_rate * revenue;
    let mso_fee = operating.mso_fee_rate * revenue;
    let compliance = operating.compliance_rate * revenue;
    let fixed_costs = operating.fixed_costs.iter().map(|c| c.amount).sum::<f64>() * locations;
    let other_opex = operating.other_opex * locations;

    OpexBreakdown {
        marketing,
        admin,
        mso_fee,
        compliance,
        fixed_costs,
        other_opex,
        total: marketing + admin + mso_fee + compliance + fixed_costs + other_opex,
    }
}

// ============================================================================
// EBITDA Bridge
// ============================================================================

/// Reported EBITDA to normalized EBIT.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EarningsBridge {
    pub reported_ebitda: f64,
    /// Individual add-backs; negative amounts reduce EBITDA
    pub add_backs: Vec<CostItem>,
    pub normalized_ebitda: f64,
    pub da: f64,
    pub normalized_ebit: f64,
}

impl EarningsBridge {
    /// Bridge from a reported EBITDA figure and add-backs already totalled
    /// across locations.
    pub fn from_reported(reported_ebitda: f64, add_backs: Vec<CostItem>, da: f64) -> Self {
        let normalized_ebitda = reported_ebitda + add_backs.iter().map(|a| a.amount).sum::<f64>();
        Self {
            reported_ebitda,
            add_backs,
            normalized_ebitda,
            da,
            normalized_ebit: normalized_ebitda - da,
        }
    }

    pub fn total_add_backs(&self) -> f64 {
        self.normalized_ebitda - self.reported_ebitda
    }
}

/// Per-location add-backs scaled to all locations.
fn scaled_add_backs(operating: &OperatingAssumptions) -> Vec<CostItem> {
    let locations = f64::from(operating.locations);
    let mut add_backs = Vec::with_capacity(operating.other_addbacks.len() + 1);
    if operating.owner_addback != 0.0 {
        add_backs.push(CostItem::new("owner compensation", operating.owner_addback * locations));
    }
    add_backs.extend(
        operating
            .other_addbacks
            .iter()
            .map(|a| CostItem::new(a.label.clone(), a.amount * locations)),
    );
    add_backs
}

// ============================================================================
// Maintenance Capex
// ============================================================================

/// Annual maintenance capex across all locations for the selected mode.
pub fn maintenance_capex(mode: &MaintenanceCapex, revenue: f64, locations: u32) -> f64 {
    let locations = f64::from(locations);
    match mode {
        MaintenanceCapex::PercentOfRevenue { rate } => rate * revenue,
        MaintenanceCapex::PerLocation { amount } => amount * locations,
        MaintenanceCapex::AssetReplacement(a) => {
            let per_location = a.equipment_value / a.equipment_replacement_years
                + a.buildout_value / a.buildout_refresh_years
                + a.ffne_value / a.ffne_refresh_years;
            per_location * locations + a.minor_maintenance_rate * revenue
        }
    }
}

// ============================================================================
// Normalized Earnings
// ============================================================================

/// Every earnings measure the valuation methods consume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedEarnings {
    pub revenue: f64,
    pub opex: OpexBreakdown,
    pub bridge: EarningsBridge,
    pub tax_rate: f64,
    pub nopat: f64,
    pub maintenance_capex: f64,
    /// NOPAT + D&A − maintenance capex
    pub owner_earnings: f64,
}

impl NormalizedEarnings {
    pub fn normalized_ebitda(&self) -> f64 {
        self.bridge.normalized_ebitda
    }

    pub fn ebit(&self) -> f64 {
        self.bridge.normalized_ebit
    }

    pub fn da(&self) -> f64 {
        self.bridge.da
    }

    pub fn ebitda_margin(&self) -> Option<f64> {
        (self.revenue > 0.0).then(|| self.bridge.normalized_ebitda / self.revenue)
    }

    pub fn ebit_margin(&self) -> Option<f64> {
        (self.revenue > 0.0).then(|| self.bridge.normalized_ebit / self.revenue)
    }

    /// Earnings measure selected by `basis`, before any risk haircut.
    pub fn earnings_for(&self, basis: EarningsBasis) -> f64 {
        earnings_for_basis(
            basis,
            self.ebit(),
            self.tax_rate,
            self.da(),
            self.maintenance_capex,
        )
    }
}

/// Shared earnings-basis formula, also used by the simulation drivers.
pub(crate) fn earnings_for_basis(
    basis: EarningsBasis,
    ebit: f64,
    tax_rate: f64,
    da: f64,
    maintenance_capex: f64,
) -> f64 {
    let nopat = ebit * (1.0 - tax_rate);
    match basis {
        EarningsBasis::OwnerEarnings => nopat + da - maintenance_capex,
        EarningsBasis::Nopat => nopat,
        EarningsBasis::NopatLessReinvestment { rate } => nopat - rate * ebit,
    }
}

/// Build the full earnings picture from revenue and effective cost rates.
pub fn normalize_earnings(
    revenue: &RevenueBreakdown,
    rates: &EffectiveCostRates,
    operating: &OperatingAssumptions,
) -> NormalizedEarnings {
    let opex = build_opex(revenue.total_revenue, rates, operating);
    let reported_ebitda = revenue.gross_profit - opex.total;
    let da = operating.depreciation_amortization * f64::from(operating.locations);
    let bridge = EarningsBridge::from_reported(reported_ebitda, scaled_add_backs(operating), da);

    let nopat = bridge.normalized_ebit * (1.0 - operating.tax_rate);
    let capex = maintenance_capex(
        &operating.maintenance_capex,
        revenue.total_revenue,
        operating.locations,
    );

    NormalizedEarnings {
        revenue: revenue.total_revenue,
        opex,
        tax_rate: operating.tax_rate,
        nopat,
        maintenance_capex: capex,
        owner_earnings: nopat + bridge.da - capex,
        bridge,
    }
}
