//! Multi-location cost synergies and phased roll-up synergy value.

use clinic_common::{Validate, ValidationResult, Violations};
use serde::{Deserialize, Serialize};

use crate::assumptions::OperatingAssumptions;
use crate::config::SynergyConstants;

// ============================================================================
// Multi-location Cost Rates
// ============================================================================

/// Admin and marketing rates after multi-location reductions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EffectiveCostRates {
    pub admin_rate: f64,
    pub marketing_rate: f64,
    /// Fractional reduction applied to the admin rate before the floor
    pub admin_reduction: f64,
    /// Fractional reduction applied to the marketing rate before the floor
    pub marketing_reduction: f64,
}

/// Reduce admin and marketing rates for every location beyond the first.
///
/// Admin never drops below `admin_rate × admin_floor_factor`. Marketing is
/// held at or above the absolute floor, so a caller rate below the floor is
/// raised to it.
pub fn effective_cost_rates(
    operating: &OperatingAssumptions,
    constants: &SynergyConstants,
) -> EffectiveCostRates {
    let extra_sites = f64::from(operating.locations.saturating_sub(1));

    let admin_reduction =
        (extra_sites * operating.admin_synergy_rate).min(constants.admin_reduction_cap);
    let admin_rate = (operating.admin_rate * constants.admin_floor_factor)
        .max(operating.admin_rate * (1.0 - admin_reduction));

    let marketing_reduction =
        (extra_sites * operating.marketing_synergy_rate).min(constants.marketing_reduction_cap);
    let marketing_rate = constants
        .marketing_floor_rate
        .max(operating.marketing_rate * (1.0 - marketing_reduction));

    EffectiveCostRates {
        admin_rate,
        marketing_rate,
        admin_reduction,
        marketing_reduction,
    }
}

// ============================================================================
// Roll-up Synergy
// ============================================================================

/// One identified source of roll-up synergy, as a share of baseline EBITDA.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynergySource {
    pub label: String,
    pub pct: f64,
}

impl SynergySource {
    pub fn new(label: impl Into<String>, pct: f64) -> Self {
        Self {
            label: label.into(),
            pct,
        }
    }
}

/// Acquirer-side synergy assumptions.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RollupAssumptions {
    pub sources: Vec<SynergySource>,
    /// Competitive-moat adjustment added after the roll-up cap
    pub moat_adjustment: f64,
}

impl RollupAssumptions {
    pub fn raw_pct(&self) -> f64 {
        self.sources.iter().map(|s| s.pct).sum()
    }
}

impl Validate for RollupAssumptions {
    fn validate(&self) -> ValidationResult<()> {
        let mut v = Violations::new();
        for s in &self.sources {
            v.fraction(&format!("rollup.sources[{}].pct", s.label), s.pct);
        }
        v.fraction("rollup.moat_adjustment", self.moat_adjustment);
        v.finish()
    }
}

/// One phase-in year of the synergy schedule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SynergyYear {
    pub year: u32,
    /// Cumulative share of run-rate synergy realized
    pub realization: f64,
    pub realized: f64,
    pub present_value: f64,
}

/// Present value of phased roll-up synergies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollupSynergy {
    pub baseline_ebitda: f64,
    /// Raw synergy share after the roll-up cap
    pub capped_pct: f64,
    /// Moat adjustment after its own cap
    pub moat_pct: f64,
    /// `min(capped_pct + moat_pct, total_cap)`
    pub total_pct: f64,
    /// Annual synergy at full realization
    pub run_rate: f64,
    pub schedule: Vec<SynergyYear>,
    pub phase_in_pv: f64,
    /// Value of the run rate beyond the phase-in window
    pub perpetuity_pv: f64,
    pub total_pv: f64,
}

/// Cap, phase in, and discount roll-up synergies on `baseline_ebitda`.
///
/// Negative baseline EBITDA yields no synergy value.
pub fn rollup_synergy(
    baseline_ebitda: f64,
    assumptions: &RollupAssumptions,
    constants: &SynergyConstants,
) -> RollupSynergy {
    let capped_pct = assumptions.raw_pct().clamp(0.0, constants.rollup_cap);
    let moat_pct = assumptions.moat_adjustment.clamp(0.0, constants.moat_cap);
    let total_pct = (capped_pct + moat_pct).min(constants.total_cap);
    let run_rate = baseline_ebitda.max(0.0) * total_pct;

    let r = constants.discount_rate;
    let schedule: Vec<SynergyYear> = constants
        .phase_in
        .iter()
        .enumerate()
        .map(|(i, &realization)| {
            let year = i as u32 + 1;
            let realized = run_rate * realization;
            SynergyYear {
                year,
                realization,
                realized,
                present_value: realized / (1.0 + r).powi(year as i32),
            }
        })
        .collect();

    let phase_in_pv: f64 = schedule.iter().map(|y| y.present_value).sum();
    let phase_years = schedule.len() as i32;
    let perpetuity_pv = if r > 0.0 {
        run_rate / r / (1.0 + r).powi(phase_years)
    } else {
        0.0
    };

    RollupSynergy {
        baseline_ebitda,
        capped_pct,
        moat_pct,
        total_pct,
        run_rate,
        schedule,
        phase_in_pv,
        perpetuity_pv,
        total_pv: phase_in_pv + perpetuity_pv,
    }
}
