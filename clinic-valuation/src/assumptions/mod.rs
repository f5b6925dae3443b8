//! Valuation assumptions.
//!
//! The complete, immutable snapshot a caller hands to the engine. The
//! persistence layer serializes exactly this structure.

pub mod types;
mod validate;

pub use types::{
    AssetReplacement, BalanceSheet, BetaInput, CapacityAssumptions, CapitalAssumptions, CostItem,
    DataQuality, DcfAssumptions, EarningsBasis, GrowthProfile, HistoricalYear, LineKind,
    MaintenanceCapex, MethodProfile, OperatingAssumptions, PracticeType, Provider, RiskOverlay,
    Scenario, ServiceLine, SynergyProfile,
};

use serde::{Deserialize, Serialize};

/// Everything one valuation run consumes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ValuationInputs {
    pub service_lines: Vec<ServiceLine>,
    pub capacity: CapacityAssumptions,
    pub operating: OperatingAssumptions,
    pub capital: CapitalAssumptions,
    pub balance_sheet: BalanceSheet,
    pub dcf: DcfAssumptions,
    pub earnings_basis: EarningsBasis,
    pub profile: MethodProfile,
    pub practice_type: PracticeType,
    /// Reported annual history, any order
    pub history: Vec<HistoricalYear>,
}
