//! Caller-supplied assumption types.
//!
//! Everything here is plain immutable data built once per valuation run.
//! Mode-dependent parameters are enum payloads so an unused parameter can
//! never be silently ignored.

use serde::{Deserialize, Serialize};

// ============================================================================
// Service Lines & Capacity
// ============================================================================

/// Revenue stream category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineKind {
    /// Clinical treatment delivered by a provider
    Service,
    /// Product sold over the counter
    Retail,
}

/// One revenue stream of a single location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceLine {
    pub id: String,
    pub name: String,
    /// Average price per unit sold
    pub unit_price: f64,
    /// Units sold per year at one location
    pub annual_volume: f64,
    /// Cost of goods as a fraction of revenue, in [0, 1]
    pub cogs_fraction: f64,
    pub kind: LineKind,
    /// Appointment slots consumed per unit sold
    #[serde(default)]
    pub visit_units: f64,
    #[serde(default)]
    pub is_membership: bool,
}

impl ServiceLine {
    /// Whether this line competes for provider and room time.
    pub fn consumes_capacity(&self) -> bool {
        self.kind == LineKind::Service && !self.is_membership && self.visit_units > 0.0
    }

    /// Appointment slots demanded per year at one location.
    pub fn visit_demand(&self) -> f64 {
        if self.consumes_capacity() {
            self.visit_units * self.annual_volume
        } else {
            0.0
        }
    }
}

/// A clinical provider (or pool of identical providers).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provider {
    pub id: String,
    /// Full-time equivalents
    pub fte: f64,
    pub hours_per_week: f64,
    pub appointments_per_hour: f64,
    /// Booked share of available hours, in [0, 1]
    pub utilization: f64,
}

impl Provider {
    /// Appointment slots per year.
    pub fn annual_capacity(&self) -> f64 {
        self.fte * self.hours_per_week * self.utilization * self.appointments_per_hour * 52.0
    }
}

/// Throughput limits of one location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CapacityAssumptions {
    /// When false, demand is never scaled down
    pub enabled: bool,
    pub providers: Vec<Provider>,
    pub rooms: u32,
    pub hours_per_day: f64,
    pub days_per_week: f64,
    pub room_utilization: f64,
}

impl Default for CapacityAssumptions {
    fn default() -> Self {
        Self {
            enabled: false,
            providers: Vec::new(),
            rooms: 0,
            hours_per_day: 10.0,
            days_per_week: 6.0,
            room_utilization: 0.75,
        }
    }
}

// ============================================================================
// Operating Assumptions
// ============================================================================

/// A labelled annual amount (fixed cost or EBITDA add-back), per location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostItem {
    pub label: String,
    pub amount: f64,
}

impl CostItem {
    pub fn new(label: impl Into<String>, amount: f64) -> Self {
        Self {
            label: label.into(),
            amount,
        }
    }
}

/// Asset-replacement parameters for maintenance capex, per location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetReplacement {
    pub equipment_value: f64,
    pub equipment_replacement_years: f64,
    pub buildout_value: f64,
    pub buildout_refresh_years: f64,
    pub ffne_value: f64,
    pub ffne_refresh_years: f64,
    /// Minor maintenance as a fraction of revenue
    pub minor_maintenance_rate: f64,
}

/// How maintenance capital expenditure is estimated. Exactly one mode applies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum MaintenanceCapex {
    PercentOfRevenue { rate: f64 },
    PerLocation { amount: f64 },
    AssetReplacement(AssetReplacement),
}

impl Default for MaintenanceCapex {
    fn default() -> Self {
        Self::PercentOfRevenue { rate: 0.03 }
    }
}

/// Cost structure, add-backs, and location count.
///
/// Rates are fractions of revenue; amounts are annual and per location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OperatingAssumptions {
    pub locations: u32,
    /// Clinical labor as a fraction of service revenue before market adjustment
    pub clinical_labor_rate: f64,
    /// Local wage-market multiplier on the labor rate
    pub labor_market_adjustment: f64,
    pub marketing_rate: f64,
    pub admin_rate: f64,
    /// Management services organization fee
    pub mso_fee_rate: f64,
    pub compliance_rate: f64,
    pub fixed_costs: Vec<CostItem>,
    pub other_opex: f64,
    /// Excess owner compensation added back to EBITDA
    pub owner_addback: f64,
    /// One-time items and normalizations; negative amounts reduce EBITDA
    pub other_addbacks: Vec<CostItem>,
    pub depreciation_amortization: f64,
    pub tax_rate: f64,
    pub maintenance_capex: MaintenanceCapex,
    /// Net working capital as a fraction of revenue
    pub working_capital_rate: f64,
    /// Admin cost reduction per additional location
    pub admin_synergy_rate: f64,
    /// Marketing cost reduction per additional location
    pub marketing_synergy_rate: f64,
}

impl Default for OperatingAssumptions {
    fn default() -> Self {
        Self {
            locations: 1,
            clinical_labor_rate: 0.30,
            labor_market_adjustment: 1.0,
            marketing_rate: 0.08,
            admin_rate: 0.10,
            mso_fee_rate: 0.0,
            compliance_rate: 0.01,
            fixed_costs: Vec::new(),
            other_opex: 0.0,
            owner_addback: 0.0,
            other_addbacks: Vec::new(),
            depreciation_amortization: 0.0,
            tax_rate: 0.26,
            maintenance_capex: MaintenanceCapex::default(),
            working_capital_rate: 0.05,
            admin_synergy_rate: 0.05,
            marketing_synergy_rate: 0.05,
        }
    }
}

// ============================================================================
// Capital Assumptions
// ============================================================================

/// Valuation scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    #[default]
    Base,
    Bull,
    Bear,
}

impl std::fmt::Display for Scenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Base => write!(f, "base"),
            Self::Bull => write!(f, "bull"),
            Self::Bear => write!(f, "bear"),
        }
    }
}

/// Equity beta, supplied directly or re-levered at a target capital structure.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BetaInput {
    Levered { beta: f64 },
    Unlevered { beta: f64, target_debt_to_equity: f64 },
}

/// Risk overlays applied on top of the base case.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskOverlay {
    /// Fractional haircut on capitalized earnings, in [0, 1)
    pub earnings_haircut: f64,
    /// Additive premium on the scenario WACC
    pub wacc_premium: f64,
}

/// CAPM and capital-structure inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CapitalAssumptions {
    pub risk_free_rate: f64,
    pub equity_risk_premium: f64,
    pub beta: BetaInput,
    pub size_premium: f64,
    pub industry_premium: f64,
    pub geographic_premium: f64,
    /// Company-specific risk premium
    pub specific_premium: f64,
    /// Pre-tax cost of debt
    pub cost_of_debt: f64,
    /// Target debt share of capital, in [0, 1)
    pub debt_weight: f64,
    pub scenario: Scenario,
    pub risk_overlay: RiskOverlay,
}

impl Default for CapitalAssumptions {
    fn default() -> Self {
        Self {
            risk_free_rate: 0.045,
            equity_risk_premium: 0.055,
            beta: BetaInput::Levered { beta: 1.2 },
            size_premium: 0.05,
            industry_premium: 0.015,
            geographic_premium: 0.0,
            specific_premium: 0.03,
            cost_of_debt: 0.09,
            debt_weight: 0.25,
            scenario: Scenario::Base,
            risk_overlay: RiskOverlay::default(),
        }
    }
}

/// Balance-sheet items bridging enterprise to equity value.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BalanceSheet {
    pub non_operating_cash: f64,
    pub interest_bearing_debt: f64,
    /// Orderly-liquidation value of equipment and build-out
    pub tangible_asset_value: f64,
}

impl BalanceSheet {
    /// `enterprise_value + non_operating_cash − interest_bearing_debt`
    pub fn equity_value(&self, enterprise_value: f64) -> f64 {
        enterprise_value + self.non_operating_cash - self.interest_bearing_debt
    }
}

// ============================================================================
// Method Assumptions
// ============================================================================

/// Earnings measure capitalized by EPV.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "basis", rename_all = "snake_case")]
pub enum EarningsBasis {
    /// NOPAT + D&A − maintenance capex
    #[default]
    OwnerEarnings,
    Nopat,
    /// NOPAT − `rate` × EBIT
    NopatLessReinvestment { rate: f64 },
}

/// Explicit-period DCF parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DcfAssumptions {
    pub projection_years: u32,
    /// Near-term growth; estimated from history when absent
    pub initial_growth: Option<f64>,
    pub terminal_growth: f64,
    /// Share of the growth premium lost each year
    pub decay_rate: f64,
    pub min_growth: f64,
}

impl Default for DcfAssumptions {
    fn default() -> Self {
        Self {
            projection_years: 5,
            initial_growth: None,
            terminal_growth: 0.03,
            decay_rate: 0.3,
            min_growth: 0.0,
        }
    }
}

/// Three-level rating used by the multiple adjustments and hybrid rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrowthProfile {
    High,
    #[default]
    Moderate,
    Low,
}

impl GrowthProfile {
    /// Classify a growth rate: at least 10% is high, below 3% is low.
    pub fn from_growth_rate(rate: f64) -> Self {
        if rate >= 0.10 {
            Self::High
        } else if rate < 0.03 {
            Self::Low
        } else {
            Self::Moderate
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SynergyProfile {
    High,
    #[default]
    Moderate,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataQuality {
    High,
    #[default]
    Medium,
    Low,
}

/// Practice archetype for margin plausibility checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PracticeType {
    #[default]
    MedSpa,
    PhysicianLed,
    MultiSite,
}

impl std::fmt::Display for PracticeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MedSpa => write!(f, "med spa"),
            Self::PhysicianLed => write!(f, "physician-led practice"),
            Self::MultiSite => write!(f, "multi-site group"),
        }
    }
}

/// Qualitative profile driving multiple adjustments and hybrid weights.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MethodProfile {
    pub growth: GrowthProfile,
    pub synergy: SynergyProfile,
    pub data_quality: DataQuality,
    /// Caller-chosen EV/EBITDA multiple replacing the benchmark table
    pub multiple_override: Option<f64>,
}

/// One year of reported history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistoricalYear {
    pub year: i32,
    pub revenue: f64,
    #[serde(default)]
    pub ebitda: Option<f64>,
}
