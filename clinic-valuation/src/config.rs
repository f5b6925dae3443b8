//! Engine configuration and calibration constants.
//!
//! Every design constant the formulas depend on lives in [`Calibration`]
//! with defaults matching the medical-aesthetics benchmarks. Callers may
//! override any of them through the layered JSON files or directly.
//!
//! Several defaults (admin floor factor, industry premium, moat cap) are
//! calibration choices without a published derivation and should be
//! reviewed by a domain expert before being relied on.

use anyhow::Result;
use clinic_common::config::{env_parse, ObservabilityConfig};
use clinic_common::config_loader::load_typed;
use clinic_common::error::ResultExt;
use clinic_common::{Validate, ValidationError, ValidationResult, Violations};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::assumptions::{DataQuality, GrowthProfile, PracticeType, Scenario};
use crate::valuation::types::MethodWeights;

// ============================================================================
// Top-level Configuration
// ============================================================================

/// Full engine configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub observability: ObservabilityConfig,
    pub calibration: Calibration,
    pub simulation: SimulationDefaults,
}

impl EngineConfig {
    /// Load from the default configuration directory.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load from `dir` (or the default directory), apply environment
    /// overrides, and validate.
    pub fn load_from(dir: Option<PathBuf>) -> Result<Self> {
        let mut config: Self = load_typed(dir)?;
        config.apply_env_overrides();
        config.validate().context("Invalid engine configuration")?;

        tracing::debug!(
            iterations = config.simulation.iterations,
            seed = config.simulation.seed,
            multiple_bands = config.calibration.benchmarks.multiple_bands.len(),
            "Engine configuration loaded"
        );
        Ok(config)
    }

    /// Apply `CLINIC_VALUATION_*` environment overrides.
    pub fn apply_env_overrides(&mut self) {
        self.observability.apply_env_overrides();
        if let Some(iterations) = env_parse::<usize>("MC_ITERATIONS") {
            self.simulation.iterations = iterations;
        }
        if let Some(seed) = env_parse::<u64>("MC_SEED") {
            self.simulation.seed = seed;
        }
    }
}

impl Validate for EngineConfig {
    fn validate(&self) -> ValidationResult<()> {
        let mut v = Violations::new();
        v.merge(self.observability.validate());
        v.merge(self.calibration.validate());
        v.merge(self.simulation.validate());
        v.finish()
    }
}

// ============================================================================
// Simulation Defaults
// ============================================================================

/// Monte Carlo defaults used when a caller builds a config from a report.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationDefaults {
    pub iterations: usize,
    pub seed: u64,
    /// Draws per independently seeded stream
    pub chunk_size: usize,
    /// Upper bound accepted for `iterations`
    pub max_iterations: usize,
    /// Standard deviation of the default normal WACC distribution
    pub wacc_std_dev: f64,
    /// Half-width of the default triangular EBIT-margin distribution
    pub margin_half_width: f64,
}

impl Default for SimulationDefaults {
    fn default() -> Self {
        Self {
            iterations: 2000,
            seed: 42,
            chunk_size: 256,
            max_iterations: 1_000_000,
            wacc_std_dev: 0.015,
            margin_half_width: 0.03,
        }
    }
}

impl Validate for SimulationDefaults {
    fn validate(&self) -> ValidationResult<()> {
        let mut v = Violations::new();
        v.ensure(self.iterations >= 1, "simulation.iterations", "must be at least 1");
        v.ensure(
            self.iterations <= self.max_iterations,
            "simulation.iterations",
            format!("must not exceed max_iterations ({})", self.max_iterations),
        );
        v.ensure(self.chunk_size >= 1, "simulation.chunk_size", "must be at least 1");
        v.non_negative("simulation.wacc_std_dev", self.wacc_std_dev);
        v.non_negative("simulation.margin_half_width", self.margin_half_width);
        v.finish()
    }
}

// ============================================================================
// Calibration
// ============================================================================

/// Design constants and benchmark tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Calibration {
    pub synergy: SynergyConstants,
    pub wacc_bounds: WaccBounds,
    /// Upper clamp on the market-adjusted clinical labor rate
    pub labor_rate_cap: f64,
    pub scenarios: ScenarioProfiles,
    pub benchmarks: Benchmarks,
    pub hybrid_weights: HybridWeightSets,
    pub cross_check: CrossCheckThresholds,
    pub sensitivity: SensitivitySteps,
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            synergy: SynergyConstants::default(),
            wacc_bounds: WaccBounds::default(),
            labor_rate_cap: 0.8,
            scenarios: ScenarioProfiles::default(),
            benchmarks: Benchmarks::default(),
            hybrid_weights: HybridWeightSets::default(),
            cross_check: CrossCheckThresholds::default(),
            sensitivity: SensitivitySteps::default(),
        }
    }
}

impl Validate for Calibration {
    fn validate(&self) -> ValidationResult<()> {
        let mut v = Violations::new();
        v.merge(self.synergy.validate());
        v.merge(self.wacc_bounds.validate());
        v.fraction("calibration.labor_rate_cap", self.labor_rate_cap);
        v.merge(self.benchmarks.validate());
        v.merge(self.hybrid_weights.validate());
        v.merge(self.cross_check.validate());
        v.merge(self.sensitivity.validate());
        v.finish()
    }
}

/// Multi-location and roll-up synergy constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynergyConstants {
    /// Maximum fractional reduction of the admin rate
    pub admin_reduction_cap: f64,
    /// Maximum fractional reduction of the marketing rate
    pub marketing_reduction_cap: f64,
    /// Absolute floor on the effective marketing rate
    pub marketing_floor_rate: f64,
    /// Effective admin rate never drops below `admin_rate × admin_floor_factor`
    pub admin_floor_factor: f64,
    /// Cap on raw roll-up synergy as a share of baseline EBITDA
    pub rollup_cap: f64,
    /// Cap on the moat adjustment added after the roll-up cap
    pub moat_cap: f64,
    /// Overall cap after the moat adjustment
    pub total_cap: f64,
    /// Cumulative share of run-rate synergy realized in each phase-in year
    pub phase_in: Vec<f64>,
    /// Discount rate for synergy present value
    pub discount_rate: f64,
}

impl Default for SynergyConstants {
    fn default() -> Self {
        Self {
            admin_reduction_cap: 0.7,
            marketing_reduction_cap: 0.5,
            marketing_floor_rate: 0.02,
            admin_floor_factor: 0.5,
            rollup_cap: 0.15,
            moat_cap: 0.03,
            total_cap: 0.20,
            phase_in: vec![0.30, 0.65, 1.0],
            discount_rate: 0.12,
        }
    }
}

impl Validate for SynergyConstants {
    fn validate(&self) -> ValidationResult<()> {
        let mut v = Violations::new();
        v.fraction("calibration.synergy.admin_reduction_cap", self.admin_reduction_cap);
        v.fraction(
            "calibration.synergy.marketing_reduction_cap",
            self.marketing_reduction_cap,
        );
        v.fraction("calibration.synergy.marketing_floor_rate", self.marketing_floor_rate);
        v.fraction("calibration.synergy.admin_floor_factor", self.admin_floor_factor);
        v.fraction("calibration.synergy.rollup_cap", self.rollup_cap);
        v.fraction("calibration.synergy.moat_cap", self.moat_cap);
        v.fraction("calibration.synergy.total_cap", self.total_cap);
        v.positive("calibration.synergy.discount_rate", self.discount_rate);

        if self.phase_in.is_empty() {
            v.push(ValidationError::MissingField {
                field: "calibration.synergy.phase_in".into(),
            });
        } else {
            v.ensure(
                self.phase_in.windows(2).all(|w| w[0] <= w[1])
                    && self.phase_in.iter().all(|p| (0.0..=1.0).contains(p)),
                "calibration.synergy.phase_in",
                "must be non-decreasing fractions",
            );
            v.ensure(
                self.phase_in.last().is_some_and(|p| (*p - 1.0).abs() < 1e-9),
                "calibration.synergy.phase_in",
                "must end at full realization (1.0)",
            );
        }
        v.finish()
    }
}

/// Engine-level WACC clamps.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaccBounds {
    pub base_floor: f64,
    pub base_ceiling: f64,
    pub scenario_floor: f64,
    pub scenario_ceiling: f64,
}

impl Default for WaccBounds {
    fn default() -> Self {
        Self {
            base_floor: 0.02,
            base_ceiling: 0.50,
            scenario_floor: 0.03,
            scenario_ceiling: 0.50,
        }
    }
}

impl Validate for WaccBounds {
    fn validate(&self) -> ValidationResult<()> {
        let mut v = Violations::new();
        v.positive("calibration.wacc_bounds.base_floor", self.base_floor);
        v.positive("calibration.wacc_bounds.scenario_floor", self.scenario_floor);
        v.ensure(
            self.base_floor <= self.base_ceiling,
            "calibration.wacc_bounds.base_ceiling",
            "must not be below base_floor",
        );
        v.ensure(
            self.scenario_floor <= self.scenario_ceiling,
            "calibration.wacc_bounds.scenario_ceiling",
            "must not be below scenario_floor",
        );
        v.finish()
    }
}

/// Shifts applied for a scenario.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioProfile {
    /// Added to the base WACC
    pub wacc_shift: f64,
    /// Added to DCF initial growth
    pub growth_shift: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioProfiles {
    pub base: ScenarioProfile,
    pub bull: ScenarioProfile,
    pub bear: ScenarioProfile,
}

impl ScenarioProfiles {
    pub fn profile(&self, scenario: Scenario) -> ScenarioProfile {
        match scenario {
            Scenario::Base => self.base,
            Scenario::Bull => self.bull,
            Scenario::Bear => self.bear,
        }
    }
}

impl Default for ScenarioProfiles {
    fn default() -> Self {
        Self {
            base: ScenarioProfile::default(),
            bull: ScenarioProfile {
                wacc_shift: -0.01,
                growth_shift: 0.02,
            },
            bear: ScenarioProfile {
                wacc_shift: 0.02,
                growth_shift: -0.03,
            },
        }
    }
}

// ============================================================================
// Benchmarks
// ============================================================================

/// Published EV/EBITDA range for a normalized-EBITDA size band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MultipleBand {
    /// Inclusive lower EBITDA bound
    pub min_ebitda: f64,
    /// Exclusive upper EBITDA bound; `None` for the top band
    pub max_ebitda: Option<f64>,
    pub low: f64,
    pub mid: f64,
    pub high: f64,
}

impl MultipleBand {
    pub fn contains_ebitda(&self, ebitda: f64) -> bool {
        ebitda >= self.min_ebitda && self.max_ebitda.map_or(true, |max| ebitda < max)
    }

    pub fn contains_multiple(&self, multiple: f64) -> bool {
        multiple >= self.low && multiple <= self.high
    }
}

/// Plausible normalized EBITDA margin range for a practice type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarginBand {
    pub practice_type: PracticeType,
    pub min_margin: f64,
    pub max_margin: f64,
}

/// Multiplicative factors applied to the band midpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MultipleAdjustments {
    pub single_site_discount: f64,
    pub per_site_premium: f64,
    pub max_site_premium: f64,
    pub data_quality_high: f64,
    pub data_quality_medium: f64,
    pub data_quality_low: f64,
    pub growth_high: f64,
    pub growth_moderate: f64,
    pub growth_low: f64,
}

impl MultipleAdjustments {
    pub fn location_factor(&self, locations: u32) -> f64 {
        if locations <= 1 {
            1.0 - self.single_site_discount
        } else {
            1.0 + (f64::from(locations - 1) * self.per_site_premium).min(self.max_site_premium)
        }
    }

    pub fn data_quality_factor(&self, quality: DataQuality) -> f64 {
        match quality {
            DataQuality::High => self.data_quality_high,
            DataQuality::Medium => self.data_quality_medium,
            DataQuality::Low => self.data_quality_low,
        }
    }

    pub fn growth_factor(&self, growth: GrowthProfile) -> f64 {
        match growth {
            GrowthProfile::High => self.growth_high,
            GrowthProfile::Moderate => self.growth_moderate,
            GrowthProfile::Low => self.growth_low,
        }
    }
}

impl Default for MultipleAdjustments {
    fn default() -> Self {
        Self {
            single_site_discount: 0.10,
            per_site_premium: 0.025,
            max_site_premium: 0.10,
            data_quality_high: 1.0,
            data_quality_medium: 0.95,
            data_quality_low: 0.85,
            growth_high: 1.10,
            growth_moderate: 1.0,
            growth_low: 0.92,
        }
    }
}

/// Industry benchmark tables and small-practice thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Benchmarks {
    /// Size bands in ascending EBITDA order
    pub multiple_bands: Vec<MultipleBand>,
    pub multiple_adjustments: MultipleAdjustments,
    pub margin_bands: Vec<MarginBand>,
    /// Revenue below which a practice is treated as micro
    pub micro_revenue: f64,
    /// Revenue below which a practice is treated as small
    pub small_revenue: f64,
    /// Minimum plausible EV/EBITDA for a going concern
    pub min_ev_ebitda: f64,
}

impl Benchmarks {
    /// Band for `ebitda`; EBITDA below the first band falls into it.
    pub fn band_for(&self, ebitda: f64) -> Option<&MultipleBand> {
        self.multiple_bands
            .iter()
            .find(|b| b.contains_ebitda(ebitda))
            .or_else(|| self.multiple_bands.first().filter(|b| ebitda < b.min_ebitda))
    }

    pub fn margin_band(&self, practice_type: PracticeType) -> Option<&MarginBand> {
        self.margin_bands
            .iter()
            .find(|b| b.practice_type == practice_type)
    }
}

impl Default for Benchmarks {
    fn default() -> Self {
        let band = |min: f64, max: Option<f64>, low: f64, mid: f64, high: f64| MultipleBand {
            min_ebitda: min,
            max_ebitda: max,
            low,
            mid,
            high,
        };
        Self {
            multiple_bands: vec![
                band(0.0, Some(500_000.0), 2.5, 3.25, 4.0),
                band(500_000.0, Some(1_000_000.0), 3.5, 4.25, 5.0),
                band(1_000_000.0, Some(3_000_000.0), 4.5, 5.5, 6.5),
                band(3_000_000.0, Some(5_000_000.0), 6.0, 7.0, 8.0),
                band(5_000_000.0, None, 7.0, 8.5, 10.0),
            ],
            multiple_adjustments: MultipleAdjustments::default(),
            margin_bands: vec![
                MarginBand {
                    practice_type: PracticeType::MedSpa,
                    min_margin: 0.10,
                    max_margin: 0.25,
                },
                MarginBand {
                    practice_type: PracticeType::PhysicianLed,
                    min_margin: 0.15,
                    max_margin: 0.30,
                },
                MarginBand {
                    practice_type: PracticeType::MultiSite,
                    min_margin: 0.12,
                    max_margin: 0.28,
                },
            ],
            micro_revenue: 1_000_000.0,
            small_revenue: 3_000_000.0,
            min_ev_ebitda: 1.5,
        }
    }
}

impl Validate for Benchmarks {
    fn validate(&self) -> ValidationResult<()> {
        let mut v = Violations::new();

        if self.multiple_bands.is_empty() {
            v.push(ValidationError::MissingField {
                field: "calibration.benchmarks.multiple_bands".into(),
            });
        }
        for (i, b) in self.multiple_bands.iter().enumerate() {
            v.ensure(
                b.low > 0.0 && b.low <= b.mid && b.mid <= b.high,
                &format!("calibration.benchmarks.multiple_bands[{i}]"),
                "requires 0 < low <= mid <= high",
            );
            v.ensure(
                b.max_ebitda.map_or(true, |max| max > b.min_ebitda),
                &format!("calibration.benchmarks.multiple_bands[{i}].max_ebitda"),
                "must exceed min_ebitda",
            );
        }
        v.ensure(
            self.multiple_bands
                .windows(2)
                .all(|w| w[0].max_ebitda == Some(w[1].min_ebitda)),
            "calibration.benchmarks.multiple_bands",
            "bands must be contiguous and ascending",
        );
        for b in &self.margin_bands {
            v.ensure(
                b.min_margin <= b.max_margin,
                &format!("calibration.benchmarks.margin_bands[{}]", b.practice_type),
                "min_margin must not exceed max_margin",
            );
        }
        v.non_negative("calibration.benchmarks.micro_revenue", self.micro_revenue);
        v.ensure(
            self.small_revenue >= self.micro_revenue,
            "calibration.benchmarks.small_revenue",
            "must not be below micro_revenue",
        );
        v.non_negative("calibration.benchmarks.min_ev_ebitda", self.min_ev_ebitda);
        v.finish()
    }
}

// ============================================================================
// Hybrid Weights, Cross-checks, Sensitivity
// ============================================================================

/// Method weight sets selected by the hybrid rule table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HybridWeightSets {
    pub growth_biased: MethodWeights,
    pub balanced: MethodWeights,
    pub conservative: MethodWeights,
}

impl Default for HybridWeightSets {
    fn default() -> Self {
        Self {
            growth_biased: MethodWeights::new(0.25, 0.50, 0.25),
            balanced: MethodWeights::new(0.40, 0.30, 0.30),
            conservative: MethodWeights::new(0.50, 0.20, 0.30),
        }
    }
}

impl Validate for HybridWeightSets {
    fn validate(&self) -> ValidationResult<()> {
        let mut v = Violations::new();
        for (name, w) in [
            ("growth_biased", self.growth_biased),
            ("balanced", self.balanced),
            ("conservative", self.conservative),
        ] {
            v.ensure(
                w.is_normalized(),
                &format!("calibration.hybrid_weights.{name}"),
                format!("weights must be non-negative and sum to 1.0, got {:.6}", w.sum()),
            );
        }
        v.finish()
    }
}

/// Thresholds for the cross-validation checks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrossCheckThresholds {
    /// EPV basis variance above this is medium severity
    pub variance_medium: f64,
    /// ... above this is high
    pub variance_high: f64,
    /// ... above this is critical
    pub variance_critical: f64,
    /// Multiples below `low × band_floor_factor` are high severity
    pub band_floor_factor: f64,
    /// Multiples above `high × band_ceiling_factor` are high severity
    pub band_ceiling_factor: f64,
    /// Terminal value share of DCF enterprise value above this is flagged
    pub max_terminal_value_share: f64,
}

impl Default for CrossCheckThresholds {
    fn default() -> Self {
        Self {
            variance_medium: 0.10,
            variance_high: 0.15,
            variance_critical: 0.25,
            band_floor_factor: 0.5,
            band_ceiling_factor: 1.5,
            max_terminal_value_share: 0.85,
        }
    }
}

impl Validate for CrossCheckThresholds {
    fn validate(&self) -> ValidationResult<()> {
        let mut v = Violations::new();
        v.ensure(
            0.0 <= self.variance_medium
                && self.variance_medium <= self.variance_high
                && self.variance_high <= self.variance_critical,
            "calibration.cross_check",
            "variance thresholds must be ascending",
        );
        v.fraction("calibration.cross_check.band_floor_factor", self.band_floor_factor);
        v.ensure(
            self.band_ceiling_factor >= 1.0,
            "calibration.cross_check.band_ceiling_factor",
            "must be at least 1.0",
        );
        v.fraction(
            "calibration.cross_check.max_terminal_value_share",
            self.max_terminal_value_share,
        );
        v.finish()
    }
}

/// Grid geometry of the sensitivity table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensitivitySteps {
    pub wacc_step: f64,
    pub wacc_steps_each_side: usize,
    pub margin_step: f64,
    pub margin_steps_each_side: usize,
}

impl Default for SensitivitySteps {
    fn default() -> Self {
        Self {
            wacc_step: 0.01,
            wacc_steps_each_side: 3,
            margin_step: 0.02,
            margin_steps_each_side: 2,
        }
    }
}

impl Validate for SensitivitySteps {
    fn validate(&self) -> ValidationResult<()> {
        let mut v = Violations::new();
        v.positive("calibration.sensitivity.wacc_step", self.wacc_step);
        v.positive("calibration.sensitivity.margin_step", self.margin_step);
        v.finish()
    }
}
