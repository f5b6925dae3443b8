//! End-to-end valuation run.
//!
//! ```text
//! inputs ─▶ capacity ─▶ revenue ─▶ cost rates ─▶ earnings bridge
//!                                                     │
//!                history ─▶ growth ──┐                ▼
//!                capital ─▶ WACC ────┴──▶ EPV / DCF / multiple ─▶ hybrid
//!                                                     │
//!                                  sensitivity ◀──────┴──────▶ cross-checks
//! ```
//!
//! A run is a pure function of its inputs and configuration. Monte Carlo,
//! LBO, roll-up synergy and the audit trail are separate entry points that
//! reuse a finished [`ValuationReport`].

use std::time::Instant;

use clinic_common::logging::generate_run_id;
use clinic_common::{Validate, ValidationError};
use serde::{Deserialize, Serialize};

use crate::analysis::{
    build_sensitivity, cross_validate, CrossCheckContext, CrossValidationReport, SensitivityGrid,
};
use crate::assumptions::ValuationInputs;
use crate::audit::AuditTrail;
use crate::capital::{compute_wacc, WaccBreakdown};
use crate::config::EngineConfig;
use crate::error::Result;
use crate::forecast::{estimate_growth, GrowthEstimate};
use crate::lbo::{LboAssumptions, LboResult, LboSimulator};
use crate::operations::{
    rollup_synergy, run_operations, OperatingResults, RollupAssumptions, RollupSynergy,
};
use crate::simulation::{MonteCarloConfig, MonteCarloResult, MonteCarloSimulator};
use crate::valuation::{MethodValuations, ValuationEngine};
use crate::warning::{log_warnings, ValuationWarning};

/// Everything one run produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationReport {
    pub operations: OperatingResults,
    pub growth: GrowthEstimate,
    pub wacc: WaccBreakdown,
    pub methods: MethodValuations,
    pub sensitivity: SensitivityGrid,
    pub cross_validation: CrossValidationReport,
    pub warnings: Vec<ValuationWarning>,
}

impl ValuationReport {
    pub fn hybrid_enterprise_value(&self) -> f64 {
        self.methods.hybrid.result.enterprise_value
    }

    pub fn hybrid_equity_value(&self) -> f64 {
        self.methods.hybrid.result.equity_value
    }
}

/// Drives a valuation run with one engine configuration.
#[derive(Debug, Clone, Default)]
pub struct ValuationPipeline {
    config: EngineConfig,
}

impl ValuationPipeline {
    /// Pipeline with built-in calibration.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Validate `inputs` and compute every deterministic result.
    pub fn run(&self, inputs: &ValuationInputs) -> Result<ValuationReport> {
        inputs.validate()?;

        let run_id = generate_run_id();
        let span = clinic_common::run_span!(
            "valuation_run",
            run_id,
            locations = inputs.operating.locations,
            scenario = %inputs.capital.scenario
        );
        let _enter = span.enter();
        let started = Instant::now();
        let calibration = &self.config.calibration;

        let operations = run_operations(inputs, calibration);
        let growth = estimate_growth(&inputs.history)?;
        let wacc = compute_wacc(
            &inputs.capital,
            inputs.operating.tax_rate,
            &calibration.wacc_bounds,
            &calibration.scenarios,
        );
        if wacc.is_base_clamped() {
            tracing::debug!(
                unclamped = wacc.unclamped_wacc,
                clamped = wacc.base_wacc,
                "Base WACC clamped to bounds"
            );
        }

        let methods =
            ValuationEngine::new(calibration).value_all(inputs, &operations, &wacc, &growth)?;
        let sensitivity = build_sensitivity(
            &methods.driver,
            wacc.scenario_wacc,
            &calibration.sensitivity,
        );
        let cross_validation = cross_validate(
            &CrossCheckContext {
                revenue: operations.earnings.revenue,
                normalized_ebitda: operations.earnings.normalized_ebitda(),
                practice_type: inputs.practice_type,
                balance: &inputs.balance_sheet,
                wacc: wacc.scenario_wacc,
                methods: &methods,
            },
            calibration,
        )?;

        let mut warnings = operations.capacity.warnings();
        warnings.extend(growth.warnings());
        warnings.extend(cross_validation.warnings());
        log_warnings(&warnings);

        tracing::info!(
            revenue = operations.earnings.revenue,
            normalized_ebitda = operations.earnings.normalized_ebitda(),
            wacc = wacc.scenario_wacc,
            epv = methods.epv.result.enterprise_value,
            dcf = methods.dcf.result.enterprise_value,
            multiple = methods.multiple.result.enterprise_value,
            hybrid = methods.hybrid.result.enterprise_value,
            warnings = warnings.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Valuation complete"
        );

        Ok(ValuationReport {
            operations,
            growth,
            wacc,
            methods,
            sensitivity,
            cross_validation,
            warnings,
        })
    }

    /// Monte Carlo config centred on the report's base case.
    pub fn default_simulation(&self, report: &ValuationReport) -> MonteCarloConfig {
        let margin = report.methods.driver.ebit_margin().unwrap_or(0.0);
        MonteCarloConfig::around_base(report.wacc.scenario_wacc, margin, &self.config.simulation)
    }

    /// Simulate enterprise and equity value around the report's base case.
    pub fn simulate(
        &self,
        report: &ValuationReport,
        config: &MonteCarloConfig,
    ) -> Result<MonteCarloResult> {
        let max = self.config.simulation.max_iterations;
        if config.iterations > max {
            return Err(ValidationError::OutOfRange {
                field: "simulation.iterations".into(),
                value: config.iterations as f64,
                min: 1.0,
                max: max as f64,
            }
            .into());
        }
        MonteCarloSimulator::new(&report.methods.driver, &self.config.calibration.wacc_bounds)
            .run(config)
    }

    /// Leveraged buyout of the report's base case.
    pub fn lbo(&self, report: &ValuationReport, assumptions: &LboAssumptions) -> Result<LboResult> {
        LboSimulator::new(&report.methods.driver, report.wacc.scenario_wacc).run(assumptions)
    }

    /// Roll-up synergy on the report's normalized EBITDA.
    pub fn rollup_synergy(
        &self,
        report: &ValuationReport,
        assumptions: &RollupAssumptions,
    ) -> Result<RollupSynergy> {
        assumptions.validate()?;
        Ok(rollup_synergy(
            report.operations.earnings.normalized_ebitda(),
            assumptions,
            &self.config.calibration.synergy,
        ))
    }

    /// Provenance for every derived figure of a run on `inputs`.
    pub fn audit_trail(&self, inputs: &ValuationInputs) -> Result<AuditTrail> {
        AuditTrail::replay(inputs, &self.config.calibration)
    }
}
