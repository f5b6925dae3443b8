//! End-to-end pipeline behavior: determinism, warnings, provenance and the
//! stochastic and deal-analysis entry points.

mod common;

use clinic_valuation::assumptions::{Provider, Scenario};
use clinic_valuation::{AuditCategory, ValuationError, ValuationPipeline};

use common::{assert_close, bridge_clinic, init_test_logging};

// ============================================================================
// Deterministic Run
// ============================================================================

#[test]
fn test_run_is_idempotent() {
    init_test_logging();
    let pipeline = ValuationPipeline::new();
    let inputs = bridge_clinic();
    let a = pipeline.run(&inputs).unwrap();
    let b = pipeline.run(&inputs).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_hybrid_blends_components() {
    let report = ValuationPipeline::new().run(&bridge_clinic()).unwrap();
    let hybrid = &report.methods.hybrid;

    assert!(hybrid.weights.is_normalized());
    let blended = hybrid.weights.epv * report.methods.epv.result.enterprise_value
        + hybrid.weights.dcf * report.methods.dcf.result.enterprise_value
        + hybrid.weights.multiple * report.methods.multiple.result.enterprise_value;
    assert_close(report.hybrid_enterprise_value(), blended, 1e-6);
    assert_close(report.hybrid_equity_value(), report.hybrid_enterprise_value(), 1e-9);
}

#[test]
fn test_every_method_bridges_to_equity() {
    let mut inputs = bridge_clinic();
    inputs.balance_sheet.non_operating_cash = 250_000.0;
    inputs.balance_sheet.interest_bearing_debt = 1_000_000.0;

    let report = ValuationPipeline::new().run(&inputs).unwrap();
    for result in report.methods.results() {
        assert_close(
            result.equity_value,
            result.enterprise_value - 750_000.0,
            1e-6,
        );
    }
}

#[test]
fn test_sensitivity_centre_matches_epv() {
    let report = ValuationPipeline::new().run(&bridge_clinic()).unwrap();
    let centre = report.sensitivity.base_value().unwrap();
    assert_close(centre, report.methods.epv.result.equity_value, 1e-3);
    assert_close(report.sensitivity.base_wacc, report.wacc.scenario_wacc, 1e-12);
}

#[test]
fn test_bear_scenario_raises_wacc() {
    let pipeline = ValuationPipeline::new();
    let base = pipeline.run(&bridge_clinic()).unwrap();

    let mut inputs = bridge_clinic();
    inputs.capital.scenario = Scenario::Bear;
    let bear = pipeline.run(&inputs).unwrap();

    assert_close(bear.wacc.scenario_wacc, base.wacc.scenario_wacc + 0.02, 1e-12);
    assert!(bear.methods.epv.result.enterprise_value < base.methods.epv.result.enterprise_value);
    assert!(bear.methods.dcf.result.enterprise_value < base.methods.dcf.result.enterprise_value);
}

#[test]
fn test_additional_locations_reduce_admin_rate() {
    let mut inputs = bridge_clinic();
    inputs.operating.locations = 3;
    let report = ValuationPipeline::new().run(&inputs).unwrap();

    assert_close(report.operations.cost_rates.admin_rate, 0.09, 1e-12);
    assert_close(report.operations.earnings.revenue, 15_000_000.0, 1e-6);
}

// ============================================================================
// Warnings & Validation
// ============================================================================

#[test]
fn test_capacity_constraint_scales_volume() {
    let mut inputs = bridge_clinic();
    inputs.capacity.enabled = true;
    inputs.capacity.rooms = 2;
    inputs.capacity.providers = vec![Provider {
        id: "np".into(),
        fte: 1.0,
        hours_per_week: 40.0,
        appointments_per_hour: 1.0,
        utilization: 1.0,
    }];

    let report = ValuationPipeline::new().run(&inputs).unwrap();
    assert_close(report.operations.capacity.effective_capacity, 2_080.0, 1e-9);
    assert_close(report.operations.earnings.revenue, 2_080_000.0, 1e-6);
    assert!(report.warnings.iter().any(|w| w.code == "capacity_constrained"));
}

#[test]
fn test_short_history_warns() {
    let mut inputs = bridge_clinic();
    inputs.history.truncate(1);
    let report = ValuationPipeline::new().run(&inputs).unwrap();
    assert!(report.warnings.iter().any(|w| w.code == "trend_last_observed"));
}

#[test]
fn test_invalid_inputs_collect_every_field() {
    let mut inputs = bridge_clinic();
    inputs.operating.locations = 0;
    inputs.service_lines[0].unit_price = -1.0;

    let err = ValuationPipeline::new().run(&inputs).unwrap_err();
    let validation = match err {
        ValuationError::Validation(v) => v,
        other => panic!("expected a validation error, got {other:?}"),
    };
    let fields = validation.fields();
    assert!(fields.contains(&"operating.locations"));
    assert!(fields.contains(&"service_lines[injectables].unit_price"));
}

// ============================================================================
// Audit Trail
// ============================================================================

#[test]
fn test_audit_trail_matches_report() {
    let pipeline = ValuationPipeline::new();
    let inputs = bridge_clinic();
    let report = pipeline.run(&inputs).unwrap();
    let trail = pipeline.audit_trail(&inputs).unwrap();

    let step = trail.get("earnings.normalized_ebitda").unwrap();
    assert_close(step.result, 1_188_000.0, 1e-6);
    assert_eq!(step.inputs.len(), 3);
    assert_eq!(step.formula_text, "reported_ebitda + Σ add_backs");

    let dcf = &report.methods.dcf;
    let mut pv_sum = 0.0;
    for year in &dcf.years {
        let fcf = trail
            .get(&format!("valuation.dcf.year.{}.free_cash_flow", year.year))
            .unwrap();
        assert_eq!(fcf.result, year.free_cash_flow);
        let pv = trail
            .get(&format!("valuation.dcf.year.{}.present_value", year.year))
            .unwrap();
        assert_eq!(pv.result, year.present_value);
        pv_sum += pv.result;
    }
    assert_close(pv_sum, dcf.pv_explicit, 1e-6);

    let wacc = trail.get("capital.wacc_base").unwrap();
    let equity_weight = wacc.inputs.iter().find(|i| i.name == "equity_weight").unwrap();
    assert_eq!(equity_weight.value, 1.0);

    assert_eq!(
        trail.get("valuation.epv.enterprise_value").unwrap().result,
        report.methods.epv.result.enterprise_value
    );
    assert_eq!(
        trail.get("valuation.hybrid.equity_value").unwrap().result,
        report.hybrid_equity_value()
    );
    for category in [
        AuditCategory::Capacity,
        AuditCategory::Revenue,
        AuditCategory::Cost,
        AuditCategory::Synergy,
        AuditCategory::Earnings,
        AuditCategory::CapitalCost,
        AuditCategory::Valuation,
    ] {
        assert!(trail.by_category(category).next().is_some(), "no {category:?} steps");
    }
}

#[test]
fn test_audit_trail_rejects_invalid_inputs() {
    let mut inputs = bridge_clinic();
    inputs.service_lines.clear();
    assert!(ValuationPipeline::new().audit_trail(&inputs).unwrap_err().is_validation());
}

// ============================================================================
// Simulation
// ============================================================================

#[test]
fn test_simulation_is_reproducible() {
    init_test_logging();
    let pipeline = ValuationPipeline::new();
    let report = pipeline.run(&bridge_clinic()).unwrap();
    let config = pipeline.default_simulation(&report).with_iterations(600);

    let a = pipeline.simulate(&report, &config).unwrap();
    let b = pipeline.simulate(&report, &config).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.sample_count, 600);

    let base = report.methods.epv.result.enterprise_value;
    assert!(a.enterprise.p5 < base && base < a.enterprise.p95);
}

#[test]
fn test_simulation_iteration_limit() {
    let pipeline = ValuationPipeline::new();
    let report = pipeline.run(&bridge_clinic()).unwrap();
    let config = pipeline
        .default_simulation(&report)
        .with_iterations(pipeline.config().simulation.max_iterations + 1);

    assert!(pipeline.simulate(&report, &config).unwrap_err().is_validation());
}
