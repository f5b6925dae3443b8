//! Worked valuation scenarios with hand-checked figures.

mod common;

use clinic_valuation::forecast::ForecastMethod;
use clinic_valuation::lbo::{EntryValuation, ExitValuation, LboSimulator};
use clinic_valuation::operations::{RollupAssumptions, SynergySource};
use clinic_valuation::{LboAssumptions, ValuationPipeline};

use common::{assert_close, bridge_clinic, buyout_driver, BUYOUT_WACC};

// ============================================================================
// Earnings
// ============================================================================

#[test]
fn test_ebitda_bridge() {
    let report = ValuationPipeline::new().run(&bridge_clinic()).unwrap();
    let earnings = &report.operations.earnings;

    assert_close(earnings.revenue, 5_000_000.0, 1e-6);
    assert_close(earnings.bridge.reported_ebitda, 1_048_000.0, 1e-6);
    assert_close(earnings.bridge.total_add_backs(), 140_000.0, 1e-6);
    assert_close(earnings.normalized_ebitda(), 1_188_000.0, 1e-6);
    assert_close(earnings.ebit(), 1_098_000.0, 1e-6);
    assert_close(earnings.nopat, 812_520.0, 1e-6);
}

#[test]
fn test_epv_scenario() {
    let report = ValuationPipeline::new().run(&bridge_clinic()).unwrap();

    assert_close(report.wacc.scenario_wacc, 0.12, 1e-12);
    assert_close(report.methods.epv.adjusted_earnings, 724_680.0, 1e-6);
    assert_close(report.methods.epv.result.enterprise_value, 6_039_000.0, 1.0);
    // No cash or debt on the balance sheet
    assert_close(
        report.methods.epv.result.equity_value,
        report.methods.epv.result.enterprise_value,
        1e-9,
    );
}

#[test]
fn test_regression_growth_from_history() {
    let report = ValuationPipeline::new().run(&bridge_clinic()).unwrap();
    assert_eq!(report.growth.method, ForecastMethod::Regression);
    assert_close(report.growth.growth_rate, 0.05, 1e-9);
    assert!(report.growth.warnings().is_empty());
}

// ============================================================================
// Deal Analysis
// ============================================================================

#[test]
fn test_lbo_entry_split() {
    let pipeline = ValuationPipeline::new();
    let report = pipeline.run(&bridge_clinic()).unwrap();
    let lbo = pipeline
        .lbo(
            &report,
            &LboAssumptions {
                entry: EntryValuation::Override {
                    enterprise_value: 10_098_000.0,
                },
                entry_debt_pct: 0.75,
                ..Default::default()
            },
        )
        .unwrap();

    assert_close(lbo.entry_debt, 7_573_500.0, 1e-6);
    assert_close(lbo.entry_equity, 2_524_500.0, 1e-6);
    assert_eq!(lbo.schedule.len(), 5);
    assert!(lbo.exit_debt < lbo.entry_debt);
}

#[test]
fn test_lbo_amortization_and_returns() {
    let driver = buyout_driver();
    let lbo = LboSimulator::new(&driver, BUYOUT_WACC)
        .run(&LboAssumptions {
            entry: EntryValuation::Override {
                enterprise_value: 10_098_000.0,
            },
            entry_debt_pct: 0.75,
            cost_of_debt: 0.09,
            hold_years: 5,
            sweep_fraction: 1.0,
            earnings_growth: 0.0,
            exit: ExitValuation::RederivedEpv,
        })
        .unwrap();

    assert_close(lbo.entry_debt, 7_573_500.0, 1e-6);
    assert_close(lbo.entry_equity, 2_524_500.0, 1e-6);

    let y1 = &lbo.schedule[0];
    assert_close(y1.free_cash_flow, 910_200.0, 1e-6);
    assert_close(y1.interest, 681_615.0, 1e-6);
    assert_close(y1.principal_paydown, 228_585.0, 1e-6);
    assert_close(y1.closing_debt, 7_344_915.0, 1e-6);

    assert_close(lbo.exit_debt, 6_205_478.0, 10.0);
    assert_close(lbo.exit_enterprise_value, 15_012_914.0, 100.0);
    assert_close(lbo.exit_equity, 8_807_436.0, 100.0);
    assert_close(lbo.moic, 3.4888, 1e-3);
    assert_close(lbo.irr, 0.284, 1e-3);
}

#[test]
fn test_synergy_cap() {
    let pipeline = ValuationPipeline::new();
    let report = pipeline.run(&bridge_clinic()).unwrap();
    let synergy = pipeline
        .rollup_synergy(
            &report,
            &RollupAssumptions {
                sources: vec![
                    SynergySource::new("purchasing", 0.08),
                    SynergySource::new("shared services", 0.07),
                    SynergySource::new("pricing", 0.05),
                ],
                moat_adjustment: 0.10,
            },
        )
        .unwrap();

    assert_close(synergy.capped_pct, 0.15, 1e-12);
    assert!(synergy.total_pct <= 0.20 + 1e-12);
    assert_close(synergy.run_rate, 1_188_000.0 * synergy.total_pct, 1e-6);
}
