//! Property tests for the numeric invariants of the engine.

use clinic_valuation::assumptions::{
    BalanceSheet, BetaInput, CapitalAssumptions, EarningsBasis, Scenario,
};
use clinic_valuation::capital::compute_wacc;
use clinic_valuation::config::{ScenarioProfiles, WaccBounds};
use clinic_valuation::simulation::{percentile, sample_normal, sample_triangular};
use clinic_valuation::valuation::{value_epv, EpvDriver};
use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

fn scenario() -> impl Strategy<Value = Scenario> {
    prop_oneof![Just(Scenario::Base), Just(Scenario::Bull), Just(Scenario::Bear)]
}

proptest! {
    #[test]
    fn prop_percentile_is_monotone(
        mut values in prop::collection::vec(-1e6f64..1e6, 1..200),
        p1 in 0.0f64..=1.0,
        p2 in 0.0f64..=1.0,
    ) {
        values.sort_by(f64::total_cmp);
        let (lo, hi) = if p1 <= p2 { (p1, p2) } else { (p2, p1) };
        let a = percentile(&values, lo).unwrap();
        let b = percentile(&values, hi).unwrap();
        prop_assert!(a <= b);
        prop_assert!(values[0] <= a && b <= values[values.len() - 1]);
    }

    #[test]
    fn prop_wacc_stays_in_bounds(
        risk_free_rate in -0.05f64..0.5,
        equity_risk_premium in 0.0f64..0.5,
        beta in 0.0f64..10.0,
        size_premium in -0.2f64..0.5,
        specific_premium in -0.2f64..0.5,
        cost_of_debt in 0.0f64..1.0,
        debt_weight in 0.0f64..0.99,
        tax_rate in 0.0f64..0.99,
        wacc_premium in -0.2f64..0.2,
        scenario in scenario(),
    ) {
        let mut capital = CapitalAssumptions {
            risk_free_rate,
            equity_risk_premium,
            beta: BetaInput::Levered { beta },
            size_premium,
            specific_premium,
            cost_of_debt,
            debt_weight,
            scenario,
            ..Default::default()
        };
        capital.risk_overlay.wacc_premium = wacc_premium;

        let w = compute_wacc(
            &capital,
            tax_rate,
            &WaccBounds::default(),
            &ScenarioProfiles::default(),
        );
        prop_assert!((0.02..=0.50).contains(&w.base_wacc));
        prop_assert!((0.03..=0.50).contains(&w.scenario_wacc));
    }

    #[test]
    fn prop_epv_identity(
        ebit in -1e6f64..5e6,
        da in 0.0f64..5e5,
        capex in 0.0f64..5e5,
        haircut in 0.0f64..0.9,
        cash in 0.0f64..1e6,
        debt in 0.0f64..5e6,
        wacc in 0.01f64..0.5,
    ) {
        let driver = EpvDriver {
            revenue: 10_000_000.0,
            ebit,
            ebitda: ebit + da,
            da,
            maintenance_capex: capex,
            tax_rate: 0.26,
            basis: EarningsBasis::OwnerEarnings,
            risk_haircut: haircut,
            balance: BalanceSheet {
                non_operating_cash: cash,
                interest_bearing_debt: debt,
                tangible_asset_value: 0.0,
            },
        };
        let epv = value_epv(&driver, wacc).unwrap();
        let expected = epv.adjusted_earnings / wacc;
        prop_assert!(
            (epv.result.enterprise_value - expected).abs() <= 1e-9 * expected.abs().max(1.0)
        );
        prop_assert!(
            (epv.result.equity_value - (epv.result.enterprise_value + cash - debt)).abs()
                <= 1e-9 * epv.result.enterprise_value.abs().max(1.0)
        );
    }

    #[test]
    fn prop_triangular_draws_stay_in_range(
        min in -1.0f64..1.0,
        spread_low in 0.0f64..1.0,
        spread_high in 0.0f64..1.0,
        seed in any::<u64>(),
    ) {
        let mode = min + spread_low;
        let max = mode + spread_high;
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        for _ in 0..100 {
            let x = sample_triangular(&mut rng, min, mode, max);
            prop_assert!(min <= x && x <= max, "{x} outside [{min}, {max}]");
        }
    }
}

#[test]
fn test_triangular_mean_converges() {
    let mut rng = ChaCha20Rng::seed_from_u64(2024);
    let n = 10_000;
    let mean = (0..n)
        .map(|_| sample_triangular(&mut rng, 0.10, 0.18, 0.26))
        .sum::<f64>()
        / n as f64;
    assert!((mean - 0.18).abs() / 0.18 < 0.01, "mean {mean}");
}

#[test]
fn test_normal_moments_converge() {
    let mut rng = ChaCha20Rng::seed_from_u64(2024);
    let n = 10_000;
    let draws: Vec<f64> = (0..n).map(|_| sample_normal(&mut rng, 0.12, 0.015)).collect();
    let mean = draws.iter().sum::<f64>() / n as f64;
    let var = draws.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    assert!((mean - 0.12).abs() / 0.12 < 0.02, "mean {mean}");
    assert!((var.sqrt() - 0.015).abs() / 0.015 < 0.10, "std_dev {}", var.sqrt());
}
