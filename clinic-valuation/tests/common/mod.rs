//! Shared fixtures for integration tests.

#![allow(dead_code)]

use clinic_valuation::assumptions::{
    BalanceSheet, BetaInput, CapitalAssumptions, CostItem, EarningsBasis, HistoricalYear,
    LineKind, MaintenanceCapex, OperatingAssumptions, ServiceLine,
};
use clinic_valuation::valuation::EpvDriver;
use clinic_valuation::ValuationInputs;

/// Single-location med spa whose P&L lands on reported EBITDA of 1,048,000
/// and a 12% WACC.
///
/// Revenue 5,000,000; COGS 500,000; labor 1,500,000; opex 1,952,000.
pub fn bridge_clinic() -> ValuationInputs {
    ValuationInputs {
        service_lines: vec![ServiceLine {
            id: "injectables".into(),
            name: "Injectables".into(),
            unit_price: 1_000.0,
            annual_volume: 5_000.0,
            cogs_fraction: 0.10,
            kind: LineKind::Service,
            visit_units: 1.0,
            is_membership: false,
        }],
        operating: OperatingAssumptions {
            locations: 1,
            clinical_labor_rate: 0.30,
            labor_market_adjustment: 1.0,
            marketing_rate: 0.08,
            admin_rate: 0.10,
            mso_fee_rate: 0.0,
            compliance_rate: 0.01,
            fixed_costs: vec![CostItem::new("rent", 600_000.0)],
            other_opex: 402_000.0,
            owner_addback: 130_000.0,
            other_addbacks: vec![
                CostItem::new("one-time items", 70_000.0),
                CostItem::new("rent normalization", -60_000.0),
            ],
            depreciation_amortization: 90_000.0,
            tax_rate: 0.26,
            maintenance_capex: MaintenanceCapex::PerLocation { amount: 90_000.0 },
            ..Default::default()
        },
        capital: CapitalAssumptions {
            risk_free_rate: 0.04,
            equity_risk_premium: 0.05,
            beta: BetaInput::Levered { beta: 1.0 },
            size_premium: 0.03,
            industry_premium: 0.0,
            geographic_premium: 0.0,
            specific_premium: 0.0,
            debt_weight: 0.0,
            ..Default::default()
        },
        earnings_basis: EarningsBasis::NopatLessReinvestment { rate: 0.08 },
        history: growing_history(5, 5_000_000.0, 0.05),
        ..Default::default()
    }
}

/// Scenario WACC at which the buyout target's exit EPV is about 15,012,865.
pub const BUYOUT_WACC: f64 = 0.060628;

/// Buyout target with flat owner earnings of 910,200.
///
/// EBIT 1,230,000 taxed at 26% with D&A equal to maintenance capex.
pub fn buyout_driver() -> EpvDriver {
    EpvDriver {
        revenue: 5_000_000.0,
        ebit: 1_230_000.0,
        ebitda: 1_320_000.0,
        da: 90_000.0,
        maintenance_capex: 90_000.0,
        tax_rate: 0.26,
        basis: EarningsBasis::OwnerEarnings,
        risk_haircut: 0.0,
        balance: BalanceSheet::default(),
    }
}

/// `years` of history ending in 2024 at `last_revenue`, growing at `rate`.
pub fn growing_history(years: u32, last_revenue: f64, rate: f64) -> Vec<HistoricalYear> {
    (0..years)
        .map(|i| {
            let back = (years - 1 - i) as i32;
            HistoricalYear {
                year: 2024 - back,
                revenue: last_revenue / (1.0 + rate).powi(back),
                ebitda: None,
            }
        })
        .collect()
}

/// Route engine events to the test output; safe to call from every test.
pub fn init_test_logging() {
    clinic_common::logging::init_logging("debug", "pretty");
}

pub fn assert_close(actual: f64, expected: f64, tolerance: f64) {
    assert!(
        (actual - expected).abs() <= tolerance,
        "expected {expected} ± {tolerance}, got {actual}"
    );
}
