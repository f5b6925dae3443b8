//! Leveraged buyout returns.
//!
//! Acquisition debt is serviced from owner-earnings free cash flow; cash
//! left after interest is swept against principal. Exit equity over entry
//! equity gives MOIC, annualized over the hold period for IRR.

use std::time::Instant;

use clinic_common::{Validate, ValidationResult, Violations};
use serde::{Deserialize, Serialize};

use crate::assumptions::EarningsBasis;
use crate::error::{Result, ValuationError};
use crate::valuation::EpvDriver;

/// How the entry price is set.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EntryValuation {
    /// Negotiated enterprise value
    Override { enterprise_value: f64 },
    /// Base-case EPV
    #[default]
    FromEpv,
}

/// How the exit price is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitValuation {
    /// EPV of final-year earnings at the scenario WACC
    #[default]
    RederivedEpv,
    /// Exit at the entry enterprise value
    FlatAtEntry,
}

/// Deal structure.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LboAssumptions {
    pub entry: EntryValuation,
    /// Debt share of entry enterprise value, in [0, 1)
    pub entry_debt_pct: f64,
    pub cost_of_debt: f64,
    pub hold_years: u32,
    /// Share of post-interest cash applied to principal
    pub sweep_fraction: f64,
    /// Annual growth of owner earnings over the hold
    pub earnings_growth: f64,
    pub exit: ExitValuation,
}

impl Default for LboAssumptions {
    fn default() -> Self {
        Self {
            entry: EntryValuation::FromEpv,
            entry_debt_pct: 0.60,
            cost_of_debt: 0.09,
            hold_years: 5,
            sweep_fraction: 1.0,
            earnings_growth: 0.0,
            exit: ExitValuation::RederivedEpv,
        }
    }
}

impl Validate for LboAssumptions {
    fn validate(&self) -> ValidationResult<()> {
        let mut v = Violations::new();
        if let EntryValuation::Override { enterprise_value } = self.entry {
            v.positive("lbo.entry.enterprise_value", enterprise_value);
        }
        v.ensure(
            (0.0..1.0).contains(&self.entry_debt_pct),
            "lbo.entry_debt_pct",
            format!("must be in [0, 1), got {}", self.entry_debt_pct),
        );
        v.in_range("lbo.cost_of_debt", self.cost_of_debt, 0.0, 1.0);
        v.ensure(
            (1..=30).contains(&self.hold_years),
            "lbo.hold_years",
            format!("must be between 1 and 30, got {}", self.hold_years),
        );
        v.fraction("lbo.sweep_fraction", self.sweep_fraction);
        v.in_range("lbo.earnings_growth", self.earnings_growth, -0.5, 1.0);
        v.finish()
    }
}

/// One year of the debt schedule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LboYear {
    pub year: u32,
    pub opening_debt: f64,
    pub interest: f64,
    pub free_cash_flow: f64,
    /// `max(0, free_cash_flow − interest)`
    pub cash_after_interest: f64,
    pub principal_paydown: f64,
    pub closing_debt: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LboResult {
    pub entry_enterprise_value: f64,
    pub entry_debt: f64,
    pub entry_equity: f64,
    pub schedule: Vec<LboYear>,
    pub exit_enterprise_value: f64,
    pub exit_debt: f64,
    pub exit_equity: f64,
    pub moic: f64,
    pub irr: f64,
}

/// `exit_equity / entry_equity`
pub fn moic(exit_equity: f64, entry_equity: f64) -> Result<f64> {
    if entry_equity <= 0.0 {
        return Err(ValuationError::NonPositiveDenominator {
            context: "MOIC entry equity",
            value: entry_equity,
        });
    }
    Ok(exit_equity / entry_equity)
}

/// `MOIC^(1/years) − 1`; a total loss (MOIC ≤ 0) is −100%.
pub fn irr_from_moic(moic: f64, years: u32) -> f64 {
    if moic <= 0.0 || years == 0 {
        return -1.0;
    }
    moic.powf(1.0 / f64::from(years)) - 1.0
}

/// Simulates a buyout of the base case.
pub struct LboSimulator<'a> {
    driver: &'a EpvDriver,
    wacc: f64,
}

impl<'a> LboSimulator<'a> {
    pub fn new(driver: &'a EpvDriver, wacc: f64) -> Self {
        Self { driver, wacc }
    }

    pub fn run(&self, assumptions: &LboAssumptions) -> Result<LboResult> {
        assumptions.validate()?;
        let started = Instant::now();

        let entry_enterprise_value = match assumptions.entry {
            EntryValuation::Override { enterprise_value } => enterprise_value,
            EntryValuation::FromEpv => self.driver.enterprise_value(self.wacc)?,
        };
        let entry_debt = assumptions.entry_debt_pct * entry_enterprise_value;
        let entry_equity = entry_enterprise_value - entry_debt;

        let growth_index = |year: u32| (1.0 + assumptions.earnings_growth).powi(year as i32 - 1);

        let mut debt = entry_debt;
        let mut schedule = Vec::with_capacity(assumptions.hold_years as usize);
        for year in 1..=assumptions.hold_years {
            let free_cash_flow = self
                .driver
                .scaled(growth_index(year))
                .with_basis(EarningsBasis::OwnerEarnings)
                .base_earnings();
            let interest = debt * assumptions.cost_of_debt;
            let cash_after_interest = (free_cash_flow - interest).max(0.0);
            let principal_paydown = (cash_after_interest * assumptions.sweep_fraction).min(debt);
            let closing_debt = (debt - principal_paydown).max(0.0);

            schedule.push(LboYear {
                year,
                opening_debt: debt,
                interest,
                free_cash_flow,
                cash_after_interest,
                principal_paydown,
                closing_debt,
            });
            debt = closing_debt;
        }

        let exit_enterprise_value = match assumptions.exit {
            ExitValuation::RederivedEpv => self
                .driver
                .scaled(growth_index(assumptions.hold_years))
                .enterprise_value(self.wacc)?,
            ExitValuation::FlatAtEntry => entry_enterprise_value,
        };
        let exit_equity = exit_enterprise_value - debt;
        let moic = moic(exit_equity, entry_equity)?;
        let irr = irr_from_moic(moic, assumptions.hold_years);

        tracing::info!(
            entry_ev = entry_enterprise_value,
            exit_ev = exit_enterprise_value,
            exit_debt = debt,
            moic,
            irr,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "LBO simulation complete"
        );

        Ok(LboResult {
            entry_enterprise_value,
            entry_debt,
            entry_equity,
            schedule,
            exit_enterprise_value,
            exit_debt: debt,
            exit_equity,
            moic,
            irr,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assumptions::BalanceSheet;

    fn make_driver() -> EpvDriver {
        EpvDriver {
            revenue: 5_000_000.0,
            ebit: 1_098_000.0,
            ebitda: 1_188_000.0,
            da: 90_000.0,
            maintenance_capex: 90_000.0,
            tax_rate: 0.26,
            basis: EarningsBasis::NopatLessReinvestment { rate: 0.08 },
            risk_haircut: 0.0,
            balance: BalanceSheet::default(),
        }
    }

    #[test]
    fn test_moic_and_irr() {
        let m = moic(8_807_436.0, 2_524_500.0).unwrap();
        assert!((m - 3.4888).abs() < 1e-3);
        assert!((irr_from_moic(m, 5) - 0.284).abs() < 1e-3);
        assert_eq!(irr_from_moic(-0.2, 5), -1.0);
        assert!(moic(1.0, 0.0).is_err());
    }

    #[test]
    fn test_entry_split() {
        let driver = make_driver();
        let lbo = LboSimulator::new(&driver, 0.12)
            .run(&LboAssumptions {
                entry: EntryValuation::Override {
                    enterprise_value: 10_098_000.0,
                },
                entry_debt_pct: 0.75,
                ..Default::default()
            })
            .unwrap();
        assert!((lbo.entry_debt - 7_573_500.0).abs() < 1e-6);
        assert!((lbo.entry_equity - 2_524_500.0).abs() < 1e-6);
    }

    #[test]
    fn test_debt_schedule_sweeps_cash() {
        let driver = make_driver();
        let assumptions = LboAssumptions {
            entry: EntryValuation::Override {
                enterprise_value: 6_000_000.0,
            },
            entry_debt_pct: 0.5,
            cost_of_debt: 0.10,
            hold_years: 3,
            sweep_fraction: 0.5,
            earnings_growth: 0.0,
            exit: ExitValuation::FlatAtEntry,
        };
        let lbo = LboSimulator::new(&driver, 0.12).run(&assumptions).unwrap();

        // Owner earnings: 812,520 + 90,000 − 90,000
        let y1 = lbo.schedule[0];
        assert!((y1.free_cash_flow - 812_520.0).abs() < 1e-6);
        assert!((y1.interest - 300_000.0).abs() < 1e-6);
        assert!((y1.principal_paydown - 256_260.0).abs() < 1e-6);
        assert!((y1.closing_debt - 2_743_740.0).abs() < 1e-6);
        assert!(lbo.schedule.windows(2).all(|w| w[1].opening_debt == w[0].closing_debt));
        assert!(lbo.exit_debt < 3_000_000.0);
        assert!((lbo.exit_equity - (6_000_000.0 - lbo.exit_debt)).abs() < 1e-6);
        assert!((lbo.moic - lbo.exit_equity / 3_000_000.0).abs() < 1e-12);
    }

    #[test]
    fn test_debt_never_negative() {
        let driver = make_driver();
        let lbo = LboSimulator::new(&driver, 0.12)
            .run(&LboAssumptions {
                entry: EntryValuation::Override {
                    enterprise_value: 1_000_000.0,
                },
                entry_debt_pct: 0.5,
                ..Default::default()
            })
            .unwrap();
        assert_eq!(lbo.exit_debt, 0.0);
        assert!(lbo.schedule.iter().all(|y| y.closing_debt >= 0.0));
    }

    #[test]
    fn test_rederived_exit_grows_with_earnings() {
        let driver = make_driver();
        let assumptions = LboAssumptions {
            earnings_growth: 0.05,
            ..Default::default()
        };
        let lbo = LboSimulator::new(&driver, 0.12).run(&assumptions).unwrap();
        let entry = driver.enterprise_value(0.12).unwrap();
        assert!((lbo.entry_enterprise_value - entry).abs() < 1e-6);
        assert!((lbo.exit_enterprise_value - entry * 1.05f64.powi(4)).abs() < 1e-3);
        assert!(lbo.irr > 0.0);
    }

    #[test]
    fn test_full_leverage_rejected() {
        let driver = make_driver();
        let err = LboSimulator::new(&driver, 0.12)
            .run(&LboAssumptions {
                entry_debt_pct: 1.0,
                ..Default::default()
            })
            .unwrap_err();
        assert!(err.is_validation());
    }
}
