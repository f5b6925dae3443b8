//! Earnings power value.
//!
//! [`EpvDriver`] carries the handful of figures the perpetuity formula
//! needs, so the sensitivity grid, the Monte Carlo simulator and the LBO
//! exit can recompute EPV at a different margin or WACC without re-running
//! the operating model.

use serde::{Deserialize, Serialize};

use super::types::{EpvValuation, ValuationMethod, ValuationResult};
use crate::assumptions::{BalanceSheet, EarningsBasis};
use crate::error::{Result, ValuationError};
use crate::operations::earnings::earnings_for_basis;
use crate::operations::NormalizedEarnings;

/// `earnings / wacc`, or an error when `wacc ≤ 0`.
pub fn perpetuity_value(earnings: f64, wacc: f64) -> Result<f64> {
    if wacc <= 0.0 || wacc.is_nan() {
        return Err(ValuationError::NonPositiveWacc { wacc });
    }
    Ok(earnings / wacc)
}

/// Inputs to the EPV formula.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpvDriver {
    pub revenue: f64,
    pub ebit: f64,
    /// Normalized EBITDA, for implied multiples
    pub ebitda: f64,
    pub da: f64,
    pub maintenance_capex: f64,
    pub tax_rate: f64,
    pub basis: EarningsBasis,
    pub risk_haircut: f64,
    pub balance: BalanceSheet,
}

impl EpvDriver {
    pub fn from_earnings(
        earnings: &NormalizedEarnings,
        basis: EarningsBasis,
        risk_haircut: f64,
        balance: BalanceSheet,
    ) -> Self {
        Self {
            revenue: earnings.revenue,
            ebit: earnings.ebit(),
            ebitda: earnings.normalized_ebitda(),
            da: earnings.da(),
            maintenance_capex: earnings.maintenance_capex,
            tax_rate: earnings.tax_rate,
            basis,
            risk_haircut,
            balance,
        }
    }

    pub fn ebit_margin(&self) -> Option<f64> {
        (self.revenue > 0.0).then(|| self.ebit / self.revenue)
    }

    /// Same driver with EBIT reset to `revenue × margin`; EBITDA moves with it.
    pub fn with_ebit_margin(mut self, margin: f64) -> Self {
        let ebit = self.revenue * margin;
        self.ebitda += ebit - self.ebit;
        self.ebit = ebit;
        self
    }

    /// Same driver with every earnings figure scaled by `factor`.
    pub fn scaled(mut self, factor: f64) -> Self {
        self.revenue *= factor;
        self.ebit *= factor;
        self.ebitda *= factor;
        self.da *= factor;
        self.maintenance_capex *= factor;
        self
    }

    pub fn with_basis(mut self, basis: EarningsBasis) -> Self {
        self.basis = basis;
        self
    }

    /// Earnings for the driver's basis before the haircut.
    pub fn base_earnings(&self) -> f64 {
        earnings_for_basis(
            self.basis,
            self.ebit,
            self.tax_rate,
            self.da,
            self.maintenance_capex,
        )
    }

    /// `base_earnings × (1 − risk_haircut)`
    pub fn adjusted_earnings(&self) -> f64 {
        self.base_earnings() * (1.0 - self.risk_haircut)
    }

    pub fn enterprise_value(&self, wacc: f64) -> Result<f64> {
        perpetuity_value(self.adjusted_earnings(), wacc)
    }

    pub fn equity_value(&self, wacc: f64) -> Result<f64> {
        Ok(self.balance.equity_value(self.enterprise_value(wacc)?))
    }
}

/// Value the driver as a zero-growth perpetuity at `wacc`.
pub fn value_epv(driver: &EpvDriver, wacc: f64) -> Result<EpvValuation> {
    let enterprise_value = driver.enterprise_value(wacc)?;
    Ok(EpvValuation {
        result: ValuationResult::new(
            ValuationMethod::Epv,
            enterprise_value,
            driver.revenue,
            driver.ebitda,
            &driver.balance,
        ),
        basis: driver.basis,
        base_earnings: driver.base_earnings(),
        risk_haircut: driver.risk_haircut,
        adjusted_earnings: driver.adjusted_earnings(),
        wacc,
    })
}
