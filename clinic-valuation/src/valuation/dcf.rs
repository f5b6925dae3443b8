//! Discounted cash flow.
//!
//! Growth decays geometrically from the initial rate toward the terminal
//! rate. Margins, D&A and capex scale with revenue; working capital moves
//! with the change in revenue.

use super::types::{DcfValuation, DcfYear, ValuationMethod, ValuationResult};
use crate::assumptions::{BalanceSheet, DcfAssumptions};
use crate::error::{Result, ValuationError};
use crate::operations::NormalizedEarnings;

/// `max(min_growth, terminal + (initial − terminal) × (1 − decay)^(t−1))` for t in 1..=years.
pub fn growth_path(
    initial_growth: f64,
    terminal_growth: f64,
    decay_rate: f64,
    min_growth: f64,
    years: u32,
) -> Vec<f64> {
    (1..=years)
        .map(|t| {
            let premium =
                (initial_growth - terminal_growth) * (1.0 - decay_rate).powi(t as i32 - 1);
            (terminal_growth + premium).max(min_growth)
        })
        .collect()
}

/// `terminal_fcf / (wacc − terminal_growth)`, requiring `wacc > terminal_growth`.
pub fn gordon_terminal_value(terminal_fcf: f64, wacc: f64, terminal_growth: f64) -> Result<f64> {
    let spread = wacc - terminal_growth;
    if spread <= 0.0 || spread.is_nan() {
        return Err(ValuationError::NonPositiveDenominator {
            context: "gordon growth terminal value (wacc - terminal growth)",
            value: spread,
        });
    }
    Ok(terminal_fcf / spread)
}

/// Project free cash flow and discount it at `wacc`.
pub fn value_dcf(
    earnings: &NormalizedEarnings,
    dcf: &DcfAssumptions,
    working_capital_rate: f64,
    initial_growth: f64,
    wacc: f64,
    balance: &BalanceSheet,
) -> Result<DcfValuation> {
    if wacc <= 0.0 || wacc.is_nan() {
        return Err(ValuationError::NonPositiveWacc { wacc });
    }

    let growth = growth_path(
        initial_growth,
        dcf.terminal_growth,
        dcf.decay_rate,
        dcf.min_growth,
        dcf.projection_years,
    );

    let mut index = 1.0;
    let mut prev_revenue = earnings.revenue;
    let mut years = Vec::with_capacity(growth.len());

    for (i, &g) in growth.iter().enumerate() {
        let year = i as u32 + 1;
        index *= 1.0 + g;

        let revenue = earnings.revenue * index;
        let ebit = earnings.ebit() * index;
        let nopat = ebit * (1.0 - earnings.tax_rate);
        let da = earnings.da() * index;
        let capex = earnings.maintenance_capex * index;
        let working_capital_change = working_capital_rate * (revenue - prev_revenue);
        let free_cash_flow = nopat + da - capex - working_capital_change;
        let discount_factor = 1.0 / (1.0 + wacc).powi(year as i32);

        years.push(DcfYear {
            year,
            growth: g,
            revenue,
            ebit,
            nopat,
            da,
            capex,
            working_capital_change,
            free_cash_flow,
            discount_factor,
            present_value: free_cash_flow * discount_factor,
        });
        prev_revenue = revenue;
    }

    let pv_explicit: f64 = years.iter().map(|y| y.present_value).sum();

    // Steady state after the last explicit year, growing at the terminal rate.
    let g_t = dcf.terminal_growth;
    let terminal_fcf = match years.last() {
        Some(last) => {
            (last.nopat + last.da - last.capex) * (1.0 + g_t)
                - working_capital_rate * last.revenue * g_t
        }
        None => earnings.nopat + earnings.da() - earnings.maintenance_capex,
    };
    let terminal_value = gordon_terminal_value(terminal_fcf, wacc, g_t)?;
    let final_discount = years.last().map_or(1.0, |y| y.discount_factor);
    let pv_terminal = terminal_value * final_discount;

    let enterprise_value = pv_explicit + pv_terminal;

    Ok(DcfValuation {
        result: ValuationResult::new(
            ValuationMethod::Dcf,
            enterprise_value,
            earnings.revenue,
            earnings.normalized_ebitda(),
            balance,
        ),
        initial_growth,
        terminal_growth: g_t,
        wacc,
        years,
        pv_explicit,
        terminal_fcf,
        terminal_value,
        pv_terminal,
    })
}
