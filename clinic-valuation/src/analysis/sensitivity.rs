//! Two-dimensional sensitivity of equity value to WACC and EBIT margin.

use serde::{Deserialize, Serialize};

use crate::config::SensitivitySteps;
use crate::valuation::EpvDriver;

/// Equity values over a WACC × EBIT-margin grid.
///
/// `equity_values[i][j]` is the EPV equity value at `wacc_values[i]` and
/// `ebit_margins[j]`. Cells where the WACC is not positive are `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityGrid {
    pub base_wacc: f64,
    pub base_margin: f64,
    pub wacc_values: Vec<f64>,
    pub ebit_margins: Vec<f64>,
    pub equity_values: Vec<Vec<Option<f64>>>,
}

impl SensitivityGrid {
    /// Value at the grid centre (base WACC, base margin).
    pub fn base_value(&self) -> Option<f64> {
        let i = self.wacc_values.len() / 2;
        let j = self.ebit_margins.len() / 2;
        self.equity_values.get(i)?.get(j).copied().flatten()
    }

    /// Lowest and highest defined cell.
    pub fn range(&self) -> Option<(f64, f64)> {
        self.equity_values
            .iter()
            .flatten()
            .flatten()
            .fold(None, |acc, &v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

fn axis(center: f64, step: f64, steps_each_side: usize) -> Vec<f64> {
    let n = steps_each_side as i64;
    (-n..=n).map(|k| center + k as f64 * step).collect()
}

/// Recompute EPV equity value at every grid point around the base case.
pub fn build_sensitivity(
    driver: &EpvDriver,
    base_wacc: f64,
    steps: &SensitivitySteps,
) -> SensitivityGrid {
    let base_margin = driver.ebit_margin().unwrap_or(0.0);
    let wacc_values = axis(base_wacc, steps.wacc_step, steps.wacc_steps_each_side);
    let ebit_margins = axis(base_margin, steps.margin_step, steps.margin_steps_each_side);

    let equity_values = wacc_values
        .iter()
        .map(|&wacc| {
            ebit_margins
                .iter()
                .map(|&margin| driver.with_ebit_margin(margin).equity_value(wacc).ok())
                .collect()
        })
        .collect();

    SensitivityGrid {
        base_wacc,
        base_margin,
        wacc_values,
        ebit_margins,
        equity_values,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assumptions::{BalanceSheet, EarningsBasis};

    fn make_driver() -> EpvDriver {
        EpvDriver {
            revenue: 4_000_000.0,
            ebit: 800_000.0,
            ebitda: 900_000.0,
            da: 100_000.0,
            maintenance_capex: 80_000.0,
            tax_rate: 0.25,
            basis: EarningsBasis::OwnerEarnings,
            risk_haircut: 0.0,
            balance: BalanceSheet {
                non_operating_cash: 50_000.0,
                interest_bearing_debt: 250_000.0,
                tangible_asset_value: 0.0,
            },
        }
    }

    #[test]
    fn test_grid_shape_and_centre() {
        let driver = make_driver();
        let grid = build_sensitivity(&driver, 0.15, &SensitivitySteps::default());

        assert_eq!(grid.wacc_values.len(), 7);
        assert_eq!(grid.ebit_margins.len(), 5);
        assert!((grid.wacc_values[0] - 0.12).abs() < 1e-12);
        assert!((grid.ebit_margins[4] - 0.24).abs() < 1e-12);

        let centre = grid.base_value().unwrap();
        assert!((centre - driver.equity_value(0.15).unwrap()).abs() < 1e-6);
    }

    #[test]
    fn test_monotone_in_both_axes() {
        let grid = build_sensitivity(&make_driver(), 0.15, &SensitivitySteps::default());
        for row in &grid.equity_values {
            let row: Vec<f64> = row.iter().map(|c| c.unwrap()).collect();
            assert!(row.windows(2).all(|w| w[0] < w[1]), "margin up, value up");
        }
        for j in 0..grid.ebit_margins.len() {
            let col: Vec<f64> = grid.equity_values.iter().map(|r| r[j].unwrap()).collect();
            assert!(col.windows(2).all(|w| w[0] > w[1]), "wacc up, value down");
        }
        let (lo, hi) = grid.range().unwrap();
        assert!(lo < hi);
    }

    #[test]
    fn test_non_positive_wacc_cells_are_empty() {
        let grid = build_sensitivity(&make_driver(), 0.02, &SensitivitySteps::default());
        assert!(grid.equity_values[0].iter().all(Option::is_none));
        assert!(grid.equity_values[1].iter().all(Option::is_none));
        assert!(grid.equity_values[2].iter().all(Option::is_some));
    }
}
