//! Revenue trend estimation from reported history.
//!
//! Four or more usable years fit a log-linear regression; two or three use
//! compound annual growth; fewer fall back to the last observed value.

use clinic_common::ValidationError;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

use crate::assumptions::HistoricalYear;
use crate::error::Result;
use crate::warning::{Severity, ValuationWarning};

/// Minimum usable years for regression.
const REGRESSION_MIN_YEARS: usize = 4;

/// How the growth rate was estimated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForecastMethod {
    /// Flat projection from the most recent year
    LastObserved,
    /// Compound annual growth between first and last year
    Cagr,
    /// OLS of ln(revenue) on year
    Regression,
}

impl std::fmt::Display for ForecastMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LastObserved => write!(f, "last observed"),
            Self::Cagr => write!(f, "CAGR"),
            Self::Regression => write!(f, "log-linear regression"),
        }
    }
}

/// Estimated revenue growth.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GrowthEstimate {
    pub growth_rate: f64,
    pub method: ForecastMethod,
    /// Usable years behind the estimate
    pub observations: usize,
    /// Goodness of fit, regression only
    pub r_squared: Option<f64>,
    /// Most recent usable revenue, zero when none
    pub last_revenue: f64,
}

impl GrowthEstimate {
    /// Revenue for each of the next `years` years.
    pub fn project(&self, years: u32) -> Vec<f64> {
        (1..=years)
            .map(|t| self.last_revenue * (1.0 + self.growth_rate).powi(t as i32))
            .collect()
    }

    pub fn warnings(&self) -> Vec<ValuationWarning> {
        match self.method {
            ForecastMethod::LastObserved => vec![ValuationWarning::insufficient_data(
                Severity::Medium,
                "trend_last_observed",
                format!(
                    "Only {} usable year(s) of history; \
                     projecting flat from the last observed revenue",
                    self.observations
                ),
            )],
            ForecastMethod::Cagr => vec![ValuationWarning::insufficient_data(
                Severity::Low,
                "trend_cagr",
                format!(
                    "{} years of history; using CAGR instead of regression",
                    self.observations
                ),
            )],
            ForecastMethod::Regression => Vec::new(),
        }
    }
}

/// Estimate revenue growth from `history` in any order.
///
/// Years with non-positive revenue are ignored. A year reported twice is an
/// error.
pub fn estimate_growth(history: &[HistoricalYear]) -> Result<GrowthEstimate> {
    let mut usable: Vec<(i32, f64)> = history
        .iter()
        .filter(|h| h.revenue > 0.0)
        .map(|h| (h.year, h.revenue))
        .collect();
    usable.sort_by_key(|(year, _)| *year);

    if let Some(pair) = usable.windows(2).find(|w| w[0].0 == w[1].0) {
        return Err(ValidationError::InvalidValue {
            field: "history".into(),
            reason: format!("duplicate year {}", pair[0].0),
        }
        .into());
    }

    let observations = usable.len();
    let last_revenue = usable.last().map_or(0.0, |(_, r)| *r);

    let (growth_rate, method, r_squared) = match usable.as_slice() {
        [] | [_] => (0.0, ForecastMethod::LastObserved, None),
        [first, .., last] if observations < REGRESSION_MIN_YEARS => {
            let periods = f64::from(last.0 - first.0);
            let cagr = (last.1 / first.1).powf(1.0 / periods) - 1.0;
            (cagr, ForecastMethod::Cagr, None)
        }
        points => {
            let (slope, r2) = log_linear_fit(points);
            (slope.exp() - 1.0, ForecastMethod::Regression, Some(r2))
        }
    };

    Ok(GrowthEstimate {
        growth_rate,
        method,
        observations,
        r_squared,
        last_revenue,
    })
}

/// OLS slope and r² of ln(revenue) against year.
fn log_linear_fit(points: &[(i32, f64)]) -> (f64, f64) {
    let xs: Vec<f64> = points.iter().map(|(year, _)| f64::from(*year)).collect();
    let ys: Vec<f64> = points.iter().map(|(_, revenue)| revenue.ln()).collect();
    let x_mean = xs.iter().mean();
    let y_mean = ys.iter().mean();

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    for (x, y) in xs.iter().zip(&ys) {
        sxy += (x - x_mean) * (y - y_mean);
        sxx += (x - x_mean).powi(2);
    }
    let slope = sxy / sxx;
    let intercept = y_mean - slope * x_mean;

    let ss_tot: f64 = ys.iter().map(|y| (y - y_mean).powi(2)).sum();
    let ss_res: f64 = xs
        .iter()
        .zip(&ys)
        .map(|(x, y)| (y - (intercept + slope * x)).powi(2))
        .sum();
    let r_squared = if ss_tot > 0.0 { 1.0 - ss_res / ss_tot } else { 1.0 };

    (slope, r_squared)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history(points: &[(i32, f64)]) -> Vec<HistoricalYear> {
        points
            .iter()
            .map(|&(year, revenue)| HistoricalYear {
                year,
                revenue,
                ebitda: None,
            })
            .collect()
    }

    #[test]
    fn test_no_history_falls_back() {
        let est = estimate_growth(&[]).unwrap();
        assert_eq!(est.method, ForecastMethod::LastObserved);
        assert_eq!(est.growth_rate, 0.0);
        assert_eq!(est.warnings()[0].severity, Severity::Medium);
        assert!(est.project(3).iter().all(|r| *r == 0.0));
    }

    #[test]
    fn test_single_year_projects_flat() {
        let est = estimate_growth(&history(&[(2023, 1_500_000.0)])).unwrap();
        assert_eq!(est.method, ForecastMethod::LastObserved);
        assert_eq!(est.project(2), vec![1_500_000.0, 1_500_000.0]);
    }

    #[test]
    fn test_cagr_for_short_history() {
        let est = estimate_growth(&history(&[
            (2023, 1_210_000.0),
            (2021, 1_000_000.0),
            (2022, 1_100_000.0),
        ]))
        .unwrap();
        assert_eq!(est.method, ForecastMethod::Cagr);
        assert!((est.growth_rate - 0.10).abs() < 1e-9);
        assert_eq!(est.last_revenue, 1_210_000.0);
        assert_eq!(est.warnings()[0].code, "trend_cagr");
    }

    #[test]
    fn test_regression_recovers_exact_growth() {
        let points: Vec<(i32, f64)> = (0..5)
            .map(|i| (2019 + i, 1_000_000.0 * 1.08f64.powi(i)))
            .collect();
        let est = estimate_growth(&history(&points)).unwrap();

        assert_eq!(est.method, ForecastMethod::Regression);
        assert!((est.growth_rate - 0.08).abs() < 1e-9);
        assert!((est.r_squared.unwrap() - 1.0).abs() < 1e-9);
        assert!(est.warnings().is_empty());
    }

    #[test]
    fn test_non_positive_years_are_excluded() {
        let est = estimate_growth(&history(&[
            (2020, 0.0),
            (2021, 1_000_000.0),
            (2022, 1_050_000.0),
        ]))
        .unwrap();
        assert_eq!(est.observations, 2);
        assert_eq!(est.method, ForecastMethod::Cagr);
        assert!((est.growth_rate - 0.05).abs() < 1e-9);
    }

    #[test]
    fn test_noisy_regression_fit() {
        let est = estimate_growth(&history(&[
            (2019, 1_000_000.0),
            (2020, 1_120_000.0),
            (2021, 1_150_000.0),
            (2022, 1_330_000.0),
        ]))
        .unwrap();
        let r2 = est.r_squared.unwrap();
        assert!(r2 > 0.8 && r2 < 1.0, "r2 = {r2}");
        assert!(est.growth_rate > 0.07 && est.growth_rate < 0.12);
    }

    #[test]
    fn test_duplicate_year_is_rejected() {
        let err = estimate_growth(&history(&[
            (2021, 1_000_000.0),
            (2022, 1_100_000.0),
            (2022, 1_150_000.0),
        ]))
        .unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("duplicate year 2022"));
    }
}
