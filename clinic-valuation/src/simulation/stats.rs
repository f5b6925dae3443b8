//! Summary statistics over simulated values.

use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

/// Percentile of an ascending-sorted sample by linear interpolation
/// between order statistics.
///
/// `p` is a fraction in [0, 1]. The index `(n − 1) × p` is clamped to the
/// sample, so out-of-range `p` returns the minimum or maximum. Returns
/// `None` for an empty sample.
pub fn percentile(sorted: &[f64], p: f64) -> Option<f64> {
    let n = sorted.len();
    if n == 0 {
        return None;
    }
    let index = ((n - 1) as f64 * p).clamp(0.0, (n - 1) as f64);
    let lower = index.floor() as usize;
    let upper = index.ceil() as usize;
    let weight = index - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * weight)
}

/// Distribution of one simulated output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DistributionSummary {
    pub mean: f64,
    pub std_dev: f64,
    /// Coefficient of variation `std_dev / |mean|`; `None` when the mean is zero
    pub volatility: Option<f64>,
    pub min: f64,
    pub p5: f64,
    pub p25: f64,
    pub median: f64,
    pub p75: f64,
    pub p95: f64,
    pub max: f64,
}

impl DistributionSummary {
    /// Summarize `values`, sorting them in place. `None` for an empty sample.
    pub fn from_values(values: &mut [f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        values.sort_by(f64::total_cmp);

        let mean = values.iter().mean();
        let std_dev = if values.len() > 1 {
            values.iter().std_dev()
        } else {
            0.0
        };
        let volatility = (mean != 0.0).then(|| std_dev / mean.abs());
        let pct = |p: f64| percentile(values, p).unwrap_or(mean);

        Some(Self {
            mean,
            std_dev,
            volatility,
            min: values[0],
            p5: pct(0.05),
            p25: pct(0.25),
            median: pct(0.50),
            p75: pct(0.75),
            p95: pct(0.95),
            max: values[values.len() - 1],
        })
    }

    /// `p95 − p5`
    pub fn spread(&self) -> f64 {
        self.p95 - self.p5
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentile_interpolation() {
        let sorted = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(percentile(&sorted, 0.0), Some(1.0));
        assert_eq!(percentile(&sorted, 0.5), Some(3.0));
        assert_eq!(percentile(&sorted, 1.0), Some(5.0));
        assert!((percentile(&sorted, 0.1).unwrap() - 1.4).abs() < 1e-12);
        assert_eq!(percentile(&sorted, 1.5), Some(5.0));
        assert_eq!(percentile(&sorted, -0.2), Some(1.0));
        assert_eq!(percentile(&[], 0.5), None);
        assert_eq!(percentile(&[7.0], 0.9), Some(7.0));
    }

    #[test]
    fn test_summary() {
        let mut values: Vec<f64> = (1..=101).rev().map(f64::from).collect();
        let s = DistributionSummary::from_values(&mut values).unwrap();

        assert!((s.mean - 51.0).abs() < 1e-9);
        assert_eq!(s.median, 51.0);
        assert_eq!(s.p5, 6.0);
        assert_eq!(s.p95, 96.0);
        assert_eq!(s.spread(), 90.0);
        assert_eq!(s.min, 1.0);
        assert_eq!(s.max, 101.0);
        assert!(s.p5 <= s.p25 && s.p25 <= s.median && s.median <= s.p75 && s.p75 <= s.p95);
        assert!((s.volatility.unwrap() - s.std_dev / 51.0).abs() < 1e-12);
    }

    #[test]
    fn test_single_value_and_zero_mean() {
        let s = DistributionSummary::from_values(&mut [3.0]).unwrap();
        assert_eq!(s.std_dev, 0.0);
        assert_eq!(s.p5, 3.0);

        let s = DistributionSummary::from_values(&mut [-1.0, 1.0]).unwrap();
        assert!(s.volatility.is_none());
        assert!(DistributionSummary::from_values(&mut []).is_none());
    }
}
