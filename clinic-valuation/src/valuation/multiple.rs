//! Market multiple valuation.

use clinic_common::ValidationError;

use super::types::{MultipleValuation, ValuationMethod, ValuationResult};
use crate::assumptions::{BalanceSheet, MethodProfile};
use crate::config::Benchmarks;
use crate::error::Result;

/// Select the EV/EBITDA multiple for `ebitda` and apply it.
///
/// The band midpoint is adjusted for location count, data quality and
/// growth; each step is clamped back into the band's published range. A
/// caller override bypasses the table but the band is still reported.
pub fn value_multiple(
    revenue: f64,
    ebitda: f64,
    locations: u32,
    profile: &MethodProfile,
    benchmarks: &Benchmarks,
    balance: &BalanceSheet,
) -> Result<MultipleValuation> {
    let band = *benchmarks
        .band_for(ebitda)
        .ok_or_else(|| ValidationError::MissingField {
            field: "calibration.benchmarks.multiple_bands".into(),
        })?;

    let adj = &benchmarks.multiple_adjustments;
    let location_factor = adj.location_factor(locations);
    let data_quality_factor = adj.data_quality_factor(profile.data_quality);
    let growth_factor = adj.growth_factor(profile.growth);

    let (selected_multiple, overridden) = match profile.multiple_override {
        Some(multiple) => (multiple, true),
        None => {
            let clamp = |m: f64| m.clamp(band.low, band.high);
            let m = clamp(band.mid * location_factor);
            let m = clamp(m * data_quality_factor);
            (clamp(m * growth_factor), false)
        }
    };

    Ok(MultipleValuation {
        result: ValuationResult::new(
            ValuationMethod::Multiple,
            ebitda * selected_multiple,
            revenue,
            ebitda,
            balance,
        ),
        band,
        location_factor,
        data_quality_factor,
        growth_factor,
        selected_multiple,
        overridden,
    })
}
