//! Weighted hybrid of the three methods.

use super::types::{
    HybridValuationResult, MethodWeights, Methodology, ValuationMethod, ValuationResult,
};
use crate::assumptions::{BalanceSheet, DataQuality, GrowthProfile, MethodProfile, SynergyProfile};
use crate::config::HybridWeightSets;

/// Pick the weight set for a qualitative profile.
///
/// All-high profiles lean on DCF; low growth or low data quality lean on
/// EPV; everything else is balanced.
pub fn select_weights(
    profile: &MethodProfile,
    sets: &HybridWeightSets,
) -> (Methodology, MethodWeights) {
    match (profile.growth, profile.synergy, profile.data_quality) {
        (GrowthProfile::High, SynergyProfile::High, DataQuality::High) => {
            (Methodology::GrowthBiased, sets.growth_biased)
        }
        (GrowthProfile::Low, _, _) | (_, _, DataQuality::Low) => {
            (Methodology::Conservative, sets.conservative)
        }
        _ => (Methodology::Balanced, sets.balanced),
    }
}

/// Blend EPV, DCF and multiple results with the selected weights.
#[allow(clippy::too_many_arguments)]
pub fn value_hybrid(
    epv: &ValuationResult,
    dcf: &ValuationResult,
    multiple: &ValuationResult,
    profile: &MethodProfile,
    sets: &HybridWeightSets,
    revenue: f64,
    ebitda: f64,
    balance: &BalanceSheet,
) -> HybridValuationResult {
    let (methodology, weights) = select_weights(profile, sets);
    let enterprise_value = weights.epv * epv.enterprise_value
        + weights.dcf * dcf.enterprise_value
        + weights.multiple * multiple.enterprise_value;

    HybridValuationResult {
        result: ValuationResult::new(
            ValuationMethod::Hybrid,
            enterprise_value,
            revenue,
            ebitda,
            balance,
        ),
        weights,
        methodology,
        components: [*epv, *dcf, *multiple],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn profile(
        growth: GrowthProfile,
        synergy: SynergyProfile,
        data_quality: DataQuality,
    ) -> MethodProfile {
        MethodProfile {
            growth,
            synergy,
            data_quality,
            multiple_override: None,
        }
    }

    #[test_case(
        GrowthProfile::High,
        SynergyProfile::High,
        DataQuality::High,
        Methodology::GrowthBiased
    )]
    #[test_case(
        GrowthProfile::High,
        SynergyProfile::Moderate,
        DataQuality::High,
        Methodology::Balanced
    )]
    #[test_case(
        GrowthProfile::Moderate,
        SynergyProfile::Moderate,
        DataQuality::Medium,
        Methodology::Balanced
    )]
    #[test_case(
        GrowthProfile::Low,
        SynergyProfile::High,
        DataQuality::High,
        Methodology::Conservative
    )]
    #[test_case(
        GrowthProfile::High,
        SynergyProfile::High,
        DataQuality::Low,
        Methodology::Conservative
    )]
    fn test_rule_table(
        growth: GrowthProfile,
        synergy: SynergyProfile,
        quality: DataQuality,
        expected: Methodology,
    ) {
        let (methodology, weights) =
            select_weights(&profile(growth, synergy, quality), &HybridWeightSets::default());
        assert_eq!(methodology, expected);
        assert!(weights.is_normalized());
    }

    #[test]
    fn test_weighted_blend() {
        let bs = BalanceSheet {
            non_operating_cash: 0.0,
            interest_bearing_debt: 1_000_000.0,
            tangible_asset_value: 0.0,
        };
        let r = |method, ev| ValuationResult::new(method, ev, 5_000_000.0, 1_000_000.0, &bs);
        let hybrid = value_hybrid(
            &r(ValuationMethod::Epv, 6_000_000.0),
            &r(ValuationMethod::Dcf, 8_000_000.0),
            &r(ValuationMethod::Multiple, 5_000_000.0),
            &MethodProfile::default(),
            &HybridWeightSets::default(),
            5_000_000.0,
            1_000_000.0,
            &bs,
        );
        let expected = 0.4 * 6_000_000.0 + 0.3 * 8_000_000.0 + 0.3 * 5_000_000.0;
        assert_eq!(hybrid.methodology, Methodology::Balanced);
        assert!((hybrid.result.enterprise_value - expected).abs() < 1e-6);
        assert!((hybrid.result.equity_value - (expected - 1_000_000.0)).abs() < 1e-6);
        assert!(hybrid.label().contains("40% EPV"));
    }
}
