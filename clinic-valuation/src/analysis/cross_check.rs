//! Inter-method and benchmark consistency checks.
//!
//! Checks never abort a valuation. A failed check carries a severity and is
//! surfaced as a consistency warning.

use serde::{Deserialize, Serialize};

use crate::assumptions::{BalanceSheet, EarningsBasis, PracticeType};
use crate::config::Calibration;
use crate::error::Result;
use crate::valuation::{DcfValuation, EpvDriver, MethodValuations, ValuationResult};
use crate::warning::{Severity, ValuationWarning};

/// Outcome of one consistency check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossCheck {
    /// Stable check name, reused as the warning code
    pub name: String,
    pub passed: bool,
    /// `Low` for passed checks
    pub severity: Severity,
    pub message: String,
}

impl CrossCheck {
    fn pass(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed: true,
            severity: Severity::Low,
            message: message.into(),
        }
    }

    fn fail(name: impl Into<String>, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed: false,
            severity,
            message: message.into(),
        }
    }
}

/// All checks for one valuation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CrossValidationReport {
    pub checks: Vec<CrossCheck>,
}

impl CrossValidationReport {
    pub fn failed(&self) -> impl Iterator<Item = &CrossCheck> {
        self.checks.iter().filter(|c| !c.passed)
    }

    pub fn all_passed(&self) -> bool {
        self.checks.iter().all(|c| c.passed)
    }

    /// Most severe failed check.
    pub fn max_severity(&self) -> Option<Severity> {
        self.failed().map(|c| c.severity).max()
    }

    pub fn get(&self, name: &str) -> Option<&CrossCheck> {
        self.checks.iter().find(|c| c.name == name)
    }

    pub fn warnings(&self) -> Vec<ValuationWarning> {
        self.failed()
            .map(|c| ValuationWarning::consistency(c.severity, c.name.clone(), c.message.clone()))
            .collect()
    }
}

/// Figures the checks compare.
#[derive(Debug, Clone, Copy)]
pub struct CrossCheckContext<'a> {
    pub revenue: f64,
    pub normalized_ebitda: f64,
    pub practice_type: PracticeType,
    pub balance: &'a BalanceSheet,
    pub wacc: f64,
    pub methods: &'a MethodValuations,
}

/// Run every consistency check.
pub fn cross_validate(
    ctx: &CrossCheckContext<'_>,
    calibration: &Calibration,
) -> Result<CrossValidationReport> {
    let mut checks = Vec::new();

    checks.push(check_epv_basis_variance(&ctx.methods.driver, ctx.wacc, calibration)?);
    for result in [
        &ctx.methods.epv.result,
        &ctx.methods.dcf.result,
        &ctx.methods.hybrid.result,
    ] {
        checks.push(check_multiple_band(result, ctx.normalized_ebitda, calibration));
    }
    checks.push(check_margin_band(
        ctx.revenue,
        ctx.normalized_ebitda,
        ctx.practice_type,
        calibration,
    ));
    checks.extend(check_small_practice(
        ctx.revenue,
        &ctx.methods.hybrid.result,
        ctx.balance,
        calibration,
    ));
    checks.push(check_terminal_share(&ctx.methods.dcf, calibration));

    Ok(CrossValidationReport { checks })
}

/// `|a − b| / max(|a|, |b|)`, zero when both are zero.
pub fn relative_difference(a: f64, b: f64) -> f64 {
    let scale = a.abs().max(b.abs());
    if scale == 0.0 {
        0.0
    } else {
        (a - b).abs() / scale
    }
}

/// EPV on owner earnings against EPV on NOPAT.
pub fn check_epv_basis_variance(
    driver: &EpvDriver,
    wacc: f64,
    calibration: &Calibration,
) -> Result<CrossCheck> {
    const NAME: &str = "epv_basis_variance";
    let t = &calibration.cross_check;

    let owner = driver.with_basis(EarningsBasis::OwnerEarnings).enterprise_value(wacc)?;
    let nopat = driver.with_basis(EarningsBasis::Nopat).enterprise_value(wacc)?;
    let diff = relative_difference(owner, nopat);

    let message = format!(
        "EPV on owner earnings {:.0} vs NOPAT {:.0} differs by {:.1}%",
        owner,
        nopat,
        diff * 100.0
    );
    let severity = if diff > t.variance_critical {
        Severity::Critical
    } else if diff > t.variance_high {
        Severity::High
    } else if diff > t.variance_medium {
        Severity::Medium
    } else {
        return Ok(CrossCheck::pass(NAME, message));
    };
    Ok(CrossCheck::fail(NAME, severity, message))
}

/// Implied EV/EBITDA against the size band for `normalized_ebitda`.
pub fn check_multiple_band(
    result: &ValuationResult,
    normalized_ebitda: f64,
    calibration: &Calibration,
) -> CrossCheck {
    let name = format!("{}_multiple_band", result.method.to_string().to_lowercase());
    let t = &calibration.cross_check;

    let Some(band) = calibration.benchmarks.band_for(normalized_ebitda) else {
        return CrossCheck::pass(name, "No benchmark band configured");
    };
    let Some(multiple) = result.implied_ev_ebitda else {
        return CrossCheck::fail(
            name,
            Severity::Medium,
            format!("{} implied EV/EBITDA is undefined for non-positive EBITDA", result.method),
        );
    };

    let message = format!(
        "{} implies {:.2}x EBITDA against a {:.1}x-{:.1}x band",
        result.method, multiple, band.low, band.high
    );
    if band.contains_multiple(multiple) {
        CrossCheck::pass(name, message)
    } else if multiple < band.low * t.band_floor_factor
        || multiple > band.high * t.band_ceiling_factor
    {
        CrossCheck::fail(name, Severity::High, message)
    } else {
        CrossCheck::fail(name, Severity::Medium, message)
    }
}

/// Normalized EBITDA margin against the practice-type band.
pub fn check_margin_band(
    revenue: f64,
    normalized_ebitda: f64,
    practice_type: PracticeType,
    calibration: &Calibration,
) -> CrossCheck {
    const NAME: &str = "margin_band";
    if revenue <= 0.0 {
        return CrossCheck::fail(NAME, Severity::Critical, "No revenue; margin is undefined");
    }
    let margin = normalized_ebitda / revenue;
    if margin < 0.0 {
        return CrossCheck::fail(
            NAME,
            Severity::Critical,
            format!("Normalized EBITDA margin is negative ({:.1}%)", margin * 100.0),
        );
    }
    let Some(band) = calibration.benchmarks.margin_band(practice_type) else {
        return CrossCheck::pass(NAME, format!("No margin band configured for {practice_type}"));
    };

    let message = format!(
        "Normalized EBITDA margin {:.1}% vs {:.0}%-{:.0}% typical for a {}",
        margin * 100.0,
        band.min_margin * 100.0,
        band.max_margin * 100.0,
        practice_type
    );
    if margin >= band.min_margin && margin <= band.max_margin {
        CrossCheck::pass(NAME, message)
    } else {
        CrossCheck::fail(NAME, Severity::Medium, message)
    }
}

/// Revenue floor, minimum EV/EBITDA and tangible asset floor.
pub fn check_small_practice(
    revenue: f64,
    hybrid: &ValuationResult,
    balance: &BalanceSheet,
    calibration: &Calibration,
) -> Vec<CrossCheck> {
    let b = &calibration.benchmarks;
    let mut checks = Vec::with_capacity(3);

    let size = if revenue < b.micro_revenue {
        CrossCheck::fail(
            "revenue_floor",
            Severity::High,
            format!(
                "Revenue {:.0} is below the micro-practice threshold {:.0}",
                revenue, b.micro_revenue
            ),
        )
    } else if revenue < b.small_revenue {
        CrossCheck::fail(
            "revenue_floor",
            Severity::Low,
            format!(
                "Revenue {:.0} is below the small-practice threshold {:.0}",
                revenue, b.small_revenue
            ),
        )
    } else {
        CrossCheck::pass(
            "revenue_floor",
            format!("Revenue {revenue:.0} is above small-practice thresholds"),
        )
    };
    checks.push(size);

    if let Some(multiple) = hybrid.implied_ev_ebitda {
        let message = format!(
            "Hybrid EV/EBITDA {:.2}x vs minimum {:.2}x",
            multiple, b.min_ev_ebitda
        );
        checks.push(if multiple < b.min_ev_ebitda {
            CrossCheck::fail("min_ev_ebitda", Severity::High, message)
        } else {
            CrossCheck::pass("min_ev_ebitda", message)
        });
    }

    let message = format!(
        "Hybrid EV {:.0} vs tangible asset value {:.0}",
        hybrid.enterprise_value, balance.tangible_asset_value
    );
    checks.push(if hybrid.enterprise_value < balance.tangible_asset_value {
        CrossCheck::fail("asset_value_floor", Severity::High, message)
    } else {
        CrossCheck::pass("asset_value_floor", message)
    });

    checks
}

/// Share of DCF value coming from the terminal value.
pub fn check_terminal_share(dcf: &DcfValuation, calibration: &Calibration) -> CrossCheck {
    const NAME: &str = "terminal_value_share";
    let max = calibration.cross_check.max_terminal_value_share;
    match dcf.terminal_value_share() {
        Some(share) if share > max => CrossCheck::fail(
            NAME,
            Severity::Medium,
            format!(
                "Terminal value is {:.0}% of DCF value (limit {:.0}%)",
                share * 100.0,
                max * 100.0
            ),
        ),
        Some(share) => CrossCheck::pass(
            NAME,
            format!("Terminal value is {:.0}% of DCF value", share * 100.0),
        ),
        None => CrossCheck::fail(NAME, Severity::Medium, "DCF enterprise value is not positive"),
    }
}
