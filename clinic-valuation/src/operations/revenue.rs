//! Revenue, cost of goods, and clinical labor.

use serde::{Deserialize, Serialize};

use crate::assumptions::{LineKind, OperatingAssumptions, ServiceLine};

/// Revenue and COGS of one service line across all locations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineRevenue {
    pub id: String,
    pub kind: LineKind,
    /// Per-location volume after capacity scaling
    pub effective_volume: f64,
    pub revenue: f64,
    pub cogs: f64,
}

/// Top line down to gross profit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueBreakdown {
    pub lines: Vec<LineRevenue>,
    pub total_revenue: f64,
    pub service_revenue: f64,
    pub retail_revenue: f64,
    pub total_cogs: f64,
    /// Market-adjusted labor rate after the cap
    pub effective_labor_rate: f64,
    pub labor_cost: f64,
    pub gross_profit: f64,
}

impl RevenueBreakdown {
    pub fn gross_margin(&self) -> Option<f64> {
        (self.total_revenue > 0.0).then(|| self.gross_profit / self.total_revenue)
    }
}

/// `clamp(base_rate × market_adjustment, 0, cap)`
pub fn effective_labor_rate(operating: &OperatingAssumptions, cap: f64) -> f64 {
    (operating.clinical_labor_rate * operating.labor_market_adjustment).clamp(0.0, cap)
}

/// Build revenue, COGS and labor cost for every line and location.
///
/// `scale_factor` applies only to lines that consume capacity; retail and
/// membership lines keep their full volume.
pub fn build_revenue(
    lines: &[ServiceLine],
    scale_factor: f64,
    operating: &OperatingAssumptions,
    labor_rate_cap: f64,
) -> RevenueBreakdown {
    let locations = f64::from(operating.locations);

    let lines: Vec<LineRevenue> = lines
        .iter()
        .map(|line| {
            let effective_volume = if line.consumes_capacity() {
                line.annual_volume * scale_factor
            } else {
                line.annual_volume
            };
            let revenue = line.unit_price * effective_volume * locations;
            LineRevenue {
                id: line.id.clone(),
                kind: line.kind,
                effective_volume,
                revenue,
                cogs: revenue * line.cogs_fraction,
            }
        })
        .collect();

    let revenue_of = |kind: LineKind| -> f64 {
        lines
            .iter()
            .filter(|l| l.kind == kind)
            .map(|l| l.revenue)
            .sum()
    };
    let service_revenue = revenue_of(LineKind::Service);
    let retail_revenue = revenue_of(LineKind::Retail);
    let total_revenue = service_revenue + retail_revenue;
    let total_cogs: f64 = lines.iter().map(|l| l.cogs).sum();

    let effective_labor_rate = effective_labor_rate(operating, labor_rate_cap);
    let labor_cost = effective_labor_rate * service_revenue;

    RevenueBreakdown {
        lines,
        total_revenue,
        service_revenue,
        retail_revenue,
        total_cogs,
        effective_labor_rate,
        labor_cost,
        gross_profit: total_revenue - total_cogs - labor_cost,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_lines() -> Vec<ServiceLine> {
        vec![
            ServiceLine {
                id: "botox".into(),
                name: "Neurotoxin".into(),
                unit_price: 400.0,
                annual_volume: 1000.0,
                cogs_fraction: 0.25,
                kind: LineKind::Service,
                visit_units: 1.0,
                is_membership: false,
            },
            ServiceLine {
                id: "skincare".into(),
                name: "Skincare retail".into(),
                unit_price: 100.0,
                annual_volume: 500.0,
                cogs_fraction: 0.5,
                kind: LineKind::Retail,
                visit_units: 0.0,
                is_membership: false,
            },
            ServiceLine {
                id: "membership".into(),
                name: "Glow club".into(),
                unit_price: 1200.0,
                annual_volume: 50.0,
                cogs_fraction: 0.1,
                kind: LineKind::Service,
                visit_units: 1.0,
                is_membership: true,
            },
        ]
    }

    #[test]
    fn test_revenue_aggregation() {
        let operating = OperatingAssumptions {
            locations: 2,
            ..Default::default()
        };
        let r = build_revenue(&make_lines(), 1.0, &operating, 0.8);

        assert_eq!(r.service_revenue, 2.0 * (400_000.0 + 60_000.0));
        assert_eq!(r.retail_revenue, 100_000.0);
        assert_eq!(r.total_revenue, 1_020_000.0);
        assert!((r.total_cogs - 262_000.0).abs() < 1e-6);
        assert!((r.labor_cost - 0.30 * 920_000.0).abs() < 1e-6);
        assert!((r.gross_profit - (1_020_000.0 - 262_000.0 - 276_000.0)).abs() < 1e-6);
        assert!((r.gross_margin().unwrap() - 482_000.0 / 1_020_000.0).abs() < 1e-9);
    }

    #[test]
    fn test_scale_factor_only_hits_capacity_lines() {
        let r = build_revenue(&make_lines(), 0.5, &OperatingAssumptions::default(), 0.8);
        assert_eq!(r.lines[0].effective_volume, 500.0);
        assert_eq!(r.lines[1].effective_volume, 500.0);
        assert_eq!(r.lines[2].effective_volume, 50.0);
    }

    #[test]
    fn test_labor_rate_cap() {
        let operating = OperatingAssumptions {
            clinical_labor_rate: 0.6,
            labor_market_adjustment: 1.5,
            ..Default::default()
        };
        assert_eq!(effective_labor_rate(&operating, 0.8), 0.8);

        let operating = OperatingAssumptions {
            clinical_labor_rate: 0.3,
            labor_market_adjustment: 1.2,
            ..Default::default()
        };
        assert!((effective_labor_rate(&operating, 0.8) - 0.36).abs() < 1e-12);
    }
}
