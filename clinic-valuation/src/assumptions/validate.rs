//! Input validation for every assumption struct.
//!
//! Only clamps documented as engine behavior (WACC bounds, labor-rate cap)
//! happen later; everything else out of range is rejected here.

use clinic_common::{Validate, ValidationError, ValidationResult, Violations};

use super::types::*;
use super::ValuationInputs;

impl Validate for ServiceLine {
    fn validate(&self) -> ValidationResult<()> {
        let mut v = Violations::new();
        let field = |name: &str| format!("service_lines[{}].{name}", self.id);

        if self.id.trim().is_empty() {
            v.push(ValidationError::MissingField {
                field: "service_lines[].id".into(),
            });
        }
        v.non_negative(&field("unit_price"), self.unit_price);
        v.non_negative(&field("annual_volume"), self.annual_volume);
        v.fraction(&field("cogs_fraction"), self.cogs_fraction);
        v.non_negative(&field("visit_units"), self.visit_units);
        v.finish()
    }
}

impl Validate for Provider {
    fn validate(&self) -> ValidationResult<()> {
        let mut v = Violations::new();
        let field = |name: &str| format!("capacity.providers[{}].{name}", self.id);

        v.non_negative(&field("fte"), self.fte);
        v.in_range(&field("hours_per_week"), self.hours_per_week, 0.0, 168.0);
        v.non_negative(&field("appointments_per_hour"), self.appointments_per_hour);
        v.fraction(&field("utilization"), self.utilization);
        v.finish()
    }
}

impl Validate for CapacityAssumptions {
    fn validate(&self) -> ValidationResult<()> {
        let mut v = Violations::new();
        v.merge(self.providers.as_slice().validate());
        v.in_range("capacity.hours_per_day", self.hours_per_day, 0.0, 24.0);
        v.in_range("capacity.days_per_week", self.days_per_week, 0.0, 7.0);
        v.fraction("capacity.room_utilization", self.room_utilization);
        v.finish()
    }
}

impl Validate for MaintenanceCapex {
    fn validate(&self) -> ValidationResult<()> {
        let mut v = Violations::new();
        match self {
            Self::PercentOfRevenue { rate } => {
                v.fraction("operating.maintenance_capex.rate", *rate);
            }
            Self::PerLocation { amount } => {
                v.non_negative("operating.maintenance_capex.amount", *amount);
            }
            Self::AssetReplacement(a) => {
                let prefix = "operating.maintenance_capex";
                v.non_negative(&format!("{prefix}.equipment_value"), a.equipment_value);
                v.positive(
                    &format!("{prefix}.equipment_replacement_years"),
                    a.equipment_replacement_years,
                );
                v.non_negative(&format!("{prefix}.buildout_value"), a.buildout_value);
                v.positive(
                    &format!("{prefix}.buildout_refresh_years"),
                    a.buildout_refresh_years,
                );
                v.non_negative(&format!("{prefix}.ffne_value"), a.ffne_value);
                v.positive(&format!("{prefix}.ffne_refresh_years"), a.ffne_refresh_years);
                v.fraction(
                    &format!("{prefix}.minor_maintenance_rate"),
                    a.minor_maintenance_rate,
                );
            }
        }
        v.finish()
    }
}

impl Validate for OperatingAssumptions {
    fn validate(&self) -> ValidationResult<()> {
        let mut v = Violations::new();

        v.ensure(self.locations >= 1, "operating.locations", "must be at least 1");
        v.fraction("operating.clinical_labor_rate", self.clinical_labor_rate);
        v.non_negative("operating.labor_market_adjustment", self.labor_market_adjustment);
        v.fraction("operating.marketing_rate", self.marketing_rate);
        v.fraction("operating.admin_rate", self.admin_rate);
        v.fraction("operating.mso_fee_rate", self.mso_fee_rate);
        v.fraction("operating.compliance_rate", self.compliance_rate);
        for item in &self.fixed_costs {
            v.non_negative(&format!("operating.fixed_costs[{}]", item.label), item.amount);
        }
        v.non_negative("operating.other_opex", self.other_opex);
        v.finite("operating.owner_addback", self.owner_addback);
        for item in &self.other_addbacks {
            v.finite(&format!("operating.other_addbacks[{}]", item.label), item.amount);
        }
        v.non_negative(
            "operating.depreciation_amortization",
            self.depreciation_amortization,
        );
        v.in_range("operating.tax_rate", self.tax_rate, 0.0, 0.99);
        v.merge(self.maintenance_capex.validate());
        v.fraction("operating.working_capital_rate", self.working_capital_rate);
        v.fraction("operating.admin_synergy_rate", self.admin_synergy_rate);
        v.fraction("operating.marketing_synergy_rate", self.marketing_synergy_rate);

        v.finish()
    }
}

impl Validate for CapitalAssumptions {
    fn validate(&self) -> ValidationResult<()> {
        let mut v = Violations::new();

        v.in_range("capital.risk_free_rate", self.risk_free_rate, -0.05, 0.5);
        v.in_range("capital.equity_risk_premium", self.equity_risk_premium, 0.0, 0.5);
        match self.beta {
            BetaInput::Levered { beta } => v.in_range("capital.beta.beta", beta, 0.0, 10.0),
            BetaInput::Unlevered {
                beta,
                target_debt_to_equity,
            } => {
                v.in_range("capital.beta.beta", beta, 0.0, 10.0);
                v.non_negative("capital.beta.target_debt_to_equity", target_debt_to_equity);
            }
        }
        v.finite("capital.size_premium", self.size_premium);
        v.finite("capital.industry_premium", self.industry_premium);
        v.finite("capital.geographic_premium", self.geographic_premium);
        v.finite("capital.specific_premium", self.specific_premium);
        v.in_range("capital.cost_of_debt", self.cost_of_debt, 0.0, 1.0);
        v.finite("capital.debt_weight", self.debt_weight);
        v.ensure(
            (0.0..1.0).contains(&self.debt_weight),
            "capital.debt_weight",
            format!("must be in [0, 1), got {}", self.debt_weight),
        );
        v.finite(
            "capital.risk_overlay.earnings_haircut",
            self.risk_overlay.earnings_haircut,
        );
        v.ensure(
            (0.0..1.0).contains(&self.risk_overlay.earnings_haircut),
            "capital.risk_overlay.earnings_haircut",
            format!("must be in [0, 1), got {}", self.risk_overlay.earnings_haircut),
        );
        v.finite("capital.risk_overlay.wacc_premium", self.risk_overlay.wacc_premium);

        v.finish()
    }
}

impl Validate for BalanceSheet {
    fn validate(&self) -> ValidationResult<()> {
        let mut v = Violations::new();
        v.non_negative("balance_sheet.non_operating_cash", self.non_operating_cash);
        v.non_negative(
            "balance_sheet.interest_bearing_debt",
            self.interest_bearing_debt,
        );
        v.non_negative(
            "balance_sheet.tangible_asset_value",
            self.tangible_asset_value,
        );
        v.finish()
    }
}

impl Validate for DcfAssumptions {
    fn validate(&self) -> ValidationResult<()> {
        let mut v = Violations::new();
        v.ensure(
            (1..=30).contains(&self.projection_years),
            "dcf.projection_years",
            format!("must be between 1 and 30, got {}", self.projection_years),
        );
        if let Some(g) = self.initial_growth {
            v.in_range("dcf.initial_growth", g, -0.5, 2.0);
        }
        v.in_range("dcf.terminal_growth", self.terminal_growth, -0.1, 0.2);
        v.fraction("dcf.decay_rate", self.decay_rate);
        v.in_range("dcf.min_growth", self.min_growth, -0.5, 0.5);
        v.finish()
    }
}

impl Validate for EarningsBasis {
    fn validate(&self) -> ValidationResult<()> {
        let mut v = Violations::new();
        if let Self::NopatLessReinvestment { rate } = self {
            v.fraction("earnings_basis.rate", *rate);
        }
        v.finish()
    }
}

impl Validate for MethodProfile {
    fn validate(&self) -> ValidationResult<()> {
        let mut v = Violations::new();
        if let Some(multiple) = self.multiple_override {
            v.positive("profile.multiple_override", multiple);
        }
        v.finish()
    }
}

impl Validate for HistoricalYear {
    fn validate(&self) -> ValidationResult<()> {
        let mut v = Violations::new();
        v.non_negative(&format!("history[{}].revenue", self.year), self.revenue);
        if let Some(ebitda) = self.ebitda {
            v.finite(&format!("history[{}].ebitda", self.year), ebitda);
        }
        v.finish()
    }
}

impl Validate for ValuationInputs {
    fn validate(&self) -> ValidationResult<()> {
        let mut v = Violations::new();

        if self.service_lines.is_empty() {
            v.push(ValidationError::MissingField {
                field: "service_lines".into(),
            });
        }
        v.merge(self.service_lines.as_slice().validate());

        let mut ids: Vec<&str> = self.service_lines.iter().map(|l| l.id.as_str()).collect();
        ids.sort_unstable();
        if let Some(pair) = ids.windows(2).find(|w| w[0] == w[1]) {
            v.push(ValidationError::InvalidValue {
                field: "service_lines".into(),
                reason: format!("duplicate service line id '{}'", pair[0]),
            });
        }

        v.merge(self.capacity.validate());
        v.merge(self.operating.validate());
        v.merge(self.capital.validate());
        v.merge(self.balance_sheet.validate());
        v.merge(self.dcf.validate());
        v.merge(self.earnings_basis.validate());
        v.merge(self.profile.validate());
        v.merge(self.history.as_slice().validate());

        let mut years: Vec<i32> = self.history.iter().map(|h| h.year).collect();
        years.sort_unstable();
        if let Some(pair) = years.windows(2).find(|w| w[0] == w[1]) {
            v.push(ValidationError::InvalidValue {
                field: "history".into(),
                reason: format!("duplicate year {}", pair[0]),
            });
        }

        v.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn make_line() -> ServiceLine {
        ServiceLine {
            id: "botox".into(),
            name: "Neurotoxin".into(),
            unit_price: 450.0,
            annual_volume: 1200.0,
            cogs_fraction: 0.25,
            kind: LineKind::Service,
            visit_units: 1.0,
            is_membership: false,
        }
    }

    #[test]
    fn test_valid_line() {
        assert!(make_line().validate().is_ok());
    }

    #[test]
    fn test_invalid_line_collects_all_fields() {
        let mut line = make_line();
        line.unit_price = -1.0;
        line.annual_volume = -5.0;
        line.cogs_fraction = 1.5;
        let err = line.validate().unwrap_err();
        assert_eq!(
            err.fields(),
            vec![
                "service_lines[botox].unit_price",
                "service_lines[botox].annual_volume",
                "service_lines[botox].cogs_fraction",
            ]
        );
    }

    #[test_case(0.0, true ; "no debt")]
    #[test_case(0.6, true ; "leveraged")]
    #[test_case(1.0, false ; "all debt")]
    #[test_case(1.2, false ; "over levered")]
    #[test_case(-0.1, false ; "negative")]
    fn test_debt_weight_bounds(weight: f64, ok: bool) {
        let capital = CapitalAssumptions {
            debt_weight: weight,
            ..CapitalAssumptions::default()
        };
        assert_eq!(capital.validate().is_ok(), ok);
    }

    #[test]
    fn test_asset_replacement_requires_positive_lives() {
        let capex = MaintenanceCapex::AssetReplacement(AssetReplacement {
            equipment_value: 300_000.0,
            equipment_replacement_years: 0.0,
            buildout_value: 200_000.0,
            buildout_refresh_years: 10.0,
            ffne_value: 50_000.0,
            ffne_refresh_years: 7.0,
            minor_maintenance_rate: 0.005,
        });
        let err = capex.validate().unwrap_err();
        assert_eq!(
            err.fields(),
            vec!["operating.maintenance_capex.equipment_replacement_years"]
        );
    }

    #[test]
    fn test_zero_locations_rejected() {
        let operating = OperatingAssumptions {
            locations: 0,
            ..OperatingAssumptions::default()
        };
        assert!(operating.validate().is_err());
    }

    #[test]
    fn test_negative_addback_allowed() {
        let operating = OperatingAssumptions {
            other_addbacks: vec![CostItem::new("Rent normalization", -60_000.0)],
            ..OperatingAssumptions::default()
        };
        assert!(operating.validate().is_ok());
    }

    #[test]
    fn test_inputs_require_service_lines() {
        let inputs = ValuationInputs::default();
        let err = inputs.validate().unwrap_err();
        assert!(err.fields().contains(&"service_lines"));
    }

    #[test]
    fn test_duplicate_line_ids_rejected() {
        let inputs = ValuationInputs {
            service_lines: vec![make_line(), make_line()],
            ..ValuationInputs::default()
        };
        let err = inputs.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate service line id"));
    }
}
