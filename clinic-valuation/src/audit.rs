//! Calculation provenance.
//!
//! An [`AuditTrail`] is built by a separate pass that replays the pure stage
//! functions and records one [`AuditStep`] per derived quantity, with the
//! formula and the inputs it consumed. A plain valuation run never pays for
//! this.

use clinic_common::Validate;
use serde::{Deserialize, Serialize};

use crate::assumptions::{BetaInput, EarningsBasis, MaintenanceCapex, ValuationInputs};
use crate::capital::{compute_wacc, WaccBreakdown};
use crate::config::Calibration;
use crate::error::Result;
use crate::forecast::{estimate_growth, GrowthEstimate};
use crate::operations::{run_operations, OperatingResults};
use crate::valuation::{MethodValuations, ValuationEngine, ValuationMethod};

/// Pipeline stage a step belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditCategory {
    Capacity,
    Revenue,
    Cost,
    Synergy,
    Earnings,
    CapitalCost,
    Valuation,
}

/// A named input to a step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditInput {
    pub name: String,
    pub value: f64,
}

/// One derived quantity with its provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditStep {
    pub id: String,
    pub description: String,
    pub formula_text: String,
    pub inputs: Vec<AuditInput>,
    pub result: f64,
    pub category: AuditCategory,
}

/// Ordered provenance for a whole valuation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditTrail {
    pub steps: Vec<AuditStep>,
}

impl AuditTrail {
    /// Validate `inputs`, replay every stage, and record each derived figure.
    pub fn replay(inputs: &ValuationInputs, calibration: &Calibration) -> Result<Self> {
        inputs.validate()?;

        let operations = run_operations(inputs, calibration);
        let growth = estimate_growth(&inputs.history)?;
        let wacc = compute_wacc(
            &inputs.capital,
            inputs.operating.tax_rate,
            &calibration.wacc_bounds,
            &calibration.scenarios,
        );
        let methods =
            ValuationEngine::new(calibration).value_all(inputs, &operations, &wacc, &growth)?;

        let mut trail = Self::default();
        trail.record_operations(inputs, &operations);
        trail.record_capital(inputs, &wacc);
        trail.record_valuation(inputs, &operations, &wacc, &growth, &methods);

        tracing::debug!(steps = trail.steps.len(), "Audit trail replayed");
        Ok(trail)
    }

    pub fn get(&self, id: &str) -> Option<&AuditStep> {
        self.steps.iter().find(|s| s.id == id)
    }

    pub fn by_category(&self, category: AuditCategory) -> impl Iterator<Item = &AuditStep> {
        self.steps.iter().filter(move |s| s.category == category)
    }

    fn push(
        &mut self,
        category: AuditCategory,
        id: impl Into<String>,
        description: impl Into<String>,
        formula: impl Into<String>,
        inputs: &[(&str, f64)],
        result: f64,
    ) {
        self.steps.push(AuditStep {
            id: id.into(),
            description: description.into(),
            formula_text: formula.into(),
            inputs: inputs
                .iter()
                .map(|(name, value)| AuditInput {
                    name: (*name).to_string(),
                    value: *value,
                })
                .collect(),
            result,
            category,
        });
    }

    fn record_operations(&mut self, inputs: &ValuationInputs, ops: &OperatingResults) {
        use AuditCategory::*;
        let op = &inputs.operating;
        let locations = f64::from(op.locations);

        let c = &ops.capacity;
        self.push(
            Capacity,
            "capacity.provider",
            "Provider appointment capacity",
            "Σ(fte × hours_per_week × utilization × appointments_per_hour) × 52",
            &[("providers", inputs.capacity.providers.len() as f64)],
            c.provider_capacity,
        );
        self.push(
            Capacity,
            "capacity.room",
            "Room appointment capacity",
            "rooms × hours_per_day × days_per_week × 52 × room_utilization",
            &[
                ("rooms", f64::from(inputs.capacity.rooms)),
                ("hours_per_day", inputs.capacity.hours_per_day),
                ("days_per_week", inputs.capacity.days_per_week),
                ("room_utilization", inputs.capacity.room_utilization),
            ],
            c.room_capacity,
        );
        self.push(
            Capacity,
            "capacity.effective",
            "Effective capacity",
            "min(provider_capacity, room_capacity)",
            &[
                ("provider_capacity", c.provider_capacity),
                ("room_capacity", c.room_capacity),
            ],
            c.effective_capacity,
        );
        self.push(
            Capacity,
            "capacity.demand",
            "Visit demand",
            "Σ(visit_units × annual_volume)",
            &[],
            c.demand,
        );
        self.push(
            Capacity,
            "capacity.scale_factor",
            "Demand scaling factor",
            "min(1, effective_capacity / demand) when enabled and capacity > 0, else 1",
            &[
                ("effective_capacity", c.effective_capacity),
                ("demand", c.demand),
            ],
            c.scale_factor,
        );

        let r = &ops.revenue;
        for (line, def) in r.lines.iter().zip(&inputs.service_lines) {
            self.push(
                Revenue,
                format!("revenue.line.{}", line.id),
                format!("{} revenue", def.name),
                "unit_price × effective_volume × locations",
                &[
                    ("unit_price", def.unit_price),
                    ("effective_volume", line.effective_volume),
                    ("locations", locations),
                ],
                line.revenue,
            );
        }
        self.push(
            Revenue,
            "revenue.service",
            "Service revenue",
            "Σ revenue of service lines",
            &[],
            r.service_revenue,
        );
        self.push(
            Revenue,
            "revenue.retail",
            "Retail revenue",
            "Σ revenue of retail lines",
            &[],
            r.retail_revenue,
        );
        self.push(
            Revenue,
            "revenue.total",
            "Total revenue",
            "service_revenue + retail_revenue",
            &[
                ("service_revenue", r.service_revenue),
                ("retail_revenue", r.retail_revenue),
            ],
            r.total_revenue,
        );
        self.push(
            Cost,
            "cost.cogs",
            "Cost of goods sold",
            "Σ(revenue × cogs_fraction)",
            &[],
            r.total_cogs,
        );
        self.push(
            Cost,
            "cost.labor_rate",
            "Effective clinical labor rate",
            "clamp(clinical_labor_rate × labor_market_adjustment, 0, cap)",
            &[
                ("clinical_labor_rate", op.clinical_labor_rate),
                ("labor_market_adjustment", op.labor_market_adjustment),
            ],
            r.effective_labor_rate,
        );
        self.push(
            Cost,
            "cost.labor",
            "Clinical labor cost",
            "effective_labor_rate × service_revenue",
            &[
                ("effective_labor_rate", r.effective_labor_rate),
                ("service_revenue", r.service_revenue),
            ],
            r.labor_cost,
        );
        self.push(
            Revenue,
            "revenue.gross_profit",
            "Gross profit",
            "total_revenue − total_cogs − labor_cost",
            &[
                ("total_revenue", r.total_revenue),
                ("total_cogs", r.total_cogs),
                ("labor_cost", r.labor_cost),
            ],
            r.gross_profit,
        );

        let rates = &ops.cost_rates;
        self.push(
            Synergy,
            "synergy.admin_rate",
            "Effective admin rate",
            "max(admin_rate × floor_factor, \
             admin_rate × (1 − min(cap, (locations − 1) × admin_synergy_rate)))",
            &[
                ("admin_rate", op.admin_rate),
                ("locations", locations),
                ("admin_synergy_rate", op.admin_synergy_rate),
            ],
            rates.admin_rate,
        );
        self.push(
            Synergy,
            "synergy.marketing_rate",
            "Effective marketing rate",
            "max(floor, marketing_rate × (1 − min(cap, (locations − 1) × marketing_synergy_rate)))",
            &[
                ("marketing_rate", op.marketing_rate),
                ("locations", locations),
                ("marketing_synergy_rate", op.marketing_synergy_rate),
            ],
            rates.marketing_rate,
        );

        let e = &ops.earnings;
        let opex = &e.opex;
        self.push(
            Cost,
            "cost.marketing",
            "Marketing",
            "marketing_rate_eff × total_revenue",
            &[
                ("marketing_rate_eff", rates.marketing_rate),
                ("total_revenue", e.revenue),
            ],
            opex.marketing,
        );
        self.push(
            Cost,
            "cost.admin",
            "Administration",
            "admin_rate_eff × total_revenue",
            &[
                ("admin_rate_eff", rates.admin_rate),
                ("total_revenue", e.revenue),
            ],
            opex.admin,
        );
        self.push(
            Cost,
            "cost.mso_fee",
            "MSO fee",
            "mso_fee_rate × total_revenue",
            &[("mso_fee_rate", op.mso_fee_rate), ("total_revenue", e.revenue)],
            opex.mso_fee,
        );
        self.push(
            Cost,
            "cost.compliance",
            "Compliance",
            "compliance_rate × total_revenue",
            &[
                ("compliance_rate", op.compliance_rate),
                ("total_revenue", e.revenue),
            ],
            opex.compliance,
        );
        self.push(
            Cost,
            "cost.fixed",
            "Fixed costs",
            "Σ fixed_costs × locations",
            &[("locations", locations)],
            opex.fixed_costs,
        );
        self.push(
            Cost,
            "cost.other_opex",
            "Other operating expense",
            "other_opex × locations",
            &[("other_opex", op.other_opex), ("locations", locations)],
            opex.other_opex,
        );
        self.push(
            Cost,
            "cost.opex_total",
            "Operating expense",
            "marketing + admin + mso_fee + compliance + fixed_costs + other_opex",
            &[
                ("marketing", opex.marketing),
                ("admin", opex.admin),
                ("mso_fee", opex.mso_fee),
                ("compliance", opex.compliance),
                ("fixed_costs", opex.fixed_costs),
                ("other_opex", opex.other_opex),
            ],
            opex.total,
        );

        let b = &e.bridge;
        self.push(
            Earnings,
            "earnings.reported_ebitda",
            "Reported EBITDA",
            "gross_profit − opex_total",
            &[("gross_profit", r.gross_profit), ("opex_total", opex.total)],
            b.reported_ebitda,
        );
        let add_backs: Vec<(&str, f64)> = b
            .add_backs
            .iter()
            .map(|a| (a.label.as_str(), a.amount))
            .collect();
        self.push(
            Earnings,
            "earnings.normalized_ebitda",
            "Normalized EBITDA",
            "reported_ebitda + Σ add_backs",
            &add_backs,
            b.normalized_ebitda,
        );
        self.push(
            Earnings,
            "earnings.da",
            "Depreciation and amortization",
            "depreciation_amortization × locations",
            &[
                ("depreciation_amortization", op.depreciation_amortization),
                ("locations", locations),
            ],
            b.da,
        );
        self.push(
            Earnings,
            "earnings.ebit",
            "Normalized EBIT",
            "normalized_ebitda − da",
            &[("normalized_ebitda", b.normalized_ebitda), ("da", b.da)],
            b.normalized_ebit,
        );
        self.push(
            Earnings,
            "earnings.nopat",
            "NOPAT",
            "ebit × (1 − tax_rate)",
            &[("ebit", b.normalized_ebit), ("tax_rate", e.tax_rate)],
            e.nopat,
        );

        let capex_formula = match &op.maintenance_capex {
            MaintenanceCapex::PercentOfRevenue { .. } => "rate × total_revenue",
            MaintenanceCapex::PerLocation { .. } => "amount × locations",
            MaintenanceCapex::AssetReplacement(_) => {
                "(equipment / replacement_years + buildout / refresh_years \
                 + ffne / refresh_years) × locations + minor_maintenance_rate × total_revenue"
            }
        };
        self.push(
            Earnings,
            "earnings.maintenance_capex",
            "Maintenance capex",
            capex_formula,
            &[("total_revenue", e.revenue), ("locations", locations)],
            e.maintenance_capex,
        );
        self.push(
            Earnings,
            "earnings.owner_earnings",
            "Owner earnings",
            "nopat + da − maintenance_capex",
            &[
                ("nopat", e.nopat),
                ("da", b.da),
                ("maintenance_capex", e.maintenance_capex),
            ],
            e.owner_earnings,
        );
    }

    fn record_capital(&mut self, inputs: &ValuationInputs, w: &WaccBreakdown) {
        use AuditCategory::CapitalCost;
        let cap = &inputs.capital;
        let tax_rate = inputs.operating.tax_rate;

        match cap.beta {
            BetaInput::Levered { beta } => self.push(
                CapitalCost,
                "capital.beta",
                "Levered beta",
                "caller-supplied levered beta",
                &[("beta", beta)],
                w.beta,
            ),
            BetaInput::Unlevered {
                beta,
                target_debt_to_equity,
            } => self.push(
                CapitalCost,
                "capital.beta",
                "Re-levered beta",
                "beta_unlevered × (1 + (1 − tax_rate) × D/E)",
                &[
                    ("beta_unlevered", beta),
                    ("tax_rate", tax_rate),
                    ("debt_to_equity", target_debt_to_equity),
                ],
                w.beta,
            ),
        }
        self.push(
            CapitalCost,
            "capital.cost_of_equity",
            "Cost of equity (CAPM)",
            "risk_free + beta × equity_risk_premium + size + industry + geographic + specific",
            &[
                ("risk_free", cap.risk_free_rate),
                ("beta", w.beta),
                ("equity_risk_premium", cap.equity_risk_premium),
                ("size_premium", cap.size_premium),
                ("industry_premium", cap.industry_premium),
                ("geographic_premium", cap.geographic_premium),
                ("specific_premium", cap.specific_premium),
            ],
            w.cost_of_equity,
        );
        self.push(
            CapitalCost,
            "capital.after_tax_cost_of_debt",
            "After-tax cost of debt",
            "cost_of_debt × (1 − tax_rate)",
            &[("cost_of_debt", cap.cost_of_debt), ("tax_rate", tax_rate)],
            w.after_tax_cost_of_debt,
        );
        self.push(
            CapitalCost,
            "capital.wacc_base",
            "Base WACC",
            "clamp(debt_weight × after_tax_cost_of_debt \
             + equity_weight × cost_of_equity, floor, ceiling)",
            &[
                ("debt_weight", w.debt_weight),
                ("after_tax_cost_of_debt", w.after_tax_cost_of_debt),
                ("equity_weight", w.equity_weight()),
                ("cost_of_equity", w.cost_of_equity),
            ],
            w.base_wacc,
        );
        self.push(
            CapitalCost,
            "capital.wacc_scenario",
            format!("Scenario WACC ({})", w.scenario),
            "clamp(wacc_base + scenario_shift + risk_premium, floor, ceiling)",
            &[
                ("wacc_base", w.base_wacc),
                ("scenario_shift", w.scenario_shift),
                ("risk_premium", w.risk_premium),
            ],
            w.scenario_wacc,
        );
    }

    fn record_valuation(
        &mut self,
        inputs: &ValuationInputs,
        ops: &OperatingResults,
        w: &WaccBreakdown,
        growth: &GrowthEstimate,
        m: &MethodValuations,
    ) {
        use AuditCategory::Valuation;
        let bs = &inputs.balance_sheet;
        let ebitda = ops.earnings.normalized_ebitda();

        self.push(
            Valuation,
            "valuation.trend_growth",
            format!("Revenue trend growth ({})", growth.method),
            "CAGR or e^slope − 1 of ln(revenue) on year",
            &[("observations", growth.observations as f64)],
            growth.growth_rate,
        );

        let basis_formula = match m.epv.basis {
            EarningsBasis::OwnerEarnings => "owner_earnings × (1 − haircut)",
            EarningsBasis::Nopat => "nopat × (1 − haircut)",
            EarningsBasis::NopatLessReinvestment { .. } => {
                "(nopat − reinvestment_rate × ebit) × (1 − haircut)"
            }
        };
        self.push(
            Valuation,
            "valuation.epv.adjusted_earnings",
            "EPV adjusted earnings",
            basis_formula,
            &[
                ("base_earnings", m.epv.base_earnings),
                ("haircut", m.epv.risk_haircut),
            ],
            m.epv.adjusted_earnings,
        );
        self.push(
            Valuation,
            "valuation.epv.enterprise_value",
            "EPV enterprise value",
            "adjusted_earnings / wacc_scenario",
            &[
                ("adjusted_earnings", m.epv.adjusted_earnings),
                ("wacc_scenario", w.scenario_wacc),
            ],
            m.epv.result.enterprise_value,
        );

        let dcf = &m.dcf;
        self.push(
            Valuation,
            "valuation.dcf.initial_growth",
            "DCF initial growth",
            "(initial_growth or trend growth) + scenario growth shift",
            &[("trend_growth", growth.growth_rate)],
            dcf.initial_growth,
        );
        for y in &dcf.years {
            self.push(
                Valuation,
                format!("valuation.dcf.year.{}.free_cash_flow", y.year),
                format!("DCF year {} free cash flow", y.year),
                "nopat + da − capex − working_capital_change",
                &[
                    ("growth", y.growth),
                    ("revenue", y.revenue),
                    ("nopat", y.nopat),
                    ("da", y.da),
                    ("capex", y.capex),
                    ("working_capital_change", y.working_capital_change),
                ],
                y.free_cash_flow,
            );
            self.push(
                Valuation,
                format!("valuation.dcf.year.{}.present_value", y.year),
                format!("DCF year {} present value", y.year),
                "free_cash_flow / (1 + wacc)^t",
                &[
                    ("free_cash_flow", y.free_cash_flow),
                    ("discount_factor", y.discount_factor),
                ],
                y.present_value,
            );
        }
        self.push(
            Valuation,
            "valuation.dcf.pv_explicit",
            "PV of explicit-period cash flows",
            "Σ fcf_t / (1 + wacc)^t",
            &[("years", dcf.years.len() as f64), ("wacc", dcf.wacc)],
            dcf.pv_explicit,
        );
        self.push(
            Valuation,
            "valuation.dcf.terminal_value",
            "Terminal value",
            "terminal_fcf / (wacc − terminal_growth)",
            &[
                ("terminal_fcf", dcf.terminal_fcf),
                ("wacc", dcf.wacc),
                ("terminal_growth", dcf.terminal_growth),
            ],
            dcf.terminal_value,
        );
        self.push(
            Valuation,
            "valuation.dcf.enterprise_value",
            "DCF enterprise value",
            "pv_explicit + terminal_value / (1 + wacc)^n",
            &[
                ("pv_explicit", dcf.pv_explicit),
                ("pv_terminal", dcf.pv_terminal),
            ],
            dcf.result.enterprise_value,
        );

        let mv = &m.multiple;
        self.push(
            Valuation,
            "valuation.multiple.selected",
            "Selected EV/EBITDA multiple",
            if mv.overridden {
                "caller override"
            } else {
                "clamp(band_mid × location × data_quality × growth, band_low, band_high)"
            },
            &[
                ("band_mid", mv.band.mid),
                ("location_factor", mv.location_factor),
                ("data_quality_factor", mv.data_quality_factor),
                ("growth_factor", mv.growth_factor),
            ],
            mv.selected_multiple,
        );
        self.push(
            Valuation,
            "valuation.multiple.enterprise_value",
            "Market multiple enterprise value",
            "normalized_ebitda × multiple",
            &[
                ("normalized_ebitda", ebitda),
                ("multiple", mv.selected_multiple),
            ],
            mv.result.enterprise_value,
        );

        let h = &m.hybrid;
        self.push(
            Valuation,
            "valuation.hybrid.enterprise_value",
            h.label(),
            "w_epv × epv + w_dcf × dcf + w_multiple × multiple",
            &[
                ("w_epv", h.weights.epv),
                ("epv", m.epv.result.enterprise_value),
                ("w_dcf", h.weights.dcf),
                ("dcf", dcf.result.enterprise_value),
                ("w_multiple", h.weights.multiple),
                ("multiple", mv.result.enterprise_value),
            ],
            h.result.enterprise_value,
        );

        for result in m.results() {
            let key = match result.method {
                ValuationMethod::Epv => "epv",
                ValuationMethod::Dcf => "dcf",
                ValuationMethod::Multiple => "multiple",
                ValuationMethod::Hybrid => "hybrid",
            };
            self.push(
                Valuation,
                format!("valuation.{key}.equity_value"),
                format!("{} equity value", result.method),
                "enterprise_value + non_operating_cash − interest_bearing_debt",
                &[
                    ("enterprise_value", result.enterprise_value),
                    ("non_operating_cash", bs.non_operating_cash),
                    ("interest_bearing_debt", bs.interest_bearing_debt),
                ],
                result.equity_value,
            );
        }
    }
}
