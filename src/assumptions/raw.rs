//! Raw assumption mapping as supplied by callers and the extraction service
//!
//! Field names follow [`AssumptionSet`]; the modeling service's legacy names
//! (`revenue_start`, `cogs_percent`, `equity_raises`, ...) are accepted as
//! aliases. Input from the extraction service gets no special trust: it goes
//! through the same deserialization and validation as any other caller.

use log::debug;
use serde::{Deserialize, Serialize};

use super::{AssumptionSet, CapexEvent, DebtEvent, EquityEvent};
use crate::error::{ModelError, Result};

/// Annual depreciation rate used when capex events omit a useful life
pub const DEFAULT_DEPRECIATION_RATE: f64 = 0.10;

/// Growth used when a revenue history yields no usable period-over-period rate
pub const DEFAULT_INFERRED_GROWTH_RATE: f64 = 0.10;

/// Gross margin used when no historical period has non-zero revenue
pub const DEFAULT_INFERRED_GROSS_MARGIN: f64 = 0.70;

/// Unvalidated flat mapping of named fields plus three event lists
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawAssumptions {
    #[serde(default, alias = "revenue_start")]
    pub starting_revenue: Option<f64>,
    #[serde(default, alias = "revenue_growth_rate")]
    pub monthly_growth_rate: Option<f64>,
    #[serde(default, alias = "cogs_percent")]
    pub cogs_fraction: Option<f64>,
    #[serde(default, alias = "opex_fixed")]
    pub fixed_opex: Option<f64>,
    #[serde(default, alias = "opex_variable_percent")]
    pub variable_opex_fraction: Option<f64>,
    #[serde(default, alias = "days_receivables")]
    pub receivable_days: Option<u32>,
    #[serde(default, alias = "days_payables")]
    pub payable_days: Option<u32>,
    #[serde(default)]
    pub tax_rate: Option<f64>,
    #[serde(default)]
    pub starting_cash: Option<f64>,

    /// Annual straight-line rate; only used to derive missing useful lives
    #[serde(default)]
    pub depreciation_rate: Option<f64>,

    #[serde(default, alias = "equity_raises")]
    pub equity_events: Vec<EquityEvent>,
    #[serde(default, alias = "debt_raises")]
    pub debt_events: Vec<DebtEvent>,
    #[serde(default, alias = "capex_schedule")]
    pub capex_events: Vec<RawCapexEvent>,
}

/// Capex event whose useful life may be left to the depreciation rate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawCapexEvent {
    #[serde(alias = "month")]
    pub period_index: u32,
    pub amount: f64,
    #[serde(default)]
    pub useful_life_months: Option<u32>,
    #[serde(default)]
    pub description: Option<String>,
}

impl RawAssumptions {
    /// Validate the mapping and build an [`AssumptionSet`]
    ///
    /// Missing required fields are rejected; event period indices are
    /// checked later against the run horizon.
    pub fn validate(self) -> Result<AssumptionSet> {
        let depreciation_rate = self.depreciation_rate.unwrap_or(DEFAULT_DEPRECIATION_RATE);
        if !depreciation_rate.is_finite() || depreciation_rate <= 0.0 || depreciation_rate > 1.0 {
            return Err(ModelError::validation(
                "depreciation_rate",
                format!("must lie in (0, 1], got {depreciation_rate}"),
            ));
        }
        let default_life = (12.0 / depreciation_rate).round() as u32;

        let capex_events = self
            .capex_events
            .into_iter()
            .map(|raw| CapexEvent {
                period_index: raw.period_index,
                amount: raw.amount,
                useful_life_months: raw.useful_life_months.unwrap_or(default_life),
                description: raw.description,
            })
            .collect();

        let assumptions = AssumptionSet {
            starting_revenue: required("starting_revenue", self.starting_revenue)?,
            monthly_growth_rate: required("monthly_growth_rate", self.monthly_growth_rate)?,
            cogs_fraction: required("cogs_fraction", self.cogs_fraction)?,
            fixed_opex: required("fixed_opex", self.fixed_opex)?,
            variable_opex_fraction: required("variable_opex_fraction", self.variable_opex_fraction)?,
            receivable_days: self.receivable_days.unwrap_or(0),
            payable_days: self.payable_days.unwrap_or(0),
            equity_events: self.equity_events,
            debt_events: self.debt_events,
            capex_events,
            tax_rate: required("tax_rate", self.tax_rate)?,
            starting_cash: required("starting_cash", self.starting_cash)?,
        };

        assumptions.validate()?;
        Ok(assumptions)
    }
}

impl RawAssumptions {
    /// Infer growth and COGS fraction from historical series
    ///
    /// Growth is the mean period-over-period change, skipping periods whose
    /// prior revenue is zero; it is only set when at least two revenue points
    /// are given. The COGS fraction is one minus the mean gross margin over
    /// periods with non-zero revenue, and is only set when both series are
    /// non-empty. Everything else is left missing for the caller to supply.
    pub fn infer_from_history(revenue: &[f64], cogs: &[f64]) -> Self {
        let monthly_growth_rate = (revenue.len() > 1).then(|| {
            let rates: Vec<f64> = revenue
                .windows(2)
                .filter(|w| w[0] != 0.0)
                .map(|w| (w[1] - w[0]) / w[0])
                .collect();
            mean(&rates).unwrap_or(DEFAULT_INFERRED_GROWTH_RATE)
        });

        let cogs_fraction = (!revenue.is_empty() && !cogs.is_empty()).then(|| {
            let margins: Vec<f64> = revenue
                .iter()
                .zip(cogs)
                .filter(|(r, _)| **r != 0.0)
                .map(|(r, c)| (r - c) / r)
                .collect();
            1.0 - mean(&margins).unwrap_or(DEFAULT_INFERRED_GROSS_MARGIN)
        });

        debug!(
            "inferred growth {:?} and cogs fraction {:?} from {} historical periods",
            monthly_growth_rate,
            cogs_fraction,
            revenue.len()
        );

        Self {
            monthly_growth_rate,
            cogs_fraction,
            ..Default::default()
        }
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

impl From<&AssumptionSet> for RawAssumptions {
    fn from(assumptions: &AssumptionSet) -> Self {
        Self {
            starting_revenue: Some(assumptions.starting_revenue),
            monthly_growth_rate: Some(assumptions.monthly_growth_rate),
            cogs_fraction: Some(assumptions.cogs_fraction),
            fixed_opex: Some(assumptions.fixed_opex),
            variable_opex_fraction: Some(assumptions.variable_opex_fraction),
            receivable_days: Some(assumptions.receivable_days),
            payable_days: Some(assumptions.payable_days),
            tax_rate: Some(assumptions.tax_rate),
            starting_cash: Some(assumptions.starting_cash),
            depreciation_rate: None,
            equity_events: assumptions.equity_events.clone(),
            debt_events: assumptions.debt_events.clone(),
            capex_events: assumptions
                .capex_events
                .iter()
                .map(|e| RawCapexEvent {
                    period_index: e.period_index,
                    amount: e.amount,
                    useful_life_months: Some(e.useful_life_months),
                    description: e.description.clone(),
                })
                .collect(),
        }
    }
}

fn required<T>(field: &str, value: Option<T>) -> Result<T> {
    value.ok_or_else(|| ModelError::validation(field, "required field is missing"))
}

/// Entry point for callers holding an untyped JSON mapping
///
/// Non-numeric values, negative day counts and malformed event tuples are
/// all reported as validation failures.
pub fn validate_and_build(raw_input: &serde_json::Value) -> Result<AssumptionSet> {
    let raw = RawAssumptions::deserialize(raw_input)
        .map_err(|e| ModelError::validation("raw_input", e.to_string()))?;
    raw.validate()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use serde_json::json;

    fn base_input() -> serde_json::Value {
        json!({
            "starting_revenue": 100000,
            "monthly_growth_rate": 0.10,
            "cogs_fraction": 0.30,
            "fixed_opex": 20000,
            "variable_opex_fraction": 0.10,
            "tax_rate": 0.25,
            "starting_cash": 50000
        })
    }

    #[test]
    fn test_builds_from_flat_mapping() {
        let assumptions = validate_and_build(&base_input()).unwrap();
        assert_relative_eq!(assumptions.starting_revenue, 100_000.0);
        assert_eq!(assumptions.receivable_days, 0);
        assert!(assumptions.equity_events.is_empty());
    }

    #[test]
    fn test_growth_of_minus_one_is_rejected() {
        let mut input = base_input();
        input["monthly_growth_rate"] = json!(-1.0);
        let err = validate_and_build(&input).unwrap_err();
        assert!(err.is_validation(), "{err:?}");
    }

    #[test]
    fn test_missing_required_field() {
        let mut input = base_input();
        input.as_object_mut().unwrap().remove("tax_rate");
        assert_eq!(
            validate_and_build(&input).unwrap_err(),
            ModelError::validation("tax_rate", "required field is missing")
        );
    }

    #[test]
    fn test_non_numeric_field() {
        let mut input = base_input();
        input["fixed_opex"] = json!("twenty thousand");
        assert!(validate_and_build(&input).unwrap_err().is_validation());
    }

    #[test]
    fn test_negative_period_index_is_rejected() {
        let mut input = base_input();
        input["equity_events"] = json!([{ "period_index": -1, "amount": 1000 }]);
        assert!(validate_and_build(&input).unwrap_err().is_validation());
    }

    #[test]
    fn test_legacy_field_names() {
        let input = json!({
            "revenue_start": 100000,
            "revenue_growth_rate": 0.15,
            "cogs_percent": 0.30,
            "opex_fixed": 50000,
            "opex_variable_percent": 0.20,
            "days_receivables": 30,
            "days_payables": 45,
            "tax_rate": 0.28,
            "starting_cash": 100000,
            "depreciation_rate": 0.10,
            "equity_raises": [{ "month": 6, "amount": 500000 }],
            "debt_raises": [{ "month": 4, "amount": 250000, "rate": 0.09 }],
            "capex_schedule": [{ "month": 3, "amount": 100000, "description": "Equipment" }]
        });
        let assumptions = validate_and_build(&input).unwrap();

        assert_eq!(assumptions.receivable_days, 30);
        assert_eq!(assumptions.equity_events, vec![EquityEvent::new(6, 500_000.0)]);
        assert_relative_eq!(assumptions.debt_events[0].annual_interest_rate, 0.09);
        // 10% annual depreciation -> 120 month life
        assert_eq!(assumptions.capex_events[0].useful_life_months, 120);
        assert_eq!(assumptions.capex_events[0].description.as_deref(), Some("Equipment"));
    }

    #[test]
    fn test_rejects_bad_depreciation_rate() {
        let mut input = base_input();
        input["depreciation_rate"] = json!(0.0);
        assert_eq!(
            validate_and_build(&input).unwrap_err(),
            ModelError::validation("depreciation_rate", "must lie in (0, 1], got 0")
        );
    }

    #[test]
    fn test_raw_round_trips_through_assumption_set() {
        let assumptions = AssumptionSet {
            capex_events: vec![CapexEvent::new(2, 36_000.0, 36).with_description("Servers")],
            ..Default::default()
        };
        let rebuilt = RawAssumptions::from(&assumptions).validate().unwrap();
        assert_eq!(rebuilt, assumptions);
    }

    #[test]
    fn test_infer_from_history_averages_growth_and_margin() {
        let revenue = [100_000.0, 110_000.0, 132_000.0];
        let cogs = [30_000.0, 44_000.0, 39_600.0];
        let raw = RawAssumptions::infer_from_history(&revenue, &cogs);

        // growth 10% then 20%; margins 70%, 60%, 70%
        assert_relative_eq!(raw.monthly_growth_rate.unwrap(), 0.15, max_relative = 1e-12);
        assert_relative_eq!(raw.cogs_fraction.unwrap(), 1.0 - 2.0 / 3.0, max_relative = 1e-12);
        assert_eq!(raw.starting_revenue, None);
        assert_eq!(raw.tax_rate, None);
    }

    #[test]
    fn test_infer_from_history_skips_zero_revenue() {
        let revenue = [0.0, 50_000.0, 60_000.0];
        let cogs = [5_000.0, 25_000.0, 30_000.0];
        let raw = RawAssumptions::infer_from_history(&revenue, &cogs);

        // 0 -> 50k has no defined rate, only 50k -> 60k counts
        assert_relative_eq!(raw.monthly_growth_rate.unwrap(), 0.2, max_relative = 1e-12);
        assert_relative_eq!(raw.cogs_fraction.unwrap(), 0.5, max_relative = 1e-12);
    }

    #[test]
    fn test_infer_from_history_fallbacks() {
        let raw = RawAssumptions::infer_from_history(&[0.0, 0.0], &[1.0, 1.0]);
        assert_relative_eq!(raw.monthly_growth_rate.unwrap(), DEFAULT_INFERRED_GROWTH_RATE);
        assert_relative_eq!(raw.cogs_fraction.unwrap(), 1.0 - DEFAULT_INFERRED_GROSS_MARGIN);

        let single = RawAssumptions::infer_from_history(&[100_000.0], &[]);
        assert_eq!(single.monthly_growth_rate, None);
        assert_eq!(single.cogs_fraction, None);
    }

    #[test]
    fn test_inferred_fields_complete_a_mapping() {
        let raw = RawAssumptions {
            starting_revenue: Some(132_000.0),
            fixed_opex: Some(40_000.0),
            variable_opex_fraction: Some(0.1),
            tax_rate: Some(0.25),
            starting_cash: Some(200_000.0),
            ..RawAssumptions::infer_from_history(&[100_000.0, 110_000.0], &[30_000.0, 33_000.0])
        };
        let assumptions = raw.validate().unwrap();
        assert_relative_eq!(assumptions.monthly_growth_rate, 0.1, max_relative = 1e-12);
        assert_relative_eq!(assumptions.cogs_fraction, 0.3, max_relative = 1e-12);
    }

    #[test]
    fn test_days_inventory_is_accepted_and_ignored() {
        let mut input = base_input();
        input["days_inventory"] = json!(15);
        let with_inventory = validate_and_build(&input).unwrap();
        assert_eq!(with_inventory, validate_and_build(&base_input()).unwrap());
    }
}
