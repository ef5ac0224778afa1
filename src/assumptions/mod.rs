//! Business-model assumptions for a projection run
//!
//! An [`AssumptionSet`] is built once per run, either directly or from the
//! flat raw mapping in [`raw`], and is never mutated by the engine. Scenario
//! variants are derived as new values via [`AssumptionSet::scaled`].

mod events;
pub mod loader;
pub mod raw;

pub use events::{CapexEvent, DebtEvent, EquityEvent, DEFAULT_DEBT_ANNUAL_RATE};
pub use loader::DEFAULT_ASSUMPTIONS_PATH;
pub use raw::{validate_and_build, RawAssumptions};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};
use crate::scenario::ScenarioMultipliers;

/// Validated input describing the business model for one projection run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssumptionSet {
    /// Revenue in period 0 (must be > 0)
    pub starting_revenue: f64,

    /// Fractional month-over-month growth (0.15 = 15%/month), > -1.0
    pub monthly_growth_rate: f64,

    /// Cost of goods sold as a fraction of revenue
    pub cogs_fraction: f64,

    /// Fixed operating expenses per period
    pub fixed_opex: f64,

    /// Operating expenses proportional to revenue
    pub variable_opex_fraction: f64,

    /// Days of revenue held as receivables
    pub receivable_days: u32,

    /// Days of COGS held as payables
    pub payable_days: u32,

    pub equity_events: Vec<EquityEvent>,
    pub debt_events: Vec<DebtEvent>,
    pub capex_events: Vec<CapexEvent>,

    /// Tax rate applied to positive pre-tax earnings
    pub tax_rate: f64,

    pub starting_cash: f64,
}

impl Default for AssumptionSet {
    /// Early-stage SaaS-style defaults used by the modeling service
    fn default() -> Self {
        Self {
            starting_revenue: 100_000.0,
            monthly_growth_rate: 0.15,
            cogs_fraction: 0.30,
            fixed_opex: 50_000.0,
            variable_opex_fraction: 0.20,
            receivable_days: 30,
            payable_days: 45,
            equity_events: Vec::new(),
            debt_events: Vec::new(),
            capex_events: Vec::new(),
            tax_rate: 0.28,
            starting_cash: 100_000.0,
        }
    }
}

impl AssumptionSet {
    /// Check every field-level invariant
    ///
    /// Event period indices are checked against a horizon in
    /// [`validate_for_horizon`](Self::validate_for_horizon), since the
    /// horizon is supplied separately.
    pub fn validate(&self) -> Result<()> {
        check_positive("starting_revenue", self.starting_revenue)?;

        check_finite("monthly_growth_rate", self.monthly_growth_rate)?;
        if self.monthly_growth_rate <= -1.0 {
            return Err(ModelError::validation(
                "monthly_growth_rate",
                format!("must be greater than -1.0, got {}", self.monthly_growth_rate),
            ));
        }

        check_fraction("cogs_fraction", self.cogs_fraction)?;
        check_fraction("variable_opex_fraction", self.variable_opex_fraction)?;
        check_fraction("tax_rate", self.tax_rate)?;
        check_non_negative("fixed_opex", self.fixed_opex)?;
        check_non_negative("starting_cash", self.starting_cash)?;

        for (i, event) in self.equity_events.iter().enumerate() {
            check_non_negative(&format!("equity_events[{i}].amount"), event.amount)?;
        }
        for (i, event) in self.debt_events.iter().enumerate() {
            check_non_negative(&format!("debt_events[{i}].amount"), event.amount)?;
            check_non_negative(
                &format!("debt_events[{i}].annual_interest_rate"),
                event.annual_interest_rate,
            )?;
        }
        for (i, event) in self.capex_events.iter().enumerate() {
            check_non_negative(&format!("capex_events[{i}].amount"), event.amount)?;
            if event.useful_life_months == 0 {
                return Err(ModelError::validation(
                    format!("capex_events[{i}].useful_life_months"),
                    "must be at least 1",
                ));
            }
        }

        Ok(())
    }

    /// Field-level validation plus the `[0, horizon)` check on every event
    pub fn validate_for_horizon(&self, horizon: u32) -> Result<()> {
        self.validate()?;

        let indices = self
            .equity_events
            .iter()
            .enumerate()
            .map(|(i, e)| (format!("equity_events[{i}].period_index"), e.period_index))
            .chain(
                self.debt_events
                    .iter()
                    .enumerate()
                    .map(|(i, e)| (format!("debt_events[{i}].period_index"), e.period_index)),
            )
            .chain(
                self.capex_events
                    .iter()
                    .enumerate()
                    .map(|(i, e)| (format!("capex_events[{i}].period_index"), e.period_index)),
            );

        for (field, period_index) in indices {
            if period_index >= horizon {
                return Err(ModelError::validation(
                    field,
                    format!("period {period_index} is outside [0, {horizon})"),
                ));
            }
        }

        Ok(())
    }

    /// Derive a scenario variant
    ///
    /// Growth is multiplied by `growth`; COGS, variable and fixed opex by
    /// `cost`. Fractional fields are clamped back into `[0, 1]`.
    pub fn scaled(&self, multipliers: &ScenarioMultipliers) -> Result<Self> {
        multipliers.check()?;

        let monthly_growth_rate = self.monthly_growth_rate * multipliers.growth;
        if monthly_growth_rate <= -1.0 {
            return Err(ModelError::validation(
                "monthly_growth_rate",
                format!(
                    "growth multiplier {} drives the rate to {monthly_growth_rate}",
                    multipliers.growth
                ),
            ));
        }

        let cogs_fraction = clamp_fraction("cogs_fraction", self.cogs_fraction * multipliers.cost);
        let variable_opex_fraction = clamp_fraction(
            "variable_opex_fraction",
            self.variable_opex_fraction * multipliers.cost,
        );

        Ok(Self {
            monthly_growth_rate,
            cogs_fraction,
            variable_opex_fraction,
            fixed_opex: self.fixed_opex * multipliers.cost,
            ..self.clone()
        })
    }

    /// Total number of scheduled events across all three lists
    pub fn event_count(&self) -> usize {
        self.equity_events.len() + self.debt_events.len() + self.capex_events.len()
    }
}

fn clamp_fraction(field: &str, value: f64) -> f64 {
    let clamped = value.clamp(0.0, 1.0);
    if clamped != value {
        debug!("{} clamped from {} to {}", field, value, clamped);
    }
    clamped
}

fn check_finite(field: &str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ModelError::validation(field, format!("must be a finite number, got {value}")))
    }
}

fn check_positive(field: &str, value: f64) -> Result<()> {
    check_finite(field, value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(ModelError::validation(field, format!("must be greater than 0, got {value}")))
    }
}

fn check_non_negative(field: &str, value: f64) -> Result<()> {
    check_finite(field, value)?;
    if value >= 0.0 {
        Ok(())
    } else {
        Err(ModelError::validation(field, format!("must be non-negative, got {value}")))
    }
}

fn check_fraction(field: &str, value: f64) -> Result<()> {
    check_finite(field, value)?;
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ModelError::validation(field, format!("must lie in [0, 1], got {value}")))
    }
}
