//! Scheduled funding and capital expenditure events

use serde::{Deserialize, Serialize};

/// Default annual rate for debt events that do not state one
pub const DEFAULT_DEBT_ANNUAL_RATE: f64 = 0.08;

/// Equity raised in a single period
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquityEvent {
    /// 0-based period the cash lands in
    #[serde(alias = "month")]
    pub period_index: u32,
    pub amount: f64,
}

/// Debt tranche drawn in a single period
///
/// Principal stays outstanding for the rest of the horizon.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DebtEvent {
    #[serde(alias = "month")]
    pub period_index: u32,
    pub amount: f64,
    /// Annual interest rate as a decimal (0.08 = 8%)
    #[serde(alias = "rate", default = "default_debt_rate")]
    pub annual_interest_rate: f64,
}

fn default_debt_rate() -> f64 {
    DEFAULT_DEBT_ANNUAL_RATE
}

/// Capital expenditure, paid in full in its period and depreciated
/// straight-line over `useful_life_months`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapexEvent {
    #[serde(alias = "month")]
    pub period_index: u32,
    pub amount: f64,
    pub useful_life_months: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl EquityEvent {
    pub fn new(period_index: u32, amount: f64) -> Self {
        Self { period_index, amount }
    }
}

impl DebtEvent {
    pub fn new(period_index: u32, amount: f64, annual_interest_rate: f64) -> Self {
        Self {
            period_index,
            amount,
            annual_interest_rate,
        }
    }

    /// Interest accrued on this tranche in one month
    pub fn monthly_interest(&self) -> f64 {
        self.amount * self.annual_interest_rate / 12.0
    }
}

impl CapexEvent {
    pub fn new(period_index: u32, amount: f64, useful_life_months: u32) -> Self {
        Self {
            period_index,
            amount,
            useful_life_months,
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Straight-line depreciation charged in each month of the useful life
    pub fn monthly_depreciation(&self) -> f64 {
        if self.useful_life_months == 0 {
            return 0.0;
        }
        self.amount / self.useful_life_months as f64
    }

    /// First period after the useful life has elapsed
    pub fn expiry_period(&self) -> u64 {
        self.period_index as u64 + self.useful_life_months as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_capex_depreciation_and_expiry() {
        let capex = CapexEvent::new(3, 120_000.0, 24);
        assert_relative_eq!(capex.monthly_depreciation(), 5_000.0);
        assert_eq!(capex.expiry_period(), 27);
    }

    #[test]
    fn test_debt_defaults_rate_when_missing() {
        let debt: DebtEvent = serde_json::from_str(r#"{"month": 6, "amount": 500000}"#).unwrap();
        assert_eq!(debt.period_index, 6);
        assert_relative_eq!(debt.annual_interest_rate, DEFAULT_DEBT_ANNUAL_RATE);
        assert_relative_eq!(debt.monthly_interest(), 500_000.0 * 0.08 / 12.0);
    }
}
