//! Period output structures for projections

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::metrics::{summarize, KpiSummary};

/// One simulated month: income statement, cash waterfall and derived metrics
///
/// Built in one piece at the end of each period and never touched again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodResult {
    // Timing
    /// 0-based period index
    pub period: u32,
    pub period_start: Option<NaiveDate>,
    pub period_end: Option<NaiveDate>,
    pub fiscal_year: Option<i32>,

    // Income statement
    pub revenue: f64,
    pub cogs: f64,
    pub gross_profit: f64,
    pub operating_expenses: f64,
    pub ebitda: f64,
    pub depreciation: f64,
    pub ebit: f64,
    pub interest_expense: f64,
    pub ebt: f64,
    pub tax: f64,
    pub net_income: f64,

    // Cash flow
    pub opening_cash: f64,
    /// Increase in net working capital (positive consumes cash)
    pub working_capital_delta: f64,
    pub equity_raised: f64,
    pub debt_raised: f64,
    pub interest_paid: f64,
    pub capex_spent: f64,
    pub tax_paid: f64,
    pub closing_cash: f64,
    pub cash_flow_movement: f64,
    pub free_cash_flow: f64,

    // Balances
    pub receivables: f64,
    pub payables: f64,
    /// Outstanding debt principal at period end
    pub debt_balance: f64,
    /// Cumulative equity raised to date
    pub equity_balance: f64,

    // Derived
    pub cumulative_revenue: f64,
    /// Negative free cash flow, floored at 0
    pub burn_rate: f64,
    /// Closing cash divided by burn rate, floored at 0; `None` when not burning
    pub months_of_cash: Option<f64>,
}

impl PeriodResult {
    pub fn is_profitable(&self) -> bool {
        self.net_income > 0.0
    }

    pub fn is_cash_negative(&self) -> bool {
        self.closing_cash < 0.0
    }
}

/// Complete projection result for one assumption set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionResult {
    /// Monthly rows in period order
    pub periods: Vec<PeriodResult>,
}

impl ProjectionResult {
    pub fn new(periods: Vec<PeriodResult>) -> Self {
        Self { periods }
    }

    /// KPI summary over all periods
    pub fn summary(&self) -> Result<KpiSummary> {
        summarize(&self.periods)
    }

    pub fn into_periods(self) -> Vec<PeriodResult> {
        self.periods
    }
}
