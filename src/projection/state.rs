//! Projection state carried from one period to the next

use crate::assumptions::AssumptionSet;
use super::schedule::{CapexBook, DebtBook, EquitySchedule};

/// Days in one projection period for working-capital conversion
pub const DAYS_PER_PERIOD: f64 = 30.0;

/// Running state of a single projection run
#[derive(Debug, Clone)]
pub struct ProjectionState {
    /// Period about to be calculated (0-based)
    pub period: u32,

    /// Revenue of the period about to be calculated
    pub revenue: f64,

    /// Sum of revenue over completed periods
    pub cumulative_revenue: f64,

    /// Cash at the start of the period (prior period's closing cash)
    pub opening_cash: f64,

    /// Net working capital at the end of the prior period; `None` before period 0
    pub prior_net_working_capital: Option<f64>,

    pub equity: EquitySchedule,
    pub debt: DebtBook,
    pub capex: CapexBook,

    growth_factor: f64,
}

impl ProjectionState {
    /// Initialize state at projection start
    pub fn from_assumptions(assumptions: &AssumptionSet) -> Self {
        Self {
            period: 0,
            revenue: assumptions.starting_revenue,
            cumulative_revenue: 0.0,
            opening_cash: assumptions.starting_cash,
            prior_net_working_capital: None,
            equity: EquitySchedule::new(&assumptions.equity_events),
            debt: DebtBook::new(&assumptions.debt_events),
            capex: CapexBook::new(&assumptions.capex_events),
            growth_factor: 1.0 + assumptions.monthly_growth_rate,
        }
    }

    /// Close the current period and advance to the next one
    pub fn advance(&mut self, closing_cash: f64, net_working_capital: f64) {
        self.cumulative_revenue += self.revenue;
        self.opening_cash = closing_cash;
        self.prior_net_working_capital = Some(net_working_capital);
        self.revenue *= self.growth_factor;
        self.period += 1;
    }
}

/// Receivables, payables and the change in net working capital
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorkingCapital {
    pub receivables: f64,
    pub payables: f64,
    pub delta: f64,
}

impl WorkingCapital {
    /// Balances implied by this period's revenue and COGS
    ///
    /// The opening position before period 0 is period 0's own level, so the
    /// first delta is zero.
    pub fn for_period(
        assumptions: &AssumptionSet,
        revenue: f64,
        cogs: f64,
        prior_net: Option<f64>,
    ) -> Self {
        let receivables = revenue * assumptions.receivable_days as f64 / DAYS_PER_PERIOD;
        let payables = cogs * assumptions.payable_days as f64 / DAYS_PER_PERIOD;
        let net = receivables - payables;
        Self {
            receivables,
            payables,
            delta: prior_net.map_or(0.0, |prior| net - prior),
        }
    }

    pub fn net(&self) -> f64 {
        self.receivables - self.payables
    }
}
