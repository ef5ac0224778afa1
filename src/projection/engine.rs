//! Core projection engine for monthly income statement and cash waterfall

use log::debug;

use crate::assumptions::AssumptionSet;
use crate::error::{ModelError, Result};
use super::calendar::Calendar;
use super::period::{PeriodResult, ProjectionResult};
use super::state::{ProjectionState, WorkingCapital};

/// Default projection horizon in months
pub const DEFAULT_HORIZON_MONTHS: u32 = 36;

/// Configuration for a projection run
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionConfig {
    /// Number of months to project (must be > 0)
    pub horizon_months: u32,

    /// Calendar labels for each period; periods are index-only when `None`
    pub calendar: Option<Calendar>,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            horizon_months: DEFAULT_HORIZON_MONTHS,
            calendar: None,
        }
    }
}

impl ProjectionConfig {
    pub fn months(horizon_months: u32) -> Self {
        Self {
            horizon_months,
            ..Default::default()
        }
    }

    pub fn with_calendar(mut self, calendar: Calendar) -> Self {
        self.calendar = Some(calendar);
        self
    }

    fn check(&self) -> Result<()> {
        if self.horizon_months == 0 {
            return Err(ModelError::invalid_input("horizon must be at least 1 month"));
        }
        if let Some(calendar) = &self.calendar {
            calendar.check()?;
            if calendar.period(self.horizon_months - 1).is_none() {
                return Err(ModelError::invalid_input(format!(
                    "calendar starting {} cannot label {} months",
                    calendar.start, self.horizon_months
                )));
            }
        }
        Ok(())
    }
}

/// Income statement lines for one period
#[derive(Debug, Clone, Copy)]
struct IncomeStatement {
    revenue: f64,
    cogs: f64,
    gross_profit: f64,
    operating_expenses: f64,
    ebitda: f64,
    depreciation: f64,
    ebit: f64,
    interest_expense: f64,
    ebt: f64,
    tax: f64,
    net_income: f64,
}

/// Events landing in one period
#[derive(Debug, Clone, Copy)]
struct ScheduledFlows {
    equity_raised: f64,
    debt_raised: f64,
    capex_spent: f64,
}

/// Main projection engine
///
/// Each run is a strict fold over periods: period `n + 1` opens with
/// period `n`'s closing cash, so periods are never computed out of order.
#[derive(Debug, Clone, Default)]
pub struct ProjectionEngine {
    config: ProjectionConfig,
}

impl ProjectionEngine {
    pub fn new(config: ProjectionConfig) -> Self {
        Self { config }
    }

    /// Run a projection for the configured horizon
    ///
    /// All validation happens before the first period is simulated.
    /// Negative cash is reported as-is, never clamped.
    pub fn project(&self, assumptions: &AssumptionSet) -> Result<ProjectionResult> {
        self.config.check()?;
        let horizon = self.config.horizon_months;
        assumptions.validate_for_horizon(horizon)?;

        debug!(
            "projecting {} months, {} scheduled events",
            horizon,
            assumptions.event_count()
        );

        let mut state = ProjectionState::from_assumptions(assumptions);
        let mut periods = Vec::with_capacity(horizon as usize);

        for _ in 0..horizon {
            periods.push(self.calculate_period(assumptions, &mut state));
        }

        Ok(ProjectionResult::new(periods))
    }

    /// Calculate one period and advance the state past it
    fn calculate_period(&self, assumptions: &AssumptionSet, state: &mut ProjectionState) -> PeriodResult {
        let period = state.period;

        let flows = ScheduledFlows {
            equity_raised: state.equity.draw(period),
            debt_raised: state.debt.draw(period),
            capex_spent: state.capex.spend(period),
        };

        let income = self.income_statement(assumptions, state);
        let working_capital = WorkingCapital::for_period(
            assumptions,
            income.revenue,
            income.cogs,
            state.prior_net_working_capital,
        );

        let opening_cash = state.opening_cash;
        let closing_cash = opening_cash + income.ebitda - working_capital.delta
            + flows.equity_raised
            + flows.debt_raised
            - income.interest_expense
            - income.tax
            - flows.capex_spent;
        let free_cash_flow =
            income.ebitda - working_capital.delta - income.tax - flows.capex_spent;
        let burn_rate = (-free_cash_flow).max(0.0);

        let dates = self.config.calendar.as_ref().and_then(|c| c.period(period));

        let row = PeriodResult {
            period,
            period_start: dates.map(|d| d.start),
            period_end: dates.map(|d| d.end),
            fiscal_year: dates.map(|d| d.fiscal_year),

            revenue: income.revenue,
            cogs: income.cogs,
            gross_profit: income.gross_profit,
            operating_expenses: income.operating_expenses,
            ebitda: income.ebitda,
            depreciation: income.depreciation,
            ebit: income.ebit,
            interest_expense: income.interest_expense,
            ebt: income.ebt,
            tax: income.tax,
            net_income: income.net_income,

            opening_cash,
            working_capital_delta: working_capital.delta,
            equity_raised: flows.equity_raised,
            debt_raised: flows.debt_raised,
            interest_paid: income.interest_expense,
            capex_spent: flows.capex_spent,
            tax_paid: income.tax,
            closing_cash,
            cash_flow_movement: closing_cash - opening_cash,
            free_cash_flow,

            receivables: working_capital.receivables,
            payables: working_capital.payables,
            debt_balance: state.debt.balance(),
            equity_balance: state.equity.raised_to_date(),

            cumulative_revenue: state.cumulative_revenue + income.revenue,
            burn_rate,
            months_of_cash: (burn_rate > 0.0).then(|| (closing_cash / burn_rate).max(0.0)),
        };

        state.advance(closing_cash, working_capital.net());
        row
    }

    /// Income statement for the state's current period
    ///
    /// Expects the period's events to have been drawn already, so new debt
    /// accrues interest and new capex depreciates from its own period.
    fn income_statement(&self, assumptions: &AssumptionSet, state: &ProjectionState) -> IncomeStatement {
        let revenue = state.revenue;
        let cogs = revenue * assumptions.cogs_fraction;
        let gross_profit = revenue - cogs;
        let operating_expenses = assumptions.fixed_opex + revenue * assumptions.variable_opex_fraction;
        let ebitda = gross_profit - operating_expenses;

        let depreciation = state.capex.depreciation();
        let ebit = ebitda - depreciation;

        let interest_expense = state.debt.monthly_interest();
        let ebt = ebit - interest_expense;

        // Losses carry no tax credit
        let tax = ebt.max(0.0) * assumptions.tax_rate;
        let net_income = ebt - tax;

        IncomeStatement {
            revenue,
            cogs,
            gross_profit,
            operating_expenses,
            ebitda,
            depreciation,
            ebit,
            interest_expense,
            ebt,
            tax,
            net_income,
        }
    }
}

/// Run a projection over `horizon_months` with no calendar
pub fn run(assumptions: &AssumptionSet, horizon_months: u32) -> Result<Vec<PeriodResult>> {
    ProjectionEngine::new(ProjectionConfig::months(horizon_months))
        .project(assumptions)
        .map(ProjectionResult::into_periods)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assumptions::{CapexEvent, DebtEvent, EquityEvent};
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use chrono::NaiveDate;
    use proptest::prelude::{prop_assert, prop_assert_eq, proptest};

    fn test_assumptions() -> AssumptionSet {
        AssumptionSet {
            starting_revenue: 100_000.0,
            monthly_growth_rate: 0.10,
            cogs_fraction: 0.30,
            fixed_opex: 20_000.0,
            variable_opex_fraction: 0.10,
            receivable_days: 0,
            payable_days: 0,
            equity_events: Vec::new(),
            debt_events: Vec::new(),
            capex_events: Vec::new(),
            tax_rate: 0.25,
            starting_cash: 50_000.0,
        }
    }

    /// Positive revenue but nothing else moving cash once tax takes all profit
    fn flat_assumptions() -> AssumptionSet {
        AssumptionSet {
            starting_revenue: 10_000.0,
            monthly_growth_rate: 0.0,
            cogs_fraction: 0.0,
            fixed_opex: 0.0,
            variable_opex_fraction: 0.0,
            receivable_days: 0,
            payable_days: 0,
            equity_events: Vec::new(),
            debt_events: Vec::new(),
            capex_events: Vec::new(),
            tax_rate: 1.0,
            starting_cash: 0.0,
        }
    }

    #[test]
    fn test_three_month_income_statement() {
        let periods = run(&test_assumptions(), 3).unwrap();
        assert_eq!(periods.len(), 3);

        let revenue: Vec<f64> = periods.iter().map(|p| p.revenue).collect();
        assert_relative_eq!(revenue[0], 100_000.0);
        assert_relative_eq!(revenue[1], 110_000.0, max_relative = 1e-12);
        assert_relative_eq!(revenue[2], 121_000.0, max_relative = 1e-12);

        let first = &periods[0];
        assert_relative_eq!(first.gross_profit, 70_000.0);
        assert_relative_eq!(first.operating_expenses, 30_000.0);
        assert_relative_eq!(first.ebitda, 40_000.0);
        assert_relative_eq!(first.tax, 10_000.0);
        assert_relative_eq!(first.net_income, 30_000.0);
        assert_relative_eq!(first.closing_cash, 50_000.0 + 40_000.0 - 10_000.0);
        assert_relative_eq!(first.free_cash_flow, 30_000.0);
        assert_eq!(first.burn_rate, 0.0);
        assert_eq!(first.months_of_cash, None);
        assert_relative_eq!(periods[2].cumulative_revenue, 331_000.0, max_relative = 1e-12);
    }

    #[test]
    fn test_equity_event_lands_exactly() {
        let assumptions = AssumptionSet {
            equity_events: vec![EquityEvent::new(1, 500_000.0)],
            ..flat_assumptions()
        };
        let periods = run(&assumptions, 3).unwrap();

        assert_eq!(periods[1].closing_cash, periods[1].opening_cash + 500_000.0);
        assert_eq!(periods[1].equity_raised, 500_000.0);
        assert_eq!(periods[2].equity_raised, 0.0);
        assert_eq!(periods[2].equity_balance, 500_000.0);
    }

    #[test]
    fn test_event_at_horizon_rejected_before_simulation() {
        let assumptions = AssumptionSet {
            capex_events: vec![CapexEvent::new(6, 1_000.0, 12)],
            ..test_assumptions()
        };
        let err = run(&assumptions, 6).unwrap_err();
        assert_eq!(
            err,
            ModelError::validation("capex_events[0].period_index", "period 6 is outside [0, 6)")
        );
        assert!(run(&assumptions, 7).is_ok());
    }

    #[test]
    fn test_zero_horizon_is_invalid_input() {
        assert!(run(&test_assumptions(), 0).unwrap_err().is_invalid_input());
    }

    #[test]
    fn test_negative_cash_is_not_clamped() {
        let assumptions = AssumptionSet {
            fixed_opex: 200_000.0,
            monthly_growth_rate: 0.0,
            ..test_assumptions()
        };
        let periods = run(&assumptions, 4).unwrap();

        // EBITDA is -140,000 every month, no tax on losses
        assert_relative_eq!(periods[0].closing_cash, -90_000.0);
        assert_relative_eq!(periods[3].closing_cash, -510_000.0);
        assert_relative_eq!(periods[0].burn_rate, 140_000.0);
        assert_eq!(periods[0].tax, 0.0);
        assert!(periods[0].net_income < 0.0);
    }

    #[test]
    fn test_months_of_cash_floors_at_zero_once_overdrawn() {
        let assumptions = AssumptionSet {
            fixed_opex: 200_000.0,
            monthly_growth_rate: 0.0,
            starting_cash: 330_000.0,
            ..test_assumptions()
        };
        let periods = run(&assumptions, 4).unwrap();

        // 190k, 50k, -90k, -230k against a 140k monthly burn
        assert_relative_eq!(periods[0].months_of_cash.unwrap(), 190.0 / 140.0);
        assert_relative_eq!(periods[1].months_of_cash.unwrap(), 50.0 / 140.0);
        assert_eq!(periods[2].months_of_cash, Some(0.0));
        assert_eq!(periods[3].months_of_cash, Some(0.0));
    }

    #[test]
    fn test_debt_interest_and_capex_depreciation() {
        let assumptions = AssumptionSet {
            debt_events: vec![DebtEvent::new(1, 120_000.0, 0.10)],
            capex_events: vec![CapexEvent::new(0, 24_000.0, 2)],
            ..test_assumptions()
        };
        let periods = run(&assumptions, 4).unwrap();

        assert_relative_eq!(periods[0].depreciation, 12_000.0);
        assert_relative_eq!(periods[1].depreciation, 12_000.0);
        assert_eq!(periods[2].depreciation, 0.0);

        assert_eq!(periods[0].interest_expense, 0.0);
        assert_relative_eq!(periods[1].interest_expense, 1_000.0);
        assert_relative_eq!(periods[3].interest_expense, 1_000.0);
        assert_relative_eq!(periods[3].debt_balance, 120_000.0);

        // Capex hits cash in its period; depreciation only reduces tax
        let first = &periods[0];
        assert_relative_eq!(first.capex_spent, 24_000.0);
        assert_relative_eq!(first.ebit, 40_000.0 - 12_000.0);
        assert_relative_eq!(first.tax, 28_000.0 * 0.25);
        assert_relative_eq!(
            first.closing_cash,
            50_000.0 + 40_000.0 - 7_000.0 - 24_000.0
        );

        let second = &periods[1];
        assert_relative_eq!(
            second.closing_cash,
            second.opening_cash + second.ebitda + 120_000.0 - 1_000.0 - second.tax,
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_working_capital_consumes_cash_as_revenue_grows() {
        let assumptions = AssumptionSet {
            receivable_days: 60,
            payable_days: 30,
            ..test_assumptions()
        };
        let periods = run(&assumptions, 3).unwrap();

        assert_eq!(periods[0].working_capital_delta, 0.0);
        // receivables +20,000, payables +3,000
        assert_relative_eq!(periods[1].working_capital_delta, 17_000.0, max_relative = 1e-9);
        assert_relative_eq!(
            periods[1].free_cash_flow,
            periods[1].ebitda - 17_000.0 - periods[1].tax,
            max_relative = 1e-9
        );
    }

    #[test]
    fn test_calendar_labels() {
        let start = NaiveDate::from_ymd_opt(2025, 7, 1).unwrap();
        let engine = ProjectionEngine::new(
            ProjectionConfig::months(3).with_calendar(Calendar::starting(start)),
        );
        let result = engine.project(&test_assumptions()).unwrap();

        assert_eq!(result.periods[0].period_start, Some(start));
        assert_eq!(result.periods[0].period_end, NaiveDate::from_ymd_opt(2025, 7, 31));
        assert_eq!(result.periods[0].fiscal_year, Some(2024));
        assert_eq!(result.periods[1].fiscal_year, Some(2025));
    }

    #[test]
    fn test_calendar_absent_by_default() {
        let periods = run(&test_assumptions(), 1).unwrap();
        assert_eq!(periods[0].period_start, None);
        assert_eq!(periods[0].fiscal_year, None);
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(48))]

        #[test]
        fn prop_run_is_deterministic_and_continuous(
            revenue in 1_000u32..1_000_000,
            growth_bp in -500i32..3_000,
            (cogs_pct, var_pct) in (0u32..=100, 0u32..=100),
            fixed in 0u32..500_000,
            (recv_days, pay_days) in (0u32..90, 0u32..90),
            tax_pct in 0u32..=100,
            cash in 0u32..2_000_000,
            (equity_at, debt_at, capex_at) in (0u32..24, 0u32..24, 0u32..24),
            capex_life in 1u32..60,
            horizon in 24u32..60
        ) {
            let assumptions = AssumptionSet {
                starting_revenue: revenue as f64,
                monthly_growth_rate: growth_bp as f64 / 10_000.0,
                cogs_fraction: cogs_pct as f64 / 100.0,
                fixed_opex: fixed as f64,
                variable_opex_fraction: var_pct as f64 / 100.0,
                receivable_days: recv_days,
                payable_days: pay_days,
                equity_events: vec![EquityEvent::new(equity_at, 250_000.0)],
                debt_events: vec![DebtEvent::new(debt_at, 100_000.0, 0.09)],
                capex_events: vec![CapexEvent::new(capex_at, 50_000.0, capex_life)],
                tax_rate: tax_pct as f64 / 100.0,
                starting_cash: cash as f64,
            };

            let first = run(&assumptions, horizon).unwrap();
            let second = run(&assumptions, horizon).unwrap();
            prop_assert_eq!(&first, &second);
            prop_assert_eq!(first.len(), horizon as usize);

            for pair in first.windows(2) {
                prop_assert_eq!(pair[0].closing_cash, pair[1].opening_cash);
            }

            let growth = 1.0 + assumptions.monthly_growth_rate;
            for (i, p) in first.iter().enumerate() {
                let expected = assumptions.starting_revenue * growth.powi(i as i32);
                prop_assert!(
                    (p.revenue - expected).abs() <= expected.abs() * 1e-9,
                    "period {}: revenue {} vs compounded {}", i, p.revenue, expected
                );
                prop_assert!(p.burn_rate >= 0.0);
                prop_assert_eq!(p.free_cash_flow, p.ebitda - p.working_capital_delta - p.tax - p.capex_spent);
            }
        }
    }

    #[test]
    fn test_closing_cash_identity() {
        let assumptions = AssumptionSet {
            receivable_days: 45,
            payable_days: 20,
            equity_events: vec![EquityEvent::new(2, 80_000.0)],
            debt_events: vec![DebtEvent::new(3, 40_000.0, 0.07)],
            capex_events: vec![CapexEvent::new(4, 30_000.0, 10)],
            ..test_assumptions()
        };
        for p in run(&assumptions, 12).unwrap() {
            let expected = p.opening_cash + p.ebitda - p.working_capital_delta + p.equity_raised
                + p.debt_raised
                - p.interest_paid
                - p.tax_paid
                - p.capex_spent;
            assert_abs_diff_eq!(p.closing_cash, expected, epsilon = 1e-6);
            assert_abs_diff_eq!(p.cash_flow_movement, p.closing_cash - p.opening_cash, epsilon = 1e-6);
        }
    }
}
