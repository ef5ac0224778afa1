//! Summary KPIs derived from a completed projection

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};
use crate::projection::PeriodResult;

/// Key metrics for one projection run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiSummary {
    pub periods: usize,
    pub total_revenue: f64,
    pub average_monthly_revenue: f64,

    /// Annualized growth from first to last period; `None` when the first
    /// period has no positive revenue
    pub revenue_cagr: Option<f64>,

    pub total_ebitda: f64,
    pub average_monthly_ebitda: f64,
    pub first_ebitda_positive_period: Option<u32>,

    pub total_net_income: f64,
    /// First period with positive net income
    pub first_profitable_period: Option<u32>,

    pub minimum_cash_balance: f64,
    pub minimum_cash_period: u32,
    pub final_cash_balance: f64,

    /// First period whose closing cash is negative; `None` means cash never
    /// runs out within the horizon
    pub cash_runway_months: Option<u32>,
    pub months_cash_negative: usize,
    pub peak_burn_rate: f64,

    pub total_equity_raised: f64,
    pub total_debt_raised: f64,
    pub total_capex: f64,
}

/// Summarize a projection sequence
///
/// Fails with [`ModelError::InvalidInput`] on an empty sequence.
pub fn summarize(periods: &[PeriodResult]) -> Result<KpiSummary> {
    let (first, last) = match (periods.first(), periods.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return Err(ModelError::invalid_input("cannot summarize an empty projection")),
    };
    let count = periods.len();

    let total_revenue: f64 = periods.iter().map(|p| p.revenue).sum();
    let total_ebitda: f64 = periods.iter().map(|p| p.ebitda).sum();
    let total_net_income: f64 = periods.iter().map(|p| p.net_income).sum();

    // Earliest period wins ties
    let (minimum_cash_period, minimum_cash_balance) = periods
        .iter()
        .map(|p| (p.period, p.closing_cash))
        .fold((first.period, first.closing_cash), |min, cur| {
            if cur.1 < min.1 { cur } else { min }
        });

    Ok(KpiSummary {
        periods: count,
        total_revenue,
        average_monthly_revenue: total_revenue / count as f64,
        revenue_cagr: revenue_cagr(first.revenue, last.revenue, count),
        total_ebitda,
        average_monthly_ebitda: total_ebitda / count as f64,
        first_ebitda_positive_period: periods.iter().find(|p| p.ebitda > 0.0).map(|p| p.period),
        total_net_income,
        first_profitable_period: periods.iter().find(|p| p.is_profitable()).map(|p| p.period),
        minimum_cash_balance,
        minimum_cash_period,
        final_cash_balance: last.closing_cash,
        cash_runway_months: periods.iter().find(|p| p.is_cash_negative()).map(|p| p.period),
        months_cash_negative: periods.iter().filter(|p| p.is_cash_negative()).count(),
        peak_burn_rate: periods.iter().map(|p| p.burn_rate).fold(0.0, f64::max),
        total_equity_raised: periods.iter().map(|p| p.equity_raised).sum(),
        total_debt_raised: periods.iter().map(|p| p.debt_raised).sum(),
        total_capex: periods.iter().map(|p| p.capex_spent).sum(),
    })
}

/// `(last / first) ^ (12 / periods) - 1`
fn revenue_cagr(first: f64, last: f64, periods: usize) -> Option<f64> {
    if first <= 0.0 || periods == 0 {
        return None;
    }
    Some((last / first).powf(12.0 / periods as f64) - 1.0)
}
