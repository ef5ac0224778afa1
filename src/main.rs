//! Financial projection CLI
//!
//! Runs a base/best/worst comparison for an assumption file and prints the
//! KPIs, or the full comparison as JSON.

use std::path::PathBuf;

use anyhow::Context;
use chrono::NaiveDate;
use clap::Parser;

use finproj::assumptions::loader::load_assumptions;
use finproj::assumptions::DEFAULT_ASSUMPTIONS_PATH;
use finproj::projection::{DEFAULT_FISCAL_YEAR_START_MONTH, DEFAULT_HORIZON_MONTHS};
use finproj::{Calendar, ScenarioKind, ScenarioMultipliers, ScenarioOverrides, ScenarioRunner};

#[derive(Debug, Parser)]
#[command(name = "finproj", version, about = "Monthly financial projections with scenario comparison")]
struct Args {
    /// JSON assumption file
    #[arg(short, long, default_value = DEFAULT_ASSUMPTIONS_PATH)]
    assumptions: PathBuf,

    /// Projection horizon in months
    #[arg(short, long, default_value_t = DEFAULT_HORIZON_MONTHS)]
    months: u32,

    /// First month of the projection (YYYY-MM-DD); periods are unlabelled if omitted
    #[arg(long)]
    start_date: Option<NaiveDate>,

    /// Month (1-12) in which the fiscal year starts
    #[arg(long, default_value_t = DEFAULT_FISCAL_YEAR_START_MONTH)]
    fiscal_year_start: u32,

    #[arg(long, default_value_t = 1.5)]
    best_growth: f64,
    #[arg(long, default_value_t = 0.9)]
    best_cost: f64,
    #[arg(long, default_value_t = 0.5)]
    worst_growth: f64,
    #[arg(long, default_value_t = 1.2)]
    worst_cost: f64,

    /// Print the full comparison as JSON instead of a summary table
    #[arg(long)]
    json: bool,

    /// Run the scenarios one after another instead of in parallel
    #[arg(long)]
    sequential: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let assumptions = load_assumptions(&args.assumptions)?;

    let overrides = ScenarioOverrides {
        best: ScenarioMultipliers::new(args.best_growth, args.best_cost),
        worst: ScenarioMultipliers::new(args.worst_growth, args.worst_cost),
    };
    let mut runner = ScenarioRunner::with_overrides(overrides);
    if let Some(start) = args.start_date {
        runner = runner.with_calendar(Calendar::starting(start).with_fiscal_year_start(args.fiscal_year_start));
    }
    if args.sequential {
        runner = runner.sequential();
    }

    let comparison = runner
        .compare(&assumptions, args.months)
        .with_context(|| format!("projecting {}", args.assumptions.display()))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&comparison)?);
        return Ok(());
    }

    println!("Scenario comparison ({} months) for {}", args.months, args.assumptions.display());
    println!(
        "{:>6} {:>16} {:>10} {:>12} {:>16} {:>16} {:>10}",
        "Case", "TotalRevenue", "CAGR", "Profitable", "MinCash", "FinalCash", "Runway"
    );
    println!("{}", "-".repeat(92));

    for kind in ScenarioKind::ALL {
        let kpis = &comparison.get(kind).kpis;
        println!(
            "{:>6} {:>16.0} {:>10} {:>12} {:>16.0} {:>16.0} {:>10}",
            kind,
            kpis.total_revenue,
            kpis.revenue_cagr.map_or_else(|| "n/a".to_string(), |r| format!("{:.1}%", r * 100.0)),
            kpis.first_profitable_period.map_or_else(|| "never".to_string(), |p| format!("month {}", p)),
            kpis.minimum_cash_balance,
            kpis.final_cash_balance,
            kpis.cash_runway_months.map_or_else(|| "none".to_string(), |p| format!("month {}", p)),
        );
    }

    println!("\nFinal cash spread (best - worst): {:.0}", comparison.final_cash_spread());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["finproj"]);
        assert_eq!(args.fiscal_year_start, DEFAULT_FISCAL_YEAR_START_MONTH);
        assert_eq!(args.months, DEFAULT_HORIZON_MONTHS);
        assert_eq!(args.start_date, None);
        assert!(!args.sequential);
    }
}
