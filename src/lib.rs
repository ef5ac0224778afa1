//! Financial projection engine - deterministic monthly projections and scenario analysis
//!
//! This library provides:
//! - Validated business-model assumptions (revenue growth, cost structure,
//!   working capital, funding, capex, tax)
//! - Month-by-month income statement and cash-flow waterfall projections
//! - Summary KPIs (growth, profitability timing, cash runway)
//! - Base/best/worst scenario comparison with configurable multipliers
//!
//! The three entry points are [`validate_and_build`], [`run`] and [`compare`].

pub mod error;
pub mod assumptions;
pub mod projection;
pub mod metrics;
pub mod scenario;

// Re-export commonly used types
pub use error::{ModelError, Result};
pub use assumptions::{validate_and_build, AssumptionSet, CapexEvent, DebtEvent, EquityEvent, RawAssumptions};
pub use projection::{run, Calendar, PeriodResult, ProjectionConfig, ProjectionEngine, ProjectionResult};
pub use metrics::{summarize, KpiSummary};
pub use scenario::{
    compare, ScenarioComparison, ScenarioKind, ScenarioMultipliers, ScenarioOutcome, ScenarioOverrides,
    ScenarioRunner,
};
