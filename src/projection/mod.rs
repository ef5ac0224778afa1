//! Projection engine for monthly income statement and cash-flow projections

mod calendar;
mod engine;
mod period;
mod schedule;
mod state;

pub use calendar::{Calendar, PeriodDates, DEFAULT_FISCAL_YEAR_START_MONTH};
pub use engine::{run, ProjectionConfig, ProjectionEngine, DEFAULT_HORIZON_MONTHS};
pub use period::{PeriodResult, ProjectionResult};
pub use state::{ProjectionState, WorkingCapital, DAYS_PER_PERIOD};
