//! Scenario runner for base/best/worst comparisons
//!
//! Derives best and worst assumption sets from deterministic multipliers,
//! projects all three and summarizes each. The three runs share nothing
//! mutable, so they fan out across the rayon pool by default; a sequential
//! runner produces identical results.

use std::fmt;

use log::info;
use serde::{Deserialize, Serialize};

use crate::assumptions::AssumptionSet;
use crate::error::{ModelError, Result};
use crate::metrics::KpiSummary;
use crate::projection::{Calendar, PeriodResult, ProjectionConfig, ProjectionEngine};

/// Named scenario variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScenarioKind {
    Base,
    Best,
    Worst,
}

impl ScenarioKind {
    pub const ALL: [ScenarioKind; 3] = [ScenarioKind::Base, ScenarioKind::Best, ScenarioKind::Worst];

    pub fn as_str(&self) -> &'static str {
        match self {
            ScenarioKind::Base => "base",
            ScenarioKind::Best => "best",
            ScenarioKind::Worst => "worst",
        }
    }
}

impl fmt::Display for ScenarioKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Growth and cost multipliers applied to a whole assumption set
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScenarioMultipliers {
    /// Applied to the monthly growth rate
    pub growth: f64,
    /// Applied to COGS, variable opex and fixed opex (> 1 increases costs)
    pub cost: f64,
}

impl ScenarioMultipliers {
    pub const IDENTITY: ScenarioMultipliers = ScenarioMultipliers { growth: 1.0, cost: 1.0 };

    pub fn new(growth: f64, cost: f64) -> Self {
        Self { growth, cost }
    }

    /// Both multipliers must be finite and strictly positive
    pub fn check(&self) -> Result<()> {
        for (name, value) in [("growth", self.growth), ("cost", self.cost)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ModelError::invalid_input(format!(
                    "{name} multiplier must be a positive finite number, got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// Multipliers for the best and worst variants
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScenarioOverrides {
    pub best: ScenarioMultipliers,
    pub worst: ScenarioMultipliers,
}

impl Default for ScenarioOverrides {
    fn default() -> Self {
        Self {
            best: ScenarioMultipliers { growth: 1.5, cost: 0.9 },
            worst: ScenarioMultipliers { growth: 0.5, cost: 1.2 },
        }
    }
}

impl ScenarioOverrides {
    pub fn multipliers(&self, kind: ScenarioKind) -> ScenarioMultipliers {
        match kind {
            ScenarioKind::Base => ScenarioMultipliers::IDENTITY,
            ScenarioKind::Best => self.best,
            ScenarioKind::Worst => self.worst,
        }
    }

    pub fn check(&self) -> Result<()> {
        self.best.check()?;
        self.worst.check()
    }
}

/// One value per scenario
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScenarioValues<T> {
    pub base: T,
    pub best: T,
    pub worst: T,
}

impl<T> ScenarioValues<T> {
    pub fn get(&self, kind: ScenarioKind) -> &T {
        match kind {
            ScenarioKind::Base => &self.base,
            ScenarioKind::Best => &self.best,
            ScenarioKind::Worst => &self.worst,
        }
    }

    pub fn map<U>(&self, mut f: impl FnMut(&T) -> U) -> ScenarioValues<U> {
        ScenarioValues {
            base: f(&self.base),
            best: f(&self.best),
            worst: f(&self.worst),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (ScenarioKind, &T)> {
        ScenarioKind::ALL.into_iter().map(move |kind| (kind, self.get(kind)))
    }
}

/// Projection and KPIs for one scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioOutcome {
    /// Assumptions after multipliers were applied
    pub assumptions: AssumptionSet,
    pub periods: Vec<PeriodResult>,
    pub kpis: KpiSummary,
}

/// Side-by-side figures for one period across the three scenarios
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlignedPeriod {
    pub period: u32,
    pub revenue: ScenarioValues<f64>,
    pub net_income: ScenarioValues<f64>,
    pub closing_cash: ScenarioValues<f64>,
}

/// Result of [`ScenarioRunner::compare`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioComparison {
    pub horizon_months: u32,
    pub overrides: ScenarioOverrides,
    pub outcomes: ScenarioValues<ScenarioOutcome>,
}

impl ScenarioComparison {
    pub fn get(&self, kind: ScenarioKind) -> &ScenarioOutcome {
        self.outcomes.get(kind)
    }

    pub fn kpis(&self) -> ScenarioValues<KpiSummary> {
        self.outcomes.map(|o| o.kpis.clone())
    }

    /// Rows aligned by period index
    ///
    /// Every scenario runs the same horizon, so the three sequences have
    /// equal length.
    pub fn aligned(&self) -> Vec<AlignedPeriod> {
        let ScenarioValues { base, best, worst } = &self.outcomes;
        base.periods
            .iter()
            .zip(&best.periods)
            .zip(&worst.periods)
            .map(|((base, best), worst)| AlignedPeriod {
                period: base.period,
                revenue: ScenarioValues { base: base.revenue, best: best.revenue, worst: worst.revenue },
                net_income: ScenarioValues {
                    base: base.net_income,
                    best: best.net_income,
                    worst: worst.net_income,
                },
                closing_cash: ScenarioValues {
                    base: base.closing_cash,
                    best: best.closing_cash,
                    worst: worst.closing_cash,
                },
            })
            .collect()
    }

    /// Best minus worst final cash balance
    pub fn final_cash_spread(&self) -> f64 {
        self.outcomes.best.kpis.final_cash_balance - self.outcomes.worst.kpis.final_cash_balance
    }
}

/// Runs base, best and worst projections for one assumption set
///
/// # Example
/// ```ignore
/// let runner = ScenarioRunner::new();
/// let comparison = runner.compare(&assumptions, 36)?;
/// println!("{:?}", comparison.get(ScenarioKind::Worst).kpis.cash_runway_months);
/// ```
#[derive(Debug, Clone)]
pub struct ScenarioRunner {
    overrides: ScenarioOverrides,
    calendar: Option<Calendar>,
    parallel: bool,
}

impl ScenarioRunner {
    /// Runner with the default multipliers, running scenarios in parallel
    pub fn new() -> Self {
        Self::with_overrides(ScenarioOverrides::default())
    }

    pub fn with_overrides(overrides: ScenarioOverrides) -> Self {
        Self {
            overrides,
            calendar: None,
            parallel: true,
        }
    }

    pub fn with_calendar(mut self, calendar: Calendar) -> Self {
        self.calendar = Some(calendar);
        self
    }

    /// Run the three scenarios one after another on the calling thread
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    /// Project base, best and worst variants and summarize each
    pub fn compare(&self, assumptions: &AssumptionSet, horizon_months: u32) -> Result<ScenarioComparison> {
        self.overrides.check()?;

        let run = |kind| self.run_kind(assumptions, horizon_months, kind);
        let (base, (best, worst)) = if self.parallel {
            rayon::join(
                || run(ScenarioKind::Base),
                || rayon::join(|| run(ScenarioKind::Best), || run(ScenarioKind::Worst)),
            )
        } else {
            (run(ScenarioKind::Base), (run(ScenarioKind::Best), run(ScenarioKind::Worst)))
        };

        let comparison = ScenarioComparison {
            horizon_months,
            overrides: self.overrides,
            outcomes: ScenarioValues { base: base?, best: best?, worst: worst? },
        };

        let finals = comparison.outcomes.map(|o| o.kpis.final_cash_balance);
        info!(
            "compared {} months: final cash best {:.2}, base {:.2}, worst {:.2}",
            horizon_months, finals.best, finals.base, finals.worst
        );

        Ok(comparison)
    }

    /// Run a single named scenario
    pub fn run_kind(
        &self,
        assumptions: &AssumptionSet,
        horizon_months: u32,
        kind: ScenarioKind,
    ) -> Result<ScenarioOutcome> {
        match kind {
            ScenarioKind::Base => self.project(assumptions.clone(), horizon_months),
            _ => self.run_custom(assumptions, horizon_months, self.overrides.multipliers(kind)),
        }
    }

    /// Run one variant with an explicit multiplier pair
    pub fn run_custom(
        &self,
        assumptions: &AssumptionSet,
        horizon_months: u32,
        multipliers: ScenarioMultipliers,
    ) -> Result<ScenarioOutcome> {
        let derived = assumptions.scaled(&multipliers)?;
        self.project(derived, horizon_months)
    }

    fn project(&self, assumptions: AssumptionSet, horizon_months: u32) -> Result<ScenarioOutcome> {
        let config = ProjectionConfig {
            horizon_months,
            calendar: self.calendar,
        };
        let result = ProjectionEngine::new(config).project(&assumptions)?;
        let kpis = result.summary()?;
        Ok(ScenarioOutcome {
            assumptions,
            periods: result.into_periods(),
            kpis,
        })
    }
}

impl Default for ScenarioRunner {
    fn default() -> Self {
        Self::new()
    }
}

/// Compare base/best/worst with optional multiplier overrides
pub fn compare(
    assumptions: &AssumptionSet,
    horizon_months: u32,
    overrides: Option<ScenarioOverrides>,
) -> Result<ScenarioComparison> {
    ScenarioRunner::with_overrides(overrides.unwrap_or_default()).compare(assumptions, horizon_months)
}
