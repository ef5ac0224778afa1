//! Optional calendar labelling for projection periods

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

/// Fiscal years start in August unless configured otherwise
pub const DEFAULT_FISCAL_YEAR_START_MONTH: u32 = 8;

/// Maps period indices onto calendar months
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Calendar {
    /// First day of period 0
    pub start: NaiveDate,

    /// Month (1-12) in which a fiscal year begins
    pub fiscal_year_start_month: u32,
}

/// Calendar bounds of one period
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodDates {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub fiscal_year: i32,
}

impl Calendar {
    /// Calendar starting at the first of `start`'s month
    pub fn starting(start: NaiveDate) -> Self {
        Self {
            start: start.with_day(1).unwrap_or(start),
            fiscal_year_start_month: DEFAULT_FISCAL_YEAR_START_MONTH,
        }
    }

    pub fn with_fiscal_year_start(mut self, month: u32) -> Self {
        self.fiscal_year_start_month = month;
        self
    }

    pub fn check(&self) -> Result<()> {
        if !(1..=12).contains(&self.fiscal_year_start_month) {
            return Err(ModelError::invalid_input(format!(
                "fiscal year start month must be 1-12, got {}",
                self.fiscal_year_start_month
            )));
        }
        Ok(())
    }

    /// Dates for period `index`; `None` when the date overflows chrono's range
    pub fn period(&self, index: u32) -> Option<PeriodDates> {
        let first = self.start.with_day(1)?;
        let start = first.checked_add_months(Months::new(index))?;
        let end = start.checked_add_months(Months::new(1))?.pred_opt()?;
        Some(PeriodDates {
            start,
            end,
            fiscal_year: self.fiscal_year(start),
        })
    }

    /// Fiscal year label: the calendar year in which the fiscal year began
    pub fn fiscal_year(&self, date: NaiveDate) -> i32 {
        if date.month() >= self.fiscal_year_start_month {
            date.year()
        } else {
            date.year() - 1
        }
    }
}
