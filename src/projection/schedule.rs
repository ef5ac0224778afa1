//! Pre-sorted event schedules advanced one period at a time
//!
//! Each schedule sorts its events once and keeps a cursor, so a run never
//! rescans events that have already landed. Capex stays in an active set
//! until its useful life elapses; debt tranches stay active for the rest of
//! the run.

use crate::assumptions::{CapexEvent, DebtEvent, EquityEvent};

trait Scheduled {
    fn period_index(&self) -> u32;
}

impl Scheduled for EquityEvent {
    fn period_index(&self) -> u32 {
        self.period_index
    }
}

impl Scheduled for DebtEvent {
    fn period_index(&self) -> u32 {
        self.period_index
    }
}

impl Scheduled for CapexEvent {
    fn period_index(&self) -> u32 {
        self.period_index
    }
}

/// Events ordered by period; input order is kept within a period
#[derive(Debug, Clone)]
struct Cursor<T> {
    events: Vec<T>,
    next: usize,
}

impl<T: Scheduled> Cursor<T> {
    fn new(mut events: Vec<T>) -> Self {
        events.sort_by_key(|e| e.period_index());
        Self { events, next: 0 }
    }

    /// Events scheduled on or before `period` not yet handed out
    fn take_due(&mut self, period: u32) -> &[T] {
        let start = self.next;
        while self.next < self.events.len() && self.events[self.next].period_index() <= period {
            self.next += 1;
        }
        &self.events[start..self.next]
    }
}

/// Equity raises
#[derive(Debug, Clone)]
pub struct EquitySchedule {
    cursor: Cursor<EquityEvent>,
    raised_to_date: f64,
}

impl EquitySchedule {
    pub fn new(events: &[EquityEvent]) -> Self {
        Self {
            cursor: Cursor::new(events.to_vec()),
            raised_to_date: 0.0,
        }
    }

    /// Amount raised in `period`
    pub fn draw(&mut self, period: u32) -> f64 {
        let raised: f64 = self.cursor.take_due(period).iter().map(|e| e.amount).sum();
        self.raised_to_date += raised;
        raised
    }

    pub fn raised_to_date(&self) -> f64 {
        self.raised_to_date
    }
}

/// Outstanding debt tranches
#[derive(Debug, Clone)]
pub struct DebtBook {
    cursor: Cursor<DebtEvent>,
    outstanding: Vec<DebtEvent>,
}

impl DebtBook {
    pub fn new(events: &[DebtEvent]) -> Self {
        Self {
            cursor: Cursor::new(events.to_vec()),
            outstanding: Vec::new(),
        }
    }

    /// Principal drawn in `period`; the tranches join the outstanding book
    pub fn draw(&mut self, period: u32) -> f64 {
        let due = self.cursor.take_due(period);
        let drawn = due.iter().map(|e| e.amount).sum();
        self.outstanding.extend_from_slice(due);
        drawn
    }

    /// Monthly interest across every outstanding tranche
    pub fn monthly_interest(&self) -> f64 {
        self.outstanding.iter().map(DebtEvent::monthly_interest).sum()
    }

    pub fn balance(&self) -> f64 {
        self.outstanding.iter().map(|e| e.amount).sum()
    }
}

/// Capital expenditure and its straight-line depreciation
#[derive(Debug, Clone)]
pub struct CapexBook {
    cursor: Cursor<CapexEvent>,
    active: Vec<CapexEvent>,
}

impl CapexBook {
    pub fn new(events: &[CapexEvent]) -> Self {
        Self {
            cursor: Cursor::new(events.to_vec()),
            active: Vec::new(),
        }
    }

    /// Cash spent on capex in `period`; also retires fully depreciated assets
    pub fn spend(&mut self, period: u32) -> f64 {
        self.active.retain(|e| (period as u64) < e.expiry_period());

        let due = self.cursor.take_due(period);
        let spent = due.iter().map(|e| e.amount).sum();
        self.active.extend(
            due.iter()
                .filter(|e| (period as u64) < e.expiry_period())
                .cloned(),
        );
        spent
    }

    /// Depreciation for the period last passed to [`spend`](Self::spend)
    pub fn depreciation(&self) -> f64 {
        self.active.iter().map(CapexEvent::monthly_depreciation).sum()
    }

    pub fn active_assets(&self) -> usize {
        self.active.len()
    }
}
