//! Per-task time accounting.
//!
//! A [`Ledger`] keeps a lifetime total and a per-day breakdown. The total
//! always equals the sum of the daily buckets: [`Ledger::record`] is the only
//! mutator and updates both in one call.

use chrono::NaiveDate;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    total_minutes: u64,
    history: BTreeMap<NaiveDate, u64>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `minutes` to the lifetime total and to `date`'s bucket.
    pub fn record(&mut self, date: NaiveDate, minutes: u32) {
        let minutes = u64::from(minutes);
        self.total_minutes += minutes;
        *self.history.entry(date).or_insert(0) += minutes;
    }

    pub fn total_minutes(&self) -> u64 {
        self.total_minutes
    }

    /// Minutes recorded on `date`, zero if nothing was recorded.
    pub fn minutes_on(&self, date: NaiveDate) -> u64 {
        self.history.get(&date).copied().unwrap_or(0)
    }

    /// Daily buckets in date order.
    pub fn days(&self) -> impl Iterator<Item = (NaiveDate, u64)> + '_ {
        self.history.iter().map(|(date, minutes)| (*date, *minutes))
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }
}
