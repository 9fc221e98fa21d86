//! Tasks: named units of work with their own phase durations and ledger.
//!
//! A [`Task`] is plain data. A [`TaskHandle`] shares one task between the
//! cycle controller (which writes to its ledger) and a shell (which reads
//! statistics or edits durations) behind a single lock, so every write lands
//! as one atomic update.

mod ledger;

pub use ledger::Ledger;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::ValidationError;

pub const DEFAULT_WORK_MINUTES: u32 = 25;
pub const DEFAULT_SHORT_BREAK_MINUTES: u32 = 5;
pub const DEFAULT_LONG_BREAK_MINUTES: u32 = 15;

/// Work, short-break and long-break lengths in minutes. All at least one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Durations {
    pub work: u32,
    pub short_break: u32,
    pub long_break: u32,
}

impl Durations {
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidDuration`] if any duration is zero.
    pub fn new(work: u32, short_break: u32, long_break: u32) -> Result<Self, ValidationError> {
        let durations = Self {
            work,
            short_break,
            long_break,
        };
        durations.validate()?;
        Ok(durations)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        for (field, value) in [
            ("work", self.work),
            ("short_break", self.short_break),
            ("long_break", self.long_break),
        ] {
            if value == 0 {
                return Err(ValidationError::InvalidDuration { field, value });
            }
        }
        Ok(())
    }
}

impl Default for Durations {
    fn default() -> Self {
        Self {
            work: DEFAULT_WORK_MINUTES,
            short_break: DEFAULT_SHORT_BREAK_MINUTES,
            long_break: DEFAULT_LONG_BREAK_MINUTES,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    name: String,
    durations: Durations,
    ledger: Ledger,
}

impl Task {
    /// Create a task with the default 25/5/15 durations.
    pub fn new(name: impl Into<String>) -> Result<Self, ValidationError> {
        Self::with_durations(name, Durations::default())
    }

    pub fn with_durations(
        name: impl Into<String>,
        durations: Durations,
    ) -> Result<Self, ValidationError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        durations.validate()?;
        Ok(Self {
            name,
            durations,
            ledger: Ledger::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn durations(&self) -> Durations {
        self.durations
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn total_minutes(&self) -> u64 {
        self.ledger.total_minutes()
    }

    pub fn minutes_on(&self, date: NaiveDate) -> u64 {
        self.ledger.minutes_on(date)
    }

    pub fn record_time(&mut self, date: NaiveDate, minutes_completed: u32) {
        self.ledger.record(date, minutes_completed);
    }

    /// Replace all three durations at once.
    pub fn set_durations(&mut self, durations: Durations) -> Result<(), ValidationError> {
        durations.validate()?;
        self.durations = durations;
        Ok(())
    }
}

/// Shared, lockable handle to a [`Task`].
#[derive(Debug, Clone)]
pub struct TaskHandle(Arc<RwLock<Task>>);

impl TaskHandle {
    pub fn new(task: Task) -> Self {
        Self(Arc::new(RwLock::new(task)))
    }

    fn read(&self) -> RwLockReadGuard<'_, Task> {
        self.0.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Task> {
        self.0.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` against a consistent view of the task.
    pub fn with<R>(&self, f: impl FnOnce(&Task) -> R) -> R {
        f(&self.read())
    }

    /// Owned copy of the task as it is right now.
    pub fn snapshot(&self) -> Task {
        self.read().clone()
    }

    pub fn name(&self) -> String {
        self.read().name.clone()
    }

    pub fn durations(&self) -> Durations {
        self.read().durations
    }

    pub fn total_minutes(&self) -> u64 {
        self.read().total_minutes()
    }

    pub fn minutes_on(&self, date: NaiveDate) -> u64 {
        self.read().minutes_on(date)
    }

    pub fn record_time(&self, date: NaiveDate, minutes_completed: u32) {
        self.write().record_time(date, minutes_completed);
    }

    pub fn set_durations(&self, durations: Durations) -> Result<(), ValidationError> {
        self.write().set_durations(durations)
    }

    /// Whether both handles point at the same task.
    pub fn same_task(&self, other: &TaskHandle) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl From<Task> for TaskHandle {
    fn from(task: Task) -> Self {
        Self::new(task)
    }
}
