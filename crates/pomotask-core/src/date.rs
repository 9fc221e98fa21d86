//! Wall-clock date source used to pick the ledger's day bucket.

use chrono::{Local, NaiveDate};
use std::sync::{Mutex, PoisonError};

pub trait DateProvider: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Today's date in the local timezone.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemDate;

impl DateProvider for SystemDate {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// A date that only changes when told to.
#[derive(Debug)]
pub struct FixedDate(Mutex<NaiveDate>);

impl FixedDate {
    pub fn new(date: NaiveDate) -> Self {
        Self(Mutex::new(date))
    }

    pub fn set(&self, date: NaiveDate) {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) = date;
    }
}

impl DateProvider for FixedDate {
    fn today(&self) -> NaiveDate {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
