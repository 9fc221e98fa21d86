use serde::{Deserialize, Serialize};
use std::fmt;

use crate::task::Durations;

/// One phase of the work/break cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Work,
    ShortBreak,
    LongBreak,
}

impl Phase {
    pub fn label(self) -> &'static str {
        match self {
            Phase::Work => "Work",
            Phase::ShortBreak => "Short Break",
            Phase::LongBreak => "Long Break",
        }
    }

    pub fn is_work(self) -> bool {
        self == Phase::Work
    }

    /// Minutes this phase lasts under `durations`.
    pub fn minutes(self, durations: &Durations) -> u32 {
        match self {
            Phase::Work => durations.work,
            Phase::ShortBreak => durations.short_break,
            Phase::LongBreak => durations.long_break,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
