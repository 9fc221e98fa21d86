//! Single-slot tick notifications.
//!
//! A [`Clock`](super::Clock) carries at most one observer. Any type with a
//! matching callback qualifies, closures included.

use serde::{Deserialize, Serialize};

/// Immutable record pushed to the observer on attach and on every tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickEvent {
    /// Remaining time formatted as `M:SS`.
    pub clock: String,
    /// Ticks elapsed since the clock was created.
    pub seconds_elapsed: u64,
    pub complete: bool,
}

pub trait ClockObserver: Send + Sync {
    fn on_tick(&self, event: &TickEvent);
}

impl<F> ClockObserver for F
where
    F: Fn(&TickEvent) + Send + Sync,
{
    fn on_tick(&self, event: &TickEvent) {
        self(event)
    }
}

/// Format a clock face: minutes unpadded, seconds zero-padded.
pub fn format_clock(minutes: u32, seconds: u32) -> String {
    format!("{minutes}:{seconds:02}")
}
