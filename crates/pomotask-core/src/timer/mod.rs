mod clock;
mod cycle;
mod observer;
mod phase;

pub use clock::{Clock, ClockReading, TICK_INTERVAL};
pub use cycle::{
    next_phase, CycleController, CycleState, PhaseListener, PhaseOutcome, PhaseReport,
    RunOutcome, DEFAULT_LONG_BREAK_AFTER,
};
pub use observer::{format_clock, ClockObserver, TickEvent};
pub use phase::Phase;
