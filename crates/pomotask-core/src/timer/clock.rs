//! Resumable countdown clock.
//!
//! A [`Clock`] counts down from a whole number of minutes, one tick per
//! elapsed second. Ticks come from one of two places:
//!
//! - **Real-clock mode**: [`Clock::start`] spawns a one-second ticker on the
//!   current tokio runtime. [`Clock::pause`] stops it.
//! - **Deterministic mode**: callers invoke [`Clock::tick`] and
//!   [`Clock::fast_forward`] directly, no timer involved.
//!
//! ## Tick rule
//!
//! ```text
//! elapsed += 1
//! if seconds >= 1 { seconds -= 1; complete when seconds == 0 && minutes == 0 }
//! else if minutes > 0 { minutes -= 1; seconds = 59 }
//! else { complete }
//! ```
//!
//! A new clock starts at `duration:00`, so the first tick rolls over to
//! `duration-1:59`. Completion is detected exactly once.
//!
//! ## Waiting
//!
//! [`Clock::wait`] suspends until the clock completes or is cancelled. The
//! gate is released after the terminal flag is stored, so a released waiter
//! always observes the terminal state.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};

use super::observer::{format_clock, ClockObserver, TickEvent};
use crate::error::ValidationError;

/// Real-clock tick period.
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Point-in-time copy of a clock's counters and flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClockReading {
    pub duration_minutes: u32,
    pub minutes_remaining: u32,
    pub seconds_remaining: u32,
    pub seconds_elapsed: u64,
    pub running: bool,
    pub complete: bool,
    pub cancelled: bool,
}

struct ClockState {
    duration_minutes: u32,
    minutes_remaining: u32,
    seconds_remaining: u32,
    seconds_elapsed: u64,
    running: bool,
    complete: bool,
    cancelled: bool,
    observer: Option<Arc<dyn ClockObserver>>,
    ticker: Option<JoinHandle<()>>,
    /// Bumped by every `start`. A ticker only advances the clock while its
    /// id is current and the clock is running.
    ticker_id: u64,
}

impl ClockState {
    fn tick_event(&self) -> TickEvent {
        TickEvent {
            clock: format_clock(self.minutes_remaining, self.seconds_remaining),
            seconds_elapsed: self.seconds_elapsed,
            complete: self.complete,
        }
    }

    fn is_finished(&self) -> bool {
        self.complete || self.cancelled
    }
}

struct Shared {
    state: Mutex<ClockState>,
    gate: watch::Sender<bool>,
}

/// Countdown clock backing one phase of the work/break cycle.
///
/// Cloning yields another handle to the same clock, so a shell can pause or
/// cancel it from a different task than the one awaiting it.
#[derive(Clone)]
pub struct Clock {
    shared: Arc<Shared>,
}

impl Clock {
    /// Create an idle clock for `duration_minutes`.
    pub fn new(duration_minutes: u32) -> Self {
        let (gate, _) = watch::channel(false);
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(ClockState {
                    duration_minutes,
                    minutes_remaining: duration_minutes,
                    seconds_remaining: 0,
                    seconds_elapsed: 0,
                    running: false,
                    complete: false,
                    cancelled: false,
                    observer: None,
                    ticker: None,
                    ticker_id: 0,
                }),
                gate,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ClockState> {
        self.shared
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn duration_minutes(&self) -> u32 {
        self.lock().duration_minutes
    }

    pub fn minutes_remaining(&self) -> u32 {
        self.lock().minutes_remaining
    }

    pub fn seconds_remaining(&self) -> u32 {
        self.lock().seconds_remaining
    }

    pub fn seconds_elapsed(&self) -> u64 {
        self.lock().seconds_elapsed
    }

    pub fn is_running(&self) -> bool {
        self.lock().running
    }

    pub fn is_complete(&self) -> bool {
        self.lock().complete
    }

    pub fn is_cancelled(&self) -> bool {
        self.lock().cancelled
    }

    /// True once the clock has completed or been cancelled.
    pub fn is_finished(&self) -> bool {
        self.lock().is_finished()
    }

    pub fn reading(&self) -> ClockReading {
        let st = self.lock();
        ClockReading {
            duration_minutes: st.duration_minutes,
            minutes_remaining: st.minutes_remaining,
            seconds_remaining: st.seconds_remaining,
            seconds_elapsed: st.seconds_elapsed,
            running: st.running,
            complete: st.complete,
            cancelled: st.cancelled,
        }
    }

    /// Current clock face as a tick event, without ticking.
    pub fn snapshot(&self) -> TickEvent {
        self.lock().tick_event()
    }

    /// Whole minutes completed so far. An in-progress minute is not counted.
    pub fn completed_minutes(&self) -> u32 {
        let st = self.lock();
        let partial = u32::from(st.seconds_remaining > 0);
        st.duration_minutes
            .saturating_sub(st.minutes_remaining)
            .saturating_sub(partial)
    }

    // ── Observer slot ────────────────────────────────────────────────

    /// Attach `observer`, replacing any previous one. The observer receives a
    /// snapshot of the current state immediately.
    pub fn attach(&self, observer: Arc<dyn ClockObserver>) {
        let event = {
            let mut st = self.lock();
            st.observer = Some(Arc::clone(&observer));
            st.tick_event()
        };
        observer.on_tick(&event);
    }

    /// Remove the observer. The clock keeps ticking silently.
    pub fn detach(&self) {
        self.lock().observer = None;
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin ticking once per second. No-op if already running or finished.
    ///
    /// Outside a tokio runtime the clock is marked running but ticks must be
    /// driven through [`Clock::tick`].
    pub fn start(&self) {
        let mut st = self.lock();
        if st.running || st.is_finished() {
            return;
        }
        st.running = true;
        st.ticker_id += 1;
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let weak = Arc::downgrade(&self.shared);
                st.ticker = Some(handle.spawn(drive(weak, st.ticker_id)));
            }
            Err(_) => {
                tracing::debug!("no tokio runtime; clock ticks must be driven manually");
            }
        }
    }

    /// Stop ticking, keeping remaining and elapsed time as they are.
    pub fn pause(&self) {
        let ticker = {
            let mut st = self.lock();
            st.running = false;
            st.ticker.take()
        };
        if let Some(ticker) = ticker {
            ticker.abort();
        }
    }

    /// Stop ticking and mark the clock cancelled, then release waiters.
    ///
    /// A completed clock stays complete. Waiters are released regardless.
    pub fn cancel(&self) {
        let ticker = {
            let mut st = self.lock();
            st.running = false;
            if !st.complete {
                st.cancelled = true;
            }
            st.ticker.take()
        };
        if let Some(ticker) = ticker {
            ticker.abort();
        }
        self.shared.gate.send_replace(true);
    }

    /// Advance the clock by one second. Returns the event pushed to the
    /// observer, or `None` if the clock had already finished.
    pub fn tick(&self) -> Option<TickEvent> {
        self.advance(None)
    }

    /// Tick on behalf of ticker `ticker_id`. Does nothing once the clock is
    /// paused or a newer ticker has taken over, checked under the same lock
    /// that applies the tick.
    fn tick_from(&self, ticker_id: u64) -> Option<TickEvent> {
        self.advance(Some(ticker_id))
    }

    fn advance(&self, ticker_id: Option<u64>) -> Option<TickEvent> {
        let (event, observer, completed) = {
            let mut st = self.lock();
            if st.is_finished() {
                return None;
            }
            if ticker_id.is_some_and(|id| !st.running || id != st.ticker_id) {
                return None;
            }
            st.seconds_elapsed += 1;
            let mut completed = false;
            if st.seconds_remaining >= 1 {
                st.seconds_remaining -= 1;
                completed = st.seconds_remaining == 0 && st.minutes_remaining == 0;
            } else if st.minutes_remaining > 0 {
                st.minutes_remaining -= 1;
                st.seconds_remaining = 59;
            } else {
                completed = true;
            }
            if completed {
                st.complete = true;
                st.running = false;
                // The ticker exits on its own once it sees the clock stopped.
                st.ticker = None;
            }
            (st.tick_event(), st.observer.clone(), completed)
        };
        tracing::debug!(clock = %event.clock, elapsed = event.seconds_elapsed, "tick");
        if completed {
            self.shared.gate.send_replace(true);
        }
        if let Some(observer) = observer {
            observer.on_tick(&event);
        }
        Some(event)
    }

    /// Remove time without waiting for it to elapse.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::FastForwardExceedsRemaining`] if either
    /// amount exceeds the corresponding remaining counter.
    pub fn fast_forward(&self, minutes: u32, seconds: u32) -> Result<(), ValidationError> {
        let mut st = self.lock();
        if minutes > st.minutes_remaining || seconds > st.seconds_remaining {
            tracing::warn!(minutes, seconds, "fast-forward exceeds remaining time");
            return Err(ValidationError::FastForwardExceedsRemaining {
                minutes,
                seconds,
                minutes_remaining: st.minutes_remaining,
                seconds_remaining: st.seconds_remaining,
            });
        }
        st.minutes_remaining -= minutes;
        st.seconds_remaining -= seconds;
        Ok(())
    }

    /// Suspend until the clock completes or is cancelled.
    ///
    /// Pausing and resuming do not affect a pending wait.
    pub async fn wait(&self) {
        let mut rx = self.shared.gate.subscribe();
        // The sender lives as long as `self`, so this cannot fail.
        let _ = rx.wait_for(|released| *released).await;
    }

    /// Whether the wait gate has been released.
    pub fn is_released(&self) -> bool {
        *self.shared.gate.borrow()
    }
}

impl fmt::Debug for Clock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Clock").field("reading", &self.reading()).finish()
    }
}

/// Ticker task body. Holds only a weak handle so a dropped clock stops it.
async fn drive(shared: Weak<Shared>, ticker_id: u64) {
    let mut interval = time::interval_at(Instant::now() + TICK_INTERVAL, TICK_INTERVAL);
    loop {
        interval.tick().await;
        let Some(shared) = shared.upgrade() else {
            break;
        };
        let clock = Clock { shared };
        match clock.tick_from(ticker_id) {
            Some(event) if !event.complete => {}
            _ => break,
        }
    }
}
