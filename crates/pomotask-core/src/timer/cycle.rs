//! Work/break cycle controller.
//!
//! Sequences one [`Clock`] per phase and writes completed work time to the
//! selected task's ledger.
//!
//! ## Transitions
//!
//! ```text
//! Work       --complete--> LongBreak   (c + 1 >= long_break_after, c = 0)
//! Work       --complete--> ShortBreak  (otherwise, c += 1)
//! ShortBreak --complete--> Work        (c unchanged)
//! LongBreak  --complete--> Work        (c = 0)
//! any        --cancel----> Work        (c = 0, run loop stops)
//! ```
//!
//! Only a finished Work phase writes to the ledger, whether it completed or
//! was cancelled. Selecting a task or shutting down discards the active
//! session without touching the ledger.

use chrono::Utc;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::clock::Clock;
use super::observer::ClockObserver;
use super::phase::Phase;
use crate::date::DateProvider;
use crate::error::{CoreError, Result, ValidationError};
use crate::events::{Event, EventSink};
use crate::task::TaskHandle;

/// Work phases completed before a long break, unless configured otherwise.
pub const DEFAULT_LONG_BREAK_AFTER: u32 = 3;

/// Next phase and work counter after `phase` completes normally.
pub fn next_phase(phase: Phase, completed_work: u32, long_break_after: u32) -> (Phase, u32) {
    match phase {
        Phase::Work if completed_work + 1 >= long_break_after => (Phase::LongBreak, 0),
        Phase::Work => (Phase::ShortBreak, completed_work + 1),
        Phase::ShortBreak => (Phase::Work, completed_work),
        Phase::LongBreak => (Phase::Work, 0),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CycleState {
    pub phase: Phase,
    pub completed_work_phases: u32,
}

impl Default for CycleState {
    fn default() -> Self {
        Self {
            phase: Phase::Work,
            completed_work_phases: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PhaseOutcome {
    Completed,
    Cancelled,
}

/// What happened when a phase was settled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhaseReport {
    pub task: String,
    pub phase: Phase,
    pub outcome: PhaseOutcome,
    /// Minutes written to the ledger. `None` for break phases.
    pub recorded_minutes: Option<u32>,
    pub next: CycleState,
}

impl PhaseReport {
    /// Summary line for a shell to show after the phase.
    pub fn message(&self) -> String {
        let verb = match self.outcome {
            PhaseOutcome::Completed => "complete!",
            PhaseOutcome::Cancelled => "cancelled.",
        };
        match self.recorded_minutes {
            Some(minutes) => format!(
                "{} timer {verb} {minutes} minutes will be recorded.",
                self.phase
            ),
            None => format!("{} timer {verb}", self.phase),
        }
    }
}

/// Why [`CycleController::run`] returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// A phase was cancelled; the cycle is back at `{Work, 0}`.
    Cancelled(PhaseReport),
    /// The session was discarded by `select_task` or `shutdown`.
    Discarded,
}

/// Receives phase-level notifications from the controller.
pub trait PhaseListener: Send + Sync {
    fn on_phase_started(&self, _phase: Phase, _clock: &Clock) {}
    fn on_phase_finished(&self, _report: &PhaseReport) {}
    fn on_phase_changed(&self, _from: Phase, _to: Phase) {}
}

struct Cycle {
    task: Option<TaskHandle>,
    state: CycleState,
    session: Option<Clock>,
    /// Bumped whenever the active session is discarded.
    generation: u64,
    /// A cancel arrived with no running session to stop. The next session
    /// is cancelled as soon as it begins.
    cancel_pending: bool,
}

impl Cycle {
    fn discard(&mut self) {
        self.state = CycleState::default();
        self.generation += 1;
        self.cancel_pending = false;
        if let Some(clock) = self.session.take() {
            clock.detach();
            clock.cancel();
        }
    }
}

/// Drives the work/break state machine for one task at a time.
///
/// Cloning yields another handle to the same controller, so one task can
/// `run()` the cycle while another pauses or cancels it.
#[derive(Clone)]
pub struct CycleController {
    cycle: Arc<Mutex<Cycle>>,
    dates: Arc<dyn DateProvider>,
    sink: Arc<dyn EventSink>,
    long_break_after: u32,
    observer: Option<Arc<dyn ClockObserver>>,
    listener: Option<Arc<dyn PhaseListener>>,
}

impl CycleController {
    pub fn new(dates: Arc<dyn DateProvider>, sink: Arc<dyn EventSink>) -> Self {
        Self {
            cycle: Arc::new(Mutex::new(Cycle {
                task: None,
                state: CycleState::default(),
                session: None,
                generation: 0,
                cancel_pending: false,
            })),
            dates,
            sink,
            long_break_after: DEFAULT_LONG_BREAK_AFTER,
            observer: None,
            listener: None,
        }
    }

    /// Number of work phases completed before a long break.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidValue`] if `n` is zero.
    pub fn with_long_break_after(mut self, n: u32) -> Result<Self, ValidationError> {
        if n == 0 {
            return Err(ValidationError::InvalidValue {
                field: "long_break_after".into(),
                message: "must be at least 1".into(),
            });
        }
        self.long_break_after = n;
        Ok(self)
    }

    /// Observer attached to every session the controller creates.
    pub fn with_observer(mut self, observer: Arc<dyn ClockObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn with_phase_listener(mut self, listener: Arc<dyn PhaseListener>) -> Self {
        self.listener = Some(listener);
        self
    }

    fn lock(&self) -> MutexGuard<'_, Cycle> {
        self.cycle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn task(&self) -> Option<TaskHandle> {
        self.lock().task.clone()
    }

    pub fn state(&self) -> CycleState {
        self.lock().state
    }

    pub fn phase(&self) -> Phase {
        self.lock().state.phase
    }

    pub fn completed_work_phases(&self) -> u32 {
        self.lock().state.completed_work_phases
    }

    pub fn long_break_after(&self) -> u32 {
        self.long_break_after
    }

    /// The session backing the current phase, if one has begun.
    pub fn session(&self) -> Option<Clock> {
        self.lock().session.clone()
    }

    /// `(minutes, seconds)` left in the current session.
    pub fn remaining(&self) -> Option<(u32, u32)> {
        self.session()
            .map(|clock| (clock.minutes_remaining(), clock.seconds_remaining()))
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Make `task` the subject of the cycle. Resets to `{Work, 0}` and drops
    /// any active session without recording it.
    pub fn select_task(&self, task: TaskHandle) {
        let mut cycle = self.lock();
        cycle.discard();
        tracing::debug!(task = %task.name(), "task selected");
        cycle.task = Some(task);
    }

    /// Reset to `{Work, 0}`, drop the active session and deselect the task.
    pub fn shutdown(&self) {
        let mut cycle = self.lock();
        cycle.discard();
        cycle.task = None;
    }

    /// Create the session for the current phase, sized from the task's
    /// durations as they are now. The clock is not started.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NoTaskSelected`] without a task, and
    /// [`CoreError::PhaseState`] while the previous session is unsettled.
    pub fn begin_phase(&self) -> Result<Clock> {
        self.begin().map(|(clock, _)| clock)
    }

    fn begin(&self) -> Result<(Clock, u64)> {
        let (clock, generation, task_name, phase) = {
            let mut cycle = self.lock();
            let task = cycle.task.clone().ok_or(CoreError::NoTaskSelected)?;
            if cycle.session.is_some() {
                tracing::warn!("begin_phase while previous phase is unsettled");
                return Err(CoreError::PhaseState("previous phase has not been settled"));
            }
            let phase = cycle.state.phase;
            let minutes = phase.minutes(&task.durations());
            let clock = Clock::new(minutes);
            if std::mem::take(&mut cycle.cancel_pending) {
                tracing::debug!(%phase, "applying pending cancel");
                clock.cancel();
            }
            cycle.session = Some(clock.clone());
            (clock, cycle.generation, task.name(), phase)
        };

        tracing::debug!(task = %task_name, %phase, minutes = clock.duration_minutes(), "phase started");
        self.sink.record(Event::PhaseStarted {
            task: task_name,
            phase,
            duration_minutes: clock.duration_minutes(),
            at: Utc::now(),
        });
        if let Some(observer) = &self.observer {
            clock.attach(Arc::clone(observer));
        }
        if let Some(listener) = &self.listener {
            listener.on_phase_started(phase, &clock);
        }
        Ok((clock, generation))
    }

    /// Settle the finished session: record work time, then advance on
    /// completion or reset on cancellation.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::PhaseState`] if there is no session or it is
    /// still running.
    pub fn finish_phase(&self) -> Result<PhaseReport> {
        self.finish(None)?
            .ok_or(CoreError::PhaseState("session was discarded"))
    }

    fn finish(&self, expected_generation: Option<u64>) -> Result<Option<PhaseReport>> {
        // Settle the cycle under the lock; ledger and sink writes happen after
        // it is released.
        let (task, clock, from, outcome, next) = {
            let mut cycle = self.lock();
            if expected_generation.is_some_and(|g| g != cycle.generation) {
                return Ok(None);
            }
            let clock = match &cycle.session {
                Some(clock) if clock.is_finished() => clock.clone(),
                Some(_) => return Err(CoreError::PhaseState("phase is still running")),
                None => return Err(CoreError::PhaseState("no phase has begun")),
            };
            let task = cycle.task.clone().ok_or(CoreError::NoTaskSelected)?;
            cycle.session = None;

            let from = cycle.state.phase;
            let outcome = if clock.is_complete() {
                let (phase, completed) = next_phase(
                    from,
                    cycle.state.completed_work_phases,
                    self.long_break_after,
                );
                cycle.state = CycleState {
                    phase,
                    completed_work_phases: completed,
                };
                PhaseOutcome::Completed
            } else {
                cycle.state = CycleState::default();
                PhaseOutcome::Cancelled
            };
            (task, clock, from, outcome, cycle.state)
        };

        let task_name = task.name();
        let minutes = clock.completed_minutes();
        let recorded_minutes = if from.is_work() {
            let date = self.dates.today();
            task.record_time(date, minutes);
            tracing::info!(task = %task_name, %date, minutes, "recorded work time");
            self.sink.record(Event::TimeRecorded {
                task: task_name.clone(),
                date,
                minutes,
                at: Utc::now(),
            });
            Some(minutes)
        } else {
            None
        };

        self.sink.record(match outcome {
            PhaseOutcome::Completed => Event::PhaseCompleted {
                task: task_name.clone(),
                phase: from,
                at: Utc::now(),
            },
            PhaseOutcome::Cancelled => Event::PhaseCancelled {
                task: task_name.clone(),
                phase: from,
                completed_minutes: minutes,
                at: Utc::now(),
            },
        });

        let report = PhaseReport {
            task: task_name,
            phase: from,
            outcome,
            recorded_minutes,
            next,
        };

        let to = report.next.phase;
        if from != to {
            tracing::info!(%from, %to, completed_work_phases = report.next.completed_work_phases, "phase changed");
            self.sink.record(Event::PhaseChanged {
                from,
                to,
                completed_work_phases: report.next.completed_work_phases,
                at: Utc::now(),
            });
        }
        if let Some(listener) = &self.listener {
            listener.on_phase_finished(&report);
            if from != to {
                listener.on_phase_changed(from, to);
            }
        }
        Ok(Some(report))
    }

    /// Run phases back to back in real time until one is cancelled or the
    /// session is discarded.
    ///
    /// # Errors
    ///
    /// Fails if no task is selected or a previous phase is still unsettled.
    pub async fn run(&self) -> Result<RunOutcome> {
        loop {
            let (clock, generation) = self.begin()?;
            clock.start();
            clock.wait().await;
            match self.finish(Some(generation))? {
                None => return Ok(RunOutcome::Discarded),
                Some(report) if report.outcome == PhaseOutcome::Cancelled => {
                    return Ok(RunOutcome::Cancelled(report));
                }
                Some(_) => {}
            }
        }
    }

    /// Pause the active session, if any.
    pub fn pause(&self) {
        if let Some(clock) = self.session() {
            clock.pause();
        }
    }

    /// Resume the active session, if any.
    pub fn resume(&self) {
        if let Some(clock) = self.session() {
            clock.start();
        }
    }

    /// Toggle the active session between running and paused. Returns whether
    /// it is running afterwards.
    pub fn toggle_pause(&self) -> bool {
        match self.session() {
            Some(clock) if clock.is_running() => {
                clock.pause();
                false
            }
            Some(clock) => {
                clock.start();
                clock.is_running()
            }
            None => false,
        }
    }

    /// Cancel the active session. The run loop records partial work time
    /// and stops.
    ///
    /// If no session is running (before `run` begins its first phase, or
    /// between two phases) the cancel is held and applied to the next
    /// session as soon as it begins. A session that has already completed
    /// but is not yet settled counts as not running.
    pub fn cancel(&self) {
        let mut cycle = self.lock();
        let stopped = match &cycle.session {
            Some(clock) => {
                clock.cancel();
                clock.is_cancelled()
            }
            None => false,
        };
        if !stopped {
            tracing::debug!("no running session; cancel held for the next phase");
            cycle.cancel_pending = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::date::FixedDate;
    use crate::events::EventLog;
    use crate::task::{Durations, Task};
    use chrono::NaiveDate;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 6).unwrap()
    }

    fn controller() -> (CycleController, TaskHandle, Arc<EventLog>) {
        let log = Arc::new(EventLog::new());
        let controller = CycleController::new(Arc::new(FixedDate::new(today())), log.clone());
        let task = TaskHandle::new(
            Task::with_durations("Study", Durations::new(3, 1, 2).unwrap()).unwrap(),
        );
        controller.select_task(task.clone());
        (controller, task, log)
    }

    fn complete(clock: &Clock) {
        while clock.tick().is_some() {}
    }

    #[test]
    fn next_phase_table() {
        assert_eq!(next_phase(Phase::Work, 0, 3), (Phase::ShortBreak, 1));
        assert_eq!(next_phase(Phase::Work, 1, 3), (Phase::ShortBreak, 2));
        assert_eq!(next_phase(Phase::Work, 2, 3), (Phase::LongBreak, 0));
        assert_eq!(next_phase(Phase::ShortBreak, 2, 3), (Phase::Work, 2));
        assert_eq!(next_phase(Phase::LongBreak, 0, 3), (Phase::Work, 0));
        assert_eq!(next_phase(Phase::Work, 0, 1), (Phase::LongBreak, 0));
    }

    #[test]
    fn begin_phase_requires_task() {
        let controller =
            CycleController::new(Arc::new(FixedDate::new(today())), Arc::new(EventLog::new()));
        assert!(matches!(
            controller.begin_phase(),
            Err(CoreError::NoTaskSelected)
        ));
    }

    #[test]
    fn session_sized_from_phase() {
        let (controller, _, _) = controller();
        let clock = controller.begin_phase().unwrap();
        assert_eq!(clock.duration_minutes(), 3);
        assert_eq!(controller.remaining(), Some((3, 0)));
        assert!(matches!(
            controller.begin_phase(),
            Err(CoreError::PhaseState(_))
        ));
        assert!(matches!(
            controller.finish_phase(),
            Err(CoreError::PhaseState(_))
        ));
    }

    #[test]
    fn work_completion_records_and_advances() {
        let (controller, task, log) = controller();
        let clock = controller.begin_phase().unwrap();
        complete(&clock);
        let report = controller.finish_phase().unwrap();
        assert_eq!(report.outcome, PhaseOutcome::Completed);
        assert_eq!(report.recorded_minutes, Some(3));
        assert_eq!(report.message(), "Work timer complete! 3 minutes will be recorded.");
        assert_eq!(
            controller.state(),
            CycleState {
                phase: Phase::ShortBreak,
                completed_work_phases: 1
            }
        );
        assert_eq!(task.minutes_on(today()), 3);
        assert!(controller.session().is_none());
        assert!(log
            .events()
            .iter()
            .any(|e| matches!(e, Event::PhaseChanged { from: Phase::Work, to: Phase::ShortBreak, .. })));
    }

    #[test]
    fn break_completion_does_not_record() {
        let (controller, task, _) = controller();
        complete(&controller.begin_phase().unwrap());
        controller.finish_phase().unwrap();

        let clock = controller.begin_phase().unwrap();
        assert_eq!(clock.duration_minutes(), 1);
        complete(&clock);
        let report = controller.finish_phase().unwrap();
        assert_eq!(report.recorded_minutes, None);
        assert_eq!(report.message(), "Short Break timer complete!");
        assert_eq!(controller.phase(), Phase::Work);
        assert_eq!(controller.completed_work_phases(), 1);
        assert_eq!(task.total_minutes(), 3);
    }

    #[test]
    fn cancelled_work_records_partial_minutes() {
        let (controller, task, _) = controller();
        task.set_durations(Durations::new(10, 5, 15).unwrap())
            .unwrap();
        let clock = controller.begin_phase().unwrap();
        clock.fast_forward(7, 0).unwrap();
        controller.cancel();
        let report = controller.finish_phase().unwrap();
        assert_eq!(report.outcome, PhaseOutcome::Cancelled);
        assert_eq!(report.recorded_minutes, Some(7));
        assert_eq!(task.minutes_on(today()), 7);
        assert_eq!(controller.state(), CycleState::default());
    }

    #[test]
    fn cancelled_break_resets_without_recording() {
        let (controller, task, _) = controller();
        complete(&controller.begin_phase().unwrap());
        controller.finish_phase().unwrap();
        controller.begin_phase().unwrap();
        controller.cancel();
        let report = controller.finish_phase().unwrap();
        assert_eq!(report.recorded_minutes, None);
        assert_eq!(report.message(), "Short Break timer cancelled.");
        assert_eq!(controller.state(), CycleState::default());
        assert_eq!(task.total_minutes(), 3);
    }

    #[test]
    fn duration_edits_apply_to_next_phase() {
        let (controller, task, _) = controller();
        let clock = controller.begin_phase().unwrap();
        task.set_durations(Durations::new(9, 4, 20).unwrap())
            .unwrap();
        assert_eq!(clock.duration_minutes(), 3);
        complete(&clock);
        controller.finish_phase().unwrap();
        assert_eq!(controller.begin_phase().unwrap().duration_minutes(), 4);
    }

    #[test]
    fn select_task_discards_session() {
        let (controller, task, log) = controller();
        complete(&controller.begin_phase().unwrap());
        controller.finish_phase().unwrap();
        let clock = controller.begin_phase().unwrap();

        let other = TaskHandle::new(Task::new("Other").unwrap());
        let before = log.len();
        controller.select_task(other.clone());
        assert!(clock.is_cancelled());
        assert!(controller.session().is_none());
        assert_eq!(controller.state(), CycleState::default());
        assert!(controller.task().unwrap().same_task(&other));
        assert_eq!(log.len(), before);
        assert_eq!(task.total_minutes(), 3);
    }

    #[test]
    fn shutdown_clears_task() {
        let (controller, _, _) = controller();
        controller.begin_phase().unwrap();
        controller.shutdown();
        assert!(controller.task().is_none());
        assert!(controller.session().is_none());
        assert_eq!(controller.state(), CycleState::default());
    }

    #[test]
    fn rejects_zero_long_break_interval() {
        let controller =
            CycleController::new(Arc::new(FixedDate::new(today())), Arc::new(EventLog::new()));
        assert!(controller.with_long_break_after(0).is_err());
    }

    #[test]
    fn toggle_pause_flips_running() {
        let (controller, _, _) = controller();
        assert!(!controller.toggle_pause());
        controller.begin_phase().unwrap();
        // No runtime: the clock is marked running but must be ticked by hand.
        assert!(controller.toggle_pause());
        assert!(!controller.toggle_pause());
    }

    #[test]
    fn cancel_without_session_stops_the_next_phase() {
        let (controller, task, _) = controller();
        controller.cancel();
        let clock = controller.begin_phase().unwrap();
        assert!(clock.is_cancelled());
        let report = controller.finish_phase().unwrap();
        assert_eq!(report.outcome, PhaseOutcome::Cancelled);
        assert_eq!(report.recorded_minutes, Some(0));
        assert_eq!(task.total_minutes(), 0);

        // The held cancel is used up.
        assert!(!controller.begin_phase().unwrap().is_cancelled());
    }

    #[test]
    fn cancel_after_completion_carries_to_next_phase() {
        let (controller, task, _) = controller();
        let clock = controller.begin_phase().unwrap();
        complete(&clock);
        controller.cancel();
        assert!(clock.is_complete());

        let report = controller.finish_phase().unwrap();
        assert_eq!(report.outcome, PhaseOutcome::Completed);
        assert_eq!(task.total_minutes(), 3);

        assert!(controller.begin_phase().unwrap().is_cancelled());
        let report = controller.finish_phase().unwrap();
        assert_eq!(report.phase, Phase::ShortBreak);
        assert_eq!(report.outcome, PhaseOutcome::Cancelled);
        assert_eq!(controller.state(), CycleState::default());
    }

    #[test]
    fn select_task_drops_held_cancel() {
        let (controller, task, _) = controller();
        controller.cancel();
        controller.select_task(task);
        assert!(!controller.begin_phase().unwrap().is_cancelled());
    }

    struct Reentrant {
        controller: std::sync::OnceLock<CycleController>,
        seen: Mutex<Vec<CycleState>>,
    }

    impl EventSink for Reentrant {
        fn record(&self, _event: Event) {
            if let Some(controller) = self.controller.get() {
                let state = controller.state();
                controller.remaining();
                self.seen.lock().unwrap().push(state);
            }
        }
    }

    #[test]
    fn sink_may_query_the_controller() {
        let sink = Arc::new(Reentrant {
            controller: std::sync::OnceLock::new(),
            seen: Mutex::new(Vec::new()),
        });
        let controller = CycleController::new(Arc::new(FixedDate::new(today())), sink.clone());
        let _ = sink.controller.set(controller.clone());
        let task = TaskHandle::new(
            Task::with_durations("Study", Durations::new(1, 1, 1).unwrap()).unwrap(),
        );
        controller.select_task(task);

        complete(&controller.begin_phase().unwrap());
        controller.finish_phase().unwrap();
        controller.begin_phase().unwrap();
        controller.cancel();
        controller.finish_phase().unwrap();

        let seen = sink.seen.lock().unwrap();
        // PhaseStarted, TimeRecorded, PhaseCompleted, PhaseChanged,
        // PhaseStarted, PhaseCancelled, PhaseChanged.
        assert_eq!(seen.len(), 7);
        assert_eq!(seen[1].phase, Phase::ShortBreak);
    }
}
