//! Core events and where they go.
//!
//! Every state change the core makes is reported as an [`Event`] to an
//! [`EventSink`]. [`EventLog`] keeps them in memory, [`TracingSink`] logs them.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use crate::timer::Phase;

/// Every state change the core performs produces an Event.
/// Shells receive them through an [`EventSink`] they hand to the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TaskAdded {
        task: String,
        at: DateTime<Utc>,
    },
    TaskRemoved {
        task: String,
        at: DateTime<Utc>,
    },
    DurationsChanged {
        task: String,
        work: u32,
        short_break: u32,
        long_break: u32,
        at: DateTime<Utc>,
    },
    TimeRecorded {
        task: String,
        date: NaiveDate,
        minutes: u32,
        at: DateTime<Utc>,
    },
    PhaseStarted {
        task: String,
        phase: Phase,
        duration_minutes: u32,
        at: DateTime<Utc>,
    },
    PhaseCompleted {
        task: String,
        phase: Phase,
        at: DateTime<Utc>,
    },
    PhaseCancelled {
        task: String,
        phase: Phase,
        completed_minutes: u32,
        at: DateTime<Utc>,
    },
    PhaseChanged {
        from: Phase,
        to: Phase,
        completed_work_phases: u32,
        at: DateTime<Utc>,
    },
    ProjectLoaded {
        project: String,
        tasks: usize,
        at: DateTime<Utc>,
    },
    ProjectSaved {
        project: String,
        tasks: usize,
        at: DateTime<Utc>,
    },
}

impl Event {
    pub fn at(&self) -> DateTime<Utc> {
        match self {
            Event::TaskAdded { at, .. }
            | Event::TaskRemoved { at, .. }
            | Event::DurationsChanged { at, .. }
            | Event::TimeRecorded { at, .. }
            | Event::PhaseStarted { at, .. }
            | Event::PhaseCompleted { at, .. }
            | Event::PhaseCancelled { at, .. }
            | Event::PhaseChanged { at, .. }
            | Event::ProjectLoaded { at, .. }
            | Event::ProjectSaved { at, .. } => *at,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let at = self.at().format("%Y-%m-%d %H:%M:%S");
        match self {
            Event::TaskAdded { task, .. } => write!(f, "{at}  Added task: {task}"),
            Event::TaskRemoved { task, .. } => write!(f, "{at}  Removed task: {task}"),
            Event::DurationsChanged {
                task,
                work,
                short_break,
                long_break,
                ..
            } => write!(
                f,
                "{at}  Changed durations of {task} to {work}/{short_break}/{long_break} minutes"
            ),
            Event::TimeRecorded {
                task,
                date,
                minutes,
                ..
            } => write!(f, "{at}  Recorded {minutes} minutes to {task} on {date}"),
            Event::PhaseStarted {
                task,
                phase,
                duration_minutes,
                ..
            } => write!(f, "{at}  {phase} timer started for {task} ({duration_minutes} min)"),
            Event::PhaseCompleted { task, phase, .. } => {
                write!(f, "{at}  {phase} timer complete for {task}")
            }
            Event::PhaseCancelled {
                task,
                phase,
                completed_minutes,
                ..
            } => write!(
                f,
                "{at}  {phase} timer cancelled for {task} after {completed_minutes} minutes"
            ),
            Event::PhaseChanged { from, to, .. } => write!(f, "{at}  {from} -> {to}"),
            Event::ProjectLoaded { project, tasks, .. } => {
                write!(f, "{at}  Loaded project {project} ({tasks} tasks)")
            }
            Event::ProjectSaved { project, tasks, .. } => {
                write!(f, "{at}  Saved project {project} ({tasks} tasks)")
            }
        }
    }
}

/// Destination for core events. Owned by whatever composes the system.
pub trait EventSink: Send + Sync {
    fn record(&self, event: Event);
}

/// In-memory, append-only event log.
#[derive(Debug, Default)]
pub struct EventLog {
    events: Mutex<Vec<Event>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every event recorded so far, oldest first.
    pub fn events(&self) -> Vec<Event> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl EventSink for EventLog {
    fn record(&self, event: Event) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

/// Forwards every event to `tracing` at info level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn record(&self, event: Event) {
        match serde_json::to_string(&event) {
            Ok(json) => tracing::info!(target: "pomotask::events", event = %json, "{event}"),
            Err(_) => tracing::info!(target: "pomotask::events", "{event}"),
        }
    }
}

/// Fans one event out to several sinks.
#[derive(Default)]
pub struct Tee {
    sinks: Vec<Arc<dyn EventSink>>,
}

impl Tee {
    pub fn new(sinks: Vec<Arc<dyn EventSink>>) -> Self {
        Self { sinks }
    }
}

impl EventSink for Tee {
    fn record(&self, event: Event) {
        for sink in &self.sinks {
            sink.record(event.clone());
        }
    }
}
