//! # Pomotask Core Library
//!
//! Core logic for the Pomotask work timer: a project of named tasks, each
//! with its own Pomodoro phase durations and a per-day ledger of minutes
//! worked. The `pomotask` CLI is a thin layer over this crate.
//!
//! ## Architecture
//!
//! - **Timer**: a one-second countdown [`Clock`] with pause, resume, cancel
//!   and fast-forward, and a [`CycleController`] that walks the
//!   work/short-break/long-break cycle and records completed work time
//! - **Task**: [`Task`] durations and [`Ledger`], shared through
//!   [`TaskHandle`] so the timer and readers see consistent totals
//! - **Project**: an ordered collection of uniquely-named tasks
//! - **Storage**: JSON project files and TOML configuration
//! - **Events**: an [`EventSink`] for state-change notifications

pub mod date;
pub mod error;
pub mod events;
pub mod project;
pub mod storage;
pub mod task;
pub mod timer;

pub use date::{DateProvider, FixedDate, SystemDate};
pub use error::{ConfigError, CoreError, PersistenceError, ValidationError};
pub use events::{Event, EventLog, EventSink, Tee, TracingSink};
pub use project::Project;
pub use storage::{Config, ProjectStore};
pub use task::{Durations, Ledger, Task, TaskHandle};
pub use timer::{
    Clock, ClockObserver, CycleController, CycleState, Phase, PhaseListener, PhaseOutcome,
    PhaseReport, RunOutcome, TickEvent,
};
