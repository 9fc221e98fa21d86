//! Task management commands for CLI.

use std::sync::Arc;

use chrono::{Local, Utc};
use clap::Subcommand;
use pomotask_core::events::{Event, EventLog};
use pomotask_core::{CoreError, Durations, Task};
use serde::Serialize;

use crate::context::{CliResult, Context};

#[derive(Subcommand)]
pub enum TaskAction {
    /// Add a task to the project
    Add {
        /// Task name (must be unique within the project)
        name: String,
        /// Work phase length in minutes (default from config)
        #[arg(long)]
        work: Option<u32>,
        /// Short break length in minutes (default from config)
        #[arg(long)]
        short_break: Option<u32>,
        /// Long break length in minutes (default from config)
        #[arg(long)]
        long_break: Option<u32>,
    },
    /// List tasks in project order
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Change a task's phase durations
    Edit {
        /// Task name
        name: String,
        #[arg(long)]
        work: Option<u32>,
        #[arg(long)]
        short_break: Option<u32>,
        #[arg(long)]
        long_break: Option<u32>,
    },
    /// Remove a task and its recorded time
    Remove {
        /// Task name
        name: String,
    },
}

#[derive(Serialize)]
struct TaskRow {
    name: String,
    work: u32,
    short_break: u32,
    long_break: u32,
    total_minutes: u64,
    today_minutes: u64,
}

pub fn run(action: TaskAction, log: &Arc<EventLog>) -> CliResult {
    let mut ctx = Context::open(log)?;

    match action {
        TaskAction::Add {
            name,
            work,
            short_break,
            long_break,
        } => {
            let defaults = ctx.config.default_durations()?;
            let durations = Durations::new(
                work.unwrap_or(defaults.work),
                short_break.unwrap_or(defaults.short_break),
                long_break.unwrap_or(defaults.long_break),
            )?;
            let task = Task::with_durations(name, durations)?;
            let handle = ctx.project.add_task(task)?;
            ctx.sink.record(Event::TaskAdded {
                task: handle.name(),
                at: Utc::now(),
            });
            ctx.save()?;
            println!("Task added: {}", handle.name());
        }
        TaskAction::List { json } => {
            let today = Local::now().date_naive();
            let rows: Vec<TaskRow> = ctx
                .project
                .tasks()
                .iter()
                .map(|handle| {
                    handle.with(|t| {
                        let d = t.durations();
                        TaskRow {
                            name: t.name().to_string(),
                            work: d.work,
                            short_break: d.short_break,
                            long_break: d.long_break,
                            total_minutes: t.total_minutes(),
                            today_minutes: t.minutes_on(today),
                        }
                    })
                })
                .collect();
            if json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else if rows.is_empty() {
                println!("No tasks to display");
            } else {
                for (i, row) in rows.iter().enumerate() {
                    println!(
                        "{}. {}  ({}/{}/{} min)  total {} min",
                        i + 1,
                        row.name,
                        row.work,
                        row.short_break,
                        row.long_break,
                        row.total_minutes
                    );
                }
            }
        }
        TaskAction::Edit {
            name,
            work,
            short_break,
            long_break,
        } => {
            if work.is_none() && short_break.is_none() && long_break.is_none() {
                return Err("nothing to change: pass --work, --short-break or --long-break".into());
            }
            let handle = ctx
                .project
                .task_named(&name)
                .ok_or(CoreError::NotFound { name: name.clone() })?;
            let current = handle.durations();
            let durations = Durations::new(
                work.unwrap_or(current.work),
                short_break.unwrap_or(current.short_break),
                long_break.unwrap_or(current.long_break),
            )?;
            handle.set_durations(durations)?;
            ctx.sink.record(Event::DurationsChanged {
                task: name.clone(),
                work: durations.work,
                short_break: durations.short_break,
                long_break: durations.long_break,
                at: Utc::now(),
            });
            ctx.save()?;
            println!(
                "Task updated: {name} ({}/{}/{} min)",
                durations.work, durations.short_break, durations.long_break
            );
        }
        TaskAction::Remove { name } => {
            let removed = ctx.project.remove_task(&name)?;
            ctx.sink.record(Event::TaskRemoved {
                task: removed.name(),
                at: Utc::now(),
            });
            ctx.save()?;
            println!("Task removed: {name}");
        }
    }
    Ok(())
}
