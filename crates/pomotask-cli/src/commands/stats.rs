use std::sync::Arc;

use chrono::{Local, NaiveDate};
use clap::Args;
use pomotask_core::events::EventLog;
use serde::Serialize;

use crate::context::{CliResult, Context};

#[derive(Args)]
pub struct StatsArgs {
    /// Day to report on (YYYY-MM-DD, default today)
    #[arg(long)]
    date: Option<NaiveDate>,
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct TaskStats {
    name: String,
    total_minutes: u64,
    day_minutes: u64,
}

#[derive(Serialize)]
struct ProjectStats {
    project: String,
    date: NaiveDate,
    total_minutes: u64,
    most_worked_on: Option<String>,
    tasks: Vec<TaskStats>,
}

pub fn run(args: StatsArgs, log: &Arc<EventLog>) -> CliResult {
    let ctx = Context::open(log)?;
    let date = args.date.unwrap_or_else(|| Local::now().date_naive());
    let project = &ctx.project;

    let stats = ProjectStats {
        project: project.name().to_string(),
        date,
        total_minutes: project.total_minutes(),
        most_worked_on: project.most_worked_on().map(|t| t.name()),
        tasks: project
            .tasks()
            .iter()
            .map(|t| TaskStats {
                name: t.name(),
                total_minutes: t.total_minutes(),
                day_minutes: t.minutes_on(date),
            })
            .collect(),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("Project: {}", stats.project);
    println!("Total time worked: {} minutes", stats.total_minutes);
    match &stats.most_worked_on {
        Some(name) => println!("Most worked on: {name}"),
        None => println!("Most worked on: -"),
    }
    println!("{}", project.task_breakdown());
    for task in &stats.tasks {
        println!(
            "  {}: {} min total, {} min on {}",
            task.name, task.total_minutes, task.day_minutes, stats.date
        );
    }
    Ok(())
}
