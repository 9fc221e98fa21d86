//! Project management commands for CLI.

use std::sync::Arc;

use clap::Subcommand;
use pomotask_core::events::EventLog;

use crate::context::{CliResult, Context};

#[derive(Subcommand)]
pub enum ProjectAction {
    /// Show the project name, file and task breakdown
    Show,
    /// Rename the project
    Rename {
        /// New project name
        name: String,
    },
}

pub fn run(action: ProjectAction, log: &Arc<EventLog>) -> CliResult {
    let mut ctx = Context::open(log)?;

    match action {
        ProjectAction::Show => {
            println!("Project: {}", ctx.project.name());
            println!("File: {}", ctx.store.path().display());
            println!("Tasks: {}", ctx.project.len());
            println!("{}", ctx.project.task_breakdown());
        }
        ProjectAction::Rename { name } => {
            if name.trim().is_empty() {
                return Err("project name must not be empty".into());
            }
            ctx.project.rename(name);
            ctx.save()?;
            println!("Project renamed: {}", ctx.project.name());
        }
    }
    Ok(())
}
