//! Interactive timer.
//!
//! `timer run <task>` drives the work/break cycle in real time. While it
//! runs, stdin accepts one command per line: `p` pauses or resumes, `c`
//! cancels the current phase, `q` cancels and quits.

use std::io::Write;
use std::sync::Arc;

use clap::Subcommand;
use pomotask_core::events::{EventLog, EventSink};
use pomotask_core::{
    Clock, CoreError, CycleController, Phase, PhaseListener, PhaseReport, Project, ProjectStore,
    RunOutcome, SystemDate, TickEvent,
};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use crate::context::{CliResult, Context};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Run the work/break cycle for a task
    Run {
        /// Task name
        task: String,
        /// Work phases before a long break (default from config)
        #[arg(long)]
        long_break_after: Option<u32>,
    },
}

/// Prints phase boundaries and saves the project after every ledger write.
struct ShellListener {
    project: Project,
    store: ProjectStore,
    sink: Arc<dyn EventSink>,
}

impl PhaseListener for ShellListener {
    fn on_phase_started(&self, phase: Phase, clock: &Clock) {
        println!(
            "\n{phase} ({}) - p: pause/resume, c: cancel, q: quit",
            clock.snapshot().clock
        );
    }

    fn on_phase_finished(&self, report: &PhaseReport) {
        println!("\n{}", report.message());
        if report.recorded_minutes.is_some() {
            if let Err(e) = self.store.save_logged(&self.project, self.sink.as_ref()) {
                tracing::warn!(error = %e, "failed to save project");
                eprintln!("error: {e}");
            }
        }
    }

    fn on_phase_changed(&self, _from: Phase, to: Phase) {
        tracing::debug!(%to, "next phase");
    }
}

fn print_tick(event: &TickEvent) {
    let mut out = std::io::stdout().lock();
    let _ = write!(out, "\r  {}   ", event.clock);
    let _ = out.flush();
}

pub fn run(action: TimerAction, log: &Arc<EventLog>) -> CliResult {
    let ctx = Context::open(log)?;

    match action {
        TimerAction::Run {
            task,
            long_break_after,
        } => {
            let handle = ctx
                .project
                .task_named(&task)
                .ok_or(CoreError::NotFound { name: task.clone() })?;

            let listener = Arc::new(ShellListener {
                project: ctx.project.clone(),
                store: ctx.store.clone(),
                sink: Arc::clone(&ctx.sink),
            });
            let controller = CycleController::new(Arc::new(SystemDate), Arc::clone(&ctx.sink))
                .with_long_break_after(
                    long_break_after.unwrap_or(ctx.config.cycle.long_break_after),
                )?
                .with_observer(Arc::new(print_tick))
                .with_phase_listener(listener);
            controller.select_task(handle);

            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;
            let result = runtime.block_on(drive(&controller));
            // Stdin reads block a pool thread until the next line arrives.
            runtime.shutdown_background();
            controller.shutdown();
            result?;
            let total = ctx
                .project
                .task_named(&task)
                .map_or(0, |t| t.total_minutes());
            println!("Total time on {task}: {total} minutes");
        }
    }
    Ok(())
}

/// Run cycles until the user quits or stdin closes.
async fn drive(controller: &CycleController) -> CliResult {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let quit = run_cycle(controller, &mut lines).await?;
        if quit {
            return Ok(());
        }
        println!("Press Enter to start again, or q to quit.");
        match lines.next_line().await? {
            Some(line) if line.trim() != "q" => {
                // Start clean: drops a cancel typed after the cycle had ended.
                if let Some(task) = controller.task() {
                    controller.select_task(task);
                }
            }
            _ => return Ok(()),
        }
    }
}

/// Run one cycle to cancellation. Returns whether the user asked to quit.
async fn run_cycle(
    controller: &CycleController,
    lines: &mut Lines<BufReader<Stdin>>,
) -> Result<bool, Box<dyn std::error::Error>> {
    let runner = controller.clone();
    let mut session = tokio::spawn(async move { runner.run().await });
    let mut quitting = false;

    loop {
        tokio::select! {
            outcome = &mut session => {
                match outcome?? {
                    RunOutcome::Cancelled(report) => {
                        tracing::debug!(phase = %report.phase, "cycle cancelled");
                    }
                    RunOutcome::Discarded => {}
                }
                return Ok(quitting);
            }
            line = lines.next_line(), if !quitting => {
                match line?.as_deref().map(str::trim) {
                    Some("p") => {
                        if controller.toggle_pause() {
                            println!("\nResumed");
                        } else {
                            println!("\nPaused");
                        }
                    }
                    Some("c") => controller.cancel(),
                    Some("q") | None => {
                        quitting = true;
                        controller.cancel();
                    }
                    Some("") => {}
                    Some(other) => {
                        println!("\nUnknown command '{other}' (p: pause/resume, c: cancel, q: quit)");
                    }
                }
            }
        }
    }
}
