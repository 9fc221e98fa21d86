//! JSON project file.
//!
//! ```json
//! {
//!   "project_name": "School",
//!   "tasks": [
//!     {
//!       "task_name": "CPSC210",
//!       "workDurationMinutes": 25,
//!       "breakDurationMinutes": 5,
//!       "longBreakDurationMinutes": 15,
//!       "totalMinutes": 50,
//!       "historyMap": [{ "date": "2024-01-31", "minutes_completed": 50 }]
//!     }
//!   ]
//! }
//! ```
//!
//! Unknown or missing fields fail the read. A failed read never yields a
//! partial project.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::PersistenceError;
use crate::events::{Event, EventSink};
use crate::project::Project;
use crate::task::{Durations, Task};

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct ProjectFile {
    project_name: String,
    tasks: Vec<TaskRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct TaskRecord {
    task_name: String,
    #[serde(rename = "workDurationMinutes")]
    work_duration_minutes: u32,
    #[serde(rename = "breakDurationMinutes")]
    break_duration_minutes: u32,
    #[serde(rename = "longBreakDurationMinutes")]
    long_break_duration_minutes: u32,
    #[serde(rename = "totalMinutes")]
    total_minutes: u64,
    #[serde(rename = "historyMap")]
    history_map: Vec<DayRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct DayRecord {
    date: NaiveDate,
    minutes_completed: u64,
}

impl From<&Task> for TaskRecord {
    fn from(task: &Task) -> Self {
        let durations = task.durations();
        Self {
            task_name: task.name().to_string(),
            work_duration_minutes: durations.work,
            break_duration_minutes: durations.short_break,
            long_break_duration_minutes: durations.long_break,
            total_minutes: task.total_minutes(),
            history_map: task
                .ledger()
                .days()
                .map(|(date, minutes)| DayRecord {
                    date,
                    minutes_completed: minutes,
                })
                .collect(),
        }
    }
}

impl TaskRecord {
    fn into_task(self) -> Result<Task, String> {
        let durations = Durations::new(
            self.work_duration_minutes,
            self.break_duration_minutes,
            self.long_break_duration_minutes,
        )
        .map_err(|e| format!("task '{}': {e}", self.task_name))?;
        let mut task = Task::with_durations(self.task_name.clone(), durations)
            .map_err(|e| format!("task '{}': {e}", self.task_name))?;
        for day in self.history_map {
            let minutes = u32::try_from(day.minutes_completed).map_err(|_| {
                format!(
                    "task '{}': {} minutes on {} is out of range",
                    self.task_name, day.minutes_completed, day.date
                )
            })?;
            task.record_time(day.date, minutes);
        }
        if task.total_minutes() != self.total_minutes {
            return Err(format!(
                "task '{}': totalMinutes is {} but history sums to {}",
                self.task_name,
                self.total_minutes,
                task.total_minutes()
            ));
        }
        Ok(task)
    }
}

/// Serialize `project` to the project file format.
pub fn to_json(project: &Project) -> Result<String, serde_json::Error> {
    let file = ProjectFile {
        project_name: project.name().to_string(),
        tasks: project
            .tasks()
            .iter()
            .map(|handle| handle.with(|task| TaskRecord::from(task)))
            .collect(),
    };
    serde_json::to_string_pretty(&file)
}

/// Parse a project from the project file format.
///
/// Errors are human-readable descriptions of what is malformed.
pub fn from_json(content: &str) -> Result<Project, String> {
    let file: ProjectFile = serde_json::from_str(content).map_err(|e| e.to_string())?;
    let mut project = Project::new(file.project_name);
    for record in file.tasks {
        let task = record.into_task()?;
        project.add_task(task).map_err(|e| e.to_string())?;
    }
    Ok(project)
}

/// Reads and writes one project file on disk.
#[derive(Debug, Clone)]
pub struct ProjectStore {
    path: PathBuf,
}

impl ProjectStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Read the project from disk.
    ///
    /// # Errors
    ///
    /// [`PersistenceError::Read`] if the file cannot be read and
    /// [`PersistenceError::Malformed`] if its contents are invalid.
    pub fn load(&self) -> Result<Project, PersistenceError> {
        let content = std::fs::read_to_string(&self.path).map_err(|source| PersistenceError::Read {
            path: self.path.clone(),
            source,
        })?;
        let project = from_json(&content).map_err(|message| PersistenceError::Malformed {
            path: self.path.clone(),
            message,
        })?;
        tracing::debug!(path = %self.path.display(), tasks = project.len(), "loaded project");
        Ok(project)
    }

    /// Read the project, or start a new one called `name` if the file does
    /// not exist yet.
    pub fn load_or_new(&self, name: &str) -> Result<Project, PersistenceError> {
        match self.load() {
            Err(PersistenceError::Read { source, .. }) if source.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no project file; starting fresh");
                Ok(Project::new(name))
            }
            other => other,
        }
    }

    /// Write the project to disk, replacing the previous file in one step.
    ///
    /// # Errors
    ///
    /// [`PersistenceError::Write`] if the file cannot be written.
    pub fn save(&self, project: &Project) -> Result<(), PersistenceError> {
        let write_err = |source: std::io::Error| PersistenceError::Write {
            path: self.path.clone(),
            source,
        };
        let content = to_json(project).map_err(|e| write_err(std::io::Error::other(e)))?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, content).map_err(write_err)?;
        std::fs::rename(&tmp, &self.path).map_err(write_err)?;
        tracing::debug!(path = %self.path.display(), tasks = project.len(), "saved project");
        Ok(())
    }

    /// [`ProjectStore::load`], reporting a `ProjectLoaded` event on success.
    pub fn load_logged(&self, sink: &dyn EventSink) -> Result<Project, PersistenceError> {
        let project = self.load()?;
        sink.record(Event::ProjectLoaded {
            project: project.name().to_string(),
            tasks: project.len(),
            at: Utc::now(),
        });
        Ok(project)
    }

    /// [`ProjectStore::save`], reporting a `ProjectSaved` event on success.
    pub fn save_logged(&self, project: &Project, sink: &dyn EventSink) -> Result<(), PersistenceError> {
        self.save(project)?;
        sink.record(Event::ProjectSaved {
            project: project.name().to_string(),
            tasks: project.len(),
            at: Utc::now(),
        });
        Ok(())
    }
}
