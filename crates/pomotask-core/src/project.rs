//! Projects: named, ordered collections of uniquely-named tasks.

use crate::error::{CoreError, Result};
use crate::task::{Task, TaskHandle};

#[derive(Debug, Clone)]
pub struct Project {
    name: String,
    tasks: Vec<TaskHandle>,
}

impl Project {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tasks: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Tasks in insertion order.
    pub fn tasks(&self) -> &[TaskHandle] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Append `task`, returning a shared handle to it.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::DuplicateName`] if a task with the same name is
    /// already present. The project is left unchanged.
    pub fn add_task(&mut self, task: Task) -> Result<TaskHandle> {
        if self.contains(task.name()) {
            tracing::warn!(task = %task.name(), project = %self.name, "duplicate task name rejected");
            return Err(CoreError::DuplicateName {
                name: task.name().to_string(),
            });
        }
        let handle = TaskHandle::new(task);
        self.tasks.push(handle.clone());
        Ok(handle)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn task_named(&self, name: &str) -> Option<TaskHandle> {
        self.position(name).map(|i| self.tasks[i].clone())
    }

    pub fn task_at(&self, index: usize) -> Option<TaskHandle> {
        self.tasks.get(index).cloned()
    }

    /// Remove the task called `name`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] if there is no such task.
    pub fn remove_task(&mut self, name: &str) -> Result<TaskHandle> {
        let Some(index) = self.position(name) else {
            tracing::warn!(task = %name, "no such task to remove");
            return Err(CoreError::NotFound {
                name: name.to_string(),
            });
        };
        Ok(self.tasks.remove(index))
    }

    /// Minutes recorded across every task.
    pub fn total_minutes(&self) -> u64 {
        self.tasks.iter().map(TaskHandle::total_minutes).sum()
    }

    /// Task with the highest total. Ties go to the earliest task.
    pub fn most_worked_on(&self) -> Option<TaskHandle> {
        let mut best: Option<(&TaskHandle, u64)> = None;
        for task in &self.tasks {
            let total = task.total_minutes();
            if best.map_or(true, |(_, max)| total > max) {
                best = Some((task, total));
            }
        }
        best.map(|(task, _)| task.clone())
    }

    /// One-line breakdown: `(Name) N min ` per task.
    pub fn task_breakdown(&self) -> String {
        if self.tasks.is_empty() {
            return "No tasks to display".to_string();
        }
        self.tasks
            .iter()
            .map(|task| {
                task.with(|t| format!("({}) {} min ", t.name(), t.total_minutes()))
            })
            .collect()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.tasks
            .iter()
            .position(|task| task.with(|t| t.name() == name))
    }
}
