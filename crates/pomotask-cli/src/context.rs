//! Shared state for commands that work on the project file.

use std::sync::Arc;

use pomotask_core::events::{EventLog, EventSink, Tee, TracingSink};
use pomotask_core::{Config, Project, ProjectStore};

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Loaded config, the project, and where events go.
pub struct Context {
    pub config: Config,
    pub store: ProjectStore,
    pub project: Project,
    pub sink: Arc<dyn EventSink>,
}

impl Context {
    /// Load config and the project file. A missing project file yields an
    /// empty project named after `default_project_name`.
    pub fn open(log: &Arc<EventLog>) -> Result<Self, Box<dyn std::error::Error>> {
        let config = Config::load()?;
        let sink: Arc<dyn EventSink> = Arc::new(Tee::new(vec![
            Arc::clone(log) as Arc<dyn EventSink>,
            Arc::new(TracingSink),
        ]));
        let store = ProjectStore::new(config.project_path()?);
        let project = if store.exists() {
            store.load_logged(sink.as_ref())?
        } else {
            tracing::debug!(path = %store.path().display(), "no project file yet");
            Project::new(config.default_project_name.clone())
        };
        Ok(Self {
            config,
            store,
            project,
            sink,
        })
    }

    /// Write the project file.
    pub fn save(&self) -> CliResult {
        self.store.save_logged(&self.project, self.sink.as_ref())?;
        Ok(())
    }
}
