//! Project file round-trips through a real directory.

use chrono::NaiveDate;
use pomotask_core::events::{Event, EventLog};
use pomotask_core::{Durations, PersistenceError, Project, ProjectStore, Task};

fn day(m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, m, d).unwrap()
}

fn sample_project() -> Project {
    let mut project = Project::new("School");
    let mut math = Task::with_durations("Math", Durations::new(50, 10, 30).unwrap()).unwrap();
    math.record_time(day(1, 30), 50);
    math.record_time(day(1, 31), 25);
    math.record_time(day(1, 31), 25);
    project.add_task(math).unwrap();
    project.add_task(Task::new("History").unwrap()).unwrap();
    let mut art = Task::new("Art").unwrap();
    art.record_time(day(2, 1), 5);
    project.add_task(art).unwrap();
    project
}

#[test]
fn save_then_load_preserves_everything() {
    let dir = tempfile::tempdir().unwrap();
    let store = ProjectStore::new(dir.path().join("project.json"));
    let project = sample_project();

    store.save(&project).unwrap();
    let loaded = store.load().unwrap();

    assert_eq!(loaded.name(), "School");
    let names: Vec<String> = loaded.tasks().iter().map(|t| t.name()).collect();
    assert_eq!(names, vec!["Math", "History", "Art"]);

    let math = loaded.task_named("Math").unwrap();
    assert_eq!(math.durations(), Durations::new(50, 10, 30).unwrap());
    assert_eq!(math.total_minutes(), 100);
    assert_eq!(math.minutes_on(day(1, 30)), 50);
    assert_eq!(math.minutes_on(day(1, 31)), 50);
    assert_eq!(loaded.task_named("History").unwrap().total_minutes(), 0);
    assert_eq!(loaded.total_minutes(), project.total_minutes());
    assert_eq!(loaded.task_breakdown(), project.task_breakdown());
}

#[test]
fn saving_twice_replaces_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let store = ProjectStore::new(dir.path().join("project.json"));
    let mut project = sample_project();
    store.save(&project).unwrap();

    project.remove_task("History").unwrap();
    project.rename("College");
    store.save(&project).unwrap();

    let loaded = store.load().unwrap();
    assert_eq!(loaded.name(), "College");
    assert_eq!(loaded.len(), 2);
    assert!(!dir.path().join("project.json.tmp").exists());
}

#[test]
fn save_creates_missing_parent_directories() {
    let dir = tempfile::tempdir().unwrap();
    let store = ProjectStore::new(dir.path().join("nested").join("deeper").join("p.json"));
    store.save(&sample_project()).unwrap();
    assert!(store.exists());
}

#[test]
fn missing_file_is_a_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let store = ProjectStore::new(dir.path().join("absent.json"));
    assert!(matches!(store.load(), Err(PersistenceError::Read { .. })));

    let fresh = store.load_or_new("Fresh").unwrap();
    assert_eq!(fresh.name(), "Fresh");
    assert!(fresh.is_empty());
}

#[test]
fn failed_load_leaves_in_memory_project_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("project.json");
    std::fs::write(&path, r#"{"project_name": "Broken", "tasks": [{"task_name": "X"}]}"#).unwrap();
    let store = ProjectStore::new(&path);

    let mut project = sample_project();
    match store.load() {
        Ok(loaded) => project = loaded,
        Err(err) => assert!(matches!(err, PersistenceError::Malformed { .. })),
    }
    assert_eq!(project.name(), "School");
    assert_eq!(project.len(), 3);
    assert!(store.load_or_new("Fresh").is_err());
}

#[test]
fn logged_variants_report_events() {
    let dir = tempfile::tempdir().unwrap();
    let store = ProjectStore::new(dir.path().join("project.json"));
    let log = EventLog::new();

    store.save_logged(&sample_project(), &log).unwrap();
    store.load_logged(&log).unwrap();

    let events = log.events();
    assert_eq!(events.len(), 2);
    assert!(matches!(events[0], Event::ProjectSaved { tasks: 3, .. }));
    assert!(matches!(events[1], Event::ProjectLoaded { tasks: 3, .. }));
}
