use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone, Utc};
use taskdeck::model::{Project, Record, RecordBody, RecordId, ProjectId, ModuleId, Task, TaskList};
use taskdeck::store::{InMemoryStore, Snapshot};
use tempfile::TempDir;

pub const MODULE_KEY: &str = "taskdeck";
pub const MODULE: ModuleId = 7;
pub const PROJECT: ProjectId = 1;
pub const OTHER_PROJECT: ProjectId = 2;

pub fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0)
        .single()
        .expect("valid date")
}

pub fn task(name: &str) -> Task {
    Task::new(name)
}

pub fn parent(name: &str, sub_tasks: &[RecordId]) -> Task {
    Task {
        sub_tasks: sub_tasks.to_vec(),
        ..Task::new(name)
    }
}

pub fn list(name: &str, is_default: bool, show_completed: bool, show_sub_tasks: bool) -> TaskList {
    TaskList {
        name: name.to_string(),
        is_default,
        show_completed,
        show_sub_tasks,
        ..TaskList::default()
    }
}

pub fn project(id: ProjectId, name: &str) -> Project {
    Project {
        id,
        name: name.to_string(),
        description: None,
        color: None,
        icon: None,
        shorty: format!("project_{id}"),
        security_level_id: 1,
        custom_module_id: MODULE,
        allowed_users: Vec::new(),
        read_only_users: Vec::new(),
    }
}

pub fn task_record(id: RecordId, project: ProjectId, task: Task) -> Record {
    Record::new(id, project, RecordBody::Task(task))
}

pub fn list_record(id: RecordId, project: ProjectId, list: TaskList) -> Record {
    Record::new(id, project, RecordBody::List(list))
}

/// Store with the module registered and both test projects present.
pub async fn seeded_store(records: Vec<Record>) -> InMemoryStore {
    let store = InMemoryStore::new();
    store.register_module(MODULE_KEY, MODULE).await;
    store
        .seed_categories(vec![project(PROJECT, "Choir"), project(OTHER_PROJECT, "Festival")])
        .await;
    store.seed(MODULE, records).await;
    store
}

pub fn snapshot(projects: Vec<Project>, records: Vec<Record>) -> Snapshot {
    Snapshot {
        module_key: Some(MODULE_KEY.to_string()),
        module_id: MODULE,
        projects,
        records,
    }
}

/// A temp directory holding a snapshot file.
pub struct SnapshotDir {
    dir: TempDir,
}

impl SnapshotDir {
    pub fn new(snapshot: &Snapshot) -> Result<Self, Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        fs::write(
            dir.path().join("taskdeck.json"),
            serde_json::to_string_pretty(snapshot)?,
        )?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn write_file(&self, rel_path: &str, contents: &str) -> std::io::Result<PathBuf> {
        let path = self.dir.path().join(rel_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, contents)?;
        Ok(path)
    }
}
