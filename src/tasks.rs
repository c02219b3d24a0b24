//! Task adapter: typed access to the task records of one project.
//!
//! Every write records who did it. Creation starts the activity log with a
//! `create` entry, updates append an `update` entry carrying the field diff,
//! completion toggles append a `fullfilled` entry with the new flag.

use serde_json::Value;

use crate::actor::IdentityProvider;
use crate::diff::{diff_of, ObjectDiff};
use crate::error::{Error, Result};
use crate::model::{ActivityEntry, ActivityKind, Record, RecordBody, RecordId, Stored, StoredTask, Task};
use crate::store::ProjectScope;

pub struct TaskRecords<'a> {
    scope: ProjectScope<'a>,
    identity: &'a dyn IdentityProvider,
}

impl<'a> TaskRecords<'a> {
    pub fn new(scope: ProjectScope<'a>, identity: &'a dyn IdentityProvider) -> Self {
        Self { scope, identity }
    }

    pub fn scope(&self) -> ProjectScope<'a> {
        self.scope
    }

    fn entry(&self, kind: ActivityKind, value: Option<Value>) -> ActivityEntry {
        ActivityEntry::new(self.identity.current_actor().id, kind, value)
    }

    /// Current task snapshot of the project.
    pub async fn list(&self) -> Result<Vec<StoredTask>> {
        Ok(self
            .scope
            .records()
            .await?
            .into_iter()
            .filter_map(into_task)
            .collect())
    }

    pub async fn get(&self, id: RecordId) -> Result<StoredTask> {
        self.list()
            .await?
            .into_iter()
            .find(|task| task.id == id)
            .ok_or(Error::TaskNotFound {
                id,
                project: self.scope.project,
            })
    }

    /// Persist a new task. Any activity it carries is replaced by a single
    /// `create` entry.
    pub async fn create(&self, mut task: Task) -> Result<StoredTask> {
        task.activity = vec![self.entry(ActivityKind::Create, None)];
        self.insert(task).await
    }

    /// Persist a task keeping its activity history, appending a `create`
    /// entry with `origin` as its value.
    pub async fn create_with_history(&self, mut task: Task, origin: Value) -> Result<StoredTask> {
        task.activity.push(self.entry(ActivityKind::Create, Some(origin)));
        self.insert(task).await
    }

    async fn insert(&self, task: Task) -> Result<StoredTask> {
        let record = self.scope.create(RecordBody::Task(task)).await?;
        into_task(record).ok_or_else(|| Error::Store("store returned a non-task record".to_string()))
    }

    /// Persist `updated` over `previous`, appending an `update` entry with the
    /// field diff. The activity log itself is not part of the diff.
    pub async fn update(&self, previous: &StoredTask, mut updated: Task) -> Result<StoredTask> {
        let diff = task_diff(&updated, previous)?;
        let value = serde_json::to_value(&diff)?;
        updated.activity.push(self.entry(ActivityKind::Update, Some(value)));
        let stored = Stored::new(previous.id, self.scope.project, updated);
        self.persist(&stored).await?;
        Ok(stored)
    }

    pub async fn delete(&self, id: RecordId) -> Result<()> {
        self.scope.delete(id).await
    }

    /// Flip `fullfilled` and log the new value.
    pub async fn toggle(&self, task: &StoredTask) -> Result<StoredTask> {
        let mut toggled = task.clone();
        toggled.fullfilled = !task.fullfilled;
        let entry = self.entry(ActivityKind::Fullfilled, Some(Value::Bool(toggled.fullfilled)));
        toggled.activity.push(entry);
        self.persist(&toggled).await?;
        Ok(toggled)
    }

    pub async fn comment(&self, task: &StoredTask, text: &str) -> Result<StoredTask> {
        if text.trim().is_empty() {
            return Err(Error::InvalidArgument("comment must not be empty".to_string()));
        }
        let mut commented = task.clone();
        let entry = self.entry(ActivityKind::Comment, Some(Value::String(text.to_string())));
        commented.activity.push(entry);
        self.persist(&commented).await?;
        Ok(commented)
    }

    async fn persist(&self, task: &StoredTask) -> Result<()> {
        let record: Record = task.clone().map(RecordBody::Task);
        self.scope.update(record).await
    }
}

fn into_task(record: Record) -> Option<StoredTask> {
    let Stored {
        id,
        data_category_id,
        value,
    } = record;
    match value {
        RecordBody::Task(task) => Some(Stored::new(id, data_category_id, task)),
        _ => None,
    }
}

/// Field diff of two task bodies without the activity log.
pub fn task_diff(current: &Task, previous: &Task) -> Result<ObjectDiff> {
    let mut diff = diff_of(current, previous)?;
    diff.remove("activity");
    Ok(diff)
}

/// Comment entries of a task, oldest first.
pub fn comments(task: &Task) -> Vec<&ActivityEntry> {
    task.activity
        .iter()
        .filter(|entry| entry.kind == ActivityKind::Comment)
        .collect()
}
