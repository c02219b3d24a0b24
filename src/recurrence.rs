//! Recurring tasks.
//!
//! A recurring task is due for a new instance once a full interval has passed
//! since the last instance was created, or since its own due date when none
//! was. Creating an instance stamps the original and returns an unsaved copy
//! due one interval later; persisting the copy is left to the caller.

use chrono::{DateTime, Duration, Utc};

use crate::error::Result;
use crate::model::{StoredTask, Task};
use crate::tasks::TaskRecords;

const MILLIS_PER_DAY: f64 = 24.0 * 60.0 * 60.0 * 1000.0;

/// Fractional days from `since` to `now`.
fn days_between(since: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    (now - since).num_milliseconds() as f64 / MILLIS_PER_DAY
}

pub fn should_create_new_instance(task: &Task, now: DateTime<Utc>) -> bool {
    let (Some(pattern), Some(due)) = (task.recurrence_pattern, task.due_date) else {
        return false;
    };
    let since = task.recurrence_last_created.unwrap_or(due);
    days_between(since, now) >= pattern.interval_days() as f64
}

/// The next instance of `task`, unsaved, if one is due at `now`.
pub fn next_instance(task: &Task, now: DateTime<Utc>) -> Option<Task> {
    if !should_create_new_instance(task, now) {
        return None;
    }
    let pattern = task.recurrence_pattern?;
    let due = task.due_date?;
    Some(Task {
        due_date: Some(due + Duration::days(pattern.interval_days())),
        fullfilled: false,
        activity: Vec::new(),
        ..task.clone()
    })
}

/// Stamp `recurrenceLastCreated = now` on the original through the task
/// adapter and return the next instance. `None` when no instance is due.
pub async fn create_new_instance(
    tasks: &TaskRecords<'_>,
    task: &StoredTask,
    now: DateTime<Utc>,
) -> Result<Option<Task>> {
    let Some(instance) = next_instance(task, now) else {
        return Ok(None);
    };

    let mut stamped = task.value.clone();
    stamped.recurrence_last_created = Some(now);
    tasks.update(task, stamped).await?;
    tracing::info!(task = task.id, due = ?instance.due_date, "recurring task due for a new instance");
    Ok(Some(instance))
}

/// Tasks of the snapshot due for a new instance at `now`.
pub fn recurrent_tasks_to_create(tasks: &[StoredTask], now: DateTime<Utc>) -> Vec<&StoredTask> {
    tasks
        .iter()
        .filter(|task| should_create_new_instance(task, now))
        .collect()
}
