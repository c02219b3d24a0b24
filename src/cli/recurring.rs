//! taskdeck recurring command implementation
//!
//! Runs instance creation against the in-memory copy of the snapshot and
//! reports the instances the host would offer.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::Workspace;
use crate::error::Result;
use crate::model::{iso8601, RecordId};
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::recurrence::{create_new_instance, recurrent_tasks_to_create};
use crate::tasks::TaskRecords;

#[derive(Serialize)]
struct DueInstance {
    task: RecordId,
    name: String,
    pattern: &'static str,
    #[serde(with = "iso8601::option")]
    next_due_date: Option<DateTime<Utc>>,
}

#[derive(Serialize)]
struct RecurringReport {
    #[serde(with = "iso8601")]
    now: DateTime<Utc>,
    instances: Vec<DueInstance>,
}

pub async fn run(workspace: &Workspace, now: DateTime<Utc>, output: OutputOptions) -> Result<()> {
    let tasks = TaskRecords::new(workspace.scope(), &workspace.identity);
    let snapshot = tasks.list().await?;

    let mut instances = Vec::new();
    for task in recurrent_tasks_to_create(&snapshot, now) {
        let Some(instance) = create_new_instance(&tasks, task, now).await? else {
            continue;
        };
        instances.push(DueInstance {
            task: task.id,
            name: instance.name.clone(),
            pattern: instance
                .recurrence_pattern
                .map(|pattern| pattern.as_str())
                .unwrap_or_default(),
            next_due_date: instance.due_date,
        });
    }

    let mut human = HumanOutput::new(format!("{} recurring task(s) due", instances.len()));
    for instance in &instances {
        let due = instance
            .next_due_date
            .map(|due| due.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        human.push_detail(format!(
            "{} #{} ({}) next due {due}",
            instance.name, instance.task, instance.pattern
        ));
    }

    let report = RecurringReport { now, instances };
    emit_success(output, "recurring", &report, Some(&human))
}
