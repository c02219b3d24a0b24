//! taskdeck due command implementation

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::Workspace;
use crate::error::{Error, Result};
use crate::graph::{DueColor, TaskGraph};
use crate::model::{iso8601, RecordId};
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::tags::{sorted_tags, TagRecords};
use crate::tasks::{comments, TaskRecords};

#[derive(Serialize)]
struct DueReport {
    id: RecordId,
    name: String,
    #[serde(with = "iso8601::option")]
    due_date: Option<DateTime<Utc>>,
    due_color: Option<DueColor>,
    relative_days: Option<i64>,
    parent: Option<RecordId>,
    super_parent: RecordId,
    has_sub_tasks: bool,
    percent_fullfilled: u32,
    tags: Vec<String>,
    comments: usize,
}

pub async fn run(
    workspace: &Workspace,
    id: RecordId,
    now: DateTime<Utc>,
    output: OutputOptions,
) -> Result<()> {
    let graph = TaskGraph::build(
        TaskRecords::new(workspace.scope(), &workspace.identity)
            .list()
            .await?,
    );
    let task = graph.get(id).ok_or(Error::TaskNotFound {
        id,
        project: workspace.project,
    })?;
    let tags = TagRecords::new(workspace.scope()).tags().await?;

    let report = DueReport {
        id,
        name: task.name.clone(),
        due_date: graph.calculate_due_date(task),
        due_color: graph.due_color(task, now),
        relative_days: task.due_date_relative.filter(|days| *days != 0),
        parent: graph.parent_id(id),
        super_parent: graph.super_parent(task).id,
        has_sub_tasks: graph.has_sub_tasks(task),
        percent_fullfilled: graph.percent_fullfilled(task),
        tags: sorted_tags(task, &tags)
            .into_iter()
            .map(|tag| tag.name.clone())
            .collect(),
        comments: comments(task).len(),
    };

    let mut human = HumanOutput::new(format!("{} #{}", report.name, report.id));
    match report.due_date {
        Some(due) => human.push_summary("due", iso8601::format(&due)),
        None => human.push_summary("due", "none"),
    }
    if let Some(color) = report.due_color {
        human.push_summary(
            "urgency",
            match color {
                DueColor::Red => "overdue",
                DueColor::Green => "due today",
                DueColor::Basic => "upcoming",
            },
        );
    }
    if let Some(days) = report.relative_days {
        human.push_summary("relative", format!("{days} day(s) before parent"));
    }
    if let Some(parent) = report.parent {
        human.push_summary("parent", format!("#{parent}"));
        human.push_summary("root", format!("#{}", report.super_parent));
    }
    if report.has_sub_tasks {
        human.push_summary("done", format!("{}%", report.percent_fullfilled));
    }
    if !report.tags.is_empty() {
        human.push_summary("tags", report.tags.join(", "));
    }
    if report.comments > 0 {
        human.push_summary("comments", report.comments.to_string());
    }

    emit_success(output, "due", &report, Some(&human))
}
