//! taskdeck tree command implementation
//!
//! Renders the project's tasks as a forest: tasks without a parent at the
//! top, sub-tasks nested in `subTasks` order.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::Workspace;
use crate::error::Result;
use crate::graph::TaskGraph;
use crate::model::{iso8601, RecordId, StoredTask};
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::tasks::TaskRecords;

#[derive(Serialize)]
struct TreeNode {
    id: RecordId,
    name: String,
    fullfilled: bool,
    #[serde(skip_serializing_if = "Option::is_none", with = "iso8601::option")]
    due_date: Option<DateTime<Utc>>,
    percent_fullfilled: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    children: Vec<TreeNode>,
}

#[derive(Serialize)]
struct TreeReport {
    project: i64,
    tasks: usize,
    roots: Vec<TreeNode>,
}

fn build_node(
    graph: &TaskGraph,
    task: &StoredTask,
    open_only: bool,
    visited: &mut HashSet<RecordId>,
) -> TreeNode {
    visited.insert(task.id);
    let children = graph
        .children(task)
        .into_iter()
        .filter(|child| !(open_only && child.fullfilled))
        .filter(|child| !visited.contains(&child.id))
        .collect::<Vec<_>>()
        .into_iter()
        .map(|child| build_node(graph, child, open_only, visited))
        .collect();

    TreeNode {
        id: task.id,
        name: task.name.clone(),
        fullfilled: task.fullfilled,
        due_date: graph.calculate_due_date(task),
        percent_fullfilled: graph.percent_fullfilled(task),
        children,
    }
}

fn render(node: &TreeNode, depth: usize, lines: &mut Vec<String>) {
    let mark = if node.fullfilled { "x" } else { " " };
    let mut line = format!("{}[{mark}] {} #{}", "  ".repeat(depth), node.name, node.id);
    if let Some(due) = node.due_date {
        line.push_str(&format!(" (due {})", due.format("%Y-%m-%d")));
    }
    if !node.children.is_empty() {
        line.push_str(&format!(" {}%", node.percent_fullfilled));
    }
    lines.push(line);
    for child in &node.children {
        render(child, depth + 1, lines);
    }
}

pub async fn run(workspace: &Workspace, open_only: bool, output: OutputOptions) -> Result<()> {
    let tasks = TaskRecords::new(workspace.scope(), &workspace.identity);
    let graph = TaskGraph::build(tasks.list().await?);

    let mut visited = HashSet::new();
    let roots: Vec<TreeNode> = graph
        .tasks()
        .iter()
        .filter(|task| graph.parent_id(task.id).is_none())
        .filter(|task| !(open_only && task.fullfilled))
        .map(|task| build_node(&graph, task, open_only, &mut visited))
        .collect();

    let mut human = HumanOutput::new(format!(
        "Project {}: {} task(s)",
        workspace.project,
        graph.len()
    ));
    let mut lines = Vec::new();
    for root in &roots {
        render(root, 0, &mut lines);
    }
    for line in lines {
        human.push_detail(line);
    }
    if !graph.conflicts().is_empty() {
        human.push_warning(format!(
            "{} task(s) listed under more than one parent",
            graph.conflicts().len()
        ));
        human.push_next_step("taskdeck validate");
    }

    let report = TreeReport {
        project: workspace.project,
        tasks: graph.len(),
        roots,
    };
    emit_success(output, "tree", &report, Some(&human))
}
