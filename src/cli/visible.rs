//! taskdeck visible command implementation
//!
//! Applies the same gates a project view does: search, completion and
//! sub-task visibility per effective list, then sorts.

use serde::Serialize;

use super::Workspace;
use crate::error::Result;
use crate::filter::{annotate, sort_tasks, SortBy, Visibility};
use crate::graph::TaskGraph;
use crate::lists::ListRecords;
use crate::model::RecordId;
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::search::{search_tasks, SearchOptions};
use crate::session::Session;
use crate::tasks::TaskRecords;

pub struct VisibleOptions {
    pub search: String,
    pub sub_tasks: bool,
    pub hide_fullfilled: bool,
    pub sort: SortBy,
    pub output: OutputOptions,
}

#[derive(Serialize)]
struct VisibleTask {
    id: RecordId,
    name: String,
    list: Option<RecordId>,
    parent: Option<RecordId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    score: Option<f64>,
}

#[derive(Serialize)]
struct VisibleReport {
    project: i64,
    sort_by: SortBy,
    shown: usize,
    hidden: usize,
    tasks: Vec<VisibleTask>,
}

pub async fn run(workspace: &Workspace, options: VisibleOptions) -> Result<()> {
    let session = Session::new();
    session.update_toggles(workspace.project, |toggles| {
        toggles.show_sub_tasks = options.sub_tasks;
        toggles.show_fullfilled = !options.hide_fullfilled;
        toggles.sort_by = options.sort;
        toggles.search = options.search.clone();
    });
    let toggles = session.toggles(workspace.project);

    let mut warnings = Vec::new();
    let lists = ListRecords::new(workspace.scope(), &session, &workspace.config.lists.default_name);
    if let Some(created) = lists.ensure_default_list().await? {
        warnings.push(format!(
            "project has no default list; assumed '{}' for unlisted tasks",
            created.name
        ));
    }
    let all_lists = lists.lists().await?;

    let graph = TaskGraph::build(
        TaskRecords::new(workspace.scope(), &workspace.identity)
            .list()
            .await?,
    );
    let search = search_tasks(
        graph.tasks(),
        &toggles.search,
        &SearchOptions::new(&workspace.config.search),
    );
    let visibility = Visibility::new(&graph, &all_lists, &toggles, &search);

    let mut annotated: Vec<_> = annotate(&graph, &search)
        .into_iter()
        .filter(|entry| visibility.show_task(entry.task))
        .collect();
    sort_tasks(&mut annotated, toggles.sort_by);

    let tasks: Vec<VisibleTask> = annotated
        .iter()
        .map(|entry| VisibleTask {
            id: entry.task.id,
            name: entry.task.name.clone(),
            list: visibility.effective_list_id(entry.task),
            parent: entry.parent,
            score: entry.score,
        })
        .collect();

    let mut human = HumanOutput::new(format!(
        "{} of {} task(s) visible in project {}",
        tasks.len(),
        graph.len(),
        workspace.project
    ));
    human.push_summary("sort", toggles.sort_by.as_str());
    if !toggles.search.is_empty() {
        human.push_summary("search", toggles.search.clone());
    }
    for list in &all_lists {
        let in_list: Vec<&VisibleTask> = tasks.iter().filter(|t| t.list == Some(list.id)).collect();
        if in_list.is_empty() {
            continue;
        }
        human.push_detail(format!("{} ({})", list.name, in_list.len()));
        for task in in_list {
            human.push_detail(format!("  {} #{}", task.name, task.id));
        }
    }
    for warning in warnings {
        human.push_warning(warning);
    }

    let report = VisibleReport {
        project: workspace.project,
        sort_by: toggles.sort_by,
        shown: tasks.len(),
        hidden: graph.len() - tasks.len(),
        tasks,
    };
    emit_success(options.output, "visible", &report, Some(&human))
}
