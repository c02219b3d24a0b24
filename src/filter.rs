//! Visibility, ordering and saved filters over a task snapshot.

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::graph::TaskGraph;
use crate::model::{iso8601, PersonId, ProjectId, RecordId, StoredList, StoredTask, TaskPriority, TaskStatus};
use crate::search::SearchResults;
use crate::session::ViewToggles;

/// Task ordering offered by the views.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortBy {
    #[default]
    DueDate,
    SortKey,
    Name,
    Priority,
}

impl SortBy {
    pub fn as_str(self) -> &'static str {
        match self {
            SortBy::DueDate => "dueDate",
            SortBy::SortKey => "sortKey",
            SortBy::Name => "name",
            SortBy::Priority => "priority",
        }
    }
}

impl std::str::FromStr for SortBy {
    type Err = String;

    fn from_str(raw: &str) -> std::result::Result<Self, Self::Err> {
        match raw {
            "dueDate" | "due-date" | "due" => Ok(SortBy::DueDate),
            "sortKey" | "sort-key" => Ok(SortBy::SortKey),
            "name" => Ok(SortBy::Name),
            "priority" => Ok(SortBy::Priority),
            other => Err(format!("unknown sort order: {other}")),
        }
    }
}

/// Decides which tasks a project view shows.
///
/// A task's effective list is its own `list` when that list exists, the
/// project's default list otherwise. Completed tasks need both the list's
/// `showCompleted` and the session's `show_fullfilled`; tasks with a parent
/// need both `showSubTasks` flags. A task missing from the search results is
/// never shown.
pub struct Visibility<'a> {
    graph: &'a TaskGraph,
    lists: HashMap<RecordId, &'a StoredList>,
    default_list: Option<RecordId>,
    toggles: &'a ViewToggles,
    search: &'a SearchResults,
}

impl<'a> Visibility<'a> {
    pub fn new(
        graph: &'a TaskGraph,
        lists: &'a [StoredList],
        toggles: &'a ViewToggles,
        search: &'a SearchResults,
    ) -> Self {
        Self {
            graph,
            lists: lists.iter().map(|list| (list.id, list)).collect(),
            default_list: lists.iter().find(|list| list.is_default).map(|list| list.id),
            toggles,
            search,
        }
    }

    pub fn effective_list_id(&self, task: &StoredTask) -> Option<RecordId> {
        task.list
            .filter(|id| self.lists.contains_key(id))
            .or(self.default_list)
    }

    pub fn effective_list(&self, task: &StoredTask) -> Option<&'a StoredList> {
        self.effective_list_id(task)
            .and_then(|id| self.lists.get(&id).copied())
    }

    pub fn show_task(&self, task: &StoredTask) -> bool {
        if !self.search.contains(task.id) {
            return false;
        }
        let list = self.effective_list(task);
        let show_completed = list.map(|list| list.show_completed).unwrap_or(false) && self.toggles.show_fullfilled;
        let show_sub_tasks = list.map(|list| list.show_sub_tasks).unwrap_or(false) && self.toggles.show_sub_tasks;

        (!task.fullfilled || show_completed) && (self.graph.parent_id(task.id).is_none() || show_sub_tasks)
    }

    /// Visible tasks in snapshot order.
    pub fn visible_tasks(&self) -> Vec<&'a StoredTask> {
        self.graph
            .tasks()
            .iter()
            .filter(|task| self.show_task(task))
            .collect()
    }

    /// Visible tasks whose effective list is `list`.
    pub fn visible_in_list(&self, list: RecordId) -> Vec<&'a StoredTask> {
        self.visible_tasks()
            .into_iter()
            .filter(|task| self.effective_list_id(task) == Some(list))
            .collect()
    }
}

/// A task with the values derived for it from the snapshot.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotatedTask<'a> {
    #[serde(flatten)]
    pub task: &'a StoredTask,
    pub parent: Option<RecordId>,
    pub score: Option<f64>,
    #[serde(with = "iso8601::option")]
    pub computed_due_date: Option<DateTime<Utc>>,
    pub percent_fullfilled: u32,
}

/// Annotate every task of the graph with parent, search score and due date.
pub fn annotate<'a>(graph: &'a TaskGraph, search: &SearchResults) -> Vec<AnnotatedTask<'a>> {
    graph
        .tasks()
        .iter()
        .map(|task| AnnotatedTask {
            task,
            parent: graph.parent_id(task.id),
            score: search.score(task.id),
            computed_due_date: graph.calculate_due_date(task),
            percent_fullfilled: graph.percent_fullfilled(task),
        })
        .collect()
}

/// Sort annotated tasks. Undated tasks and tasks without priority go last;
/// ties fall back to `sortKey`, then id.
pub fn sort_tasks(tasks: &mut [AnnotatedTask<'_>], sort_by: SortBy) {
    tasks.sort_by(|left, right| {
        let primary = match sort_by {
            SortBy::DueDate => cmp_missing_last(left.computed_due_date, right.computed_due_date),
            SortBy::SortKey => Ordering::Equal,
            SortBy::Name => left.task.name.to_lowercase().cmp(&right.task.name.to_lowercase()),
            SortBy::Priority => cmp_missing_last(
                left.task.priority.map(TaskPriority::rank),
                right.task.priority.map(TaskPriority::rank),
            )
            .then_with(|| cmp_missing_last(left.computed_due_date, right.computed_due_date)),
        };
        primary
            .then_with(|| left.task.sort_key.cmp(&right.task.sort_key))
            .then_with(|| left.task.id.cmp(&right.task.id))
    });
}

fn cmp_missing_last<T: Ord>(left: Option<T>, right: Option<T>) -> Ordering {
    match (left, right) {
        (Some(left), Some(right)) => left.cmp(&right),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DateRange {
    #[serde(default, skip_serializing_if = "Option::is_none", with = "iso8601::option")]
    pub from: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "iso8601::option")]
    pub to: Option<DateTime<Utc>>,
}

impl DateRange {
    fn is_open(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }

    /// Inclusive on both ends; an undated task never falls in a bounded range.
    pub fn contains(&self, due: Option<DateTime<Utc>>) -> bool {
        if self.is_open() {
            return true;
        }
        let Some(due) = due else {
            return false;
        };
        self.from.map_or(true, |from| due >= from) && self.to.map_or(true, |to| due <= to)
    }
}

/// A named filter saved for one project.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedFilter {
    pub id: u64,
    pub name: String,
    pub project_id: ProjectId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<TaskPriority>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub assigned_to: Vec<PersonId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<RecordId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<SortBy>,
    #[serde(default)]
    pub date_range: DateRange,
}

impl SavedFilter {
    pub fn new(name: impl Into<String>, project_id: ProjectId) -> Self {
        Self {
            name: name.into(),
            project_id,
            ..Self::default()
        }
    }

    /// Every criterion that is set must hold. Assignees and tags match on any overlap.
    pub fn matches(&self, graph: &TaskGraph, task: &StoredTask) -> bool {
        if self.status.is_some() && task.status != self.status {
            return false;
        }
        if self.priority.is_some() && task.priority != self.priority {
            return false;
        }
        if !self.assigned_to.is_empty() && !task.assigned_to.iter().any(|p| self.assigned_to.contains(p)) {
            return false;
        }
        if !self.tags.is_empty() && !task.tags.iter().any(|t| self.tags.contains(t)) {
            return false;
        }
        self.date_range.is_open() || self.date_range.contains(graph.calculate_due_date(task))
    }

    pub fn apply<'a>(&self, graph: &'a TaskGraph) -> Vec<&'a StoredTask> {
        graph
            .tasks()
            .iter()
            .filter(|task| self.matches(graph, task))
            .collect()
    }
}

/// In-memory saved filters; ids are assigned from 1 upwards.
#[derive(Debug, Clone)]
pub struct FilterStore {
    filters: Vec<SavedFilter>,
    next_id: u64,
}

impl Default for FilterStore {
    fn default() -> Self {
        Self {
            filters: Vec::new(),
            next_id: 1,
        }
    }
}

impl FilterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `filter` under a fresh id, ignoring the id it carries.
    pub fn add(&mut self, mut filter: SavedFilter) -> SavedFilter {
        filter.id = self.next_id;
        self.next_id += 1;
        self.filters.push(filter.clone());
        filter
    }

    /// Apply `update` to the filter with `id`. Returns false for unknown ids.
    pub fn update(&mut self, id: u64, update: impl FnOnce(&mut SavedFilter)) -> bool {
        let Some(filter) = self.filters.iter_mut().find(|f| f.id == id) else {
            return false;
        };
        update(filter);
        filter.id = id;
        true
    }

    pub fn delete(&mut self, id: u64) {
        self.filters.retain(|f| f.id != id);
    }

    pub fn get(&self, id: u64) -> Option<&SavedFilter> {
        self.filters.iter().find(|f| f.id == id)
    }

    pub fn by_project(&self, project: ProjectId) -> Vec<&SavedFilter> {
        self.filters.iter().filter(|f| f.project_id == project).collect()
    }

    pub fn all(&self) -> &[SavedFilter] {
        &self.filters
    }
}
