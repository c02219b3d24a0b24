//! Task graph derived from a flat snapshot of task records.
//!
//! Tasks reference their children through `subTasks`; there is no stored
//! back-reference. `TaskGraph` builds the id map and a child -> parent index
//! once per snapshot and answers every hierarchy question from them. It owns
//! no state beyond the snapshot it was built from: rebuild it whenever the
//! collection changes.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::model::{RecordId, StoredTask};

/// A second task claiming an already-parented child.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ParentConflict {
    pub child: RecordId,
    /// Parent kept by the index (first in snapshot order)
    pub kept: RecordId,
    pub ignored: RecordId,
}

/// A `subTasks` entry naming a task that is not in the snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DanglingReference {
    pub parent: RecordId,
    pub missing: RecordId,
}

/// Integrity findings for one snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IntegrityReport {
    pub ambiguous_parents: Vec<ParentConflict>,
    pub dangling: Vec<DanglingReference>,
    /// Tasks whose ancestry loops back on itself
    pub cyclic: Vec<RecordId>,
}

impl IntegrityReport {
    pub fn is_clean(&self) -> bool {
        self.ambiguous_parents.is_empty() && self.dangling.is_empty() && self.cyclic.is_empty()
    }
}

/// Urgency bucket of a computed due date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DueColor {
    /// Due before today
    Red,
    /// Due within the next day
    Green,
    Basic,
}

enum DueResolution {
    Due(DateTime<Utc>),
    Undated,
    Cycle,
}

#[derive(Debug, Clone, Default)]
pub struct TaskGraph {
    tasks: Vec<StoredTask>,
    index: HashMap<RecordId, usize>,
    parent_of: HashMap<RecordId, RecordId>,
    conflicts: Vec<ParentConflict>,
}

impl TaskGraph {
    /// Build the graph. When several tasks claim the same child the first one
    /// in snapshot order wins and the rest are kept as conflicts.
    pub fn build(tasks: Vec<StoredTask>) -> Self {
        let index: HashMap<RecordId, usize> = tasks
            .iter()
            .enumerate()
            .map(|(position, task)| (task.id, position))
            .collect();

        let mut parent_of = HashMap::new();
        let mut conflicts = Vec::new();
        for task in &tasks {
            for &child in &task.sub_tasks {
                match parent_of.get(&child) {
                    None => {
                        parent_of.insert(child, task.id);
                    }
                    Some(&kept) if kept != task.id => conflicts.push(ParentConflict {
                        child,
                        kept,
                        ignored: task.id,
                    }),
                    Some(_) => {}
                }
            }
        }

        for conflict in &conflicts {
            tracing::warn!(
                child = conflict.child,
                kept = conflict.kept,
                ignored = conflict.ignored,
                "task listed as sub-task by more than one parent"
            );
        }

        Self {
            tasks,
            index,
            parent_of,
            conflicts,
        }
    }

    /// Build the graph, rejecting snapshots where a child has two parents.
    pub fn try_build(tasks: Vec<StoredTask>) -> Result<Self> {
        let graph = Self::build(tasks);
        if let Some(conflict) = graph.conflicts.first() {
            return Err(Error::AmbiguousParent {
                child: conflict.child,
                first: conflict.kept,
                second: conflict.ignored,
            });
        }
        Ok(graph)
    }

    pub fn tasks(&self) -> &[StoredTask] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, id: RecordId) -> Option<&StoredTask> {
        self.index.get(&id).map(|&position| &self.tasks[position])
    }

    /// Id -> task lookup over the snapshot.
    pub fn tasks_map(&self) -> HashMap<RecordId, &StoredTask> {
        self.tasks.iter().map(|task| (task.id, task)).collect()
    }

    pub fn conflicts(&self) -> &[ParentConflict] {
        &self.conflicts
    }

    pub fn parent_id(&self, id: RecordId) -> Option<RecordId> {
        self.parent_of
            .get(&id)
            .copied()
            .filter(|parent| self.index.contains_key(parent))
    }

    /// The task listing `task` in its `subTasks`, if any.
    pub fn find_parent(&self, task: &StoredTask) -> Option<&StoredTask> {
        self.parent_id(task.id).and_then(|parent| self.get(parent))
    }

    /// Direct sub-tasks in `subTasks` order; ids missing from the snapshot are skipped.
    pub fn children(&self, task: &StoredTask) -> Vec<&StoredTask> {
        task.sub_tasks.iter().filter_map(|&id| self.get(id)).collect()
    }

    pub fn has_sub_tasks(&self, task: &StoredTask) -> bool {
        task.sub_tasks.iter().any(|&id| self.index.contains_key(&id))
    }

    /// Absolute due date of a task.
    ///
    /// A non-zero `dueDateRelative` is an offset in days before the parent's
    /// computed due date and overrides the task's own `dueDate` whenever the
    /// parent resolves to a date. Cyclic ancestry yields `None`.
    pub fn calculate_due_date(&self, task: &StoredTask) -> Option<DateTime<Utc>> {
        let mut visited = HashSet::new();
        match self.resolve_due(task, &mut visited) {
            DueResolution::Due(due) => Some(due),
            DueResolution::Undated => None,
            DueResolution::Cycle => {
                tracing::warn!(task = task.id, "cyclic sub-tasks while resolving due date");
                None
            }
        }
    }

    fn resolve_due(&self, task: &StoredTask, visited: &mut HashSet<RecordId>) -> DueResolution {
        if !visited.insert(task.id) {
            return DueResolution::Cycle;
        }

        let own = task.due_date;
        let relative = task.due_date_relative.filter(|days| *days != 0);
        let parent = relative.and_then(|days| self.find_parent(task).map(|parent| (days, parent)));

        let Some((days, parent)) = parent else {
            return own.map(DueResolution::Due).unwrap_or(DueResolution::Undated);
        };

        match self.resolve_due(parent, visited) {
            DueResolution::Due(parent_due) => {
                let due = Duration::try_days(days)
                    .and_then(|offset| parent_due.checked_sub_signed(offset));
                match due {
                    Some(due) => DueResolution::Due(due),
                    None => {
                        tracing::warn!(task = task.id, days, "relative due offset out of range");
                        own.map(DueResolution::Due).unwrap_or(DueResolution::Undated)
                    }
                }
            }
            DueResolution::Undated => own.map(DueResolution::Due).unwrap_or(DueResolution::Undated),
            DueResolution::Cycle => DueResolution::Cycle,
        }
    }

    /// Root ancestor of `task`, or `task` itself when it has no parent.
    pub fn super_parent<'a>(&'a self, task: &'a StoredTask) -> &'a StoredTask {
        let mut visited = HashSet::from([task.id]);
        let mut current = task;
        while let Some(parent) = self.find_parent(current) {
            if !visited.insert(parent.id) {
                tracing::warn!(task = task.id, "cyclic sub-tasks while resolving super parent");
                return task;
            }
            current = parent;
        }
        current
    }

    /// Share of fullfilled direct sub-tasks, floored to whole percent.
    pub fn percent_fullfilled(&self, task: &StoredTask) -> u32 {
        let children = self.children(task);
        if children.is_empty() {
            return 0;
        }
        let done = children.iter().filter(|child| child.fullfilled).count();
        (done * 100 / children.len()) as u32
    }

    /// `root` and every descendant, children before the parent that lists them.
    pub fn descendants_post_order(&self, root: RecordId) -> Result<Vec<RecordId>> {
        if self.get(root).is_none() {
            return Err(Error::InvalidArgument(format!("task {root} is not in the snapshot")));
        }
        let mut order = Vec::new();
        let mut done = HashSet::new();
        let mut on_path = HashSet::new();
        self.visit_post_order(root, &mut on_path, &mut done, &mut order)?;
        Ok(order)
    }

    fn visit_post_order(
        &self,
        id: RecordId,
        on_path: &mut HashSet<RecordId>,
        done: &mut HashSet<RecordId>,
        order: &mut Vec<RecordId>,
    ) -> Result<()> {
        if done.contains(&id) {
            return Ok(());
        }
        if !on_path.insert(id) {
            return Err(Error::CycleDetected(id));
        }
        if let Some(task) = self.get(id) {
            for child in self.children(task) {
                self.visit_post_order(child.id, on_path, done, order)?;
            }
        }
        on_path.remove(&id);
        done.insert(id);
        order.push(id);
        Ok(())
    }

    /// Urgency of the computed due date relative to `now` (UTC day boundaries).
    pub fn due_color(&self, task: &StoredTask, now: DateTime<Utc>) -> Option<DueColor> {
        let due = self.calculate_due_date(task)?;
        let start_of_today = now.date_naive().and_hms_opt(0, 0, 0)?.and_utc();
        if due < start_of_today {
            return Some(DueColor::Red);
        }
        if due - start_of_today < Duration::days(1) {
            return Some(DueColor::Green);
        }
        Some(DueColor::Basic)
    }

    /// Check the snapshot for ambiguous parents, dangling ids and cycles.
    pub fn validate(&self) -> IntegrityReport {
        let index = &self.index;
        let dangling = self
            .tasks
            .iter()
            .flat_map(|task| {
                task.sub_tasks
                    .iter()
                    .filter(move |id| !index.contains_key(id))
                    .map(move |&missing| DanglingReference {
                        parent: task.id,
                        missing,
                    })
            })
            .collect();

        let mut cyclic = Vec::new();
        for task in &self.tasks {
            let mut visited = HashSet::from([task.id]);
            let mut current = task.id;
            while let Some(parent) = self.parent_id(current) {
                if parent == task.id {
                    cyclic.push(task.id);
                    break;
                }
                if !visited.insert(parent) {
                    break;
                }
                current = parent;
            }
        }

        IntegrityReport {
            ambiguous_parents: self.conflicts.clone(),
            dangling,
            cyclic,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Stored, Task};
    use chrono::TimeZone;

    fn task(id: RecordId, sub_tasks: &[RecordId]) -> StoredTask {
        let mut value = Task::new(format!("task {id}"));
        value.sub_tasks = sub_tasks.to_vec();
        Stored::new(id, 1, value)
    }

    #[test]
    fn first_parent_wins_and_conflict_is_recorded() {
        let graph = TaskGraph::build(vec![task(1, &[3]), task(2, &[3]), task(3, &[])]);
        assert_eq!(graph.parent_id(3), Some(1));
        assert_eq!(
            graph.conflicts(),
            &[ParentConflict {
                child: 3,
                kept: 1,
                ignored: 2,
            }]
        );
    }

    #[test]
    fn self_reference_fails_closed_on_due_date() {
        let mut looped = task(1, &[1]);
        looped.due_date_relative = Some(2);
        looped.due_date = Some(Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap());
        let graph = TaskGraph::build(vec![looped]);
        let looped = graph.get(1).expect("task");
        assert_eq!(graph.calculate_due_date(looped), None);
        assert_eq!(graph.super_parent(looped).id, 1);
        assert_eq!(graph.validate().cyclic, vec![1]);
    }

    #[test]
    fn post_order_rejects_cycles() {
        let graph = TaskGraph::build(vec![task(1, &[2]), task(2, &[1])]);
        assert!(matches!(
            graph.descendants_post_order(1),
            Err(Error::CycleDetected(_))
        ));
    }

    #[test]
    fn due_color_buckets() {
        let now = Utc.with_ymd_and_hms(2024, 6, 10, 15, 0, 0).unwrap();
        let dated = |id: RecordId, due: DateTime<Utc>| {
            let mut t = task(id, &[]);
            t.due_date = Some(due);
            t
        };
        let graph = TaskGraph::build(vec![
            dated(1, Utc.with_ymd_and_hms(2024, 6, 9, 23, 0, 0).unwrap()),
            dated(2, Utc.with_ymd_and_hms(2024, 6, 10, 8, 0, 0).unwrap()),
            dated(3, Utc.with_ymd_and_hms(2024, 6, 12, 8, 0, 0).unwrap()),
            task(4, &[]),
        ]);
        let color = |id| graph.due_color(graph.get(id).expect("task"), now);
        assert_eq!(color(1), Some(DueColor::Red));
        assert_eq!(color(2), Some(DueColor::Green));
        assert_eq!(color(3), Some(DueColor::Basic));
        assert_eq!(color(4), None);
    }
}
