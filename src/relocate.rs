//! Cross-project task moves.
//!
//! Records cannot change project, so a move clones the task and its whole
//! subtree into the target project and deletes the originals:
//!
//! 1. detach the root from its parent's `subTasks` in the source project
//! 2. clone the subtree children first, rewriting `subTasks` to the new ids
//! 3. delete the originals, children first
//!
//! Each step is written to the move journal before the next begins, and
//! per-record progress (clone ids, deleted ids) as it happens. A move that
//! fails can be resumed, skipping finished work, or rolled back while no
//! original has been deleted yet.

use std::collections::HashSet;

use serde_json::json;

use crate::actor::IdentityProvider;
use crate::error::{Error, Result};
use crate::graph::TaskGraph;
use crate::journal::{MoveIntent, MoveJournal, MovePhase};
use crate::model::{ModuleId, ProjectId, RecordId, StoredTask};
use crate::store::{ProjectScope, RecordStore};
use crate::tasks::TaskRecords;

pub struct Relocator<'a> {
    store: &'a dyn RecordStore,
    module_id: ModuleId,
    identity: &'a dyn IdentityProvider,
    journal: &'a MoveJournal,
}

impl<'a> Relocator<'a> {
    pub fn new(
        store: &'a dyn RecordStore,
        module_id: ModuleId,
        identity: &'a dyn IdentityProvider,
        journal: &'a MoveJournal,
    ) -> Self {
        Self {
            store,
            module_id,
            identity,
            journal,
        }
    }

    fn tasks(&self, project: ProjectId) -> TaskRecords<'a> {
        TaskRecords::new(
            ProjectScope::new(self.store, self.module_id, project),
            self.identity,
        )
    }

    /// Move `task_id` and its subtree from `source` to `target`. Returns the
    /// root's clone.
    pub async fn move_task(
        &self,
        task_id: RecordId,
        source: ProjectId,
        target: ProjectId,
    ) -> Result<StoredTask> {
        if source == target {
            return Err(Error::InvalidArgument(format!(
                "task {task_id} is already in project {target}"
            )));
        }

        let graph = TaskGraph::build(self.tasks(source).list().await?);
        if graph.get(task_id).is_none() {
            return Err(Error::TaskNotFound {
                id: task_id,
                project: source,
            });
        }
        let post_order = graph.descendants_post_order(task_id)?;
        let parent = graph.parent_id(task_id);

        let mut intent = MoveIntent::new(
            self.identity.current_actor().id,
            source,
            target,
            task_id,
            parent,
            post_order,
        );
        intent.parent_position = parent
            .and_then(|id| graph.get(id))
            .and_then(|parent| parent.sub_tasks.iter().position(|&id| id == task_id));
        self.journal.record(&mut intent)?;
        tracing::info!(
            move_id = %intent.move_id,
            task = task_id,
            source,
            target,
            subtree = intent.post_order.len(),
            "moving task"
        );

        self.drive(&mut intent).await
    }

    /// Continue a journaled move from where it stopped.
    pub async fn resume(&self, move_id: &str) -> Result<StoredTask> {
        let mut intent = self.journal.load(move_id)?;
        if intent.phase == MovePhase::RolledBack {
            return Err(Error::MoveBlocked {
                move_id: move_id.to_string(),
                reason: "move was rolled back".to_string(),
            });
        }
        intent.last_error = None;
        tracing::info!(move_id = %intent.move_id, phase = intent.phase.as_str(), "resuming move");
        self.drive(&mut intent).await
    }

    /// Undo a journaled move: delete the clones made so far and re-attach
    /// the root to its former parent.
    pub async fn roll_back(&self, move_id: &str) -> Result<MoveIntent> {
        let mut intent = self.journal.load(move_id)?;
        if !intent.can_roll_back() {
            let reason = if intent.phase.is_terminal() {
                format!("move is already {}", intent.phase.as_str())
            } else {
                format!("{} original task(s) already deleted", intent.deleted.len())
            };
            return Err(Error::MoveBlocked {
                move_id: move_id.to_string(),
                reason,
            });
        }

        if let Err(err) = self.undo(&mut intent).await {
            return Err(self.fail(&mut intent, err));
        }
        intent.phase = MovePhase::RolledBack;
        intent.last_error = None;
        self.journal.record(&mut intent)?;
        tracing::info!(move_id = %intent.move_id, "rolled back move");
        Ok(intent)
    }

    async fn drive(&self, intent: &mut MoveIntent) -> Result<StoredTask> {
        loop {
            let step = match intent.phase {
                MovePhase::Planned => self.detach(intent).await.map(|()| MovePhase::Detached),
                MovePhase::Detached => self.clone_subtree(intent).await.map(|()| MovePhase::Cloned),
                MovePhase::Cloned => self.delete_originals(intent).await.map(|()| MovePhase::Completed),
                MovePhase::Completed => break,
                MovePhase::RolledBack => {
                    return Err(Error::MoveBlocked {
                        move_id: intent.move_id.to_string(),
                        reason: "move was rolled back".to_string(),
                    })
                }
            };
            match step {
                Ok(next) => {
                    intent.phase = next;
                    self.journal.record(intent)?;
                }
                Err(err) => return Err(self.fail(intent, err)),
            }
        }

        let new_root = intent.new_root().ok_or_else(|| Error::MoveBlocked {
            move_id: intent.move_id.to_string(),
            reason: "journal has no clone of the root task".to_string(),
        })?;
        tracing::info!(move_id = %intent.move_id, new_root, "move completed");
        self.tasks(intent.target_project).get(new_root).await
    }

    /// Journal the failure and hand the error back.
    fn fail(&self, intent: &mut MoveIntent, err: Error) -> Error {
        tracing::warn!(
            move_id = %intent.move_id,
            phase = intent.phase.as_str(),
            error = %err,
            "move step failed"
        );
        intent.last_error = Some(err.to_string());
        if let Err(journal_err) = self.journal.record(intent) {
            tracing::warn!(move_id = %intent.move_id, error = %journal_err, "could not journal move failure");
        }
        err
    }

    async fn detach(&self, intent: &MoveIntent) -> Result<()> {
        let Some(parent_id) = intent.parent else {
            return Ok(());
        };
        let source = self.tasks(intent.source_project);
        let Some(parent) = source.list().await?.into_iter().find(|task| task.id == parent_id) else {
            tracing::warn!(parent = parent_id, "former parent is gone; nothing to detach");
            return Ok(());
        };
        if !parent.sub_tasks.contains(&intent.root) {
            return Ok(());
        }

        let mut updated = parent.value.clone();
        updated.sub_tasks.retain(|&id| id != intent.root);
        source.update(&parent, updated).await?;
        Ok(())
    }

    async fn clone_subtree(&self, intent: &mut MoveIntent) -> Result<()> {
        let originals = TaskGraph::build(self.tasks(intent.source_project).list().await?);
        let target = self.tasks(intent.target_project);

        for id in intent.post_order.clone() {
            if intent.id_map.contains_key(&id) {
                continue;
            }
            let original = originals.get(id).ok_or_else(|| Error::MoveBlocked {
                move_id: intent.move_id.to_string(),
                reason: format!("task {id} disappeared from project {}", intent.source_project),
            })?;

            let mut clone = original.value.clone();
            clone.list = None;
            clone.sub_tasks = original
                .sub_tasks
                .iter()
                .filter_map(|child| intent.id_map.get(child).copied())
                .collect();
            let origin = json!({
                "movedFrom": { "project": intent.source_project, "id": id },
            });
            let created = target.create_with_history(clone, origin).await?;

            intent.id_map.insert(id, created.id);
            self.journal.record(intent)?;
        }
        Ok(())
    }

    async fn delete_originals(&self, intent: &mut MoveIntent) -> Result<()> {
        let source = self.tasks(intent.source_project);
        let remaining: HashSet<RecordId> = source.list().await?.iter().map(|task| task.id).collect();

        for id in intent.post_order.clone() {
            if intent.deleted.contains(&id) {
                continue;
            }
            if remaining.contains(&id) {
                source.delete(id).await?;
            }
            intent.deleted.push(id);
            self.journal.record(intent)?;
        }
        Ok(())
    }

    async fn undo(&self, intent: &mut MoveIntent) -> Result<()> {
        let target = self.tasks(intent.target_project);
        let existing: HashSet<RecordId> = target.list().await?.iter().map(|task| task.id).collect();

        for id in intent.post_order.clone() {
            let Some(clone_id) = intent.id_map.get(&id).copied() else {
                continue;
            };
            if existing.contains(&clone_id) {
                target.delete(clone_id).await?;
            }
            intent.id_map.remove(&id);
            self.journal.record(intent)?;
        }

        if intent.phase != MovePhase::Planned {
            self.reattach(intent).await?;
        }
        Ok(())
    }

    async fn reattach(&self, intent: &MoveIntent) -> Result<()> {
        let Some(parent_id) = intent.parent else {
            return Ok(());
        };
        let source = self.tasks(intent.source_project);
        let Some(parent) = source.list().await?.into_iter().find(|task| task.id == parent_id) else {
            tracing::warn!(parent = parent_id, "former parent is gone; root stays top-level");
            return Ok(());
        };
        if parent.sub_tasks.contains(&intent.root) {
            return Ok(());
        }

        let mut updated = parent.value.clone();
        let position = intent
            .parent_position
            .unwrap_or(updated.sub_tasks.len())
            .min(updated.sub_tasks.len());
        updated.sub_tasks.insert(position, intent.root);
        source.update(&parent, updated).await?;
        Ok(())
    }
}
