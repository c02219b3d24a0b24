//! Move-intent journal.
//!
//! Every cross-project move is recorded as one JSON file under the journal
//! directory, named by its move id and rewritten after each step. A move
//! that stopped halfway can be picked up from its entry and resumed or
//! rolled back.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::lock::{self, FileLock, DEFAULT_LOCK_TIMEOUT_MS};
use crate::model::{PersonId, ProjectId, RecordId};

const LOCK_FILE: &str = ".lock";

/// Progress of a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MovePhase {
    /// Subtree collected, nothing written yet
    Planned,
    /// Root removed from its former parent's `subTasks`
    Detached,
    /// Every clone exists in the target project
    Cloned,
    /// Originals deleted
    Completed,
    RolledBack,
}

impl MovePhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, MovePhase::Completed | MovePhase::RolledBack)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MovePhase::Planned => "planned",
            MovePhase::Detached => "detached",
            MovePhase::Cloned => "cloned",
            MovePhase::Completed => "completed",
            MovePhase::RolledBack => "rolled-back",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MoveIntent {
    pub move_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub actor: PersonId,
    pub source_project: ProjectId,
    pub target_project: ProjectId,
    pub root: RecordId,
    /// Former parent of the root in the source project
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<RecordId>,
    /// Index of the root in the former parent's `subTasks`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_position: Option<usize>,
    /// Subtree ids, children before parents
    pub post_order: Vec<RecordId>,
    /// Source id -> clone id in the target project
    #[serde(default)]
    pub id_map: BTreeMap<RecordId, RecordId>,
    /// Source ids already deleted
    #[serde(default)]
    pub deleted: Vec<RecordId>,
    pub phase: MovePhase,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl MoveIntent {
    pub fn new(
        actor: PersonId,
        source_project: ProjectId,
        target_project: ProjectId,
        root: RecordId,
        parent: Option<RecordId>,
        post_order: Vec<RecordId>,
    ) -> Self {
        let now = Utc::now();
        Self {
            move_id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            actor,
            source_project,
            target_project,
            root,
            parent,
            parent_position: None,
            post_order,
            id_map: BTreeMap::new(),
            deleted: Vec::new(),
            phase: MovePhase::Planned,
            last_error: None,
        }
    }

    /// Id of the root's clone once it exists.
    pub fn new_root(&self) -> Option<RecordId> {
        self.id_map.get(&self.root).copied()
    }

    pub fn is_pending(&self) -> bool {
        !self.phase.is_terminal()
    }

    /// Rollback is only possible while every original still exists.
    pub fn can_roll_back(&self) -> bool {
        self.is_pending() && self.deleted.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct MoveJournal {
    dir: PathBuf,
}

impl MoveJournal {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Journal configured by `[moves] journal_dir`, relative to `base`.
    pub fn from_config(base: &Path, config: &Config) -> Self {
        Self::new(base.join(&config.moves.journal_dir))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, move_id: &Uuid) -> PathBuf {
        self.dir.join(format!("{move_id}.json"))
    }

    /// Write the current state of `intent`, replacing its previous entry.
    pub fn record(&self, intent: &mut MoveIntent) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let _lock = FileLock::acquire(self.dir.join(LOCK_FILE), DEFAULT_LOCK_TIMEOUT_MS)?;

        intent.updated_at = Utc::now();
        let json = serde_json::to_vec_pretty(intent)?;
        lock::write_atomic(self.entry_path(&intent.move_id), &json)?;
        tracing::debug!(move_id = %intent.move_id, phase = intent.phase.as_str(), "journaled move");
        Ok(())
    }

    pub fn load(&self, move_id: &str) -> Result<MoveIntent> {
        let parsed = Uuid::parse_str(move_id.trim())
            .map_err(|_| Error::InvalidArgument(format!("not a move id: {move_id}")))?;
        let path = self.entry_path(&parsed);
        if !path.exists() {
            return Err(Error::MoveNotFound(move_id.to_string()));
        }
        let _lock = FileLock::acquire(self.dir.join(LOCK_FILE), DEFAULT_LOCK_TIMEOUT_MS)?;
        let content = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Every entry, oldest first.
    pub fn all(&self) -> Result<Vec<MoveIntent>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let _lock = FileLock::acquire(self.dir.join(LOCK_FILE), DEFAULT_LOCK_TIMEOUT_MS)?;

        let paths: Vec<PathBuf> = fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().and_then(|ext| ext.to_str()) == Some("json"))
            .collect();

        let mut intents = Vec::new();
        for path in paths {
            let content = fs::read_to_string(&path)?;
            match serde_json::from_str::<MoveIntent>(&content) {
                Ok(intent) => intents.push(intent),
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "skipping unreadable journal entry")
                }
            }
        }
        intents.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(intents)
    }

    /// Moves that neither completed nor were rolled back.
    pub fn pending(&self) -> Result<Vec<MoveIntent>> {
        Ok(self.all()?.into_iter().filter(MoveIntent::is_pending).collect())
    }
}
