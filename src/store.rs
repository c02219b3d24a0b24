//! Record store seam.
//!
//! The host owns persistence. `RecordStore` is the contract the engine talks
//! to: a flat collection of custom module data values per project (data
//! category), plus the categories themselves. Every call is an await point.
//!
//! `InMemoryStore` implements the contract for tests and for the inspection
//! CLI, which loads a JSON snapshot exported from the host.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::error::{Error, Result};
use crate::model::{ModuleId, Project, ProjectId, Record, RecordBody, RecordId};

/// Module id used while the plugin module is not (yet) known to the host
pub const UNRESOLVED_MODULE: ModuleId = -1;

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Look up the id of a custom module by its key.
    async fn module_id(&self, key: &str) -> Result<Option<ModuleId>>;

    /// All data values of one project.
    async fn data_values(&self, module_id: ModuleId, project: ProjectId) -> Result<Vec<Record>>;

    /// Persist a new data value; the returned record carries the assigned id.
    async fn create_data_value(
        &self,
        module_id: ModuleId,
        project: ProjectId,
        body: RecordBody,
    ) -> Result<Record>;

    /// Replace a data value in full.
    async fn update_data_value(&self, module_id: ModuleId, record: Record) -> Result<()>;

    async fn delete_data_value(
        &self,
        module_id: ModuleId,
        id: RecordId,
        project: ProjectId,
    ) -> Result<()>;

    async fn categories(&self, module_id: ModuleId) -> Result<Vec<Project>>;

    /// Persist a new category; the id of `project` is ignored and assigned by the store.
    async fn create_category(&self, module_id: ModuleId, project: Project) -> Result<Project>;

    async fn update_category(&self, module_id: ModuleId, project: Project) -> Result<()>;

    async fn delete_category(&self, module_id: ModuleId, id: ProjectId) -> Result<()>;
}

/// One project's slice of the module's records. The entity adapters are
/// built on top of it.
#[derive(Clone, Copy)]
pub struct ProjectScope<'a> {
    pub store: &'a dyn RecordStore,
    pub module_id: ModuleId,
    pub project: ProjectId,
}

impl<'a> ProjectScope<'a> {
    pub fn new(store: &'a dyn RecordStore, module_id: ModuleId, project: ProjectId) -> Self {
        Self {
            store,
            module_id,
            project,
        }
    }

    /// Records of this project only, whatever the store returned.
    pub async fn records(&self) -> Result<Vec<Record>> {
        let records = self.store.data_values(self.module_id, self.project).await?;
        Ok(records
            .into_iter()
            .filter(|record| record.data_category_id == self.project)
            .collect())
    }

    pub async fn create(&self, body: RecordBody) -> Result<Record> {
        let kind = body.kind();
        let record = self
            .store
            .create_data_value(self.module_id, self.project, body)
            .await?;
        tracing::debug!(id = record.id, project = self.project, kind, "created record");
        Ok(record)
    }

    /// Replace a record, forcing it into this project.
    pub async fn update(&self, mut record: Record) -> Result<()> {
        record.data_category_id = self.project;
        let id = record.id;
        self.store.update_data_value(self.module_id, record).await?;
        tracing::debug!(id, project = self.project, "updated record");
        Ok(())
    }

    pub async fn delete(&self, id: RecordId) -> Result<()> {
        self.store
            .delete_data_value(self.module_id, id, self.project)
            .await?;
        tracing::debug!(id, project = self.project, "deleted record");
        Ok(())
    }
}

/// Module data exported from the host: the module, its categories and every
/// data value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module_key: Option<String>,
    pub module_id: ModuleId,
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub records: Vec<Record>,
}

impl Snapshot {
    pub fn read(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// Store operations that can be made to fail in tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    Create,
    Update,
    Delete,
}

#[derive(Debug, Default)]
struct MemoryState {
    modules: HashMap<String, ModuleId>,
    /// Ids are unique within a project only.
    records: BTreeMap<(ProjectId, RecordId), (ModuleId, Record)>,
    categories: BTreeMap<ProjectId, Project>,
    next_record_id: RecordId,
    next_category_id: ProjectId,
    faults: HashMap<StoreOp, usize>,
}

impl MemoryState {
    /// Consume one operation of `op`, failing when an armed fault runs out.
    fn check_fault(&mut self, op: StoreOp) -> Result<()> {
        if let Some(remaining) = self.faults.get_mut(&op) {
            if *remaining == 0 {
                self.faults.remove(&op);
                return Err(Error::Store(format!("injected {op:?} failure")));
            }
            *remaining -= 1;
        }
        Ok(())
    }
}

/// Process-local record store.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: Mutex<MemoryState>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a module key so `module_id` resolves it.
    pub async fn register_module(&self, key: impl Into<String>, id: ModuleId) {
        let mut state = self.state.lock().await;
        state.modules.insert(key.into(), id);
    }

    /// Seed records as exported from the host, keeping their ids.
    pub async fn seed(&self, module_id: ModuleId, records: Vec<Record>) {
        let mut state = self.state.lock().await;
        for record in records {
            state.next_record_id = state.next_record_id.max(record.id);
            state
                .records
                .insert((record.data_category_id, record.id), (module_id, record));
        }
    }

    /// Seed categories as exported from the host, keeping their ids.
    pub async fn seed_categories(&self, projects: Vec<Project>) {
        let mut state = self.state.lock().await;
        for project in projects {
            state.next_category_id = state.next_category_id.max(project.id);
            state.categories.insert(project.id, project);
        }
    }

    /// Load an exported snapshot. The module is registered under the
    /// snapshot's key, or `fallback_key` when it carries none.
    pub async fn load_snapshot(&self, snapshot: Snapshot, fallback_key: &str) {
        let key = snapshot
            .module_key
            .unwrap_or_else(|| fallback_key.to_string());
        self.register_module(key, snapshot.module_id).await;
        self.seed_categories(snapshot.projects).await;
        self.seed(snapshot.module_id, snapshot.records).await;
    }

    /// Let `ok_count` further operations of `op` succeed, then fail the next one once.
    pub async fn fail_after(&self, op: StoreOp, ok_count: usize) {
        let mut state = self.state.lock().await;
        state.faults.insert(op, ok_count);
    }
}

#[async_trait]
impl RecordStore for InMemoryStore {
    async fn module_id(&self, key: &str) -> Result<Option<ModuleId>> {
        tokio::task::yield_now().await;
        let state = self.state.lock().await;
        Ok(state.modules.get(key).copied())
    }

    async fn data_values(&self, module_id: ModuleId, project: ProjectId) -> Result<Vec<Record>> {
        tokio::task::yield_now().await;
        let state = self.state.lock().await;
        Ok(state
            .records
            .range((project, RecordId::MIN)..=(project, RecordId::MAX))
            .filter(|(_, (module, _))| *module == module_id)
            .map(|(_, (_, record))| record.clone())
            .collect())
    }

    async fn create_data_value(
        &self,
        module_id: ModuleId,
        project: ProjectId,
        body: RecordBody,
    ) -> Result<Record> {
        tokio::task::yield_now().await;
        let mut state = self.state.lock().await;
        state.check_fault(StoreOp::Create)?;
        state.next_record_id += 1;
        let record = Record::new(state.next_record_id, project, body);
        state
            .records
            .insert((project, record.id), (module_id, record.clone()));
        Ok(record)
    }

    async fn update_data_value(&self, module_id: ModuleId, record: Record) -> Result<()> {
        tokio::task::yield_now().await;
        let mut state = self.state.lock().await;
        state.check_fault(StoreOp::Update)?;
        match state.records.get_mut(&(record.data_category_id, record.id)) {
            Some((module, existing)) if *module == module_id => {
                *existing = record;
                Ok(())
            }
            _ => Err(Error::Store(format!(
                "data value {} not found in project {}",
                record.id, record.data_category_id
            ))),
        }
    }

    async fn delete_data_value(
        &self,
        module_id: ModuleId,
        id: RecordId,
        project: ProjectId,
    ) -> Result<()> {
        tokio::task::yield_now().await;
        let mut state = self.state.lock().await;
        state.check_fault(StoreOp::Delete)?;
        let matches = state
            .records
            .get(&(project, id))
            .map(|(module, _)| *module == module_id)
            .unwrap_or(false);
        if !matches {
            return Err(Error::Store(format!(
                "data value {id} not found in project {project}"
            )));
        }
        state.records.remove(&(project, id));
        Ok(())
    }

    async fn categories(&self, module_id: ModuleId) -> Result<Vec<Project>> {
        tokio::task::yield_now().await;
        let state = self.state.lock().await;
        Ok(state
            .categories
            .values()
            .filter(|project| project.custom_module_id == module_id)
            .cloned()
            .collect())
    }

    async fn create_category(&self, module_id: ModuleId, mut project: Project) -> Result<Project> {
        tokio::task::yield_now().await;
        let mut state = self.state.lock().await;
        state.check_fault(StoreOp::Create)?;
        state.next_category_id += 1;
        project.id = state.next_category_id;
        project.custom_module_id = module_id;
        state.categories.insert(project.id, project.clone());
        Ok(project)
    }

    async fn update_category(&self, module_id: ModuleId, project: Project) -> Result<()> {
        tokio::task::yield_now().await;
        let mut state = self.state.lock().await;
        state.check_fault(StoreOp::Update)?;
        match state.categories.get_mut(&project.id) {
            Some(existing) if existing.custom_module_id == module_id => {
                *existing = project;
                Ok(())
            }
            _ => Err(Error::ProjectNotFound(project.id)),
        }
    }

    async fn delete_category(&self, module_id: ModuleId, id: ProjectId) -> Result<()> {
        tokio::task::yield_now().await;
        let mut state = self.state.lock().await;
        state.check_fault(StoreOp::Delete)?;
        match state.categories.get(&id) {
            Some(existing) if existing.custom_module_id == module_id => {
                state.categories.remove(&id);
                // Data values of a deleted category go with it.
                state
                    .records
                    .retain(|(project, _), (module, _)| !(*module == module_id && *project == id));
                Ok(())
            }
            _ => Err(Error::ProjectNotFound(id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Tag, Task};

    #[tokio::test]
    async fn create_assigns_increasing_ids_after_seed() {
        let store = InMemoryStore::new();
        store
            .seed(1, vec![Record::new(10, 5, RecordBody::Task(Task::new("seeded")))])
            .await;
        let created = store
            .create_data_value(1, 5, RecordBody::Tag(Tag::default()))
            .await
            .expect("create");
        assert_eq!(created.id, 11);
        assert_eq!(store.data_values(1, 5).await.expect("values").len(), 2);
        assert!(store.data_values(2, 5).await.expect("values").is_empty());
    }

    #[tokio::test]
    async fn injected_fault_fires_once() {
        let store = InMemoryStore::new();
        store.fail_after(StoreOp::Create, 1).await;
        let body = || RecordBody::Task(Task::new("t"));
        assert!(store.create_data_value(1, 1, body()).await.is_ok());
        assert!(matches!(
            store.create_data_value(1, 1, body()).await,
            Err(Error::Store(_))
        ));
        assert!(store.create_data_value(1, 1, body()).await.is_ok());
    }

    #[tokio::test]
    async fn same_id_in_two_projects_keeps_both_records() {
        let store = InMemoryStore::new();
        store
            .seed(
                1,
                vec![
                    Record::new(4, 1, RecordBody::Task(Task::new("Choir warmup"))),
                    Record::new(4, 2, RecordBody::Task(Task::new("Festival setup"))),
                ],
            )
            .await;

        let first = store.data_values(1, 1).await.expect("values");
        let second = store.data_values(1, 2).await.expect("values");
        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 1);
        assert_eq!(first[0].id, 4);
        assert_eq!(second[0].id, 4);

        store.delete_data_value(1, 4, 1).await.expect("delete");
        assert!(store.data_values(1, 1).await.expect("values").is_empty());
        assert_eq!(store.data_values(1, 2).await.expect("values").len(), 1);
    }
}
