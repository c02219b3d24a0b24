//! Project adapter. Projects are the module's data categories whose shorty
//! starts with `project`.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{ModuleId, PersonId, Project, ProjectId};
use crate::store::RecordStore;

/// Shorty prefix marking a category as a project
pub const PROJECT_SHORTY_PREFIX: &str = "project";
pub const DEFAULT_PROJECT_COLOR: &str = "basic";
pub const DEFAULT_PROJECT_ICON: &str = "fas fa-folder";
pub const DEFAULT_SECURITY_LEVEL: i64 = 1;

/// Fields a user supplies for a new project.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProject {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub allowed_users: Vec<PersonId>,
    #[serde(default)]
    pub read_only_users: Vec<PersonId>,
}

impl NewProject {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

pub fn is_project(category: &Project) -> bool {
    category.shorty.starts_with(PROJECT_SHORTY_PREFIX)
}

pub struct ProjectRecords<'a> {
    store: &'a dyn RecordStore,
    module_id: ModuleId,
}

impl<'a> ProjectRecords<'a> {
    pub fn new(store: &'a dyn RecordStore, module_id: ModuleId) -> Self {
        Self { store, module_id }
    }

    pub async fn projects(&self) -> Result<Vec<Project>> {
        Ok(self
            .store
            .categories(self.module_id)
            .await?
            .into_iter()
            .filter(is_project)
            .collect())
    }

    pub async fn get(&self, id: ProjectId) -> Result<Project> {
        self.projects()
            .await?
            .into_iter()
            .find(|project| project.id == id)
            .ok_or(Error::ProjectNotFound(id))
    }

    /// Create a project. The shorty continues from the last project's id.
    pub async fn create(&self, new: NewProject) -> Result<Project> {
        if new.name.trim().is_empty() {
            return Err(Error::InvalidArgument("project name must not be empty".to_string()));
        }
        let last_id = self.projects().await?.last().map_or(0, |project| project.id);
        let project = Project {
            id: 0,
            name: new.name,
            description: Some(new.description.unwrap_or_default()),
            color: Some(new.color.unwrap_or_else(|| DEFAULT_PROJECT_COLOR.to_string())),
            icon: Some(new.icon.unwrap_or_else(|| DEFAULT_PROJECT_ICON.to_string())),
            shorty: format!("{PROJECT_SHORTY_PREFIX}_{}", last_id + 1),
            security_level_id: DEFAULT_SECURITY_LEVEL,
            custom_module_id: self.module_id,
            allowed_users: new.allowed_users,
            read_only_users: new.read_only_users,
        };
        let created = self.store.create_category(self.module_id, project).await?;
        tracing::info!(id = created.id, shorty = %created.shorty, "created project");
        Ok(created)
    }

    pub async fn update(&self, mut project: Project) -> Result<()> {
        project.description.get_or_insert_with(String::new);
        self.store.update_category(self.module_id, project).await
    }

    /// Delete a project together with all of its records.
    pub async fn delete(&self, id: ProjectId) -> Result<()> {
        self.store.delete_category(self.module_id, id).await?;
        tracing::info!(id, "deleted project");
        Ok(())
    }
}
