//! List adapter and default-list bootstrap.

use crate::error::{Error, Result};
use crate::model::{Record, RecordBody, RecordId, Stored, StoredList, TaskList};
use crate::session::Session;
use crate::store::ProjectScope;

pub struct ListRecords<'a> {
    scope: ProjectScope<'a>,
    session: &'a Session,
    default_name: String,
}

impl<'a> ListRecords<'a> {
    pub fn new(scope: ProjectScope<'a>, session: &'a Session, default_name: impl Into<String>) -> Self {
        Self {
            scope,
            session,
            default_name: default_name.into(),
        }
    }

    pub async fn lists(&self) -> Result<Vec<StoredList>> {
        Ok(self
            .scope
            .records()
            .await?
            .into_iter()
            .filter_map(into_list)
            .collect())
    }

    pub async fn get_by_id(&self, id: RecordId) -> Result<Option<StoredList>> {
        Ok(self.lists().await?.into_iter().find(|list| list.id == id))
    }

    pub async fn default_list(&self) -> Result<Option<StoredList>> {
        Ok(self.lists().await?.into_iter().find(|list| list.is_default))
    }

    pub async fn create(&self, list: TaskList) -> Result<StoredList> {
        let record = self.scope.create(RecordBody::List(list)).await?;
        into_list(record).ok_or_else(|| Error::Store("store returned a non-list record".to_string()))
    }

    pub async fn update(&self, list: &StoredList) -> Result<()> {
        let record: Record = list.clone().map(RecordBody::List);
        self.scope.update(record).await
    }

    pub async fn delete(&self, id: RecordId) -> Result<()> {
        self.scope.delete(id).await
    }

    /// Create the project's default list unless one exists or another
    /// bootstrap for the project is in flight. Returns the created list.
    pub async fn ensure_default_list(&self) -> Result<Option<StoredList>> {
        let project = self.scope.project;
        if self.session.is_creating_default_list(project) {
            return Ok(None);
        }
        if self.lists().await?.iter().any(|list| list.is_default) {
            return Ok(None);
        }
        // Re-checked after the await above: another task may have claimed it meanwhile.
        let Some(_guard) = self.session.try_begin_default_list(project) else {
            return Ok(None);
        };

        let list = TaskList {
            name: self.default_name.clone(),
            sort_key: 0,
            is_collapsed: false,
            is_default: true,
            ..TaskList::default()
        };
        let created = self.create(list).await?;
        tracing::info!(project, id = created.id, "created default list");
        Ok(Some(created))
    }
}

fn into_list(record: Record) -> Option<StoredList> {
    let Stored {
        id,
        data_category_id,
        value,
    } = record;
    match value {
        RecordBody::List(list) => Some(Stored::new(id, data_category_id, list)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{InMemoryStore, StoreOp};

    #[tokio::test]
    async fn default_list_uses_configured_name() {
        let store = InMemoryStore::new();
        let session = Session::new();
        let lists = ListRecords::new(ProjectScope::new(&store, 1, 9), &session, "Inbox");

        let created = lists.ensure_default_list().await.expect("bootstrap").expect("created");
        assert_eq!(created.name, "Inbox");
        assert!(created.is_default);
        assert_eq!(created.sort_key, 0);
        assert!(lists.ensure_default_list().await.expect("second").is_none());
        assert_eq!(lists.default_list().await.expect("lookup").map(|l| l.id), Some(created.id));
    }

    #[tokio::test]
    async fn failed_bootstrap_releases_the_claim() {
        let store = InMemoryStore::new();
        let session = Session::new();
        let lists = ListRecords::new(ProjectScope::new(&store, 1, 9), &session, "Unsortiert");

        store.fail_after(StoreOp::Create, 0).await;
        assert!(lists.ensure_default_list().await.is_err());
        assert!(!session.is_creating_default_list(9));
        assert!(lists.ensure_default_list().await.expect("retry").is_some());
    }
}
