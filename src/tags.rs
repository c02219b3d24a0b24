//! Tag adapter.

use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::model::{Record, RecordBody, RecordId, Stored, StoredTag, Tag, Task};
use crate::store::ProjectScope;

pub struct TagRecords<'a> {
    scope: ProjectScope<'a>,
}

impl<'a> TagRecords<'a> {
    pub fn new(scope: ProjectScope<'a>) -> Self {
        Self { scope }
    }

    /// Tags of the project keyed by id.
    pub async fn tags(&self) -> Result<BTreeMap<RecordId, StoredTag>> {
        Ok(self
            .scope
            .records()
            .await?
            .into_iter()
            .filter_map(into_tag)
            .map(|tag| (tag.id, tag))
            .collect())
    }

    /// Persist a new tag. A `sort_key` of `None` places it after every existing tag.
    pub async fn create(
        &self,
        name: impl Into<String>,
        color: impl Into<String>,
        sort_key: Option<i64>,
    ) -> Result<StoredTag> {
        let sort_key = match sort_key {
            Some(key) => key,
            None => next_sort_key(self.tags().await?.values()),
        };
        let tag = Tag {
            name: name.into(),
            color: color.into(),
            sort_key,
        };
        let record = self.scope.create(RecordBody::Tag(tag)).await?;
        into_tag(record).ok_or_else(|| Error::Store("store returned a non-tag record".to_string()))
    }

    pub async fn update(&self, tag: &StoredTag) -> Result<()> {
        let record: Record = tag.clone().map(RecordBody::Tag);
        self.scope.update(record).await
    }
}

fn into_tag(record: Record) -> Option<StoredTag> {
    let Stored {
        id,
        data_category_id,
        value,
    } = record;
    match value {
        RecordBody::Tag(tag) => Some(Stored::new(id, data_category_id, tag)),
        _ => None,
    }
}

fn next_sort_key<'t>(tags: impl Iterator<Item = &'t StoredTag>) -> i64 {
    tags.map(|tag| tag.sort_key).max().map_or(0, |max| max + 1)
}

/// The task's tags that exist, ordered by name.
pub fn sorted_tags<'t>(task: &Task, tags: &'t BTreeMap<RecordId, StoredTag>) -> Vec<&'t StoredTag> {
    let mut resolved: Vec<&StoredTag> = task.tags.iter().filter_map(|id| tags.get(id)).collect();
    resolved.sort_by(|left, right| left.name.cmp(&right.name));
    resolved
}
