//! Module context: which host custom module the plugin's data lives in.

use serde::Serialize;

use crate::error::Result;
use crate::model::ModuleId;
use crate::store::{RecordStore, UNRESOLVED_MODULE};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleContext {
    pub key: String,
    pub id: ModuleId,
}

impl ModuleContext {
    pub fn new(key: impl Into<String>, id: ModuleId) -> Self {
        Self {
            key: key.into(),
            id,
        }
    }

    /// Resolve the module id for `key`; unknown keys yield the unresolved id.
    pub async fn resolve(store: &dyn RecordStore, key: &str) -> Result<Self> {
        let id = store.module_id(key).await?.unwrap_or(UNRESOLVED_MODULE);
        if id == UNRESOLVED_MODULE {
            tracing::warn!(module = key, "custom module not registered with host");
        }
        Ok(Self::new(key, id))
    }

    pub fn is_resolved(&self) -> bool {
        self.id != UNRESOLVED_MODULE
    }
}
