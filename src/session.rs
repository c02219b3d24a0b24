//! Per-project session state.
//!
//! View toggles, the live search query and the default-list bootstrap flag
//! are process-lifetime state scoped by project. Entries are created on first
//! access and dropped by `clear_project`.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

use crate::filter::SortBy;
use crate::model::ProjectId;

/// Session-wide view settings for one project. They can only narrow what a
/// list's own settings allow.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ViewToggles {
    pub show_sub_tasks: bool,
    pub show_fullfilled: bool,
    pub sort_by: SortBy,
    pub search: String,
}

impl Default for ViewToggles {
    fn default() -> Self {
        Self {
            show_sub_tasks: false,
            show_fullfilled: true,
            sort_by: SortBy::DueDate,
            search: String::new(),
        }
    }
}

#[derive(Debug, Default)]
pub struct Session {
    toggles: Mutex<HashMap<ProjectId, ViewToggles>>,
    bootstrapping: Mutex<HashSet<ProjectId>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toggles(&self, project: ProjectId) -> ViewToggles {
        lock(&self.toggles).entry(project).or_default().clone()
    }

    pub fn update_toggles(&self, project: ProjectId, update: impl FnOnce(&mut ViewToggles)) {
        let mut toggles = lock(&self.toggles);
        update(toggles.entry(project).or_default());
    }

    pub fn set_search(&self, project: ProjectId, query: impl Into<String>) {
        let query = query.into();
        self.update_toggles(project, |toggles| toggles.search = query);
    }

    /// Forget everything held for a project.
    pub fn clear_project(&self, project: ProjectId) {
        lock(&self.toggles).remove(&project);
        lock(&self.bootstrapping).remove(&project);
    }

    /// Claim the default-list bootstrap for `project`. Returns `None` while
    /// another bootstrap is in flight; the claim ends when the guard drops.
    pub fn try_begin_default_list(&self, project: ProjectId) -> Option<BootstrapGuard<'_>> {
        if lock(&self.bootstrapping).insert(project) {
            Some(BootstrapGuard {
                session: self,
                project,
            })
        } else {
            None
        }
    }

    pub fn is_creating_default_list(&self, project: ProjectId) -> bool {
        lock(&self.bootstrapping).contains(&project)
    }
}

#[derive(Debug)]
pub struct BootstrapGuard<'a> {
    session: &'a Session,
    project: ProjectId,
}

impl Drop for BootstrapGuard<'_> {
    fn drop(&mut self) {
        lock(&self.session.bootstrapping).remove(&self.project);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggles_start_with_host_defaults() {
        let session = Session::new();
        let toggles = session.toggles(4);
        assert!(!toggles.show_sub_tasks);
        assert!(toggles.show_fullfilled);
        assert_eq!(toggles.sort_by, SortBy::DueDate);
        assert!(toggles.search.is_empty());
    }

    #[test]
    fn toggles_are_scoped_by_project() {
        let session = Session::new();
        session.set_search(1, "milk");
        assert_eq!(session.toggles(1).search, "milk");
        assert!(session.toggles(2).search.is_empty());
        session.clear_project(1);
        assert!(session.toggles(1).search.is_empty());
    }

    #[test]
    fn bootstrap_claim_is_exclusive_until_dropped() {
        let session = Session::new();
        let guard = session.try_begin_default_list(3).expect("first claim");
        assert!(session.try_begin_default_list(3).is_none());
        assert!(session.try_begin_default_list(4).is_some());
        assert!(session.is_creating_default_list(3));
        drop(guard);
        assert!(!session.is_creating_default_list(3));
        assert!(session.try_begin_default_list(3).is_some());
    }
}
