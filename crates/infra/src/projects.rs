//! Project directory, read-only from this service's point of view.

use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use apflow_auth::{scope_for, Actor, ResourceKind};
use apflow_core::{DomainError, DomainResult, ProjectId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Scope-filtered read access to projects.
pub trait ProjectStore: Send + Sync {
    /// Projects visible to the actor, newest first.
    fn list_visible(&self, actor: &Actor) -> DomainResult<Vec<Project>>;
}

impl<S> ProjectStore for Arc<S>
where
    S: ProjectStore + ?Sized,
{
    fn list_visible(&self, actor: &Actor) -> DomainResult<Vec<Project>> {
        (**self).list_visible(actor)
    }
}

#[derive(Debug, Default)]
pub struct InMemoryProjectStore {
    projects: RwLock<Vec<Project>>,
}

impl InMemoryProjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, project: Project) -> DomainResult<()> {
        let mut projects = self
            .projects
            .write()
            .map_err(|_| DomainError::invariant("project store lock poisoned"))?;
        projects.push(project);
        Ok(())
    }
}

impl ProjectStore for InMemoryProjectStore {
    fn list_visible(&self, actor: &Actor) -> DomainResult<Vec<Project>> {
        let scope = scope_for(actor, ResourceKind::Projects);
        let projects = self
            .projects
            .read()
            .map_err(|_| DomainError::invariant("project store lock poisoned"))?;

        let mut visible: Vec<Project> = projects
            .iter()
            .filter(|p| scope.allows_project(p.id))
            .cloned()
            .collect();
        visible.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(visible)
    }
}
