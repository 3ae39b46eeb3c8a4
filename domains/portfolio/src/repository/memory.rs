//! In-memory project repository
//!
//! Used by the mock provider path and by workflow tests. Mirrors the Postgres
//! implementation's observable behavior (case-insensitive title uniqueness,
//! gallery only loaded on request) and supports one-shot failure injection
//! for exercising the saga's compensation branches.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use atelier_common::RepositoryError;

use crate::domain::entities::Project;
use crate::repository::ProjectRepository;

#[derive(Debug, Default)]
struct FailNext {
    create: bool,
    update: bool,
    delete: bool,
}

#[derive(Clone, Default)]
pub struct InMemoryProjectRepository {
    projects: Arc<Mutex<HashMap<Uuid, Project>>>,
    fail_next: Arc<Mutex<FailNext>>,
}

impl InMemoryProjectRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `create` call with a connection error.
    pub fn set_fail_next_create(&self) {
        self.lock_fail().create = true;
    }

    /// Fail the next `update` call with a connection error.
    pub fn set_fail_next_update(&self) {
        self.lock_fail().update = true;
    }

    /// Fail the next `delete` call with a connection error.
    pub fn set_fail_next_delete(&self) {
        self.lock_fail().delete = true;
    }

    /// Number of stored projects.
    pub fn len(&self) -> usize {
        self.lock_projects().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock_projects(&self) -> std::sync::MutexGuard<'_, HashMap<Uuid, Project>> {
        self.projects
            .lock()
            .expect("repository lock poisoned")
    }

    fn lock_fail(&self) -> std::sync::MutexGuard<'_, FailNext> {
        self.fail_next
            .lock()
            .expect("repository lock poisoned")
    }

    fn injected_failure() -> RepositoryError {
        RepositoryError::Connection(sqlx::Error::PoolClosed)
    }
}

#[async_trait]
impl ProjectRepository for InMemoryProjectRepository {
    async fn create(&self, project: &Project) -> Result<Project, RepositoryError> {
        {
            let mut fail = self.lock_fail();
            if fail.create {
                fail.create = false;
                return Err(Self::injected_failure());
            }
        }

        let mut projects = self.lock_projects();
        // Storage-layer backstop for the advisory title check
        if projects
            .values()
            .any(|existing| existing.title.eq_ignore_ascii_case(&project.title))
        {
            return Err(RepositoryError::AlreadyExists);
        }
        projects.insert(project.id, project.clone());
        Ok(project.clone())
    }

    async fn update(&self, project: &Project) -> Result<Project, RepositoryError> {
        {
            let mut fail = self.lock_fail();
            if fail.update {
                fail.update = false;
                return Err(Self::injected_failure());
            }
        }

        let mut projects = self.lock_projects();
        if !projects.contains_key(&project.id) {
            return Err(RepositoryError::NotFound);
        }
        // Same backstop as create, ignoring the project's own row
        if projects.values().any(|existing| {
            existing.id != project.id && existing.title.eq_ignore_ascii_case(&project.title)
        }) {
            return Err(RepositoryError::AlreadyExists);
        }
        projects.insert(project.id, project.clone());
        Ok(project.clone())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Project>, RepositoryError> {
        Ok(self.lock_projects().get(&id).cloned().map(|mut project| {
            project.gallery.clear();
            project
        }))
    }

    async fn get_by_id_with_gallery(&self, id: Uuid) -> Result<Option<Project>, RepositoryError> {
        Ok(self.lock_projects().get(&id).cloned())
    }

    async fn get_by_title(&self, title: &str) -> Result<Option<Project>, RepositoryError> {
        Ok(self
            .lock_projects()
            .values()
            .find(|project| project.title.eq_ignore_ascii_case(title))
            .cloned())
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        {
            let mut fail = self.lock_fail();
            if fail.delete {
                fail.delete = false;
                return Err(Self::injected_failure());
            }
        }

        match self.lock_projects().remove(&id) {
            Some(_) => Ok(()),
            None => Err(RepositoryError::NotFound),
        }
    }

    async fn list(&self) -> Result<Vec<Project>, RepositoryError> {
        let mut projects: Vec<Project> = self.lock_projects().values().cloned().collect();
        projects.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(projects)
    }
}
