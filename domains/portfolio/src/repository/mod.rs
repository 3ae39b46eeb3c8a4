//! Repository implementations for the Portfolio domain

pub mod memory;
pub mod projects;

use async_trait::async_trait;
use uuid::Uuid;

use atelier_common::RepositoryError;

use crate::domain::entities::Project;

pub use memory::InMemoryProjectRepository;
pub use projects::PgProjectRepository;

/// Persistence boundary for projects and their image references.
///
/// `create` and `update` persist the full project graph (row, tags, gallery)
/// atomically: either everything lands or nothing does. The store owns no
/// knowledge of object storage.
#[async_trait]
pub trait ProjectRepository: Send + Sync {
    /// Persist a new project graph.
    async fn create(&self, project: &Project) -> Result<Project, RepositoryError>;

    /// Persist changes to an existing project graph.
    async fn update(&self, project: &Project) -> Result<Project, RepositoryError>;

    /// Fetch a project without its gallery.
    async fn get_by_id(&self, id: Uuid) -> Result<Option<Project>, RepositoryError>;

    /// Fetch a project with its gallery eagerly loaded.
    async fn get_by_id_with_gallery(&self, id: Uuid) -> Result<Option<Project>, RepositoryError>;

    /// Case-insensitive exact title lookup.
    async fn get_by_title(&self, title: &str) -> Result<Option<Project>, RepositoryError>;

    /// Delete a project row; tag and gallery rows go with it.
    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError>;

    /// All projects with galleries, newest first.
    async fn list(&self) -> Result<Vec<Project>, RepositoryError>;
}
