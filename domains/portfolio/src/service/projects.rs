//! Project workflow: the saga coordinating object storage and the database
//!
//! Object storage and the relational store cannot share a transaction, so
//! every mutating operation here follows the same discipline: cheap gates
//! first (validation, uniqueness, existence), remote uploads next with their
//! identifiers remembered, the database write last, and best-effort
//! compensation of remembered identifiers on the failure branch. Nothing is
//! retried automatically; surfaced errors carry enough classification for the
//! boundary layer to choose a status.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use uuid::Uuid;
use validator::Validate;

use atelier_common::{Error, Result};
use atelier_media::{MediaErrorKind, UploadFile};

use crate::domain::dto::{ProjectRequest, ProjectResponse};
use crate::domain::entities::Project;
use crate::repository::ProjectRepository;
use crate::service::images::{ImageOrchestrator, ImageUploadError};

pub struct ProjectService {
    repository: Arc<dyn ProjectRepository>,
    images: ImageOrchestrator,
}

fn image_error(err: ImageUploadError) -> Error {
    match err.kind {
        MediaErrorKind::BadRequest => Error::Validation(err.message),
        MediaErrorKind::Unavailable => Error::Internal(err.message),
    }
}

/// Cancellation is only honored before the first remote mutation; once an
/// upload or delete is in flight, abandoning the request would orphan either
/// the remote state or the compensation outcome.
fn ensure_active(cancel: &CancellationToken) -> Result<()> {
    if cancel.is_cancelled() {
        return Err(Error::Internal(
            "operation cancelled before any remote mutation".to_string(),
        ));
    }
    Ok(())
}

impl ProjectService {
    pub fn new(repository: Arc<dyn ProjectRepository>, images: ImageOrchestrator) -> Self {
        Self { repository, images }
    }

    /// Create a project, uploading its images before the database write.
    ///
    /// The title gate runs before any upload so a doomed request wastes no
    /// uploads. If persistence fails after uploads, every uploaded identifier
    /// is compensated before the failure surfaces.
    pub async fn create(
        &self,
        request: ProjectRequest,
        main_image: Option<UploadFile>,
        gallery: Vec<UploadFile>,
        cancel: &CancellationToken,
    ) -> Result<ProjectResponse> {
        request
            .validate()
            .map_err(|e| Error::Validation(e.to_string()))?;

        if self.repository.get_by_title(&request.title).await?.is_some() {
            return Err(Error::Conflict(format!(
                "a project titled '{}' already exists",
                request.title
            )));
        }

        ensure_active(cancel)?;

        let mut project = Project::from_request(&request);

        let mut main_pending: Option<String> = None;
        let mut gallery_pending: Vec<String> = Vec::new();

        if let Some(file) = main_image {
            let media = self.images.upload_one(file).await.map_err(image_error)?;
            main_pending = Some(media.public_id.clone());
            project.attach_main_image(media);
        }

        if !gallery.is_empty() {
            match self.images.upload_many(gallery).await {
                Ok(media) => {
                    gallery_pending = media
                        .iter()
                        .map(|uploaded| uploaded.public_id.clone())
                        .collect();
                    project.attach_gallery(media);
                }
                Err(err) => {
                    // The batch already rolled back its own partial uploads;
                    // the main image from the previous step is on us.
                    self.images.compensate(main_pending.as_deref(), &[]).await;
                    return Err(image_error(err));
                }
            }
        }

        match self.repository.create(&project).await {
            Ok(created) => {
                tracing::info!(project_id = %created.id, title = %created.title, "Project created");
                Ok(ProjectResponse::from(created))
            }
            Err(err) => {
                if main_pending.is_some() || !gallery_pending.is_empty() {
                    tracing::error!(
                        title = %project.title,
                        "Persisting project failed after uploads, compensating"
                    );
                    self.images
                        .compensate(main_pending.as_deref(), &gallery_pending)
                        .await;
                }
                Err(err.into())
            }
        }
    }

    /// Update a project, optionally replacing its main image.
    ///
    /// The old main image is deleted only after the new state is durably
    /// persisted; deleting before the commit risks losing the reference if
    /// the database write then fails.
    pub async fn update(
        &self,
        id: Uuid,
        request: ProjectRequest,
        new_main_image: Option<UploadFile>,
        cancel: &CancellationToken,
    ) -> Result<ProjectResponse> {
        request
            .validate()
            .map_err(|e| Error::Validation(e.to_string()))?;

        let mut project = self
            .repository
            .get_by_id_with_gallery(id)
            .await?
            .ok_or_else(|| Error::NotFound("project not found".to_string()))?;

        project.apply_request(&request);

        ensure_active(cancel)?;

        let mut old_main: Option<String> = None;
        let mut new_main: Option<String> = None;

        if let Some(file) = new_main_image {
            let media = self.images.upload_one(file).await.map_err(image_error)?;
            // Remember the old identifier; it is deleted only after the
            // database write succeeds.
            old_main = project.main_image_public_id.clone();
            new_main = Some(media.public_id.clone());
            project.attach_main_image(media);
        }

        match self.repository.update(&project).await {
            Ok(updated) => {
                if let Some(old_id) = old_main {
                    self.images.delete_one(&old_id).await;
                }
                tracing::info!(project_id = %updated.id, "Project updated");
                Ok(ProjectResponse::from(updated))
            }
            Err(err) => {
                if let Some(new_id) = new_main {
                    tracing::error!(
                        project_id = %id,
                        "Persisting update failed after upload, compensating new image"
                    );
                    self.images.compensate(Some(&new_id), &[]).await;
                }
                Err(err.into())
            }
        }
    }

    /// Delete a project: database row first, remote assets second.
    ///
    /// A leftover remote asset is a recoverable, low-cost inconsistency; a
    /// dangling database reference to a deleted asset would be visible to
    /// users. The row delete therefore always precedes the remote cleanup.
    pub async fn delete(&self, id: Uuid, cancel: &CancellationToken) -> Result<()> {
        let project = self
            .repository
            .get_by_id_with_gallery(id)
            .await?
            .ok_or_else(|| Error::NotFound("project not found".to_string()))?;

        let (main_id, gallery_ids) = project.collect_public_ids();

        ensure_active(cancel)?;

        self.repository.delete(project.id).await?;

        self.images
            .compensate(main_id.as_deref(), &gallery_ids)
            .await;

        tracing::info!(project_id = %id, "Project deleted");
        Ok(())
    }

    /// Remove a single gallery image: remote asset first, then the reference.
    ///
    /// Only one asset is involved, so the narrower risk window is acceptable
    /// and keeps a transient-failure retry simple.
    pub async fn delete_gallery_image(
        &self,
        project_id: Uuid,
        image_id: Uuid,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let mut project = self
            .repository
            .get_by_id_with_gallery(project_id)
            .await?
            .ok_or_else(|| Error::NotFound("project not found".to_string()))?;

        let public_id = project
            .find_gallery_image(image_id)
            .map(|image| image.public_id.clone())
            .ok_or_else(|| {
                Error::NotFound("image does not belong to this project".to_string())
            })?;

        ensure_active(cancel)?;

        self.images.delete_one(&public_id).await;

        project.remove_gallery_image(image_id);
        self.repository.update(&project).await?;

        tracing::info!(%project_id, %image_id, "Gallery image removed");
        Ok(())
    }

    /// Fetch one project with its gallery.
    pub async fn get(&self, id: Uuid) -> Result<ProjectResponse> {
        let project = self
            .repository
            .get_by_id_with_gallery(id)
            .await?
            .ok_or_else(|| Error::NotFound("project not found".to_string()))?;
        Ok(ProjectResponse::from(project))
    }

    /// List all projects, newest first.
    pub async fn list(&self) -> Result<Vec<ProjectResponse>> {
        let projects = self.repository.list().await?;
        Ok(projects.into_iter().map(ProjectResponse::from).collect())
    }
}
