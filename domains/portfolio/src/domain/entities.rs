//! Domain entities for the Portfolio domain
//!
//! A project optionally carries a main image and an ordered gallery of images
//! held in external object storage; only the references (URL + storage public
//! id) live here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use atelier_media::UploadedMedia;

use crate::domain::dto::ProjectRequest;

/// Project category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectCategory {
    Residential,
    Commercial,
    Remodeling,
    Industrial,
    Institutional,
}

impl ProjectCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectCategory::Residential => "residential",
            ProjectCategory::Commercial => "commercial",
            ProjectCategory::Remodeling => "remodeling",
            ProjectCategory::Industrial => "industrial",
            ProjectCategory::Institutional => "institutional",
        }
    }
}

impl FromStr for ProjectCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "residential" => Ok(ProjectCategory::Residential),
            "commercial" => Ok(ProjectCategory::Commercial),
            "remodeling" => Ok(ProjectCategory::Remodeling),
            "industrial" => Ok(ProjectCategory::Industrial),
            "institutional" => Ok(ProjectCategory::Institutional),
            other => Err(format!("unknown project category '{}'", other)),
        }
    }
}

/// Project status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Completed,
    UnderConstruction,
    #[default]
    Conceptual,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Completed => "completed",
            ProjectStatus::UnderConstruction => "under_construction",
            ProjectStatus::Conceptual => "conceptual",
        }
    }
}

impl FromStr for ProjectStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "completed" => Ok(ProjectStatus::Completed),
            "under_construction" => Ok(ProjectStatus::UnderConstruction),
            "conceptual" => Ok(ProjectStatus::Conceptual),
            other => Err(format!("unknown project status '{}'", other)),
        }
    }
}

/// Gallery image reference, owned exclusively by its project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectImage {
    pub id: Uuid,
    pub project_id: Uuid,
    pub url: String,
    pub public_id: String,
    /// Gallery display order, a user-visible property
    pub position: i32,
}

/// Project entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: ProjectCategory,
    pub location: String,
    pub project_year: String,
    pub client_name: Option<String>,
    pub status: ProjectStatus,
    pub main_image_url: Option<String>,
    pub main_image_public_id: Option<String>,
    pub tags: Vec<String>,
    pub gallery: Vec<ProjectImage>,
    pub created_at: DateTime<Utc>,
}

impl Project {
    /// Build a new in-memory project from a validated request. The id and
    /// creation timestamp are assigned here; images are attached afterwards.
    pub fn from_request(request: &ProjectRequest) -> Self {
        Project {
            id: Uuid::new_v4(),
            title: request.title.clone(),
            description: request.description.clone(),
            category: request.category,
            location: request.location.clone(),
            project_year: request.project_year.clone(),
            client_name: request.client_name.clone(),
            status: request.status,
            main_image_url: None,
            main_image_public_id: None,
            tags: request.tags.clone(),
            gallery: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Apply field changes from a request onto this project in place.
    /// Identity, creation timestamp, and image references are untouched.
    pub fn apply_request(&mut self, request: &ProjectRequest) {
        self.title = request.title.clone();
        self.description = request.description.clone();
        self.category = request.category;
        self.location = request.location.clone();
        self.project_year = request.project_year.clone();
        self.client_name = request.client_name.clone();
        self.status = request.status;
        self.tags = request.tags.clone();
    }

    /// Attach an uploaded main image, replacing any previous reference.
    pub fn attach_main_image(&mut self, media: UploadedMedia) {
        self.main_image_url = Some(media.url);
        self.main_image_public_id = Some(media.public_id);
    }

    /// Attach uploaded gallery media in upload order.
    pub fn attach_gallery(&mut self, media: Vec<UploadedMedia>) {
        let start = self.gallery.len() as i32;
        for (offset, item) in media.into_iter().enumerate() {
            self.gallery.push(ProjectImage {
                id: Uuid::new_v4(),
                project_id: self.id,
                url: item.url,
                public_id: item.public_id,
                position: start + offset as i32,
            });
        }
    }

    /// Collect every storage identifier referenced by this project
    /// (main image + gallery), for remote cleanup.
    pub fn collect_public_ids(&self) -> (Option<String>, Vec<String>) {
        let main = self.main_image_public_id.clone();
        let gallery = self
            .gallery
            .iter()
            .map(|image| image.public_id.clone())
            .collect();
        (main, gallery)
    }

    /// Find a gallery image belonging to this project.
    pub fn find_gallery_image(&self, image_id: Uuid) -> Option<&ProjectImage> {
        self.gallery.iter().find(|image| image.id == image_id)
    }

    /// Remove a gallery image reference, returning it if it was present.
    pub fn remove_gallery_image(&mut self, image_id: Uuid) -> Option<ProjectImage> {
        let index = self.gallery.iter().position(|image| image.id == image_id)?;
        Some(self.gallery.remove(index))
    }
}
